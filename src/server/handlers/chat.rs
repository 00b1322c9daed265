use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use futures_util::stream;
use serde::Deserialize;

use crate::chat::stream::sentence_fragments;
use crate::chat::transcript::{Message, Role};
use crate::core::errors::ApiError;
use crate::rag::AnswerChain;
use crate::server::handlers::session::SessionId;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct StreamRequest {
    #[serde(default)]
    pub prompt: String,
}

/// `GET /` — the transcript rendered for display.
pub async fn chat_page(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = SessionId::from_headers(&headers);
    let transcript = state.transcripts.snapshot(&session.id);

    let mut response = Html(render_transcript(&state.settings.app_name, &transcript)).into_response();
    session.apply(&mut response);
    response
}

/// `POST /` — one synchronous chat turn, then redirect back to the page.
pub async fn submit_prompt(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<PromptForm>,
) -> Response {
    let session = SessionId::from_headers(&headers);

    state
        .assembler
        .respond(&state.transcripts, &session.id, &form.prompt)
        .await;

    let mut response = Redirect::to("/").into_response();
    session.apply(&mut response);
    response
}

/// `POST /chat-stream` — the incremental delivery mode.
///
/// Streams plain-text sentence fragments. Does not touch the transcript.
pub async fn chat_stream(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StreamRequest>,
) -> Result<Response, ApiError> {
    let prompt = request.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(ApiError::BadRequest("No prompt provided".to_string()));
    }

    let fragments = match state.chain.invoke(&prompt).await {
        Ok(output) => sentence_fragments(&output.result),
        Err(err) => {
            tracing::warn!("chain invocation failed during stream: {}", err);
            vec![format!("Error: {}", err.message())]
        }
    };

    let body = Body::from_stream(stream::iter(
        fragments.into_iter().map(Ok::<String, Infallible>),
    ));

    let response = Response::builder()
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body)
        .map_err(ApiError::internal)?;

    Ok(response)
}

/// `GET /reset` — drop the session transcript and go back to the page.
pub async fn reset(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let session = SessionId::from_headers(&headers);
    state.transcripts.clear(&session.id);

    let mut response = Redirect::to("/").into_response();
    session.apply(&mut response);
    response
}

fn render_transcript(app_name: &str, transcript: &[Message]) -> String {
    let mut messages = String::new();
    for message in transcript {
        let role = match message.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        messages.push_str(&format!(
            "<div class=\"message {role}\"><span class=\"role\">{role}</span><pre>{}</pre></div>\n",
            escape_html(&message.content),
        ));
    }

    format!(
        "<!doctype html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title}</title></head>\n\
         <body>\n<h1>{title}</h1>\n{messages}\
         <form method=\"post\" action=\"/\">\n\
         <input type=\"text\" name=\"prompt\" autofocus>\n\
         <button type=\"submit\">Send</button>\n\
         </form>\n<a href=\"/reset\">Reset</a>\n</body>\n</html>\n",
        title = escape_html(app_name),
        messages = messages,
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
