//! Cookie-based session identity.
//!
//! A browser session is identified by the `ragchat_session` cookie. When the
//! cookie is absent a fresh id is minted and the handler sets it on the
//! response.

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "ragchat_session";

pub struct SessionId {
    pub id: String,
    is_new: bool,
}

impl SessionId {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        match read_cookie(headers, SESSION_COOKIE) {
            Some(id) => Self { id, is_new: false },
            None => Self {
                id: Uuid::new_v4().to_string(),
                is_new: true,
            },
        }
    }

    /// Attach a `Set-Cookie` header when this request minted a new session.
    pub fn apply(&self, response: &mut Response) {
        if !self.is_new {
            return;
        }

        let cookie = format!("{}={}; Path=/; HttpOnly", SESSION_COOKIE, self.id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().append(SET_COOKIE, value);
        }
    }
}

fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        let Some((key, value)) = pair.trim().split_once('=') else {
            continue;
        };
        if key == name && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_existing_session_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; ragchat_session=abc-123"),
        );

        let session = SessionId::from_headers(&headers);
        assert_eq!(session.id, "abc-123");
        assert!(!session.is_new);
    }

    #[test]
    fn mints_a_fresh_id_without_cookie() {
        let session = SessionId::from_headers(&HeaderMap::new());
        assert!(session.is_new);
        assert!(!session.id.is_empty());
    }

    #[test]
    fn fresh_sessions_get_distinct_ids() {
        let a = SessionId::from_headers(&HeaderMap::new());
        let b = SessionId::from_headers(&HeaderMap::new());
        assert_ne!(a.id, b.id);
    }
}
