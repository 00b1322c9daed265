use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::llm::LlmProvider;
use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let provider_ok = state.provider.health_check().await.unwrap_or(false);

    Json(json!({
        "status": "ok",
        "app": state.settings.app_name,
        "provider": state.provider.name(),
        "provider_ok": provider_ok,
    }))
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde_json::Value;

    use super::*;
    use crate::core::errors::ApiError;
    use crate::rag::{AnswerChain, ChainOutput};

    struct UnusedChain;

    #[async_trait]
    impl AnswerChain for UnusedChain {
        async fn invoke(&self, _query: &str) -> Result<ChainOutput, ApiError> {
            Err(ApiError::Internal("not under test".to_string()))
        }
    }

    struct StubProvider {
        healthy: bool,
    }

    #[async_trait]
    impl crate::llm::LlmProvider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn health_check(&self) -> Result<bool, ApiError> {
            Ok(self.healthy)
        }

        async fn generate(&self, _model: &str, _prompt: &str) -> Result<String, ApiError> {
            Err(ApiError::Internal("not under test".to_string()))
        }

        async fn embed(&self, _model: &str, _inputs: &[String]) -> Result<Vec<Vec<f32>>, ApiError> {
            Err(ApiError::Internal("not under test".to_string()))
        }
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[tokio::test]
    async fn health_reports_provider_status() {
        let state = AppState::with_fakes(
            Arc::new(StubProvider { healthy: true }),
            Arc::new(UnusedChain),
        );

        let response = health(State(state)).await.into_response();
        let payload = body_json(response).await;

        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["provider"], "stub");
        assert_eq!(payload["provider_ok"], true);
    }

    #[tokio::test]
    async fn health_surfaces_unreachable_provider() {
        let state = AppState::with_fakes(
            Arc::new(StubProvider { healthy: false }),
            Arc::new(UnusedChain),
        );

        let response = health(State(state)).await.into_response();
        let payload = body_json(response).await;

        assert_eq!(payload["status"], "ok");
        assert_eq!(payload["provider_ok"], false);
    }
}
