use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::providers::{handlers, services::ProviderService};

pub fn routes(service: Arc<ProviderService>) -> Router {
    Router::new()
        .route(
            "/api/v1/providers",
            get(handlers::list_providers).post(handlers::create_provider),
        )
        .route(
            "/api/v1/providers/{id}",
            get(handlers::get_provider)
                .patch(handlers::update_provider)
                .delete(handlers::delete_provider),
        )
        .route(
            "/api/v1/providers/{id}/models",
            post(handlers::create_model),
        )
        .route(
            "/api/v1/providers/{id}/models/{model_id}",
            axum::routing::delete(handlers::delete_model),
        )
        .with_state(service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{test_pool, with_test_auth};
    use axum_test::TestServer;
    use serde_json::json;

    async fn server() -> TestServer {
        let service = Arc::new(ProviderService::new(test_pool().await));
        TestServer::new(with_test_auth(routes(service))).unwrap()
    }

    #[tokio::test]
    async fn provider_model_cascade_over_http() {
        let server = server().await;

        let created = server
            .post("/api/v1/providers")
            .json(&json!({"name": "local-ollama", "base_url": "http://localhost:11434"}))
            .await;
        created.assert_status_ok();
        let provider_id = created.json::<serde_json::Value>()["data"]["id"]
            .as_i64()
            .unwrap();

        server
            .post(&format!("/api/v1/providers/{provider_id}/models"))
            .json(&json!({"name": "llama3", "capabilities": "chat"}))
            .await
            .assert_status_ok();

        server
            .delete(&format!("/api/v1/providers/{provider_id}"))
            .await
            .assert_status_ok();

        let gone = server.get(&format!("/api/v1/providers/{provider_id}")).await;
        gone.assert_status_not_found();
    }

    #[tokio::test]
    async fn create_echoes_no_credential() {
        let server = server().await;
        let created = server
            .post("/api/v1/providers")
            .json(&json!({"name": "openai-prod", "api_key": "sk-secret"}))
            .await;
        created.assert_status_ok();

        let body = created.text();
        assert!(!body.contains("sk-secret"));
        assert_eq!(
            created.json::<serde_json::Value>()["data"]["has_api_key"],
            true
        );
    }
}
