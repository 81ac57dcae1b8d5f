use axum::{routing::post, Router};
use std::sync::Arc;

use crate::features::execute::handlers::{self, ExecuteState};
use crate::features::execute::services::LlmDispatcher;
use crate::features::providers::services::ProviderService;

pub fn routes(providers: Arc<ProviderService>, dispatcher: Arc<LlmDispatcher>) -> Router {
    let state = ExecuteState {
        providers,
        dispatcher,
    };

    Router::new()
        .route("/api/v1/execute", post(handlers::execute_prompt))
        .with_state(state)
}
