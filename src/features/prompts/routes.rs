use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::features::prompts::{handlers, services::PromptService};

pub fn routes(service: Arc<PromptService>) -> Router {
    Router::new()
        .route(
            "/api/v1/prompts",
            post(handlers::create_prompt).get(handlers::list_prompts),
        )
        .route(
            "/api/v1/prompts/{id}",
            get(handlers::get_prompt)
                .patch(handlers::update_prompt)
                .delete(handlers::delete_prompt),
        )
        .route(
            "/api/v1/prompts/{id}/versions",
            post(handlers::create_version),
        )
        .route(
            "/api/v1/prompts/{id}/versions/{version_id}",
            axum::routing::patch(handlers::update_version).delete(handlers::delete_version),
        )
        .route(
            "/api/v1/prompts/{id}/versions/{version_id}/set-active",
            post(handlers::set_active_version),
        )
        .with_state(service)
}
