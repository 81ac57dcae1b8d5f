use axum::{extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::execute::dtos::{ExecuteRequestDto, ExecuteResponseDto};
use crate::features::execute::services::{LlmDispatcher, ResolvedProfile};
use crate::features::providers::services::ProviderService;
use crate::shared::types::ApiResponse;

#[derive(Clone)]
pub struct ExecuteState {
    pub providers: Arc<ProviderService>,
    pub dispatcher: Arc<LlmDispatcher>,
}

/// Execute a prompt against an LLM provider
#[utoipa::path(
    post,
    path = "/api/v1/execute",
    request_body = ExecuteRequestDto,
    responses(
        (status = 200, description = "Prompt executed successfully", body = ApiResponse<ExecuteResponseDto>),
        (status = 400, description = "Unsupported provider, missing credential, or wrong model kind"),
        (status = 502, description = "Upstream model service rejected the call or was unreachable")
    ),
    tag = "execute",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn execute_prompt(
    _user: AuthenticatedUser,
    State(state): State<ExecuteState>,
    AppJson(dto): AppJson<ExecuteRequestDto>,
) -> Result<Json<ApiResponse<ExecuteResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // A provider id that resolves to nothing simply means no per-call
    // profile; the dispatcher then falls back to process-wide defaults.
    let profile = match dto.provider_id {
        Some(id) => state.providers.find(id).await?.map(|p| ResolvedProfile {
            api_key: p.api_key,
            base_url: p.base_url,
        }),
        None => None,
    };

    let config = dto.config.unwrap_or_default();
    let response = state
        .dispatcher
        .execute(
            &dto.model_provider,
            &dto.model_name,
            &dto.prompt_text,
            &config,
            profile.as_ref(),
        )
        .await?;

    Ok(Json(ApiResponse::success(
        Some(ExecuteResponseDto { response }),
        None,
        None,
    )))
}
