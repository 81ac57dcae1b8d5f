use axum::{extract::Path, extract::Query, extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::prompts::dtos::{
    CreatePromptDto, CreatePromptVersionDto, PromptDetailDto, PromptPageDto, PromptQueryParams,
    PromptVersionResponseDto, UpdatePromptDto, UpdatePromptVersionDto,
};
use crate::features::prompts::services::PromptService;
use crate::shared::types::{ApiResponse, Meta};

/// Create a new prompt
#[utoipa::path(
    post,
    path = "/api/v1/prompts",
    request_body = CreatePromptDto,
    responses(
        (status = 200, description = "Prompt created successfully", body = ApiResponse<PromptDetailDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_prompt(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    AppJson(dto): AppJson<CreatePromptDto>,
) -> Result<Json<ApiResponse<PromptDetailDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let prompt = service.create(dto).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// List prompts with filtering, sorting and pagination
#[utoipa::path(
    get,
    path = "/api/v1/prompts",
    params(PromptQueryParams),
    responses(
        (status = 200, description = "Prompts retrieved successfully", body = ApiResponse<PromptPageDto>)
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_prompts(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Query(params): Query<PromptQueryParams>,
) -> Result<Json<ApiResponse<PromptPageDto>>> {
    let page = service.list(&params).await?;
    let total = page.total;
    Ok(Json(ApiResponse::success(
        Some(page),
        None,
        Some(Meta { total }),
    )))
}

/// Get a prompt with its versions
#[utoipa::path(
    get,
    path = "/api/v1/prompts/{id}",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt retrieved successfully", body = ApiResponse<PromptDetailDto>),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_prompt(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<PromptDetailDto>>> {
    let prompt = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// Partially update a prompt
#[utoipa::path(
    patch,
    path = "/api/v1/prompts/{id}",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    request_body = UpdatePromptDto,
    responses(
        (status = 200, description = "Prompt updated successfully", body = ApiResponse<PromptDetailDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_prompt(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdatePromptDto>,
) -> Result<Json<ApiResponse<PromptDetailDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let prompt = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// Delete a prompt and all of its versions
#[utoipa::path(
    delete,
    path = "/api/v1/prompts/{id}",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    responses(
        (status = 200, description = "Prompt deleted successfully"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_prompt(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Prompt deleted successfully".to_string()),
        None,
    )))
}

/// Add a version to a prompt
#[utoipa::path(
    post,
    path = "/api/v1/prompts/{id}/versions",
    params(
        ("id" = i64, Path, description = "Prompt ID")
    ),
    request_body = CreatePromptVersionDto,
    responses(
        (status = 200, description = "Version created successfully", body = ApiResponse<PromptVersionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Prompt not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_version(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<CreatePromptVersionDto>,
) -> Result<Json<ApiResponse<PromptVersionResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let version = service.add_version(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(version), None, None)))
}

/// Make a version the prompt's active version
#[utoipa::path(
    post,
    path = "/api/v1/prompts/{id}/versions/{version_id}/set-active",
    params(
        ("id" = i64, Path, description = "Prompt ID"),
        ("version_id" = i64, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "Active version updated", body = ApiResponse<PromptDetailDto>),
        (status = 404, description = "Prompt or version not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn set_active_version(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path((id, version_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<PromptDetailDto>>> {
    let prompt = service.set_active_version(id, version_id).await?;
    Ok(Json(ApiResponse::success(Some(prompt), None, None)))
}

/// Partially update a version
#[utoipa::path(
    patch,
    path = "/api/v1/prompts/{id}/versions/{version_id}",
    params(
        ("id" = i64, Path, description = "Prompt ID"),
        ("version_id" = i64, Path, description = "Version ID")
    ),
    request_body = UpdatePromptVersionDto,
    responses(
        (status = 200, description = "Version updated successfully", body = ApiResponse<PromptVersionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Version not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_version(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path((id, version_id)): Path<(i64, i64)>,
    AppJson(dto): AppJson<UpdatePromptVersionDto>,
) -> Result<Json<ApiResponse<PromptVersionResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let version = service.update_version(id, version_id, dto).await?;
    Ok(Json(ApiResponse::success(Some(version), None, None)))
}

/// Delete a version; the active pointer is cleared if it pointed here
#[utoipa::path(
    delete,
    path = "/api/v1/prompts/{id}/versions/{version_id}",
    params(
        ("id" = i64, Path, description = "Prompt ID"),
        ("version_id" = i64, Path, description = "Version ID")
    ),
    responses(
        (status = 200, description = "Version deleted successfully"),
        (status = 404, description = "Version not found")
    ),
    tag = "prompts",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_version(
    _user: AuthenticatedUser,
    State(service): State<Arc<PromptService>>,
    Path((id, version_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_version(id, version_id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Version deleted successfully".to_string()),
        None,
    )))
}
