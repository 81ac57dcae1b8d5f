use axum::{extract::Path, extract::State, Json};
use std::sync::Arc;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::AppJson;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::providers::dtos::{
    CreateProviderDto, CreateProviderModelDto, ProviderModelResponseDto, ProviderResponseDto,
    UpdateProviderDto,
};
use crate::features::providers::services::ProviderService;
use crate::shared::types::ApiResponse;

/// List providers with their models
#[utoipa::path(
    get,
    path = "/api/v1/providers",
    responses(
        (status = 200, description = "Providers retrieved successfully", body = ApiResponse<Vec<ProviderResponseDto>>)
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_providers(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
) -> Result<Json<ApiResponse<Vec<ProviderResponseDto>>>> {
    let providers = service.list().await?;
    Ok(Json(ApiResponse::success(Some(providers), None, None)))
}

/// Register a provider connection profile
#[utoipa::path(
    post,
    path = "/api/v1/providers",
    request_body = CreateProviderDto,
    responses(
        (status = 200, description = "Provider created successfully", body = ApiResponse<ProviderResponseDto>),
        (status = 400, description = "Validation error")
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_provider(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
    AppJson(dto): AppJson<CreateProviderDto>,
) -> Result<Json<ApiResponse<ProviderResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let provider = service.create(dto).await?;
    Ok(Json(ApiResponse::success(Some(provider), None, None)))
}

/// Get a provider with its models
#[utoipa::path(
    get,
    path = "/api/v1/providers/{id}",
    params(
        ("id" = i64, Path, description = "Provider ID")
    ),
    responses(
        (status = 200, description = "Provider retrieved successfully", body = ApiResponse<ProviderResponseDto>),
        (status = 404, description = "Provider not found")
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_provider(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ProviderResponseDto>>> {
    let provider = service.get(id).await?;
    Ok(Json(ApiResponse::success(Some(provider), None, None)))
}

/// Partially update a provider
#[utoipa::path(
    patch,
    path = "/api/v1/providers/{id}",
    params(
        ("id" = i64, Path, description = "Provider ID")
    ),
    request_body = UpdateProviderDto,
    responses(
        (status = 200, description = "Provider updated successfully", body = ApiResponse<ProviderResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Provider not found")
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_provider(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<UpdateProviderDto>,
) -> Result<Json<ApiResponse<ProviderResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let provider = service.update(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(provider), None, None)))
}

/// Delete a provider and its models
#[utoipa::path(
    delete,
    path = "/api/v1/providers/{id}",
    params(
        ("id" = i64, Path, description = "Provider ID")
    ),
    responses(
        (status = 200, description = "Provider deleted successfully"),
        (status = 404, description = "Provider not found")
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_provider(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Provider deleted successfully".to_string()),
        None,
    )))
}

/// Register a model under a provider
#[utoipa::path(
    post,
    path = "/api/v1/providers/{id}/models",
    params(
        ("id" = i64, Path, description = "Provider ID")
    ),
    request_body = CreateProviderModelDto,
    responses(
        (status = 200, description = "Model created successfully", body = ApiResponse<ProviderModelResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Provider not found")
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_model(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
    Path(id): Path<i64>,
    AppJson(dto): AppJson<CreateProviderModelDto>,
) -> Result<Json<ApiResponse<ProviderModelResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let model = service.add_model(id, dto).await?;
    Ok(Json(ApiResponse::success(Some(model), None, None)))
}

/// Delete a model; the provider id in the path must own it
#[utoipa::path(
    delete,
    path = "/api/v1/providers/{id}/models/{model_id}",
    params(
        ("id" = i64, Path, description = "Provider ID"),
        ("model_id" = i64, Path, description = "Model ID")
    ),
    responses(
        (status = 200, description = "Model deleted successfully"),
        (status = 404, description = "Model not found")
    ),
    tag = "providers",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn delete_model(
    _user: AuthenticatedUser,
    State(service): State<Arc<ProviderService>>,
    Path((id, model_id)): Path<(i64, i64)>,
) -> Result<Json<ApiResponse<()>>> {
    service.delete_model(id, model_id).await?;
    Ok(Json(ApiResponse::success(
        None,
        Some("Model deleted successfully".to_string()),
        None,
    )))
}
