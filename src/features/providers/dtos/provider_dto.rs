use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::features::providers::models::{Provider, ProviderModel};

fn default_is_active() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProviderDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub api_key: Option<String>,

    pub base_url: Option<String>,

    #[serde(default = "default_is_active")]
    pub is_active: bool,
}

// Partial update: absent fields keep their prior values
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProviderDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub api_key: Option<String>,

    pub base_url: Option<String>,

    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateProviderModelDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub capabilities: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderModelResponseDto {
    pub id: i64,
    pub provider_id: i64,
    pub name: String,
    pub capabilities: Option<String>,
}

/// Read view of a provider. The stored credential never leaves the server;
/// only its presence is reported.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProviderResponseDto {
    pub id: i64,
    pub name: String,
    pub has_api_key: bool,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub models: Vec<ProviderModelResponseDto>,
}

impl From<ProviderModel> for ProviderModelResponseDto {
    fn from(m: ProviderModel) -> Self {
        Self {
            id: m.id,
            provider_id: m.provider_id,
            name: m.name,
            capabilities: m.capabilities,
        }
    }
}

impl ProviderResponseDto {
    pub fn from_parts(provider: Provider, models: Vec<ProviderModel>) -> Self {
        Self {
            id: provider.id,
            name: provider.name,
            has_api_key: provider.api_key.is_some(),
            base_url: provider.base_url,
            is_active: provider.is_active,
            created_at: provider.created_at,
            models: models
                .into_iter()
                .map(ProviderModelResponseDto::from)
                .collect(),
        }
    }
}
