use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::features::prompts::models::{Prompt, PromptVersion};
use crate::shared::constants::{DEFAULT_PAGE_SIZE, DEFAULT_SKIP};

// Sort direction
#[derive(Debug, Clone, Copy, Default, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Desc,
    Asc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

fn default_skip() -> i64 {
    DEFAULT_SKIP
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

fn default_sort_by() -> String {
    "created_at".to_string()
}

// Query params for listing prompts
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PromptQueryParams {
    /// Substring matched case-insensitively against name or description
    pub search: Option<String>,

    /// Field to sort by; unknown names fall back to created_at
    #[serde(default = "default_sort_by")]
    pub sort_by: String,

    /// Sort direction (default: desc)
    #[serde(default)]
    pub order: SortDirection,

    /// Rows to skip. Not validated for negativity; callers own the boundary.
    #[serde(default = "default_skip")]
    pub skip: i64,

    /// Page size. Not validated for negativity; callers own the boundary.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

// Create request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromptDto {
    #[validate(length(min = 1, max = 200))]
    pub name: String,

    pub description: Option<String>,

    /// Comma-separated tags
    pub tags: Option<String>,
}

// Partial update: absent fields keep their prior values
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePromptDto {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,

    pub description: Option<String>,

    pub tags: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreatePromptVersionDto {
    pub version_number: i64,

    #[validate(length(min = 1))]
    pub template: String,

    pub input_variables: Option<String>,

    pub model_config_json: Option<String>,

    pub commit_message: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdatePromptVersionDto {
    #[validate(length(min = 1))]
    pub template: Option<String>,

    pub input_variables: Option<String>,

    pub model_config_json: Option<String>,

    pub commit_message: Option<String>,
}

// Response DTOs
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptResponseDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub active_version_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptVersionResponseDto {
    pub id: i64,
    pub prompt_id: i64,
    pub version_number: i64,
    pub template: String,
    pub input_variables: Option<String>,
    pub model_config_json: Option<String>,
    pub commit_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Prompt together with its versions, returned by the single-prompt reads
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptDetailDto {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub tags: Option<String>,
    pub active_version_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub versions: Vec<PromptVersionResponseDto>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PromptPageDto {
    pub items: Vec<PromptResponseDto>,
    pub total: i64,
    pub page: i64,
    pub size: i64,
}

impl From<Prompt> for PromptResponseDto {
    fn from(p: Prompt) -> Self {
        Self {
            id: p.id,
            name: p.name,
            description: p.description,
            tags: p.tags,
            active_version_id: p.active_version_id,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

impl From<PromptVersion> for PromptVersionResponseDto {
    fn from(v: PromptVersion) -> Self {
        Self {
            id: v.id,
            prompt_id: v.prompt_id,
            version_number: v.version_number,
            template: v.template,
            input_variables: v.input_variables,
            model_config_json: v.model_config_json,
            commit_message: v.commit_message,
            created_at: v.created_at,
        }
    }
}

impl PromptDetailDto {
    pub fn from_parts(prompt: Prompt, versions: Vec<PromptVersion>) -> Self {
        Self {
            id: prompt.id,
            name: prompt.name,
            description: prompt.description,
            tags: prompt.tags,
            active_version_id: prompt.active_version_id,
            created_at: prompt.created_at,
            updated_at: prompt.updated_at,
            versions: versions
                .into_iter()
                .map(PromptVersionResponseDto::from)
                .collect(),
        }
    }
}
