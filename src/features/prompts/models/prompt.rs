use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Prompt {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    /// Comma-separated tags, opaque to the store
    pub tags: Option<String>,
    pub active_version_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PromptVersion {
    pub id: i64,
    pub prompt_id: i64,
    pub version_number: i64,
    pub template: String,
    /// Serialized variable descriptor, opaque to the store
    pub input_variables: Option<String>,
    /// Serialized model parameters (temperature, top_k, ...), opaque to the store
    pub model_config_json: Option<String>,
    pub commit_message: Option<String>,
    pub created_at: DateTime<Utc>,
}
