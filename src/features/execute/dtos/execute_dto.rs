use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ExecuteRequestDto {
    /// Registry provider whose credential/endpoint should be used for this
    /// call; a missing id falls back to the process-wide defaults
    pub provider_id: Option<i64>,

    /// Provider family selector, e.g. "openai", "gemini", "ollama"
    #[validate(length(min = 1))]
    pub model_provider: String,

    #[validate(length(min = 1))]
    pub model_name: String,

    pub prompt_text: String,

    /// Free-form per-call model parameters
    #[schema(value_type = Object)]
    pub config: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ExecuteResponseDto {
    pub response: String,
}
