use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::core::config::LlmConfig;
use crate::core::error::{AppError, Result};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEMPERATURE: f64 = 0.7;

/// One fixed timeout bounds every upstream call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// The closed set of backend families an Execute call can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    OpenAi,
    Gemini,
    Ollama,
}

impl ProviderFamily {
    /// Case-insensitive substring classification, e.g. "OpenAI (prod)"
    /// still routes to the OpenAI adapter.
    pub fn classify(raw: &str) -> Option<Self> {
        let family = raw.to_lowercase();
        if family.contains("openai") {
            Some(ProviderFamily::OpenAi)
        } else if family.contains("gemini") {
            Some(ProviderFamily::Gemini)
        } else if family.contains("ollama") {
            Some(ProviderFamily::Ollama)
        } else {
            None
        }
    }
}

/// Per-call credential/endpoint pair resolved from the provider registry;
/// overrides the process-wide defaults.
#[derive(Debug, Clone, Default)]
pub struct ResolvedProfile {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<GeminiContent<'a>>,
}

#[derive(Serialize)]
struct GeminiContent<'a> {
    parts: Vec<GeminiPart<'a>>,
}

#[derive(Serialize)]
struct GeminiPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiCandidateContent,
}

#[derive(Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Deserialize)]
struct GeminiCandidatePart {
    text: Option<String>,
}

fn is_embedding_model(model: &str) -> bool {
    let model = model.to_lowercase();
    model.contains("embed") || model.contains("nomic")
}

/// Routes one prompt execution to the right backend adapter and normalizes
/// the result. Defaults are fixed at construction; each call builds its own
/// transient HTTP client and there are no retries.
pub struct LlmDispatcher {
    defaults: LlmConfig,
}

impl LlmDispatcher {
    pub fn new(defaults: LlmConfig) -> Self {
        Self { defaults }
    }

    pub async fn execute(
        &self,
        provider_family: &str,
        model_name: &str,
        prompt_text: &str,
        config: &Map<String, Value>,
        profile: Option<&ResolvedProfile>,
    ) -> Result<String> {
        match ProviderFamily::classify(provider_family) {
            Some(ProviderFamily::OpenAi) => {
                self.run_openai(model_name, prompt_text, config, profile).await
            }
            Some(ProviderFamily::Gemini) => self.run_gemini(model_name, prompt_text, profile).await,
            Some(ProviderFamily::Ollama) => {
                self.run_ollama(model_name, prompt_text, config, profile).await
            }
            None => Err(AppError::UnsupportedProvider(format!(
                "Unknown provider: {}",
                provider_family
            ))),
        }
    }

    /// Single-turn chat completion with the prompt as the sole user message.
    async fn run_openai(
        &self,
        model: &str,
        prompt: &str,
        config: &Map<String, Value>,
        profile: Option<&ResolvedProfile>,
    ) -> Result<String> {
        let api_key = profile
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.defaults.openai_api_key.clone())
            .ok_or_else(|| AppError::Validation("OpenAI API key not set".to_string()))?;

        let base_url = profile
            .and_then(|p| p.base_url.as_deref())
            .unwrap_or(OPENAI_DEFAULT_BASE_URL);
        let url = format!("{}/chat/completions", base_url.trim_end_matches('/'));

        let request = ChatCompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: config
                .get("temperature")
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_TEMPERATURE),
        };

        let client = transient_client()?;
        let response = client
            .post(&url)
            .bearer_auth(&api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("OpenAI", base_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamBadRequest(format!(
                "OpenAI API error ({}): {}",
                status, body
            )));
        }

        let parsed: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::UpstreamBadRequest(format!("Failed to parse OpenAI response: {}", e))
        })?;

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default())
    }

    /// Single-turn generation; the credential is installed client-wide and
    /// no per-call parameters are applied.
    async fn run_gemini(
        &self,
        model: &str,
        prompt: &str,
        profile: Option<&ResolvedProfile>,
    ) -> Result<String> {
        let api_key = profile
            .and_then(|p| p.api_key.clone())
            .or_else(|| self.defaults.gemini_api_key.clone())
            .ok_or_else(|| AppError::Validation("Gemini API key not set".to_string()))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&api_key).map_err(|_| {
                AppError::Validation("Gemini API key contains invalid characters".to_string())
            })?,
        );
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = profile
            .and_then(|p| p.base_url.as_deref())
            .unwrap_or(GEMINI_BASE_URL);
        let url = format!(
            "{}/models/{}:generateContent",
            base_url.trim_end_matches('/'),
            model
        );

        let request = GenerateContentRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart { text: prompt }],
            }],
        };

        let response = client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error("Gemini", base_url, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamBadRequest(format!(
                "Gemini API error ({}): {}",
                status, body
            )));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            AppError::UpstreamBadRequest(format!("Failed to parse Gemini response: {}", e))
        })?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default())
    }

    /// Generation against a self-hosted Ollama server; everything in the
    /// per-call config is merged verbatim into the payload.
    async fn run_ollama(
        &self,
        model: &str,
        prompt: &str,
        config: &Map<String, Value>,
        profile: Option<&ResolvedProfile>,
    ) -> Result<String> {
        let base_url = profile
            .and_then(|p| p.base_url.clone())
            .unwrap_or_else(|| self.defaults.ollama_base_url.clone());
        let url = format!("{}/api/generate", base_url.trim_end_matches('/'));

        let mut payload = Map::new();
        payload.insert("model".to_string(), json!(model));
        payload.insert("prompt".to_string(), json!(prompt));
        payload.insert("stream".to_string(), json!(false));
        for (key, value) in config {
            payload.insert(key.clone(), value.clone());
        }

        let client = transient_client()?;
        let response = client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| transport_error("Ollama", &base_url, e))?;

        if response.status() == StatusCode::BAD_REQUEST {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default();

            if is_embedding_model(model) {
                return Err(AppError::WrongModelKind(format!(
                    "Model '{}' appears to be an embedding model. \
                     Use a chat/generation model like 'llama3' for prompts.",
                    model
                )));
            }
            return Err(AppError::UpstreamBadRequest(format!(
                "Ollama 400 Bad Request: {}",
                detail
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::UpstreamBadRequest(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AppError::UpstreamBadRequest(format!("Failed to parse Ollama response: {}", e))
        })?;

        Ok(body
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}

fn transient_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

fn transport_error(upstream: &str, endpoint: &str, err: reqwest::Error) -> AppError {
    if err.is_connect() {
        AppError::UpstreamUnreachable(format!("Could not connect to {} at {}", upstream, endpoint))
    } else if err.is_timeout() {
        AppError::UpstreamUnreachable(format!(
            "Timed out waiting for {} at {}",
            upstream, endpoint
        ))
    } else {
        AppError::UpstreamBadRequest(format!("{} request failed: {}", upstream, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::routing::post;
    use axum::{Json, Router};

    fn dispatcher(defaults: LlmConfig) -> LlmDispatcher {
        LlmDispatcher::new(defaults)
    }

    fn no_defaults() -> LlmConfig {
        LlmConfig {
            openai_api_key: None,
            gemini_api_key: None,
            ollama_base_url: "http://localhost:11434".to_string(),
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn classification_is_case_insensitive_substring() {
        assert_eq!(
            ProviderFamily::classify("OpenAI (prod)"),
            Some(ProviderFamily::OpenAi)
        );
        assert_eq!(
            ProviderFamily::classify("google-gemini"),
            Some(ProviderFamily::Gemini)
        );
        assert_eq!(
            ProviderFamily::classify("OLLAMA"),
            Some(ProviderFamily::Ollama)
        );
        assert_eq!(ProviderFamily::classify("anthropic"), None);
    }

    #[test]
    fn embedding_models_are_detected_by_name() {
        assert!(is_embedding_model("nomic-embed-text"));
        assert!(is_embedding_model("mxbai-EMBED-large"));
        assert!(is_embedding_model("Nomic"));
        assert!(!is_embedding_model("llama3"));
    }

    #[tokio::test]
    async fn unknown_family_is_unsupported() {
        let err = dispatcher(no_defaults())
            .execute("anthropic", "claude", "hi", &Map::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedProvider(_)));
    }

    #[tokio::test]
    async fn openai_without_credential_fails_before_any_network_call() {
        let err = dispatcher(no_defaults())
            .execute("openai", "gpt-4o", "hi", &Map::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn gemini_without_credential_fails_before_any_network_call() {
        let err = dispatcher(no_defaults())
            .execute("gemini", "gemini-pro", "hi", &Map::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn unreachable_ollama_endpoint_is_reported_with_its_address() {
        let defaults = LlmConfig {
            ollama_base_url: "http://127.0.0.1:9".to_string(),
            ..no_defaults()
        };
        let err = dispatcher(defaults)
            .execute("ollama", "llama3", "hi", &Map::new(), None)
            .await
            .unwrap_err();
        match err {
            AppError::UpstreamUnreachable(msg) => assert!(msg.contains("127.0.0.1:9")),
            other => panic!("expected UpstreamUnreachable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn ollama_400_for_embedding_model_is_wrong_model_kind() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "model does not support generate"})),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let profile = ResolvedProfile {
            api_key: None,
            base_url: Some(base),
        };
        let err = dispatcher(no_defaults())
            .execute(
                "ollama",
                "nomic-embed-text",
                "hi",
                &Map::new(),
                Some(&profile),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::WrongModelKind(_)));
    }

    #[tokio::test]
    async fn ollama_400_for_generation_model_keeps_upstream_detail() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "invalid option: top_x"})),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let profile = ResolvedProfile {
            api_key: None,
            base_url: Some(base),
        };
        let err = dispatcher(no_defaults())
            .execute("ollama", "llama3", "hi", &Map::new(), Some(&profile))
            .await
            .unwrap_err();
        match err {
            AppError::UpstreamBadRequest(msg) => assert!(msg.contains("invalid option: top_x")),
            other => panic!("expected UpstreamBadRequest, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn ollama_success_returns_response_field() {
        let router = Router::new().route(
            "/api/generate",
            post(|Json(payload): Json<Value>| async move {
                assert_eq!(payload["model"], "llama3");
                assert_eq!(payload["stream"], false);
                // per-call config is merged verbatim into the payload
                assert_eq!(payload["temperature"], 0.2);
                Json(serde_json::json!({"model": "llama3", "response": "pong", "done": true}))
            }),
        );
        let base = spawn_stub(router).await;

        let profile = ResolvedProfile {
            api_key: None,
            base_url: Some(base),
        };
        let mut config = Map::new();
        config.insert("temperature".to_string(), json!(0.2));

        let text = dispatcher(no_defaults())
            .execute("ollama", "llama3", "ping", &config, Some(&profile))
            .await
            .unwrap();
        assert_eq!(text, "pong");
    }

    #[tokio::test]
    async fn ollama_success_without_response_field_yields_empty_string() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { Json(serde_json::json!({"done": true})) }),
        );
        let base = spawn_stub(router).await;

        let profile = ResolvedProfile {
            api_key: None,
            base_url: Some(base),
        };
        let text = dispatcher(no_defaults())
            .execute("ollama", "llama3", "ping", &Map::new(), Some(&profile))
            .await
            .unwrap();
        assert_eq!(text, "");
    }

    #[tokio::test]
    async fn openai_profile_overrides_endpoint_and_applies_temperature_default() {
        let router = Router::new().route(
            "/chat/completions",
            post(|Json(payload): Json<Value>| async move {
                assert_eq!(payload["model"], "gpt-4o");
                assert_eq!(payload["temperature"], 0.7);
                assert_eq!(payload["messages"][0]["role"], "user");
                Json(serde_json::json!({
                    "choices": [{"message": {"role": "assistant", "content": "hello back"}}]
                }))
            }),
        );
        let base = spawn_stub(router).await;

        let profile = ResolvedProfile {
            api_key: Some("sk-test".to_string()),
            base_url: Some(base),
        };
        let text = dispatcher(no_defaults())
            .execute("openai", "gpt-4o", "hello", &Map::new(), Some(&profile))
            .await
            .unwrap();
        assert_eq!(text, "hello back");
    }

    #[tokio::test]
    async fn openai_upstream_error_is_bad_request_kind() {
        let router = Router::new().route(
            "/chat/completions",
            post(|| async {
                (
                    axum::http::StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": {"message": "bad key"}})),
                )
            }),
        );
        let base = spawn_stub(router).await;

        let profile = ResolvedProfile {
            api_key: Some("sk-bad".to_string()),
            base_url: Some(base),
        };
        let err = dispatcher(no_defaults())
            .execute("openai", "gpt-4o", "hello", &Map::new(), Some(&profile))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UpstreamBadRequest(_)));
    }
}
