//! Google Generative AI (Gemini) `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::{GenerationClient, get_api_key};
use crate::{
    error::{Error, Result},
    types::{Completion, GenerationOptions, HistoryTurn},
};

/// Base URL including the API version segment
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Model used when none is configured
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Environment variables consulted for the API key, in order
pub const API_KEY_ENV_VARS: &[&str] = &["GOOGLE_API_KEY", "GEMINI_API_KEY"];

/// Gemini REST client
#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new client with an API key
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = get_api_key(None, API_KEY_ENV_VARS)?;
        Ok(Self::new(api_key))
    }

    /// Use a different model
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Use a different base URL (must include the API version segment)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Rebuild the HTTP client with a request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidConfig("request timeout must be non-zero".into()));
        }
        self.client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(self)
    }

    /// Model this client targets
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// List models that support `generateContent`
    pub async fn list_models(&self) -> Result<Vec<GeminiModelInfo>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("key", &self.api_key)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::api(status.as_u16(), status_text(status)));
        }

        let list: GeminiModelList = response.json().await?;

        Ok(list
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .collect())
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(
        &self,
        history: &[HistoryTurn],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let request = build_request(history, options);
        tracing::debug!(
            model = %self.model,
            turns = history.len(),
            max_output_tokens = ?options.max_output_tokens,
            "sending generateContent request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            tracing::trace!(body = %serde_json::to_string(&request)?, "request body");
        }

        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        tracing::trace!(status = status.as_u16(), %body, "response body");

        decode_response(status, &body)
    }
}

/// Build the request body from a history snapshot
fn build_request(history: &[HistoryTurn], options: &GenerationOptions) -> GeminiRequest {
    let contents = history
        .iter()
        .map(|turn| GeminiContent {
            role: Some(turn.role.as_str().to_string()),
            parts: vec![GeminiPart {
                text: turn.text.clone(),
            }],
        })
        .collect();

    let generation_config = (!options.is_empty()).then(|| GeminiGenerationConfig {
        max_output_tokens: options.max_output_tokens,
        temperature: options.temperature,
        top_p: options.top_p,
        top_k: options.top_k,
    });

    GeminiRequest {
        contents,
        generation_config,
    }
}

/// Map a status and raw body to a completion or one of the failure kinds
fn decode_response(status: StatusCode, body: &str) -> Result<Completion> {
    if !status.is_success() {
        if let Ok(detail) = serde_json::from_str::<GeminiErrorResponse>(body) {
            tracing::debug!(
                status = status.as_u16(),
                detail = %detail.error.message,
                "endpoint rejected request"
            );
        }
        return Err(Error::api(status.as_u16(), status_text(status)));
    }

    let body = body.trim();
    if body.is_empty() || body == "null" {
        return Err(Error::EmptyResponse);
    }

    Ok(serde_json::from_str(body)?)
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

// Request types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_k: Option<u32>,
}

// Error body

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}

// Model listing types

/// Model info returned from the models endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeminiModelInfo {
    /// Model name (e.g., "models/gemini-2.0-flash")
    pub name: String,
    /// Display name
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supported_generation_methods: Vec<String>,
    #[serde(default)]
    pub input_token_limit: Option<u32>,
    #[serde(default)]
    pub output_token_limit: Option<u32>,
}

impl GeminiModelInfo {
    /// Get the model ID (without "models/" prefix)
    pub fn id(&self) -> &str {
        self.name.strip_prefix("models/").unwrap_or(&self.name)
    }
}

#[derive(Debug, Deserialize)]
struct GeminiModelList {
    #[serde(default)]
    models: Vec<GeminiModelInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_shape() {
        let history = vec![HistoryTurn::user("Hi"), HistoryTurn::model("Hello!")];
        let request = build_request(&history, &GenerationOptions::with_max_output_tokens(50));
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "contents": [
                    { "role": "user", "parts": [{ "text": "Hi" }] },
                    { "role": "model", "parts": [{ "text": "Hello!" }] }
                ],
                "generationConfig": { "maxOutputTokens": 50 }
            })
        );
    }

    #[test]
    fn test_build_request_omits_empty_generation_config() {
        let request = build_request(&[HistoryTurn::user("Hi")], &GenerationOptions::default());
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("generationConfig").is_none());
    }

    #[test]
    fn test_build_request_all_options() {
        let options = GenerationOptions {
            max_output_tokens: Some(10),
            temperature: Some(0.5),
            top_p: Some(0.25),
            top_k: Some(40),
        };
        let json = serde_json::to_value(build_request(&[], &options)).unwrap();
        let config = &json["generationConfig"];
        assert_eq!(config["maxOutputTokens"], 10);
        assert_eq!(config["temperature"], 0.5);
        assert_eq!(config["topP"], 0.25);
        assert_eq!(config["topK"], 40);
    }

    #[test]
    fn test_decode_success() {
        let body = r#"{
            "candidates": [{
                "finishReason": "STOP",
                "content": { "role": "model", "parts": [{ "text": "Halo!" }] }
            }],
            "modelVersion": "gemini-2.0-flash"
        }"#;
        let completion = decode_response(StatusCode::OK, body).unwrap();
        assert_eq!(completion.first_text(), Some("Halo!"));
    }

    #[test]
    fn test_decode_non_success_uses_status_text() {
        let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
        let err = decode_response(StatusCode::BAD_REQUEST, body).unwrap_err();
        match err {
            Error::Api { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Bad Request");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_non_success_without_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = decode_response(status, "").unwrap_err();
        assert_eq!(err.to_string(), "API error (599): 599");
    }

    #[test]
    fn test_decode_empty_body() {
        assert!(matches!(
            decode_response(StatusCode::OK, "").unwrap_err(),
            Error::EmptyResponse
        ));
        assert!(matches!(
            decode_response(StatusCode::OK, "  null \n").unwrap_err(),
            Error::EmptyResponse
        ));
    }

    #[test]
    fn test_decode_malformed_body() {
        let err = decode_response(StatusCode::OK, "{not json").unwrap_err();
        assert!(matches!(err, Error::Json(_)));
    }

    #[test]
    fn test_generate_url() {
        let client = GeminiClient::new("k")
            .with_base_url("http://localhost:8080/v1beta/")
            .with_model("gemini-test");
        assert_eq!(
            client.generate_url(),
            "http://localhost:8080/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_debug_hides_api_key() {
        let client = GeminiClient::new("super-secret");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains(DEFAULT_MODEL));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = GeminiClient::new("k").with_timeout(Duration::ZERO).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }

    #[test]
    fn test_model_info_id() {
        let info: GeminiModelInfo = serde_json::from_value(serde_json::json!({
            "name": "models/gemini-2.0-flash",
            "displayName": "Gemini 2.0 Flash",
            "supportedGenerationMethods": ["generateContent", "countTokens"]
        }))
        .unwrap();
        assert_eq!(info.id(), "gemini-2.0-flash");
    }

    #[tokio::test]
    async fn test_transport_failure_is_http_error() {
        // Nothing listens on port 9 locally, so the connection is refused.
        let client = GeminiClient::new("k")
            .with_base_url("http://127.0.0.1:9/v1beta")
            .with_timeout(Duration::from_secs(2))
            .unwrap();
        let err = client
            .generate(&[HistoryTurn::user("Hi")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_transport(), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_transport_failure_does_not_expose_api_key() {
        let key = "SECRET-KEY-123";
        let client = GeminiClient::new(key)
            .with_base_url("http://127.0.0.1:9/v1beta")
            .with_timeout(Duration::from_secs(2))
            .unwrap();

        let err = client
            .generate(&[HistoryTurn::user("Hi")], &GenerationOptions::default())
            .await
            .unwrap_err();
        assert!(!err.to_string().contains(key), "key in {:?}", err.to_string());
        assert!(!format!("{:?}", err).contains(key));

        let err = client.list_models().await.unwrap_err();
        assert!(!err.to_string().contains(key));
    }
}
