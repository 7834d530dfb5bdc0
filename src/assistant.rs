//! Assistant gateway.
//!
//! Three async operations backed by a generative-text model: task
//! suggestion, text refinement, and board summarization. The defining
//! contract is that none of them can fail from the caller's point of
//! view — every backend error is caught here, logged, and converted into
//! the operation's fallback value. Single attempt, no retry, no
//! streaming.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::types::BoardState;

/// Returned by `summarize_board` when the backend is unreachable or the
/// response is unusable.
pub const SUMMARY_FALLBACK: &str =
    "Could not generate summary at this time. Please check your network.";

/// A single generation request. When `response_schema` is set the backend
/// is asked for structured JSON output conforming to it.
#[derive(Debug, Clone)]
pub struct LlmRequest {
    pub prompt: String,
    pub response_schema: Option<serde_json::Value>,
}

impl LlmRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            response_schema: None,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, request: LlmRequest) -> Result<String, LlmError>;
}

#[async_trait]
impl LlmClient for Arc<dyn LlmClient> {
    async fn generate(&self, request: LlmRequest) -> Result<String, LlmError> {
        (**self).generate(request).await
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("http error: {0}")]
    Http(String),
    #[error("response error: {0}")]
    Response(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Gemini client configuration.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-3-flash-preview".to_string(),
            endpoint: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            temperature: 0.7,
            timeout_secs: 30,
        }
    }
}

/// Gemini generateContent client.
pub struct GeminiClient {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Http(e.to_string()))?;
        Ok(Self { client, config })
    }

    fn build_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.config.endpoint, self.config.model, self.config.api_key
        )
    }
}

// Gemini API request/response structures

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct GeminiGenerationConfig {
    temperature: f32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<String>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContentResponse,
}

#[derive(Debug, Deserialize)]
struct GeminiContentResponse {
    parts: Vec<GeminiPartResponse>,
}

#[derive(Debug, Deserialize)]
struct GeminiPartResponse {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[allow(dead_code)]
    code: Option<i32>,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn generate(&self, request: LlmRequest) -> Result<String, LlmError> {
        let url = self.build_url();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response_mime_type = request
            .response_schema
            .is_some()
            .then(|| "application/json".to_string());
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: request.prompt,
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: self.config.temperature,
                response_mime_type,
                response_schema: request.response_schema,
            },
        };

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Response(format!("HTTP {}: {}", status, text)));
        }

        let text = response
            .text()
            .await
            .map_err(|e| LlmError::Http(e.to_string()))?;

        let parsed: GeminiResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Serialization(e.to_string()))?;

        if let Some(error) = parsed.error {
            return Err(LlmError::Response(format!(
                "Gemini API error: {}",
                error.message
            )));
        }

        parsed
            .candidates
            .and_then(|c| c.into_iter().next())
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::Response("No content in response".to_string()))
    }
}

/// A task drafted by the assistant.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TaskSuggestion {
    pub title: String,
    pub description: String,
}

/// The degrade-on-failure boundary in front of an [`LlmClient`].
pub struct AssistantGateway<C: LlmClient> {
    client: C,
}

impl<C: LlmClient> AssistantGateway<C> {
    pub fn new(client: C) -> Self {
        Self { client }
    }

    /// Draft a short list of plausible tasks for a column. Any backend
    /// failure, including unparseable output, yields an empty list.
    pub async fn suggest_tasks(&self, column_title: &str) -> Vec<TaskSuggestion> {
        let prompt = format!(
            "Suggest 3 unique, realistic project tasks for a Kanban column named \"{}\". \
             Each task needs a title and a brief description.",
            column_title
        );
        let request = LlmRequest {
            prompt,
            response_schema: Some(json!({
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING", "description": "Short title of the task" },
                        "description": { "type": "STRING", "description": "One sentence description" }
                    },
                    "required": ["title", "description"]
                }
            })),
        };

        let output = match self.client.generate(request).await {
            Ok(output) => output,
            Err(e) => {
                log::warn!("[sparkboard.assistant] Task suggestion failed: {}", e);
                return Vec::new();
            }
        };
        match parse_suggestions(&output) {
            Some(suggestions) => suggestions,
            None => {
                log::warn!("[sparkboard.assistant] Task suggestion output was not a suggestion list");
                Vec::new()
            }
        }
    }

    /// Professionalize a piece of card text. On failure the input comes
    /// back unchanged.
    pub async fn refine_text(&self, text: &str) -> String {
        let prompt = format!(
            "Improve and professionalize this task description, making it actionable and clear: \"{}\"",
            text
        );
        match self.client.generate(LlmRequest::text(prompt)).await {
            Ok(refined) => refined,
            Err(e) => {
                log::warn!("[sparkboard.assistant] Refinement failed: {}", e);
                text.to_string()
            }
        }
    }

    /// Narrative summary of the whole board, bounded to roughly 120
    /// words. On failure a fixed human-readable message is returned.
    pub async fn summarize_board(&self, state: &BoardState) -> String {
        let board_json = match serde_json::to_string(state) {
            Ok(json) => json,
            Err(e) => {
                log::warn!("[sparkboard.assistant] Failed to serialize board for summary: {}", e);
                return SUMMARY_FALLBACK.to_string();
            }
        };
        let prompt = format!(
            "Act as a senior project manager. Analyze the status of this board: {}. \
             Provide a clear executive summary (under 120 words) identifying progress, \
             key wins, and potential bottlenecks.",
            board_json
        );
        match self.client.generate(LlmRequest::text(prompt)).await {
            Ok(summary) => summary,
            Err(e) => {
                log::warn!("[sparkboard.assistant] Summary failed: {}", e);
                SUMMARY_FALLBACK.to_string()
            }
        }
    }
}

/// Parse suggestion output, tolerating prose around the JSON array.
fn parse_suggestions(output: &str) -> Option<Vec<TaskSuggestion>> {
    if let Ok(suggestions) = serde_json::from_str(output) {
        return Some(suggestions);
    }
    let start = output.find('[')?;
    let end = output.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str(&output[start..=end]).ok()
}

/// Canned-response client for tests and offline demos.
pub struct MockLlmClient {
    pub response: String,
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
        Ok(self.response.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        async fn generate(&self, _request: LlmRequest) -> Result<String, LlmError> {
            Err(LlmError::Http("connection refused".to_string()))
        }
    }

    #[test]
    fn default_config() {
        let config = GeminiConfig::default();
        assert_eq!(config.model, "gemini-3-flash-preview");
        assert!(config.endpoint.contains("generativelanguage.googleapis.com"));
    }

    #[test]
    fn build_url_includes_model_and_key() {
        let client = GeminiClient::new(GeminiConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        })
        .unwrap();
        let url = client.build_url();
        assert!(url.contains("gemini-3-flash-preview:generateContent"));
        assert!(url.contains("key=test-key"));
    }

    #[tokio::test]
    async fn suggest_tasks_parses_structured_output() {
        let gateway = AssistantGateway::new(MockLlmClient {
            response: r#"[{"title":"Write docs","description":"Cover the public API."},
                          {"title":"Fix flaky test","description":"Stabilize CI."}]"#
                .to_string(),
        });
        let suggestions = gateway.suggest_tasks("To Do").await;
        assert_eq!(suggestions.len(), 2);
        assert_eq!(suggestions[0].title, "Write docs");
    }

    #[tokio::test]
    async fn suggest_tasks_tolerates_surrounding_prose() {
        let gateway = AssistantGateway::new(MockLlmClient {
            response: "Here you go:\n[{\"title\":\"A\",\"description\":\"B\"}]\nEnjoy!".to_string(),
        });
        let suggestions = gateway.suggest_tasks("Doing").await;
        assert_eq!(suggestions.len(), 1);
    }

    #[tokio::test]
    async fn suggest_tasks_failure_yields_empty_list() {
        let gateway = AssistantGateway::new(FailingClient);
        assert!(gateway.suggest_tasks("X").await.is_empty());
    }

    #[tokio::test]
    async fn suggest_tasks_garbage_output_yields_empty_list() {
        let gateway = AssistantGateway::new(MockLlmClient {
            response: "I cannot help with that.".to_string(),
        });
        assert!(gateway.suggest_tasks("X").await.is_empty());
    }

    #[tokio::test]
    async fn refine_text_failure_returns_input_unchanged() {
        let gateway = AssistantGateway::new(FailingClient);
        assert_eq!(gateway.refine_text("hello").await, "hello");
    }

    #[tokio::test]
    async fn refine_text_returns_backend_output() {
        let gateway = AssistantGateway::new(MockLlmClient {
            response: "Polished.".to_string(),
        });
        assert_eq!(gateway.refine_text("rough").await, "Polished.");
    }

    #[tokio::test]
    async fn summarize_board_failure_returns_fixed_message() {
        let gateway = AssistantGateway::new(FailingClient);
        let summary = gateway.summarize_board(&BoardState::starter()).await;
        assert_eq!(summary, SUMMARY_FALLBACK);
    }

    #[tokio::test]
    async fn summarize_board_returns_backend_output() {
        let gateway = AssistantGateway::new(MockLlmClient {
            response: "Two cards remain in To Do.".to_string(),
        });
        let summary = gateway.summarize_board(&BoardState::starter()).await;
        assert_eq!(summary, "Two cards remain in To Do.");
    }
}
