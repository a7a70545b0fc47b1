//! Client for the hosted LLM (Anthropic Messages API) used by every flow.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::config::LlmConfig;

const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Upper bound on model turns in one tool-use conversation.
pub const MAX_TOOL_ROUNDS: usize = 6;

#[derive(Debug, Clone, Error)]
pub enum LlmApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("rate limited")]
    RateLimited,
    #[error("invalid api key")]
    InvalidApiKey,
    #[error("json error: {0}")]
    Serde(String),
    #[error("LLM service is not configured: ANTHROPIC_API_KEY is not set")]
    MissingApiKey,
    #[error("model kept calling tools after {0} rounds")]
    ToolLoopExhausted(usize),
}

impl LlmApiError {
    /// Returns true if the error is transient and should be retried.
    pub fn should_retry(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout | Self::RateLimited => true,
            Self::Http { status, .. } => (500..=599).contains(status),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    Base64 { media_type: String, data: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    Image {
        source: MediaSource,
    },
    Document {
        source: MediaSource,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
    /// Block types this client does not act on (e.g. thinking).
    #[serde(other)]
    Unsupported,
}

impl ContentBlock {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn image(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Image {
            source: MediaSource::Base64 {
                media_type: media_type.into(),
                data: data.into(),
            },
        }
    }

    pub fn pdf(data: impl Into<String>) -> Self {
        Self::Document {
            source: MediaSource::Base64 {
                media_type: "application/pdf".to_string(),
                data: data.into(),
            },
        }
    }
}

/// A message in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: Vec<ContentBlock>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::user_blocks(vec![ContentBlock::text(content)])
    }

    pub fn user_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::User,
            content,
        }
    }

    pub fn assistant_blocks(content: Vec<ContentBlock>) -> Self {
        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// Tool advertised to the model.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Server-side implementation of a tool the model may call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    fn definition(&self) -> ToolDefinition;

    /// `Err` is reported back to the model as an error result, not raised.
    async fn call(&self, input: Value) -> Result<Value, String>;
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
}

/// Response from the Messages API
#[derive(Debug, Clone, Deserialize)]
pub struct LlmResponse {
    pub id: String,
    pub content: Vec<ContentBlock>,
    pub model: String,
    pub stop_reason: Option<String>,
    pub usage: Usage,
}

impl LlmResponse {
    /// All text blocks joined together.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();
        (!parts.is_empty()).then(|| parts.join("\n"))
    }

    pub fn tool_uses(&self) -> Vec<(&str, &str, &Value)> {
        self.content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => {
                    Some((id.as_str(), name.as_str(), input))
                }
                _ => None,
            })
            .collect()
    }

    pub fn wants_tools(&self) -> bool {
        self.stop_reason.as_deref() == Some("tool_use") && !self.tool_uses().is_empty()
    }
}

/// Token usage information
#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct LlmApiClient {
    http: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl LlmApiClient {
    const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

    /// A missing key is not an error here; each call fails with [`LlmApiError::MissingApiKey`] instead.
    pub fn new(config: &LlmConfig) -> Result<Self, LlmApiError> {
        let http = Client::builder()
            .timeout(Self::REQUEST_TIMEOUT)
            .user_agent(concat!("krishi-mitra/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| LlmApiError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{}{}", config.base_url.trim_end_matches('/'), MESSAGES_PATH),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Send a completion request
    pub async fn complete(
        &self,
        messages: &[Message],
        system: Option<&str>,
        tools: &[ToolDefinition],
        max_tokens: u32,
    ) -> Result<LlmResponse, LlmApiError> {
        let api_key = self.api_key.as_deref().ok_or(LlmApiError::MissingApiKey)?;
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            messages,
            system,
            tools,
        };

        (|| async { self.send_request(api_key, &request).await })
            .retry(
                ExponentialBuilder::default()
                    .with_min_delay(Duration::from_secs(1))
                    .with_max_delay(Duration::from_secs(30))
                    .with_max_times(3)
                    .with_jitter(),
            )
            .when(|e: &LlmApiError| e.should_retry())
            .notify(|e, dur| {
                warn!(
                    "LLM call failed, retrying after {:.2}s: {}",
                    dur.as_secs_f64(),
                    e
                )
            })
            .await
    }

    async fn send_request(
        &self,
        api_key: &str,
        request: &MessagesRequest<'_>,
    ) -> Result<LlmResponse, LlmApiError> {
        let res = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        match res.status() {
            s if s.is_success() => res
                .json::<LlmResponse>()
                .await
                .map_err(|e| LlmApiError::Serde(e.to_string())),
            StatusCode::UNAUTHORIZED => Err(LlmApiError::InvalidApiKey),
            StatusCode::TOO_MANY_REQUESTS => Err(LlmApiError::RateLimited),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(LlmApiError::Http { status, body })
            }
        }
    }

    /// Run a conversation, executing tool calls until the model produces a final answer.
    pub async fn complete_with_tools(
        &self,
        mut messages: Vec<Message>,
        system: Option<&str>,
        tools: &[Arc<dyn ToolHandler>],
        max_tokens: u32,
    ) -> Result<LlmResponse, LlmApiError> {
        let definitions: Vec<ToolDefinition> = tools.iter().map(|t| t.definition()).collect();

        for round in 0..MAX_TOOL_ROUNDS {
            let response = self
                .complete(&messages, system, &definitions, max_tokens)
                .await?;
            if !response.wants_tools() {
                return Ok(response);
            }

            let mut results = Vec::new();
            for (id, name, input) in response.tool_uses() {
                debug!(round, tool = name, "Model requested tool");
                let outcome = match tools.iter().find(|t| t.definition().name == name) {
                    Some(tool) => tool.call(input.clone()).await,
                    None => Err(format!("unknown tool: {name}")),
                };
                results.push(match outcome {
                    Ok(value) => ContentBlock::ToolResult {
                        tool_use_id: id.to_string(),
                        content: value_to_tool_content(value),
                        is_error: false,
                    },
                    Err(message) => {
                        warn!(tool = name, error = %message, "Tool call failed");
                        ContentBlock::ToolResult {
                            tool_use_id: id.to_string(),
                            content: message,
                            is_error: true,
                        }
                    }
                });
            }

            messages.push(Message::assistant_blocks(response.content));
            messages.push(Message::user_blocks(results));
        }

        Err(LlmApiError::ToolLoopExhausted(MAX_TOOL_ROUNDS))
    }

    /// Run a conversation and parse the final answer as JSON.
    pub async fn ask_json<T: DeserializeOwned>(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: &[Arc<dyn ToolHandler>],
        max_tokens: u32,
    ) -> Result<T, LlmApiError> {
        let response = self
            .complete_with_tools(messages, system, tools, max_tokens)
            .await?
            .text()
            .ok_or_else(|| LlmApiError::Serde("No text content in response".to_string()))?;

        parse_json_answer(&response)
    }
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

fn value_to_tool_content(value: Value) -> String {
    match value {
        Value::String(s) => s,
        other => other.to_string(),
    }
}

fn map_reqwest_error(e: reqwest::Error) -> LlmApiError {
    if e.is_timeout() {
        LlmApiError::Timeout
    } else {
        LlmApiError::Transport(e.to_string())
    }
}

/// Parse a model answer that should contain a single JSON document.
pub fn parse_json_answer<T: DeserializeOwned>(response: &str) -> Result<T, LlmApiError> {
    if response.trim().is_empty() {
        tracing::error!("LLM returned an empty response");
        return Err(LlmApiError::Serde("Empty response from model".to_string()));
    }

    let json_str = extract_json(response);
    serde_json::from_str(json_str).map_err(|e| {
        tracing::error!(
            json_error = %e,
            response_length = response.len(),
            extracted_json_preview = %json_str.chars().take(500).collect::<String>(),
            "Failed to parse JSON answer"
        );
        LlmApiError::Serde(format!(
            "{} (response preview: {})",
            e,
            json_str.chars().take(200).collect::<String>()
        ))
    })
}

/// Extract JSON from a string that might contain markdown code blocks or surrounding prose
fn extract_json(text: &str) -> &str {
    let text = text.trim();

    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        // Skip past any language identifier on the same line
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);
        if let Some(end) = text[content_start..].find("```") {
            return text[content_start..content_start + end].trim();
        }
    }

    // Prose around a bare object: take the outermost braces.
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if start < end => &text[start..=end],
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use axum::{Json, Router, extract::State, routing::post};
    use serde_json::json;

    use super::*;

    #[test]
    fn test_extract_json_plain() {
        let input = r#"{"key": "value"}"#;
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_code_block() {
        let input = "Here's the JSON:\n```json\n{\"key\": \"value\"}\n```";
        assert_eq!(extract_json(input), r#"{"key": "value"}"#);
    }

    #[test]
    fn test_extract_json_surrounded_by_prose() {
        let input = "Sure! {\"answer\": \"Sow after the first rains.\"} Hope this helps.";
        assert_eq!(
            extract_json(input),
            r#"{"answer": "Sow after the first rains."}"#
        );
    }

    #[test]
    fn unknown_response_blocks_are_tolerated() {
        let response: LlmResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "model": "m",
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 1, "output_tokens": 2},
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "{\"ok\": true}"}
            ]
        }))
        .unwrap();
        assert_eq!(response.content[0], ContentBlock::Unsupported);
        assert_eq!(response.text().as_deref(), Some("{\"ok\": true}"));
        assert!(!response.wants_tools());
    }

    #[test]
    fn tool_result_serializes_without_false_error_flag() {
        let block = ContentBlock::ToolResult {
            tool_use_id: "t1".to_string(),
            content: "done".to_string(),
            is_error: false,
        };
        assert_eq!(
            serde_json::to_value(block).unwrap(),
            json!({"type": "tool_result", "tool_use_id": "t1", "content": "done"})
        );
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = LlmApiClient::new(&LlmConfig {
            api_key: None,
            model: "m".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();
        let err = client
            .complete(&[Message::user("hi")], None, &[], 16)
            .await
            .unwrap_err();
        assert!(matches!(err, LlmApiError::MissingApiKey));
        assert!(!err.should_retry());
    }

    struct Echo;

    #[async_trait]
    impl ToolHandler for Echo {
        fn definition(&self) -> ToolDefinition {
            ToolDefinition {
                name: "echo".to_string(),
                description: "Echo the input".to_string(),
                input_schema: json!({"type": "object"}),
            }
        }

        async fn call(&self, input: Value) -> Result<Value, String> {
            Ok(input)
        }
    }

    type Seen = Arc<Mutex<Vec<Value>>>;

    async fn scripted_model(State(seen): State<Seen>, Json(body): Json<Value>) -> Json<Value> {
        let turn = {
            let mut seen = seen.lock().unwrap();
            seen.push(body);
            seen.len()
        };
        if turn == 1 {
            Json(json!({
                "id": "msg_1", "model": "m", "stop_reason": "tool_use",
                "usage": {"input_tokens": 1, "output_tokens": 1},
                "content": [{"type": "tool_use", "id": "call_1", "name": "echo", "input": {"x": 1}}]
            }))
        } else {
            Json(json!({
                "id": "msg_2", "model": "m", "stop_reason": "end_turn",
                "usage": {"input_tokens": 1, "output_tokens": 1},
                "content": [{"type": "text", "text": "```json\n{\"status\": \"done\"}\n```"}]
            }))
        }
    }

    #[tokio::test]
    async fn tool_loop_feeds_results_back() {
        let seen: Seen = Arc::default();
        let app = Router::new()
            .route("/v1/messages", post(scripted_model))
            .with_state(seen.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = LlmApiClient::new(&LlmConfig {
            api_key: Some("test-key".to_string()),
            model: "m".to_string(),
            base_url: format!("http://{addr}"),
        })
        .unwrap();

        let tools: Vec<Arc<dyn ToolHandler>> = vec![Arc::new(Echo)];
        let answer: Value = client
            .ask_json(vec![Message::user("go")], Some("sys"), &tools, 64)
            .await
            .unwrap();
        assert_eq!(answer, json!({"status": "done"}));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0]["tools"][0]["name"], "echo");
        assert_eq!(seen[0]["system"], "sys");
        let followup = &seen[1]["messages"];
        assert_eq!(followup[1]["role"], "assistant");
        assert_eq!(followup[2]["content"][0]["type"], "tool_result");
        assert_eq!(followup[2]["content"][0]["content"], "{\"x\":1}");
    }
}
