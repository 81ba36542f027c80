//! # Schemas Module
//!
//! Typed requests accepted by the relay, the events it streams back, and the
//! wire structures exchanged with upstream providers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::providers::Provider;

// =============================================================================
// CALLER-FACING TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

/// # Chat Request
///
/// A validated `/api/chat` body. Numeric options are kept exactly as the caller
/// sent them (or `None` when absent or not numeric); defaults are applied by
/// the upstream adapter.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub messages: Vec<Message>,
    pub api_key: String,
    pub model: Option<String>,
    pub provider: Provider,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i64>,
}

/// A validated `/api/generate-image` body.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageJobRequest {
    pub prompt: String,
    pub api_key: String,
    pub model: Option<String>,
}

/// A validated `/api/validate-key` body.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidateKeyRequest {
    pub api_key: String,
    pub provider: Provider,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidateKeyResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidateKeyResponse {
    pub fn valid() -> Self {
        Self { valid: true, message: None }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageResponse {
    pub image_url: String,
}

/// # Chat Stream Event
///
/// One event of the normalized chat stream. `Done` and `Error` are terminal:
/// nothing is emitted after either of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatStreamEvent {
    Content { text: String },
    Done,
    Error { message: String },
}

/// Literal payload of the end-of-stream event.
pub const DONE_SENTINEL: &str = "[DONE]";

impl ChatStreamEvent {
    pub fn content(text: impl Into<String>) -> Self {
        Self::Content { text: text.into() }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Content { .. })
    }

    /// Payload carried in the `data:` field of the SSE frame.
    pub fn sse_data(&self) -> String {
        match self {
            Self::Content { text } => serde_json::json!({ "content": text }).to_string(),
            Self::Done => DONE_SENTINEL.to_string(),
            Self::Error { message } => serde_json::json!({ "error": message }).to_string(),
        }
    }
}

// =============================================================================
// UPSTREAM CHAT COMPLETION WIRE FORMAT
// =============================================================================

/// Body sent to an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Debug, Serialize)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub stream: bool,
    pub temperature: f64,
    pub max_tokens: u32,
}

/// One streamed chunk of an upstream chat completion.
#[derive(Debug, Default, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Some providers report failures in-band as an `error` object.
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: ChunkDelta,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChunkDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionChunk {
    /// Text fragment of the first choice, if any.
    pub fn fragment(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }

    /// In-band upstream error, if this chunk carries one.
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(error) => Some(
                error
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
            ),
        }
    }
}

// =============================================================================
// UPSTREAM PREDICTION WIRE FORMAT
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    #[default]
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    /// Any status string this relay does not know; treated as still pending.
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Prediction output: nothing, a single reference, or a list of references.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    #[default]
    Empty,
    Text(String),
    Sequence(Vec<Value>),
    Other(Value),
}

impl PredictionOutput {
    /// First usable image reference in the output.
    pub fn image_reference(&self) -> Option<String> {
        let reference = match self {
            Self::Text(text) => Some(text.as_str()),
            Self::Sequence(items) => items.first().and_then(Value::as_str),
            Self::Empty | Self::Other(_) => None,
        };
        reference.filter(|url| !url.is_empty()).map(str::to_string)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictionUrls {
    #[serde(default)]
    pub get: Option<String>,
}

/// Prediction object as returned by the create and poll endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: PredictionStatus,
    #[serde(default)]
    pub urls: PredictionUrls,
    #[serde(default)]
    pub output: PredictionOutput,
    #[serde(default)]
    pub error: Option<Value>,
}

impl PredictionResponse {
    /// Provider error text; non-string error payloads are rendered as JSON.
    pub fn error_message(&self) -> Option<String> {
        match &self.error {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) if text.is_empty() => None,
            Some(Value::String(text)) => Some(text.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}

/// # Prediction Job
///
/// An in-flight asynchronous job. Created from the submission response and
/// replaced wholesale on every poll; the poll URL always comes from the
/// submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionJob {
    pub id: Option<String>,
    pub status: PredictionStatus,
    pub poll_url: String,
    pub output: PredictionOutput,
    pub error: Option<String>,
}

impl PredictionJob {
    pub fn from_response(response: PredictionResponse, poll_url: impl Into<String>) -> Self {
        let error = response.error_message();
        Self {
            id: response.id,
            status: response.status,
            poll_url: poll_url.into(),
            output: response.output,
            error,
        }
    }
}
