//! # Request Validation
//!
//! Turns raw JSON bodies into typed requests, or rejects them with a 400 and
//! a field specific message. Validation never touches the network, so a
//! rejected request is guaranteed not to reach an upstream provider.

use serde_json::Value;

use crate::{
    error::RelayError,
    providers::Provider,
    schemas::{ChatRequest, ImageJobRequest, Message, ValidateKeyRequest},
};

pub const API_KEY_REQUIRED: &str = "API key is required";
pub const REPLICATE_KEY_REQUIRED: &str = "Replicate API key is required";
pub const MESSAGES_REQUIRED: &str = "Messages array is required";
pub const MESSAGES_EMPTY: &str = "Messages array must not be empty";
pub const INVALID_MESSAGE: &str = "Each message needs a role of system, user or assistant and text content";
pub const PROMPT_REQUIRED: &str = "Prompt is required";

/// Non-empty text field, or `None` when absent, empty or not a string.
fn non_empty_text<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
}

/// Optional model name; empty or non-string values count as absent.
fn optional_model(body: &Value) -> Option<String> {
    non_empty_text(body, "model").map(str::to_string)
}

/// Numeric option as sent by the caller; anything non-numeric is `None`.
fn optional_number(body: &Value, field: &str) -> Option<f64> {
    body.get(field).and_then(Value::as_f64)
}

/// Integer option as sent by the caller. Fractional numbers are truncated.
fn optional_integer(body: &Value, field: &str) -> Option<i64> {
    let value = body.get(field)?;
    value.as_i64().or_else(|| value.as_f64().map(|number| number as i64))
}

fn provider(body: &Value) -> Provider {
    Provider::from_key(body.get("provider").and_then(Value::as_str))
}

/// Validate a `/api/chat` body.
pub fn validate_chat_request(body: &Value) -> Result<ChatRequest, RelayError> {
    let api_key = non_empty_text(body, "apiKey")
        .ok_or_else(|| RelayError::validation(API_KEY_REQUIRED))?;

    let raw_messages = body
        .get("messages")
        .and_then(Value::as_array)
        .ok_or_else(|| RelayError::validation(MESSAGES_REQUIRED))?;

    if raw_messages.is_empty() {
        return Err(RelayError::validation(MESSAGES_EMPTY));
    }

    let messages = raw_messages
        .iter()
        .map(|raw| {
            serde_json::from_value::<Message>(raw.clone())
                .map_err(|_| RelayError::validation(INVALID_MESSAGE))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ChatRequest {
        messages,
        api_key: api_key.to_string(),
        model: optional_model(body),
        provider: provider(body),
        temperature: optional_number(body, "temperature"),
        max_tokens: optional_integer(body, "maxTokens"),
    })
}

/// Validate a `/api/generate-image` body.
pub fn validate_image_request(body: &Value) -> Result<ImageJobRequest, RelayError> {
    let api_key = non_empty_text(body, "apiKey")
        .ok_or_else(|| RelayError::validation(REPLICATE_KEY_REQUIRED))?;
    let prompt = non_empty_text(body, "prompt")
        .ok_or_else(|| RelayError::validation(PROMPT_REQUIRED))?;

    Ok(ImageJobRequest {
        prompt: prompt.to_string(),
        api_key: api_key.to_string(),
        model: optional_model(body),
    })
}

/// Validate a `/api/validate-key` body.
pub fn validate_key_request(body: &Value) -> Result<ValidateKeyRequest, RelayError> {
    let api_key = non_empty_text(body, "apiKey")
        .ok_or_else(|| RelayError::validation(API_KEY_REQUIRED))?;

    Ok(ValidateKeyRequest {
        api_key: api_key.to_string(),
        provider: provider(body),
    })
}
