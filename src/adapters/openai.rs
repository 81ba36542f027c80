//! # OpenAI-Compatible Chat Adapter
//!
//! Streams chat completions from any provider that speaks the OpenAI
//! `/chat/completions` protocol. The provider's base URL and default model
//! come from the [`ProviderRegistry`]; everything else is shared.

use std::{fmt::Display, time::Instant};

use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures_util::{future, StreamExt};
use reqwest::{header::ACCEPT, Client, Response};
use tracing::{debug, warn};

use crate::{
    adapters::{base::AdapterUtils, resolve_max_tokens, resolve_temperature, ChatEventStream, ChatUpstream},
    error::RelayError,
    providers::ProviderRegistry,
    schemas::{ChatRequest, ChatStreamEvent, CompletionChunk, CompletionRequest, ValidateKeyRequest, DONE_SENTINEL},
};

pub const CHAT_AUTH_MESSAGE: &str = "Invalid API key. Check your API key in Settings.";
pub const CHAT_DEFAULT_ERROR: &str = "Failed to get response from OpenAI";
pub const KEY_INVALID_MESSAGE: &str = "Invalid API key";

const ERROR_POINTERS: &[&str] = &["/error/message", "/message"];

#[derive(Clone, Debug)]
pub struct OpenAICompatibleAdapter {
    client: Client,
    registry: ProviderRegistry,
}

impl OpenAICompatibleAdapter {
    pub fn new(client: Client, registry: ProviderRegistry) -> Self {
        Self { client, registry }
    }

    /// Turn a non-2xx chat response into the caller-facing error. Rejected
    /// credentials always get the fixed Settings hint.
    async fn reject(response: Response) -> RelayError {
        let status = response.status().as_u16();
        let body = AdapterUtils::read_error_body(response).await;
        debug!(status, body = ?body, "OpenAI-compatible upstream rejected request");

        if RelayError::is_auth_status(status) {
            return RelayError::auth(CHAT_AUTH_MESSAGE);
        }

        let message = AdapterUtils::error_message(body.as_ref(), ERROR_POINTERS)
            .unwrap_or_else(|| CHAT_DEFAULT_ERROR.to_string());
        RelayError::upstream(status, message)
    }

    /// Key checks report the provider's own wording for every status.
    async fn reject_key(response: Response) -> RelayError {
        let status = response.status().as_u16();
        let body = AdapterUtils::read_error_body(response).await;
        debug!(status, "Key rejected by upstream");

        let message = AdapterUtils::error_message(body.as_ref(), ERROR_POINTERS)
            .unwrap_or_else(|| KEY_INVALID_MESSAGE.to_string());

        if RelayError::is_auth_status(status) {
            RelayError::auth(message)
        } else {
            RelayError::upstream(status, message)
        }
    }
}

#[async_trait]
impl ChatUpstream for OpenAICompatibleAdapter {
    async fn stream_chat_completion(&self, request: &ChatRequest) -> Result<ChatEventStream, RelayError> {
        let endpoint = self.registry.endpoint(request.provider);
        let model = endpoint.model_for(request.model.as_deref());
        let body = CompletionRequest {
            model,
            messages: &request.messages,
            stream: true,
            temperature: resolve_temperature(request.temperature),
            max_tokens: resolve_max_tokens(request.max_tokens),
        };

        AdapterUtils::log_request(request.provider.name(), model, request.messages.len());
        let start_time = Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", endpoint.base_url))
            .bearer_auth(&request.api_key)
            .header(ACCEPT, "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(provider = request.provider.name(), "Chat completion request failed: {}", e);
                RelayError::from(e)
            })?;

        let status = response.status();
        AdapterUtils::log_response(request.provider.name(), status.as_u16(), start_time.elapsed().as_millis() as u64);

        if !status.is_success() {
            return Err(Self::reject(response).await);
        }

        Ok(fragment_stream(response))
    }

    async fn validate_key(&self, request: &ValidateKeyRequest) -> Result<(), RelayError> {
        let endpoint = self.registry.endpoint(request.provider);
        let start_time = Instant::now();

        let response = self
            .client
            .get(format!("{}/models", endpoint.base_url))
            .bearer_auth(&request.api_key)
            .send()
            .await?;

        AdapterUtils::log_response(
            request.provider.name(),
            response.status().as_u16(),
            start_time.elapsed().as_millis() as u64,
        );

        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::reject_key(response).await)
        }
    }
}

/// Decode an upstream SSE body into content events, one per non-empty
/// fragment, stopping at the `[DONE]` sentinel. Nothing is buffered beyond
/// the event currently being decoded.
pub fn fragment_stream(response: Response) -> ChatEventStream {
    let stream = response
        .bytes_stream()
        .eventsource()
        .take_while(|event| future::ready(!is_done(event)))
        .filter_map(|event| future::ready(decode_event(event)));

    Box::pin(stream)
}

fn is_done<E>(event: &Result<Event, E>) -> bool {
    matches!(event, Ok(event) if event.data.trim() == DONE_SENTINEL)
}

fn decode_event<E: Display>(event: Result<Event, E>) -> Option<Result<ChatStreamEvent, RelayError>> {
    let event = match event {
        Ok(event) => event,
        Err(err) => return Some(Err(RelayError::internal(format!("Upstream stream failed: {}", err)))),
    };

    if event.data.trim().is_empty() {
        return None;
    }

    let chunk = match serde_json::from_str::<CompletionChunk>(&event.data) {
        Ok(chunk) => chunk,
        Err(err) => return Some(Err(RelayError::internal(format!("Malformed upstream chunk: {}", err)))),
    };

    if let Some(message) = chunk.error_message() {
        return Some(Err(RelayError::internal(message)));
    }

    chunk.fragment().map(|text| Ok(ChatStreamEvent::content(text)))
}
