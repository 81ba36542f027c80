//! # Upstream Client Adapters
//!
//! Provider specific HTTP semantics hidden behind two seams:
//!
//! - [`ChatUpstream`]: streaming chat completions against OpenAI-compatible
//!   endpoints (default provider and DeepSeek, see [`crate::providers`])
//! - [`PredictionUpstream`]: the create/poll pair of an asynchronous
//!   prediction API
//!
//! Handlers only ever talk to the traits, so tests swap in doubles and the
//! relay never branches on which provider is behind them.

use std::pin::Pin;

use async_trait::async_trait;
use futures_util::Stream;

use crate::{
    error::RelayError,
    schemas::{ChatRequest, ChatStreamEvent, ImageJobRequest, PredictionJob, ValidateKeyRequest},
};

pub mod base;
pub mod openai;
pub mod replicate;

pub use base::AdapterUtils;
pub use openai::OpenAICompatibleAdapter;
pub use replicate::ReplicateAdapter;

/// Lazy, non-restartable sequence of chat events from one upstream call.
/// Yields only `Content` events; ends when the upstream signals completion.
pub type ChatEventStream = Pin<Box<dyn Stream<Item = Result<ChatStreamEvent, RelayError>> + Send>>;

pub const DEFAULT_TEMPERATURE: f64 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Sampling temperature to send upstream.
pub fn resolve_temperature(requested: Option<f64>) -> f64 {
    requested
        .filter(|temperature| temperature.is_finite())
        .unwrap_or(DEFAULT_TEMPERATURE)
}

/// Token limit to send upstream; non-positive requests use the default.
pub fn resolve_max_tokens(requested: Option<i64>) -> u32 {
    requested
        .filter(|max_tokens| *max_tokens > 0)
        .map(|max_tokens| u32::try_from(max_tokens).unwrap_or(u32::MAX))
        .unwrap_or(DEFAULT_MAX_TOKENS)
}

#[async_trait]
pub trait ChatUpstream: Send + Sync {
    /// Start a streaming completion. Returns once the upstream has accepted
    /// the request; failures up to that point are ordinary errors.
    async fn stream_chat_completion(&self, request: &ChatRequest) -> Result<ChatEventStream, RelayError>;

    /// Check that the key is accepted by the selected provider.
    async fn validate_key(&self, request: &ValidateKeyRequest) -> Result<(), RelayError>;
}

#[async_trait]
pub trait PredictionUpstream: Send + Sync {
    /// Submit a job and return its initial state and poll URL.
    async fn create_prediction(&self, request: &ImageJobRequest) -> Result<PredictionJob, RelayError>;

    /// Fetch the current state of the job behind `poll_url`.
    async fn fetch_prediction(&self, poll_url: &str, api_key: &str) -> Result<PredictionJob, RelayError>;
}
