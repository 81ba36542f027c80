//! # AI Relay
//!
//! HTTP relay between browser front ends and hosted AI providers. The caller
//! supplies its own provider key with every request; the relay holds no
//! credentials and no per-request state beyond the request itself.
//!
//! ## Features
//!
//! - **Chat streaming**: OpenAI-compatible chat completions (default provider
//!   or DeepSeek) relayed fragment by fragment as Server-Sent Events
//! - **Key validation**: a cheap authenticated call that reports whether a key
//!   is accepted
//! - **Image generation**: create/poll orchestration of an asynchronous
//!   prediction job, bounded by a fixed attempt budget
//! - **Uniform errors**: every failure is a [`RelayError`] with an HTTP status
//!   and a message
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ai_relay::{create_router, AppState, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::for_test(); // or Config::parse_args() for CLI
//!     let app = create_router(AppState::new(config)?);
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:5000").await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`validation`] - request body checks producing typed requests
//! - [`adapters`] - upstream provider clients behind the chat and prediction seams
//! - [`streaming`] - relay of upstream fragments to SSE frames
//! - [`polling`] - create/poll orchestration for image jobs
//! - [`providers`] - provider selection and endpoint registry
//! - [`config`] - configuration from CLI, environment and `.env`
//! - [`error`] - the relay error type

// Core infrastructure
pub mod core;

pub mod adapters;
pub mod config;
pub mod error;
pub mod polling;
pub mod providers;
pub mod schemas;
pub mod streaming;
pub mod validation;

#[cfg(feature = "server")]
pub mod server;

pub use adapters::{ChatEventStream, ChatUpstream, OpenAICompatibleAdapter, PredictionUpstream, ReplicateAdapter};
pub use config::Config;
pub use error::{ErrorKind, RelayError};
pub use polling::{run_async_image_job, PollPolicy};
pub use providers::{Provider, ProviderRegistry};
pub use schemas::{ChatRequest, ChatStreamEvent, ImageJobRequest, Message, Role, ValidateKeyRequest};

#[cfg(feature = "server")]
pub use server::{create_router, AppState};
