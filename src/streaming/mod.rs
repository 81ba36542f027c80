//! # Streaming Module
//!
//! Relays upstream chat fragments to the caller as Server-Sent Events. Each
//! event carries one JSON payload (or the `[DONE]` sentinel) in its `data:`
//! field, and the stream always ends with exactly one terminal event.

pub mod core;
#[cfg(feature = "server")]
pub mod sse;

pub use core::{relay_events, STREAM_INTERRUPTED};
#[cfg(feature = "server")]
pub use sse::create_streaming_response;
