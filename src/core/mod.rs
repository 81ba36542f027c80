//! # Core Infrastructure
//!
//! Shared plumbing used by the upstream adapters.

pub mod http_client;
