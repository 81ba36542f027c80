//! # Base Adapter Functionality
//!
//! Helpers shared by the upstream adapters: request/response logging and
//! pulling a readable message out of a provider's error body.

use reqwest::Response;
use serde_json::Value;
use tracing::debug;

pub struct AdapterUtils;

impl AdapterUtils {
    /// Read an error body as JSON. Providers do not always send JSON on
    /// failure, so an unreadable body is simply `None`.
    pub async fn read_error_body(response: Response) -> Option<Value> {
        let bytes = response.bytes().await.ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// First non-empty string found at any of `pointers` (JSON pointers).
    pub fn error_message(body: Option<&Value>, pointers: &[&str]) -> Option<String> {
        let body = body?;
        pointers
            .iter()
            .filter_map(|pointer| body.pointer(pointer).and_then(Value::as_str))
            .find(|message| !message.is_empty())
            .map(str::to_string)
    }

    pub fn log_request(adapter_name: &str, target: &str, detail: usize) {
        debug!(
            adapter = adapter_name,
            target = target,
            detail = detail,
            "Sending upstream request"
        );
    }

    pub fn log_response(adapter_name: &str, status: u16, response_time_ms: u64) {
        debug!(
            adapter = adapter_name,
            status = status,
            response_time_ms = response_time_ms,
            "Upstream responded"
        );
    }
}
