//! Request summary logging for `/api` routes.
//!
//! One line per request: `METHOD path status in Nms`, followed by the JSON
//! response body for JSON responses. The body is read into memory and
//! re-wrapped in a fresh body; streamed (SSE) responses pass through
//! untouched.

use std::time::Instant;

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::header::CONTENT_TYPE,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::RelayError;

pub const MAX_LOG_LINE_CHARS: usize = 80;
pub const UNREADABLE_BODY: &str = "Failed to read response body";

pub async fn log_api_requests(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    if !path.starts_with("/api") {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let request_id = Uuid::new_v4();
    let start = Instant::now();

    let response = next.run(request).await;

    let mut line = format!(
        "{} {} {} in {}ms",
        method,
        path,
        response.status().as_u16(),
        start.elapsed().as_millis()
    );

    if !is_json(&response) {
        info!(%request_id, "{}", truncate_line(&line));
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(err) => {
            warn!(%request_id, "{} (body unreadable: {})", truncate_line(&line), err);
            let mut fallback = RelayError::internal(UNREADABLE_BODY).into_response();
            *fallback.status_mut() = parts.status;
            return fallback;
        }
    };

    line.push_str(" :: ");
    line.push_str(&String::from_utf8_lossy(&bytes));
    info!(%request_id, "{}", truncate_line(&line));

    Response::from_parts(parts, Body::from(bytes))
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.starts_with("application/json"))
        .unwrap_or(false)
}

/// Cut a log line to [`MAX_LOG_LINE_CHARS`], marking the cut with `…`.
pub fn truncate_line(line: &str) -> String {
    if line.chars().count() <= MAX_LOG_LINE_CHARS {
        return line.to_string();
    }

    let mut truncated: String = line.chars().take(MAX_LOG_LINE_CHARS - 1).collect();
    truncated.push('…');
    truncated
}
