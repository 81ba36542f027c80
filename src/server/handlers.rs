//! # Server Handlers
//!
//! HTTP route handlers. Each one validates its body, calls exactly one
//! upstream seam and maps the outcome to a response.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::Value;
use tracing::{debug, warn};

use super::AppState;
use crate::{
    error::RelayError,
    polling::run_async_image_job,
    schemas::{ImageResponse, ValidateKeyResponse},
    streaming::create_streaming_response,
    validation::{validate_chat_request, validate_image_request, validate_key_request},
};

fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, RelayError> {
    body.map(|Json(value)| value).map_err(|rejection| {
        debug!("Rejected request body: {}", rejection.body_text());
        RelayError::validation(rejection.body_text())
    })
}

/// `POST /api/chat`: relay a streaming chat completion as SSE.
///
/// Errors before the upstream accepts the request are plain JSON responses;
/// after that the stream is committed and failures arrive in-stream.
pub async fn chat(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, RelayError> {
    let request = validate_chat_request(&json_body(body)?)?;

    let upstream = state.chat().stream_chat_completion(&request).await.map_err(|err| {
        warn!(provider = request.provider.name(), status = err.status, "Chat request failed: {}", err);
        err
    })?;

    Ok(create_streaming_response(upstream))
}

/// `POST /api/validate-key`: always answers 200 with a verdict.
pub async fn validate_key(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Json<ValidateKeyResponse> {
    let request = match json_body(body).and_then(|body| validate_key_request(&body)) {
        Ok(request) => request,
        Err(err) => return Json(ValidateKeyResponse::invalid(err.message)),
    };

    match state.chat().validate_key(&request).await {
        Ok(()) => Json(ValidateKeyResponse::valid()),
        Err(err) => {
            debug!(provider = request.provider.name(), status = err.status, "Key rejected");
            Json(ValidateKeyResponse::invalid(err.message))
        }
    }
}

/// `POST /api/generate-image`: run an asynchronous job to completion.
pub async fn generate_image(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<ImageResponse>, RelayError> {
    let request = validate_image_request(&json_body(body)?)?;

    let image_url = run_async_image_job(state.images(), &request, state.poll_policy).await?;

    Ok(Json(ImageResponse { image_url }))
}

/// Health check handler
pub async fn health_check() -> impl IntoResponse {
    let health_status = serde_json::json!({
        "status": "healthy",
        "service": "ai-relay",
        "version": env!("CARGO_PKG_VERSION")
    });

    (StatusCode::OK, Json(health_status))
}
