//! SSE framing for the relayed chat stream.

use std::convert::Infallible;

use axum::{
    http::{
        header::CACHE_CONTROL,
        HeaderValue,
    },
    response::{
        sse::{Event, Sse},
        IntoResponse, Response,
    },
};
use futures_util::StreamExt;

use crate::{adapters::ChatEventStream, schemas::ChatStreamEvent, streaming::core::relay_events};

/// Wrap one chat event as an SSE frame.
pub fn to_sse_event(event: &ChatStreamEvent) -> Event {
    Event::default().data(event.sse_data())
}

/// Commit the streaming response and relay `upstream` through it.
///
/// Only called once the upstream has accepted the request; from here on
/// failures travel as in-stream `error` events with status 200.
pub fn create_streaming_response(upstream: ChatEventStream) -> Response {
    let frames = relay_events(upstream).map(|event| Ok::<_, Infallible>(to_sse_event(&event)));

    let mut response = Sse::new(frames).into_response();
    let headers = response.headers_mut();
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache, no-transform"));
    headers.insert("x-accel-buffering", HeaderValue::from_static("no"));
    response
}
