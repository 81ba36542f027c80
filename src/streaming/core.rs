//! # Stream Relay
//!
//! Turns an upstream chat event stream into the caller-facing sequence:
//! every content fragment in order, then exactly one terminal event.

use futures_util::{stream, Stream, StreamExt};
use tracing::{debug, warn};

use crate::{adapters::ChatEventStream, schemas::ChatStreamEvent};

/// Message sent to the caller when the upstream stream fails after the
/// response has started.
pub const STREAM_INTERRUPTED: &str = "Stream interrupted";

/// Relay state; `Finished` once a terminal event has been handed out.
enum RelayState {
    Open { upstream: ChatEventStream, fragments: usize },
    Finished,
}

/// Relay `upstream` as content events followed by `Done`, or by a single
/// `Error` if the upstream fails part way. Nothing follows the terminal
/// event, and fragments are forwarded as soon as they arrive.
pub fn relay_events(upstream: ChatEventStream) -> impl Stream<Item = ChatStreamEvent> + Send {
    let initial = RelayState::Open { upstream, fragments: 0 };

    stream::unfold(initial, |state| async move {
        let RelayState::Open { mut upstream, fragments } = state else {
            return None;
        };

        match upstream.next().await {
            Some(Ok(event @ ChatStreamEvent::Content { .. })) => {
                Some((event, RelayState::Open { upstream, fragments: fragments + 1 }))
            }
            // Terminal events from upstream end the relay as-is.
            Some(Ok(event)) => Some((event, RelayState::Finished)),
            Some(Err(err)) => {
                warn!(fragments, "Upstream chat stream failed: {}", err);
                Some((
                    ChatStreamEvent::Error { message: STREAM_INTERRUPTED.to_string() },
                    RelayState::Finished,
                ))
            }
            None => {
                debug!(fragments, "Upstream chat stream completed");
                Some((ChatStreamEvent::Done, RelayState::Finished))
            }
        }
    })
}
