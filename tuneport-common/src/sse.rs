//! Server-Sent Events (SSE) utilities
//!
//! Shared SSE plumbing for tuneport services.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::convert::Infallible;
use std::time::Duration;
use tracing::warn;

/// Keep-alive interval for every SSE stream
pub const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Turn a stream of serializable updates into an SSE response
///
/// Every item becomes one event named `event_name` with a JSON body. Items
/// that fail to serialize are logged and skipped.
///
/// # Example
/// ```rust,ignore
/// let (sink, rx) = ChannelSink::new(16);
/// tuneport_common::sse::json_event_stream("status", ReceiverStream::new(rx))
/// ```
pub fn json_event_stream<S, T>(
    event_name: &'static str,
    updates: S,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize + Send + 'static,
{
    let stream = updates.filter_map(move |update| async move {
        match Event::default().event(event_name).json_data(&update) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                warn!("Failed to serialize {} event: {}", event_name, e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}
