//! Server-Sent Events (SSE) status stream
//!
//! Each connected client is one subscriber in the player's pool. When the
//! client goes away its receiver is dropped, the next delivery fails and the
//! pool prunes the subscriber.

use crate::api::server::AppContext;
use crate::sse::ChannelSink;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

/// GET /player/updates - SSE stream of status snapshots
///
/// The current snapshot is sent first, then every change.
pub async fn player_updates(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (sink, rx) = ChannelSink::new(ctx.updates_capacity);
    let id = ctx.player.subscribe(sink);
    debug!(subscriber = %id, "New SSE client connected");

    tuneport_common::sse::json_event_stream("status", ReceiverStream::new(rx))
}
