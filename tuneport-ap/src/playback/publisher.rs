//! Change detection between the actor and its observers

use crate::sse::SubscriberPool;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tracing::debug;
use tuneport_common::{PlaybackStatus, PlayerEvent};

/// Forwards a snapshot only when it differs from the last one broadcast
pub struct StatusPublisher {
    last: Option<PlaybackStatus>,
    status_tx: watch::Sender<Option<PlaybackStatus>>,
    pool: Arc<SubscriberPool>,
    events_tx: broadcast::Sender<PlayerEvent>,
}

impl StatusPublisher {
    pub fn new(
        status_tx: watch::Sender<Option<PlaybackStatus>>,
        pool: Arc<SubscriberPool>,
        events_tx: broadcast::Sender<PlayerEvent>,
    ) -> Self {
        Self {
            last: None,
            status_tx,
            pool,
            events_tx,
        }
    }

    /// Returns true when the snapshot was broadcast
    pub fn publish(&mut self, status: &PlaybackStatus) -> bool {
        if self.last.as_ref() == Some(status) {
            return false;
        }

        debug!(
            state = %status.state,
            elapsed = status.elapsed_seconds,
            "Publishing status"
        );

        self.status_tx.send_replace(Some(status.clone()));
        // No listeners is fine
        let _ = self.events_tx.send(PlayerEvent::StatusChanged {
            status: status.clone(),
            timestamp: chrono::Utc::now(),
        });
        self.pool.broadcast(status);
        self.last = Some(status.clone());
        true
    }

    /// End every subscriber stream. Called once when the actor halts.
    pub fn close(&self) {
        self.pool.close_all();
    }
}
