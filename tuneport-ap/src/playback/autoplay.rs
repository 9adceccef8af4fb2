//! Auto-advance to the next track
//!
//! Listens on the player event bus. When a track ends and names a successor,
//! asks the track's provider for it and starts playing it.

use super::handle::PlayerHandle;
use crate::providers::{play_from_provider, Registry};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use tuneport_common::PlayerEvent;

pub struct AutoAdvance;

impl AutoAdvance {
    /// Start listening. The task ends when the player is released.
    pub fn spawn(player: PlayerHandle, registry: Arc<Registry>) -> JoinHandle<()> {
        // Subscribe before spawning so no event is missed
        let events = player.events();
        tokio::spawn(run(events, player, registry))
    }
}

async fn run(
    mut events: broadcast::Receiver<PlayerEvent>,
    player: PlayerHandle,
    registry: Arc<Registry>,
) {
    debug!("Auto-advance started");

    loop {
        match events.recv().await {
            Ok(PlayerEvent::TrackEnded { track, .. }) => {
                if !track.has_successor() {
                    debug!(title = %track.title, "Track ended without a successor");
                    continue;
                }

                info!(
                    provider = %track.provider,
                    next = %track.next,
                    "Auto-advancing to next track"
                );
                let played =
                    play_from_provider(&registry, &player, &track.provider, &track.next).await;
                if let Err(e) = played {
                    warn!(
                        provider = %track.provider,
                        next = %track.next,
                        error = %e,
                        "Auto-advance failed"
                    );
                }
            }
            Ok(PlayerEvent::Released { .. }) => break,
            Ok(PlayerEvent::StatusChanged { .. }) => {}
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Auto-advance: Lagged {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }

    debug!("Auto-advance stopped");
}
