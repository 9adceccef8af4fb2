//! Event types for the tuneport event system
//!
//! The playback actor emits these on an in-process broadcast bus. Listeners
//! (auto-advance, diagnostics) subscribe through the player handle.

mod playback_types;

pub use playback_types::{PlaybackState, PlaybackStatus};

use serde::{Deserialize, Serialize};

use crate::track::Track;

/// Player event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerEvent {
    /// A new, distinct status snapshot was published
    StatusChanged {
        status: PlaybackStatus,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The engine reported the end of the loaded track
    ///
    /// Triggers:
    /// - Auto-advance: request the track's successor
    TrackEnded {
        track: Track,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The playback actor released its engine and stopped
    Released {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}
