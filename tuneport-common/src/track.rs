//! Track model shared by providers, the player and the transport

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A playable track as described by a search provider
///
/// Built once by a provider and cloned, never mutated, when handed to the
/// player.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    /// Provider-scoped identifier
    pub id: String,
    pub title: String,
    /// Thumbnail URL (may be empty)
    pub thumbnail: String,
    /// Name of the provider that produced this track
    pub provider: String,
    /// Source locator handed to the media engine
    pub stream_url: String,
    /// Identifier of the track to auto-advance to (may be empty)
    pub next: String,
    /// Identifier of the preceding track (may be empty)
    pub previous: String,
    /// Duration in seconds, 0 if unknown
    pub duration: u64,
    #[serde(default)]
    pub last_played: Option<DateTime<Utc>>,
}

impl Track {
    /// True when the track names a provider and a successor to auto-advance to
    pub fn has_successor(&self) -> bool {
        !self.provider.is_empty() && !self.next.is_empty()
    }
}
