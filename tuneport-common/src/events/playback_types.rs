//! Playback-related type definitions
//!
//! Playback state enumeration and the status snapshot pushed to observers.

use serde::{Deserialize, Serialize};

/// Playback state enumeration
///
/// Mirrors the states a native media engine reports. The playback actor is
/// the only component that decides which one is current.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    /// No media loaded yet
    #[default]
    Idle,
    /// Media is being opened
    Opening,
    /// Media is playing
    Playing,
    /// Media is paused
    Paused,
    /// Playback stopped
    Stopped,
    /// Engine is buffering the stream
    Buffering,
    /// Media reached its end
    Ended,
    /// Engine failed to open or play the media
    Error,
}

impl PlaybackState {
    /// True for states in which nothing is (or will soon be) audible.
    pub fn is_stopped(self) -> bool {
        matches!(
            self,
            PlaybackState::Idle
                | PlaybackState::Stopped
                | PlaybackState::Ended
                | PlaybackState::Error
        )
    }

    /// Lower-case state name as sent to clients
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Idle => "idle",
            PlaybackState::Opening => "opening",
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
            PlaybackState::Buffering => "buffering",
            PlaybackState::Ended => "ended",
            PlaybackState::Error => "error",
        }
    }
}

impl std::fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of playback status
///
/// Produced only by the playback actor. Compared structurally to decide
/// whether observers need to hear about it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    /// Media length in seconds (0 until the engine reports one)
    pub duration_seconds: u64,
    /// Elapsed playback time in seconds
    pub elapsed_seconds: u64,
    /// Volume, 0-100
    pub volume: u8,
    /// Display name of the loaded track
    pub title: String,
    /// Stream source the engine was given
    pub source_locator: String,
    /// Thumbnail URL of the loaded track
    pub thumbnail_url: String,
    pub state: PlaybackState,
    pub is_playing: bool,
}
