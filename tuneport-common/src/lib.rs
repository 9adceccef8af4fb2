//! # Tuneport Common Library
//!
//! Shared code for the tuneport services including:
//! - Track and playback status model
//! - Player event types
//! - Configuration file loading and root folder resolution
//! - SSE helpers

pub mod config;
pub mod error;
pub mod events;
pub mod sse;
pub mod track;

pub use error::{Error, Result};
pub use events::{PlaybackState, PlaybackStatus, PlayerEvent};
pub use track::Track;
