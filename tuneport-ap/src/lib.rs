//! # Tuneport Audio Player Library (tuneport-ap)
//!
//! Playback backend that mediates commands to a native media engine.
//!
//! **Purpose:** Serialize every engine call through one playback actor, push
//! deduplicated status snapshots to live observers, and answer search and
//! autocomplete queries by fanning out to several collaborators at once.
//!
//! **Architecture:** Playback actor on a dedicated thread, tokio channels
//! between the actor and its handles, axum for HTTP and SSE.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod playback;
pub mod providers;
pub mod sse;

pub use error::{Error, Result};
pub use playback::{PlaybackActor, PlayerHandle};
