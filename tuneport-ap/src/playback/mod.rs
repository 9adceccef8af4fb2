//! Playback actor, its handle and the services built on the player events

pub mod actor;
pub mod autoplay;
pub mod commands;
pub mod handle;
pub mod publisher;

pub use actor::PlaybackActor;
pub use autoplay::AutoAdvance;
pub use commands::Command;
pub use handle::PlayerHandle;
pub use publisher::StatusPublisher;
