//! Native media engine seam
//!
//! The playback actor drives exactly one engine instance from its own worker
//! thread. Implementations are stateful and need not be thread-safe; they are
//! constructed inside the worker through a factory closure.

mod headless;

pub use headless::HeadlessEngine;

use thiserror::Error;
use tuneport_common::PlaybackState;

/// Failure reported by a single engine call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{call}: {message}")]
pub struct EngineError {
    /// Name of the engine call that failed
    pub call: &'static str,
    pub message: String,
}

impl EngineError {
    pub fn new(call: &'static str, message: impl Into<String>) -> Self {
        Self {
            call,
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Stateful handle onto a native media-playback engine
///
/// Times and lengths are in milliseconds. Volume is 0-100.
pub trait NativeMediaEngine {
    /// Load a source locator (file path or stream URL)
    fn set_source(&mut self, locator: &str) -> EngineResult<()>;

    /// Start or restart playback of the loaded source
    fn play(&mut self) -> EngineResult<()>;

    fn set_pause(&mut self, paused: bool) -> EngineResult<()>;

    fn stop(&mut self) -> EngineResult<()>;

    fn set_time(&mut self, ms: u64) -> EngineResult<()>;

    /// Elapsed playback time
    fn time(&self) -> EngineResult<u64>;

    fn state(&self) -> EngineResult<PlaybackState>;

    /// Media length, 0 while unknown
    fn length(&self) -> EngineResult<u64>;

    fn set_volume(&mut self, level: u8) -> EngineResult<()>;

    fn volume(&self) -> EngineResult<u8>;

    fn is_playing(&self) -> EngineResult<bool>;

    /// Release the player handle. Later calls fail.
    fn release(&mut self) -> EngineResult<()>;

    /// Release the process-wide runtime the engine was created from
    fn release_runtime(&mut self) -> EngineResult<()>;
}
