//! Error types for tuneport-ap
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use crate::engine::EngineError;
use thiserror::Error;

/// Main error type for tuneport-ap
#[derive(Error, Debug)]
pub enum Error {
    /// The engine did not reach the expected state within the readiness timeout
    #[error("Timed out after {waited_ms}ms waiting for {operation}")]
    CommandTimeout {
        operation: &'static str,
        waited_ms: u64,
    },

    /// A native engine call failed or the engine reported an error state
    #[error("Engine call {call} failed: {message}")]
    EngineCallFailed { call: &'static str, message: String },

    /// No provider or completion source registered under this name
    #[error("Unknown collaborator: {0}")]
    UnknownCollaborator(String),

    /// One or more collaborators failed during a concurrent query
    #[error("Aggregate failure: {0}")]
    AggregateFailure(String),

    /// The playback actor has been released
    #[error("Playback actor is closed")]
    ActorClosed,

    /// Configuration file loading or validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP server errors
    #[error("HTTP server error: {0}")]
    Http(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience Result type using tuneport-ap Error
pub type Result<T> = std::result::Result<T, Error>;

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        Error::EngineCallFailed {
            call: e.call,
            message: e.message,
        }
    }
}

impl From<tuneport_common::Error> for Error {
    fn from(e: tuneport_common::Error) -> Self {
        match e {
            tuneport_common::Error::Io(e) => Error::Io(e),
            tuneport_common::Error::Config(msg) => Error::Config(msg),
            tuneport_common::Error::NotFound(msg) => Error::NotFound(msg),
            tuneport_common::Error::Internal(msg) => Error::Internal(msg),
        }
    }
}
