//! REST API and SSE transport for the audio player

pub mod handlers;
pub mod server;
pub mod sse;

pub use server::{create_router, run, AppContext};
