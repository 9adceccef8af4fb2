//! Server-Sent Events (SSE) module

pub mod pool;

pub use pool::{ChannelSink, SinkError, StatusSink, SubscriberId, SubscriberPool};
