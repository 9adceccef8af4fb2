//! Subscriber pool for status snapshots
//!
//! Holds the live observers of the player status. Every observer keeps its
//! own copy of the last snapshot it was handed, so a subscriber that joins
//! late still receives the current snapshot exactly once, and nobody receives
//! the same snapshot twice.
//!
//! Delivery never blocks. A sink that cannot take a snapshot right now is
//! treated as gone and pruned in the same pass.

use std::fmt;
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tuneport_common::PlaybackStatus;
use uuid::Uuid;

/// Stable identifier of one subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(Uuid);

impl SubscriberId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkError {
    /// The observer is not keeping up
    #[error("sink is full")]
    Full,
    /// The observer went away
    #[error("sink is closed")]
    Closed,
}

/// Receiving end of status snapshots
///
/// `deliver` must not block.
pub trait StatusSink: Send {
    fn deliver(&mut self, status: &PlaybackStatus) -> Result<(), SinkError>;

    /// Called once when the subscriber is removed from the pool
    fn close(&mut self) {}
}

/// Sink backed by a bounded tokio channel
///
/// Closing drops the sender, which ends the receiving stream.
pub struct ChannelSink {
    tx: Option<mpsc::Sender<PlaybackStatus>>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PlaybackStatus>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn deliver(&mut self, status: &PlaybackStatus) -> Result<(), SinkError> {
        let tx = self.tx.as_ref().ok_or(SinkError::Closed)?;
        tx.try_send(status.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => SinkError::Full,
            mpsc::error::TrySendError::Closed(_) => SinkError::Closed,
        })
    }

    fn close(&mut self) {
        self.tx = None;
    }
}

struct Subscriber {
    id: SubscriberId,
    sink: Box<dyn StatusSink>,
    last_delivered: Option<PlaybackStatus>,
    alive: bool,
}

impl Subscriber {
    fn offer(&mut self, status: &PlaybackStatus) {
        if self.last_delivered.as_ref() == Some(status) {
            return;
        }
        match self.sink.deliver(status) {
            Ok(()) => {
                debug!(subscriber = %self.id, state = %status.state, "Delivered status");
                self.last_delivered = Some(status.clone());
            }
            Err(e) => {
                info!(subscriber = %self.id, reason = %e, "Dropping subscriber");
                self.alive = false;
            }
        }
    }
}

#[derive(Default)]
struct PoolInner {
    subscribers: Vec<Subscriber>,
    /// Set once the player is released; later sinks are closed on arrival
    closed: bool,
}

/// Registry of live status observers
#[derive(Default)]
pub struct SubscriberPool {
    inner: Mutex<PoolInner>,
}

impl SubscriberPool {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PoolInner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a sink. Nothing is delivered until the next broadcast.
    pub fn add(&self, sink: Box<dyn StatusSink>) -> SubscriberId {
        self.add_with(sink, || None)
    }

    /// Register a sink and hand it `current()` right away
    ///
    /// `current` runs while the pool is locked, so no broadcast can slip in
    /// between reading the snapshot and registering the subscriber. On a
    /// closed pool the sink gets the snapshot and is closed at once.
    pub fn add_with<F>(&self, sink: Box<dyn StatusSink>, current: F) -> SubscriberId
    where
        F: FnOnce() -> Option<PlaybackStatus>,
    {
        let mut inner = self.lock();
        let mut subscriber = Subscriber {
            id: SubscriberId::new(),
            sink,
            last_delivered: None,
            alive: true,
        };
        if let Some(status) = current() {
            subscriber.offer(&status);
        }

        let id = subscriber.id;
        if subscriber.alive && !inner.closed {
            inner.subscribers.push(subscriber);
            info!(subscriber = %id, total = inner.subscribers.len(), "Subscriber added");
        } else {
            subscriber.sink.close();
        }
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let mut inner = self.lock();
        match inner.subscribers.iter().position(|s| s.id == id) {
            Some(index) => {
                let mut subscriber = inner.subscribers.remove(index);
                subscriber.sink.close();
                info!(subscriber = %id, total = inner.subscribers.len(), "Subscriber removed");
                true
            }
            None => false,
        }
    }

    /// Offer a snapshot to every subscriber that has not seen it yet
    pub fn broadcast(&self, status: &PlaybackStatus) {
        let mut inner = self.lock();
        for subscriber in inner.subscribers.iter_mut() {
            subscriber.offer(status);
        }
        inner.subscribers.retain_mut(|s| {
            if !s.alive {
                s.sink.close();
            }
            s.alive
        });
    }

    /// Close and remove every subscriber, and refuse new ones
    pub fn close_all(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        let count = inner.subscribers.len();
        for mut subscriber in inner.subscribers.drain(..) {
            subscriber.sink.close();
        }
        info!(closed = count, "Subscriber pool closed");
    }

    pub fn len(&self) -> usize {
        self.lock().subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().subscribers.is_empty()
    }
}
