//! Cloneable handle onto the playback actor

use super::commands::{Command, Envelope};
use crate::error::{Error, Result};
use crate::sse::{StatusSink, SubscriberId, SubscriberPool};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tracing::debug;
use tuneport_common::{PlaybackStatus, PlayerEvent, Track};

/// Entry point for everything that wants to drive or observe the player
///
/// Commands are queued to the actor and answered once applied. Reads come
/// from the last published snapshot and never touch the engine.
#[derive(Clone)]
pub struct PlayerHandle {
    commands: mpsc::Sender<Envelope>,
    status: watch::Receiver<Option<PlaybackStatus>>,
    track: watch::Receiver<Option<Track>>,
    events: broadcast::Sender<PlayerEvent>,
    pool: Arc<SubscriberPool>,
    released: Arc<AtomicBool>,
}

impl PlayerHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<Envelope>,
        status: watch::Receiver<Option<PlaybackStatus>>,
        track: watch::Receiver<Option<Track>>,
        events: broadcast::Sender<PlayerEvent>,
        pool: Arc<SubscriberPool>,
    ) -> Self {
        Self {
            commands,
            status,
            track,
            events,
            pool,
            released: Arc::new(AtomicBool::new(false)),
        }
    }

    async fn send(&self, command: Command) -> Result<()> {
        let name = command.name();
        let (envelope, reply) = Envelope::new(command);
        self.commands
            .send(envelope)
            .await
            .map_err(|_| Error::ActorClosed)?;
        debug!(command = name, "Command queued");
        reply.await.map_err(|_| Error::ActorClosed)?
    }

    /// Load and start a track. Resolves once the engine is playing.
    pub async fn play(&self, track: Track) -> Result<()> {
        self.send(Command::Play(track)).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.send(Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.send(Command::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.send(Command::Stop).await
    }

    /// Seek to an absolute position in seconds
    pub async fn seek(&self, seconds: u64) -> Result<()> {
        self.send(Command::Seek(seconds)).await
    }

    /// Set volume; values outside 0-100 are clamped
    pub async fn set_volume(&self, level: i32) -> Result<()> {
        self.send(Command::SetVolume(level)).await
    }

    /// Release the engine and stop the actor
    ///
    /// Safe to call more than once, from any clone. Every call returns only
    /// after the actor has stopped taking commands and closed all status
    /// subscribers.
    pub async fn release(&self) -> Result<()> {
        if !self.released.swap(true, Ordering::SeqCst) {
            match self.send(Command::Release).await {
                Ok(()) | Err(Error::ActorClosed) => {}
                Err(e) => return Err(e),
            }
        }
        self.commands.closed().await;
        Ok(())
    }

    /// Last published snapshot
    pub fn status(&self) -> Option<PlaybackStatus> {
        self.status.borrow().clone()
    }

    /// Track of the last successful Play
    pub fn current_track(&self) -> Option<Track> {
        self.track.borrow().clone()
    }

    /// Register an observer; it immediately receives the current snapshot
    pub fn subscribe<S: StatusSink + 'static>(&self, sink: S) -> SubscriberId {
        let status = self.status.clone();
        self.pool
            .add_with(Box::new(sink), move || status.borrow().clone())
    }

    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        self.pool.remove(id)
    }

    /// Number of live status observers
    pub fn subscriber_count(&self) -> usize {
        self.pool.len()
    }

    pub fn events(&self) -> broadcast::Receiver<PlayerEvent> {
        self.events.subscribe()
    }
}
