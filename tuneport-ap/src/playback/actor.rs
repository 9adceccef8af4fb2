//! Playback actor
//!
//! Sole owner of the native engine. Runs on a dedicated `playback-actor`
//! thread driven by a current-thread tokio runtime, consumes commands one at
//! a time in arrival order, and derives the status snapshot after every
//! command and on a periodic tick.
//!
//! **Readiness waits:** after `play()` the engine needs time to open the
//! source. The actor polls the engine until it reports `Playing` and a
//! non-zero length, bounded by `ready_timeout`. While waiting it keeps
//! draining the intake queue: `Play`, `Stop` and `Release` abandon the wait,
//! everything else is parked and handled afterwards in arrival order.

use super::commands::{Command, Envelope};
use super::handle::PlayerHandle;
use super::publisher::StatusPublisher;
use crate::config::PlayerSettings;
use crate::engine::{EngineError, EngineResult, NativeMediaEngine};
use crate::error::{Error, Result};
use crate::sse::SubscriberPool;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use tuneport_common::{PlaybackState, PlaybackStatus, PlayerEvent, Track};

/// Capacity of the in-process player event bus
const EVENT_BUS_CAPACITY: usize = 64;

/// How a readiness wait ended
#[derive(Debug)]
enum WaitOutcome {
    Ready,
    TimedOut { waited_ms: u64 },
    Failed(EngineError),
    /// A newer Play, a Stop or a Release arrived
    Superseded,
}

pub struct PlaybackActor<E: NativeMediaEngine> {
    engine: E,
    settings: PlayerSettings,
    commands: mpsc::Receiver<Envelope>,
    /// Commands received during a readiness wait, in arrival order
    backlog: VecDeque<Envelope>,
    publisher: StatusPublisher,
    track_tx: watch::Sender<Option<Track>>,
    events_tx: broadcast::Sender<PlayerEvent>,
    status: PlaybackStatus,
    track: Option<Track>,
    /// True once a Play completed and until the media is torn down
    loaded: bool,
    halted: bool,
}

impl<E: NativeMediaEngine + 'static> PlaybackActor<E> {
    /// Start the actor thread and return a handle onto it
    ///
    /// The engine is built by `factory` on the actor thread. Returns once the
    /// actor has published its initial snapshot.
    pub fn spawn<F>(settings: PlayerSettings, factory: F) -> Result<PlayerHandle>
    where
        F: FnOnce() -> EngineResult<E> + Send + 'static,
    {
        settings.validate()?;

        let (command_tx, command_rx) = mpsc::channel(settings.command_queue_capacity);
        let (status_tx, status_rx) = watch::channel(None);
        let (track_tx, track_rx) = watch::channel(None);
        let (events_tx, _) = broadcast::channel(EVENT_BUS_CAPACITY);
        let pool = Arc::new(SubscriberPool::new());
        let publisher = StatusPublisher::new(status_tx, Arc::clone(&pool), events_tx.clone());

        let (ready_tx, ready_rx) = std::sync::mpsc::channel::<Result<()>>();
        let actor_events = events_tx.clone();

        std::thread::Builder::new()
            .name("playback-actor".to_string())
            .spawn(move || {
                let runtime = match tokio::runtime::Builder::new_current_thread()
                    .enable_time()
                    .build()
                {
                    Ok(runtime) => runtime,
                    Err(e) => {
                        let _ = ready_tx.send(Err(Error::Internal(format!(
                            "Failed to build playback runtime: {}",
                            e
                        ))));
                        return;
                    }
                };

                let engine = match factory() {
                    Ok(engine) => engine,
                    Err(e) => {
                        error!("Failed to create media engine: {}", e);
                        let _ = ready_tx.send(Err(e.into()));
                        return;
                    }
                };

                let mut actor = PlaybackActor {
                    engine,
                    settings,
                    commands: command_rx,
                    backlog: VecDeque::new(),
                    publisher,
                    track_tx,
                    events_tx: actor_events,
                    status: PlaybackStatus::default(),
                    track: None,
                    loaded: false,
                    halted: false,
                };
                actor.initialize();
                let _ = ready_tx.send(Ok(()));

                runtime.block_on(actor.run());
            })?;

        ready_rx
            .recv()
            .map_err(|_| Error::Internal("Playback actor exited during startup".to_string()))??;

        Ok(PlayerHandle::new(command_tx, status_rx, track_rx, events_tx, pool))
    }
}

impl<E: NativeMediaEngine> PlaybackActor<E> {
    fn initialize(&mut self) {
        let volume = self.settings.initial_volume.min(100);
        self.status.volume = match self.engine.set_volume(volume) {
            Ok(()) => volume,
            Err(e) => {
                warn!("Failed to apply initial volume: {}", e);
                self.engine.volume().unwrap_or(volume)
            }
        };
        self.publish();
        info!(volume = self.status.volume, "Playback actor initialized");
    }

    async fn run(mut self) {
        info!("Playback actor started");

        let mut ticker = tokio::time::interval(self.settings.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        while !self.halted {
            if let Some(envelope) = self.backlog.pop_front() {
                self.dispatch(envelope).await;
                continue;
            }

            tokio::select! {
                received = self.commands.recv() => match received {
                    Some(envelope) => self.dispatch(envelope).await,
                    None => {
                        info!("All player handles dropped, releasing engine");
                        self.release();
                        self.publish();
                    }
                },
                _ = ticker.tick() => self.tick(),
            }
        }

        // Status streams end before the intake closes
        self.publisher.close();
        self.close_intake();
        let _ = self.events_tx.send(PlayerEvent::Released {
            timestamp: chrono::Utc::now(),
        });
        info!("Playback actor stopped");
    }

    async fn dispatch(&mut self, envelope: Envelope) {
        let name = envelope.command.name();
        debug!(command = name, "Applying command");

        let result = self.apply(&envelope.command).await;
        if let Err(e) = &result {
            error!(command = name, error = %e, "Command failed");
        }

        self.publish();
        envelope.reply(result);
    }

    async fn apply(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Play(track) => self.play(track.clone()).await,
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::Stop => {
                self.stop();
                Ok(())
            }
            Command::Seek(seconds) => self.seek(*seconds),
            Command::SetVolume(level) => self.set_volume(*level),
            Command::Release => {
                self.release();
                Ok(())
            }
        }
    }

    // ========================================================================
    // Commands
    // ========================================================================

    async fn play(&mut self, track: Track) -> Result<()> {
        info!(title = %track.title, provider = %track.provider, "Play requested");

        if !self.status.state.is_stopped() {
            self.stop();
        }

        self.loaded = false;
        self.status = PlaybackStatus {
            duration_seconds: 0,
            elapsed_seconds: 0,
            volume: self.status.volume,
            title: track.title.clone(),
            source_locator: track.stream_url.clone(),
            thumbnail_url: track.thumbnail.clone(),
            state: PlaybackState::Opening,
            is_playing: false,
        };
        self.publish();

        let started = self
            .engine
            .set_source(&track.stream_url)
            .and_then(|()| self.engine.play());
        if let Err(e) = started {
            self.force_stop();
            return Err(e.into());
        }

        if !self.settle("playing state", Self::reached_playing).await? {
            return Ok(());
        }
        if !self.settle("media length", Self::has_length).await? {
            return Ok(());
        }

        let length_ms = match self.engine.length() {
            Ok(ms) => ms,
            Err(e) => {
                self.force_stop();
                return Err(e.into());
            }
        };

        self.status.duration_seconds = length_ms.div_ceil(1000);
        self.status.elapsed_seconds = 0;
        self.status.state = PlaybackState::Playing;
        self.status.is_playing = self.output_running();
        self.loaded = true;
        self.track = Some(track.clone());
        self.track_tx.send_replace(Some(track));

        info!(
            title = %self.status.title,
            duration = self.status.duration_seconds,
            "Playback started"
        );
        Ok(())
    }

    /// Run one readiness wait and translate its outcome
    ///
    /// Returns `Ok(false)` when a newer command took over. The state then
    /// stays `Opening` with nothing loaded, and the parked command decides
    /// what happens next.
    async fn settle(
        &mut self,
        operation: &'static str,
        probe: fn(&E) -> EngineResult<bool>,
    ) -> Result<bool> {
        match self.wait_for(operation, probe).await {
            WaitOutcome::Ready => Ok(true),
            WaitOutcome::Superseded => {
                info!(operation, "Readiness wait superseded by a newer command");
                Ok(false)
            }
            WaitOutcome::TimedOut { waited_ms } => {
                warn!(operation, waited_ms, "Engine did not become ready");
                self.force_stop();
                Err(Error::CommandTimeout {
                    operation,
                    waited_ms,
                })
            }
            WaitOutcome::Failed(e) => {
                warn!(operation, error = %e, "Engine failed while opening media");
                self.force_stop();
                Err(e.into())
            }
        }
    }

    async fn wait_for(
        &mut self,
        operation: &'static str,
        probe: fn(&E) -> EngineResult<bool>,
    ) -> WaitOutcome {
        let started = Instant::now();
        let deadline = started + self.settings.ready_timeout;

        loop {
            if self.backlog.iter().any(|e| e.command.interrupts_wait()) {
                return WaitOutcome::Superseded;
            }

            match probe(&self.engine) {
                Ok(true) => return WaitOutcome::Ready,
                Ok(false) => {}
                Err(e) => return WaitOutcome::Failed(e),
            }

            let now = Instant::now();
            if now >= deadline {
                return WaitOutcome::TimedOut {
                    waited_ms: now.duration_since(started).as_millis() as u64,
                };
            }
            let nap = self.settings.poll_interval.min(deadline - now);

            tokio::select! {
                received = self.commands.recv() => match received {
                    Some(envelope) => {
                        debug!(
                            command = envelope.command.name(),
                            operation,
                            "Command arrived during readiness wait"
                        );
                        self.backlog.push_back(envelope);
                    }
                    None => return WaitOutcome::Superseded,
                },
                _ = tokio::time::sleep(nap) => {}
            }
        }
    }

    fn reached_playing(engine: &E) -> EngineResult<bool> {
        match engine.state()? {
            PlaybackState::Playing => Ok(true),
            PlaybackState::Error => Err(EngineError::new(
                "state",
                "engine reported an error while opening media",
            )),
            _ => Ok(false),
        }
    }

    fn has_length(engine: &E) -> EngineResult<bool> {
        Ok(engine.length()? > 0)
    }

    /// Tear down after a failed Play
    fn force_stop(&mut self) {
        if let Err(e) = self.engine.stop() {
            warn!("Engine stop failed during recovery: {}", e);
        }
        self.loaded = false;
        self.status.duration_seconds = 0;
        self.status.elapsed_seconds = 0;
        self.status.state = PlaybackState::Stopped;
        self.status.is_playing = false;
    }

    fn pause(&mut self) -> Result<()> {
        if self.status.state != PlaybackState::Playing {
            debug!(state = %self.status.state, "Pause ignored");
            return Ok(());
        }

        self.engine.set_pause(true)?;
        if let Ok(ms) = self.engine.time() {
            self.status.elapsed_seconds = ms / 1000;
        }
        self.status.state = PlaybackState::Paused;
        self.status.is_playing = false;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        if self.status.state == PlaybackState::Playing || !self.loaded {
            debug!(state = %self.status.state, loaded = self.loaded, "Resume ignored");
            return Ok(());
        }

        if self.status.state == PlaybackState::Paused {
            self.engine.set_pause(false)?;
        } else {
            self.engine.play()?;
            self.status.elapsed_seconds = 0;
        }
        self.status.state = PlaybackState::Playing;
        self.status.is_playing = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.status.state.is_stopped() {
            debug!(state = %self.status.state, "Stop ignored");
            return;
        }

        if let Err(e) = self.engine.stop() {
            warn!("Engine stop failed: {}", e);
        }
        self.status.elapsed_seconds = 0;
        self.status.state = PlaybackState::Stopped;
        self.status.is_playing = false;

        if !self.loaded {
            self.status.title.clear();
            self.status.source_locator.clear();
            self.status.thumbnail_url.clear();
            self.status.duration_seconds = 0;
        }
    }

    fn seek(&mut self, seconds: u64) -> Result<()> {
        if !self.loaded {
            debug!("Seek ignored, nothing loaded");
            return Ok(());
        }

        self.engine.set_time(seconds.saturating_mul(1000))?;
        self.status.elapsed_seconds = match self.status.duration_seconds {
            0 => seconds,
            duration => seconds.min(duration),
        };
        Ok(())
    }

    fn set_volume(&mut self, requested: i32) -> Result<()> {
        let level = requested.clamp(0, 100) as u8;
        self.engine.set_volume(level)?;
        self.status.volume = level;
        Ok(())
    }

    /// Terminal. Every step runs even if an earlier one failed.
    fn release(&mut self) {
        info!("Releasing media engine");

        if let Err(e) = self.engine.stop() {
            warn!("Engine stop failed during release: {}", e);
        }
        if let Err(e) = self.engine.release() {
            warn!("Engine release failed: {}", e);
        }
        if let Err(e) = self.engine.release_runtime() {
            warn!("Engine runtime release failed: {}", e);
        }

        self.loaded = false;
        self.status.elapsed_seconds = 0;
        self.status.state = PlaybackState::Stopped;
        self.status.is_playing = false;
        self.halted = true;
    }

    // ========================================================================
    // Status derivation
    // ========================================================================

    fn tick(&mut self) {
        if !self.loaded {
            return;
        }

        let previous = self.status.state;
        if let Err(e) = self.refresh() {
            warn!("Status refresh failed, keeping last snapshot: {}", e);
            return;
        }
        self.publish();

        if self.status.state == PlaybackState::Ended && previous != PlaybackState::Ended {
            if let Some(track) = &self.track {
                info!(title = %track.title, "Track ended");
                let _ = self.events_tx.send(PlayerEvent::TrackEnded {
                    track: track.clone(),
                    timestamp: chrono::Utc::now(),
                });
            }
        }
    }

    /// Read everything first so a failing call leaves the snapshot untouched
    fn refresh(&mut self) -> EngineResult<()> {
        let state = self.engine.state()?;
        let time_ms = self.engine.time()?;
        let volume = self.engine.volume()?;
        let running = self.engine.is_playing()?;
        let length_ms = if self.status.duration_seconds == 0 {
            Some(self.engine.length()?)
        } else {
            None
        };

        self.status.state = state;
        // A Playing state alone does not mean the output is running
        self.status.is_playing = running && state == PlaybackState::Playing;
        self.status.elapsed_seconds = time_ms / 1000;
        self.status.volume = volume.min(100);
        if let Some(ms) = length_ms.filter(|ms| *ms > 0) {
            self.status.duration_seconds = ms.div_ceil(1000);
        }
        Ok(())
    }

    /// Whether the engine output is actually running after a successful open
    fn output_running(&self) -> bool {
        match self.engine.is_playing() {
            Ok(running) => running,
            Err(e) => {
                warn!("Engine is_playing failed, assuming output runs: {}", e);
                true
            }
        }
    }

    fn publish(&mut self) {
        self.publisher.publish(&self.status);
    }

    fn close_intake(&mut self) {
        self.commands.close();
        for envelope in self.backlog.drain(..) {
            envelope.reject_closed();
        }
        while let Ok(envelope) = self.commands.try_recv() {
            envelope.reject_closed();
        }
    }
}
