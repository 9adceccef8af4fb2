//! Test helpers shared by the tuneport-ap integration tests
//!
//! - FakeEngine: scriptable in-memory media engine with a call log
//! - RecordingSink: status sink that keeps everything it was handed
//! - Stub search providers and completion sources
//! - Player setup with short timings

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tuneport_ap::config::PlayerSettings;
use tuneport_ap::engine::{EngineError, EngineResult, NativeMediaEngine};
use tuneport_ap::providers::{CompletionSource, SearchProvider};
use tuneport_ap::sse::{SinkError, StatusSink};
use tuneport_ap::{Error, PlaybackActor, PlayerHandle};
use tuneport_common::{PlaybackState, PlaybackStatus, Track};

/// Length reported for sources without an explicit one
pub const DEFAULT_LENGTH_MS: u64 = 180_500;

// ============================================================================
// FakeEngine
// ============================================================================

#[derive(Debug, Default)]
pub struct FakeState {
    source: Option<String>,
    state: PlaybackState,
    time_ms: u64,
    volume: u8,
    length_ms: u64,
    /// State polls spent in Opening so far
    polls: u32,
    /// Polls before a source reports Playing; `None` never does
    ready_after: HashMap<String, Option<u32>>,
    lengths: HashMap<String, u64>,
    error_sources: HashSet<String>,
    failing: HashSet<&'static str>,
    released: bool,
    /// Engine reports Playing but its output is not running
    output_stalled: bool,
    calls: Vec<&'static str>,
}

/// In-memory engine; clones share state so tests can steer the actor's copy
#[derive(Debug, Clone, Default)]
pub struct FakeEngine {
    inner: Arc<Mutex<FakeState>>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.inner.lock().unwrap()
    }

    /// Report Playing after `polls` state polls
    pub fn ready_after(&self, source: &str, polls: u32) {
        self.lock()
            .ready_after
            .insert(source.to_string(), Some(polls));
    }

    pub fn never_ready(&self, source: &str) {
        self.lock().ready_after.insert(source.to_string(), None);
    }

    pub fn error_on_open(&self, source: &str) {
        self.lock().error_sources.insert(source.to_string());
    }

    pub fn set_length(&self, source: &str, ms: u64) {
        self.lock().lengths.insert(source.to_string(), ms);
    }

    pub fn fail(&self, call: &'static str) {
        self.lock().failing.insert(call);
    }

    pub fn heal(&self, call: &'static str) {
        self.lock().failing.remove(call);
    }

    /// Jump to the end of the loaded media
    pub fn finish_track(&self) {
        let mut s = self.lock();
        s.time_ms = s.length_ms;
        s.state = PlaybackState::Ended;
    }

    /// Keep reporting Playing while `is_playing()` answers false
    pub fn stall_output(&self, stalled: bool) {
        self.lock().output_stalled = stalled;
    }

    /// Advance the play position
    pub fn advance(&self, ms: u64) {
        self.lock().time_ms += ms;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self, call: &str) -> usize {
        self.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn volume_now(&self) -> u8 {
        self.lock().volume
    }

    pub fn time_now(&self) -> u64 {
        self.lock().time_ms
    }

    pub fn source_now(&self) -> Option<String> {
        self.lock().source.clone()
    }

    fn enter(&self, call: &'static str) -> EngineResult<MutexGuard<'_, FakeState>> {
        let mut s = self.lock();
        s.calls.push(call);
        if s.failing.contains(call) {
            return Err(EngineError::new(call, "injected failure"));
        }
        if s.released && call != "release_runtime" {
            return Err(EngineError::new(call, "engine has been released"));
        }
        Ok(s)
    }
}

impl NativeMediaEngine for FakeEngine {
    fn set_source(&mut self, locator: &str) -> EngineResult<()> {
        let mut s = self.enter("set_source")?;
        s.source = Some(locator.to_string());
        s.state = PlaybackState::Idle;
        s.time_ms = 0;
        s.length_ms = 0;
        s.polls = 0;
        Ok(())
    }

    fn play(&mut self) -> EngineResult<()> {
        let mut s = self.enter("play")?;
        if s.source.is_none() {
            return Err(EngineError::new("play", "no source loaded"));
        }
        if s.state == PlaybackState::Paused {
            s.state = PlaybackState::Playing;
        } else {
            s.state = PlaybackState::Opening;
            s.time_ms = 0;
            s.polls = 0;
        }
        Ok(())
    }

    fn set_pause(&mut self, paused: bool) -> EngineResult<()> {
        let mut s = self.enter("set_pause")?;
        s.state = match (s.state, paused) {
            (PlaybackState::Playing, true) => PlaybackState::Paused,
            (PlaybackState::Paused, false) => PlaybackState::Playing,
            (state, _) => state,
        };
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        let mut s = self.enter("stop")?;
        if s.source.is_some() {
            s.state = PlaybackState::Stopped;
        }
        s.time_ms = 0;
        Ok(())
    }

    fn set_time(&mut self, ms: u64) -> EngineResult<()> {
        let mut s = self.enter("set_time")?;
        s.time_ms = ms;
        Ok(())
    }

    fn time(&self) -> EngineResult<u64> {
        Ok(self.enter("time")?.time_ms)
    }

    fn state(&self) -> EngineResult<PlaybackState> {
        let mut s = self.enter("state")?;
        if s.state == PlaybackState::Opening {
            let source = s.source.clone().unwrap_or_default();
            if s.error_sources.contains(&source) {
                s.state = PlaybackState::Error;
            } else {
                let ready = s.ready_after.get(&source).copied().unwrap_or(Some(0));
                if let Some(polls) = ready {
                    if s.polls >= polls {
                        s.state = PlaybackState::Playing;
                        s.length_ms = s.lengths.get(&source).copied().unwrap_or(DEFAULT_LENGTH_MS);
                    }
                }
                s.polls += 1;
            }
        }
        Ok(s.state)
    }

    fn length(&self) -> EngineResult<u64> {
        Ok(self.enter("length")?.length_ms)
    }

    fn set_volume(&mut self, level: u8) -> EngineResult<()> {
        let mut s = self.enter("set_volume")?;
        s.volume = level;
        Ok(())
    }

    fn volume(&self) -> EngineResult<u8> {
        Ok(self.enter("volume")?.volume)
    }

    fn is_playing(&self) -> EngineResult<bool> {
        let s = self.enter("is_playing")?;
        Ok(s.state == PlaybackState::Playing && !s.output_stalled)
    }

    fn release(&mut self) -> EngineResult<()> {
        let mut s = self.enter("release")?;
        s.released = true;
        Ok(())
    }

    fn release_runtime(&mut self) -> EngineResult<()> {
        self.enter("release_runtime")?;
        Ok(())
    }
}

// ============================================================================
// Player setup
// ============================================================================

/// Short timings so readiness timeouts fire quickly
pub fn test_settings() -> PlayerSettings {
    PlayerSettings {
        tick_interval: Duration::from_millis(20),
        poll_interval: Duration::from_millis(5),
        ready_timeout: Duration::from_millis(200),
        initial_volume: 100,
        command_queue_capacity: 32,
    }
}

/// Spawn an actor over a fresh FakeEngine; returns the engine for steering
pub fn spawn_player() -> (PlayerHandle, FakeEngine) {
    spawn_player_with(test_settings())
}

pub fn spawn_player_with(settings: PlayerSettings) -> (PlayerHandle, FakeEngine) {
    let engine = FakeEngine::new();
    let remote = engine.clone();
    let player = PlaybackActor::spawn(settings, move || Ok(engine)).unwrap();
    (player, remote)
}

pub fn sample_track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Track {}", id),
        thumbnail: format!("https://img.example/{}.jpg", id),
        provider: "stub".to_string(),
        stream_url: stream_url(id),
        ..Track::default()
    }
}

pub fn stream_url(id: &str) -> String {
    format!("fake://{}", id)
}

/// Poll the player status until `predicate` holds
pub async fn wait_for_status<F>(player: &PlayerHandle, predicate: F) -> PlaybackStatus
where
    F: Fn(&PlaybackStatus) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if let Some(status) = player.status() {
            if predicate(&status) {
                return status;
            }
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("Status never matched, last: {:?}", player.status());
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn is_timeout(result: &Result<(), Error>) -> bool {
    matches!(result, Err(Error::CommandTimeout { .. }))
}

// ============================================================================
// Sinks
// ============================================================================

/// Sink that records every delivery; can be told to start failing
#[derive(Clone, Default)]
pub struct RecordingSink {
    received: Arc<Mutex<Vec<PlaybackStatus>>>,
    failing: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn received(&self) -> Vec<PlaybackStatus> {
        self.received.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn start_failing(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl StatusSink for RecordingSink {
    fn deliver(&mut self, status: &PlaybackStatus) -> Result<(), SinkError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        self.received.lock().unwrap().push(status.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// ============================================================================
// Collaborators
// ============================================================================

/// Provider answering from a fixed track list
pub struct StaticProvider {
    pub name: &'static str,
    pub tracks: Vec<Track>,
    pub delay: Duration,
}

impl StaticProvider {
    pub fn new(name: &'static str, tracks: Vec<Track>) -> Self {
        Self {
            name,
            tracks,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl SearchProvider for StaticProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, query: &str) -> tuneport_ap::Result<Vec<Track>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let needle = query.to_lowercase();
        Ok(self
            .tracks
            .iter()
            .filter(|t| t.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn resolve(&self, id: &str) -> tuneport_ap::Result<Track> {
        self.tracks
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| Error::NotFound(id.to_string()))
    }
}

/// Provider whose every call fails with `message`
pub struct FailingProvider {
    pub name: &'static str,
    pub message: &'static str,
}

#[async_trait]
impl SearchProvider for FailingProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn search(&self, _query: &str) -> tuneport_ap::Result<Vec<Track>> {
        Err(Error::Internal(self.message.to_string()))
    }

    async fn resolve(&self, _id: &str) -> tuneport_ap::Result<Track> {
        Err(Error::Internal(self.message.to_string()))
    }
}

/// Completion source with fixed suggestions
pub struct StaticCompleter {
    pub name: &'static str,
    pub suggestions: Vec<&'static str>,
}

#[async_trait]
impl CompletionSource for StaticCompleter {
    fn name(&self) -> &str {
        self.name
    }

    async fn complete(&self, query: &str) -> tuneport_ap::Result<Vec<String>> {
        let needle = query.to_lowercase();
        Ok(self
            .suggestions
            .iter()
            .filter(|s| s.to_lowercase().starts_with(&needle))
            .map(|s| s.to_string())
            .collect())
    }
}

/// Tracks `a`, `b`, `c` chained through `next`
pub fn chained_tracks() -> Vec<Track> {
    let ids = ["a", "b", "c"];
    ids.iter()
        .enumerate()
        .map(|(i, id)| Track {
            next: ids.get(i + 1).map(|s| s.to_string()).unwrap_or_default(),
            previous: if i > 0 { ids[i - 1].to_string() } else { String::new() },
            ..sample_track(id)
        })
        .collect()
}
