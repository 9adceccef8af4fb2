//! Headless software engine
//!
//! Plays nothing audible. Local files are probed with symphonia to learn
//! their length, and the play position advances on the wall clock. Used when
//! no native engine is linked into the binary.

use super::{EngineError, EngineResult, NativeMediaEngine};
use std::path::Path;
use std::time::{Duration, Instant};
use symphonia::core::codecs::CODEC_TYPE_NULL;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;
use tuneport_common::PlaybackState;

/// Default delay between `play()` and the engine reporting `Playing`
pub const DEFAULT_OPEN_DELAY: Duration = Duration::from_millis(150);

#[derive(Debug)]
struct LoadedSource {
    locator: String,
    /// None when the source could not be probed
    length_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Idle,
    Stopped,
    /// Position is `offset_ms` at `started`, advancing afterwards.
    /// `started` may lie in the future while the source is opening.
    Running { started: Instant, offset_ms: u64 },
    Paused { at_ms: u64 },
}

#[derive(Debug)]
pub struct HeadlessEngine {
    open_delay: Duration,
    source: Option<LoadedSource>,
    phase: Phase,
    volume: u8,
    released: bool,
}

impl HeadlessEngine {
    pub fn new() -> Self {
        Self::with_open_delay(DEFAULT_OPEN_DELAY)
    }

    pub fn with_open_delay(open_delay: Duration) -> Self {
        Self {
            open_delay,
            source: None,
            phase: Phase::Idle,
            volume: 100,
            released: false,
        }
    }

    fn ensure_live(&self, call: &'static str) -> EngineResult<()> {
        if self.released {
            return Err(EngineError::new(call, "engine has been released"));
        }
        Ok(())
    }

    fn length_ms(&self) -> Option<u64> {
        self.source.as_ref().and_then(|s| s.length_ms)
    }

    fn position_ms(&self, now: Instant) -> u64 {
        let raw = match self.phase {
            Phase::Idle | Phase::Stopped => 0,
            Phase::Paused { at_ms } => at_ms,
            Phase::Running { started, offset_ms } => {
                offset_ms + now.saturating_duration_since(started).as_millis() as u64
            }
        };
        match self.length_ms() {
            Some(length) => raw.min(length),
            None => raw,
        }
    }

    fn state_at(&self, now: Instant) -> PlaybackState {
        if self.source.is_none() {
            return PlaybackState::Idle;
        }
        match self.phase {
            Phase::Idle => PlaybackState::Idle,
            Phase::Stopped => PlaybackState::Stopped,
            Phase::Paused { .. } => PlaybackState::Paused,
            Phase::Running { started, .. } => {
                if now < started {
                    return PlaybackState::Opening;
                }
                match self.length_ms() {
                    None => PlaybackState::Error,
                    Some(length) if self.position_ms(now) >= length => PlaybackState::Ended,
                    Some(_) => PlaybackState::Playing,
                }
            }
        }
    }
}

impl Default for HeadlessEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeMediaEngine for HeadlessEngine {
    fn set_source(&mut self, locator: &str) -> EngineResult<()> {
        self.ensure_live("set_source")?;

        let length_ms = match probe_length_ms(Path::new(locator)) {
            Ok(ms) => Some(ms),
            Err(reason) => {
                debug!("Could not probe {}: {}", locator, reason);
                None
            }
        };

        self.source = Some(LoadedSource {
            locator: locator.to_string(),
            length_ms,
        });
        self.phase = Phase::Idle;
        Ok(())
    }

    fn play(&mut self) -> EngineResult<()> {
        self.ensure_live("play")?;
        let Some(source) = self.source.as_ref() else {
            return Err(EngineError::new("play", "no source loaded"));
        };

        let now = Instant::now();
        self.phase = match self.phase {
            Phase::Paused { at_ms } => Phase::Running {
                started: now,
                offset_ms: at_ms,
            },
            _ => {
                debug!("Opening {}", source.locator);
                Phase::Running {
                    started: now + self.open_delay,
                    offset_ms: 0,
                }
            }
        };
        Ok(())
    }

    fn set_pause(&mut self, paused: bool) -> EngineResult<()> {
        self.ensure_live("set_pause")?;
        let now = Instant::now();
        self.phase = match (self.phase, paused) {
            (Phase::Running { .. }, true) => Phase::Paused {
                at_ms: self.position_ms(now),
            },
            (Phase::Paused { at_ms }, false) => Phase::Running {
                started: now,
                offset_ms: at_ms,
            },
            (phase, _) => phase,
        };
        Ok(())
    }

    fn stop(&mut self) -> EngineResult<()> {
        self.ensure_live("stop")?;
        if self.source.is_some() {
            self.phase = Phase::Stopped;
        }
        Ok(())
    }

    fn set_time(&mut self, ms: u64) -> EngineResult<()> {
        self.ensure_live("set_time")?;
        let target = match self.length_ms() {
            Some(length) => ms.min(length),
            None => ms,
        };
        let now = Instant::now();
        self.phase = match self.phase {
            Phase::Running { started, .. } => Phase::Running {
                started: started.max(now),
                offset_ms: target,
            },
            Phase::Paused { .. } => Phase::Paused { at_ms: target },
            phase => phase,
        };
        Ok(())
    }

    fn time(&self) -> EngineResult<u64> {
        self.ensure_live("time")?;
        Ok(self.position_ms(Instant::now()))
    }

    fn state(&self) -> EngineResult<PlaybackState> {
        self.ensure_live("state")?;
        Ok(self.state_at(Instant::now()))
    }

    fn length(&self) -> EngineResult<u64> {
        self.ensure_live("length")?;
        Ok(self.length_ms().unwrap_or(0))
    }

    fn set_volume(&mut self, level: u8) -> EngineResult<()> {
        self.ensure_live("set_volume")?;
        self.volume = level.min(100);
        Ok(())
    }

    fn volume(&self) -> EngineResult<u8> {
        self.ensure_live("volume")?;
        Ok(self.volume)
    }

    fn is_playing(&self) -> EngineResult<bool> {
        self.ensure_live("is_playing")?;
        Ok(self.state_at(Instant::now()) == PlaybackState::Playing)
    }

    fn release(&mut self) -> EngineResult<()> {
        self.ensure_live("release")?;
        self.released = true;
        self.source = None;
        self.phase = Phase::Idle;
        Ok(())
    }

    fn release_runtime(&mut self) -> EngineResult<()> {
        Ok(())
    }
}

/// Probe a local audio file for its length in milliseconds
pub fn probe_length_ms(path: &Path) -> std::result::Result<u64, String> {
    let file = std::fs::File::open(path)
        .map_err(|e| format!("Failed to open file {}: {}", path.display(), e))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext_str) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext_str);
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| format!("Failed to probe format: {}", e))?;

    let track = probed
        .format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| "No audio track found".to_string())?;

    let params = &track.codec_params;
    let n_frames = params
        .n_frames
        .ok_or_else(|| "Frame count not found".to_string())?;

    if let Some(time_base) = params.time_base {
        let time = time_base.calc_time(n_frames);
        return Ok(time.seconds * 1000 + (time.frac * 1000.0).round() as u64);
    }

    let sample_rate = params
        .sample_rate
        .ok_or_else(|| "Sample rate not found".to_string())?;
    Ok(n_frames * 1000 / u64::from(sample_rate))
}
