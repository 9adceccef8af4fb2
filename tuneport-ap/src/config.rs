//! Configuration for tuneport-ap
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--port, --root-folder, --no-autoplay)
//! 2. Environment variables (TUNEPORT_AP_PORT, TUNEPORT_ROOT_FOLDER)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! The TOML file is read from `--config` when given, otherwise from
//! `~/.config/tuneport/tuneport-ap.toml` or `/etc/tuneport/tuneport-ap.toml`.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;
use tuneport_common::config::{find_config_file, load_toml, resolve_root_folder};

/// Config file name searched in the platform config directories
pub const CONFIG_FILE_NAME: &str = "tuneport-ap.toml";

/// Environment variable naming the music root folder
pub const ROOT_FOLDER_ENV: &str = "TUNEPORT_ROOT_FOLDER";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Root folder for audio files (optional)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Play the next library track when one ends
    #[serde(default = "default_autoplay")]
    pub autoplay: bool,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub player: PlayerToml,

    #[serde(default)]
    pub updates: UpdatesConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            root_folder: None,
            autoplay: default_autoplay(),
            logging: LoggingConfig::default(),
            player: PlayerToml::default(),
            updates: UpdatesConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Filter directive (e.g. "info" or "tuneport_ap=trace"). RUST_LOG wins.
    #[serde(default)]
    pub level: Option<String>,
}

/// `[player]` table, timings in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerToml {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_ready_timeout_ms")]
    pub ready_timeout_ms: u64,
    #[serde(default = "default_initial_volume")]
    pub initial_volume: u8,
    #[serde(default = "default_command_queue_capacity")]
    pub command_queue_capacity: usize,
}

impl Default for PlayerToml {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            ready_timeout_ms: default_ready_timeout_ms(),
            initial_volume: default_initial_volume(),
            command_queue_capacity: default_command_queue_capacity(),
        }
    }
}

/// `[updates]` table
#[derive(Debug, Clone, Deserialize)]
pub struct UpdatesConfig {
    /// Snapshots buffered per SSE client before it counts as stalled
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for UpdatesConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_port() -> u16 {
    5740
}

fn default_autoplay() -> bool {
    true
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_ready_timeout_ms() -> u64 {
    30_000
}

fn default_initial_volume() -> u8 {
    100
}

fn default_command_queue_capacity() -> usize {
    32
}

fn default_channel_capacity() -> usize {
    16
}

/// Timing and sizing of the playback actor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSettings {
    /// Period of the status refresh tick
    pub tick_interval: Duration,
    /// Engine polling period during readiness waits
    pub poll_interval: Duration,
    /// Upper bound of one readiness wait
    pub ready_timeout: Duration,
    pub initial_volume: u8,
    pub command_queue_capacity: usize,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerToml::default().into()
    }
}

impl From<PlayerToml> for PlayerSettings {
    fn from(t: PlayerToml) -> Self {
        Self {
            tick_interval: Duration::from_millis(t.tick_interval_ms),
            poll_interval: Duration::from_millis(t.poll_interval_ms),
            ready_timeout: Duration::from_millis(t.ready_timeout_ms),
            initial_volume: t.initial_volume,
            command_queue_capacity: t.command_queue_capacity,
        }
    }
}

impl PlayerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.tick_interval.is_zero() {
            return Err(Error::Config("tick_interval must be greater than zero".to_string()));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll_interval must be greater than zero".to_string()));
        }
        if self.ready_timeout.is_zero() {
            return Err(Error::Config("ready_timeout must be greater than zero".to_string()));
        }
        if self.poll_interval >= self.ready_timeout {
            return Err(Error::Config(format!(
                "poll_interval ({}ms) must be shorter than ready_timeout ({}ms)",
                self.poll_interval.as_millis(),
                self.ready_timeout.as_millis()
            )));
        }
        if self.command_queue_capacity == 0 {
            return Err(Error::Config(
                "command_queue_capacity must be greater than zero".to_string(),
            ));
        }
        if self.initial_volume > 100 {
            return Err(Error::Config(format!(
                "initial_volume {} is outside 0-100",
                self.initial_volume
            )));
        }
        Ok(())
    }
}

/// Values given on the command line (or through their env variables)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub port: Option<u16>,
    pub root_folder: Option<PathBuf>,
    pub no_autoplay: bool,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub root_folder: PathBuf,
    pub autoplay: bool,
    pub log_level: Option<String>,
    pub player: PlayerSettings,
    pub updates_capacity: usize,
}

impl Config {
    /// Load and validate the configuration
    ///
    /// An explicit `toml_path` must exist. Without one the platform config
    /// file is used when present, built-in defaults otherwise.
    pub fn load(toml_path: Option<&Path>, overrides: ConfigOverrides) -> Result<Self> {
        let toml_config: TomlConfig = match toml_path {
            Some(path) => load_toml(path)?,
            None => match find_config_file(CONFIG_FILE_NAME) {
                Some(path) => {
                    info!("Loading configuration from {}", path.display());
                    load_toml(&path)?
                }
                None => TomlConfig::default(),
            },
        };

        Self::from_toml(toml_config, overrides)
    }

    /// Merge a parsed TOML file with the command-line overrides
    pub fn from_toml(toml_config: TomlConfig, overrides: ConfigOverrides) -> Result<Self> {
        let root_folder = resolve_root_folder(
            overrides.root_folder.as_deref(),
            ROOT_FOLDER_ENV,
            toml_config.root_folder.as_deref(),
        );

        let player = PlayerSettings::from(toml_config.player);
        player.validate()?;

        if toml_config.updates.channel_capacity == 0 {
            return Err(Error::Config(
                "updates.channel_capacity must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            port: overrides.port.unwrap_or(toml_config.port),
            root_folder,
            autoplay: toml_config.autoplay && !overrides.no_autoplay,
            log_level: toml_config.logging.level,
            player,
            updates_capacity: toml_config.updates.channel_capacity,
        })
    }
}
