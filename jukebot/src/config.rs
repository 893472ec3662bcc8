//! Bot configuration
//!
//! Loaded from TOML (see [`jukebot_common::config`] for file resolution).
//! Every key is optional; missing keys take the compiled defaults below.
//!
//! ```toml
//! command_prefix = "?"
//!
//! [session]
//! leave_delay_ms = 60000
//! status_interval_ms = 5000
//! default_volume = 0.1
//!
//! [commands]
//! volume_step = 0.1
//! owner_id = "123456789"
//!
//! [sounds]
//! tada = "https://video.example/watch?v=tada"
//!
//! [[catalog]]
//! title = "Tada"
//! duration_seconds = 3
//! locator = "https://video.example/watch?v=tada"
//!
//! [logging]
//! level = "debug"
//! ```

use crate::playback::SessionConfig;
use crate::resolver::CatalogEntry;
use jukebot_common::config::{check_range, load_toml, LoggingConfig};
use jukebot_common::human_time::millis_to_duration;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Top-level bot configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct BotConfig {
    /// Prefix marking a chat line as a command
    pub command_prefix: String,
    pub session: SessionSettings,
    pub commands: CommandSettings,
    /// Sound shortcut name → locator
    pub sounds: BTreeMap<String, String>,
    /// Entries served by the in-memory resolver
    pub catalog: Vec<CatalogEntry>,
    /// Playlist id → item locators
    pub playlists: BTreeMap<String, Vec<String>>,
    pub logging: LoggingConfig,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            command_prefix: "?".to_string(),
            session: SessionSettings::default(),
            commands: CommandSettings::default(),
            sounds: BTreeMap::new(),
            catalog: Vec::new(),
            playlists: BTreeMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

/// `[session]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionSettings {
    /// Delay before leaving an idle voice destination
    pub leave_delay_ms: u64,
    /// Status refresh period while playing (0 disables)
    pub status_interval_ms: u64,
    /// Initial volume (0.0-1.0)
    pub default_volume: f32,
    /// Event subscriber buffer
    pub event_capacity: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        let defaults = SessionConfig::default();
        Self {
            leave_delay_ms: defaults.leave_delay.as_millis() as u64,
            status_interval_ms: defaults.status_interval.as_millis() as u64,
            default_volume: defaults.default_volume,
            event_capacity: defaults.event_capacity,
        }
    }
}

/// `[commands]` section
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommandSettings {
    /// Volume change per reaction press (0.0-1.0)
    pub volume_step: f32,
    /// Unauthorized attempts before a user is ignored
    pub unauthorized_threshold: u32,
    /// Window after which unauthorized attempt counts reset
    pub unauthorized_window_ms: u64,
    /// How long an over-threshold user is ignored
    pub ignore_period_ms: u64,
    /// Command replies kept above the status
    pub output_lines: usize,
    /// Platform id of the user allowed to run owner-only commands
    pub owner_id: Option<String>,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            volume_step: 0.1,
            unauthorized_threshold: 3,
            unauthorized_window_ms: 60_000,
            ignore_period_ms: 300_000,
            output_lines: 5,
            owner_id: None,
        }
    }
}

impl CommandSettings {
    pub fn unauthorized_window(&self) -> Duration {
        millis_to_duration(self.unauthorized_window_ms)
    }

    pub fn ignore_period(&self) -> Duration {
        millis_to_duration(self.ignore_period_ms)
    }
}

impl BotConfig {
    /// Load and validate the configuration at `path`
    ///
    /// `None` or a missing file yields the defaults.
    pub fn load(path: Option<&Path>) -> jukebot_common::Result<Self> {
        let config: Self = load_toml(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values outside their meaningful ranges
    pub fn validate(&self) -> jukebot_common::Result<()> {
        if self.command_prefix.is_empty() || self.command_prefix.chars().any(char::is_whitespace) {
            return Err(jukebot_common::Error::Config(format!(
                "command_prefix must be non-empty and contain no whitespace (got {:?})",
                self.command_prefix
            )));
        }
        check_range("session.default_volume", self.session.default_volume, 0.0, 1.0)?;
        check_range("session.event_capacity", self.session.event_capacity, 1, 65_536)?;
        check_range("commands.volume_step", self.commands.volume_step, 0.01, 1.0)?;
        check_range("commands.unauthorized_threshold", self.commands.unauthorized_threshold, 1, 1000)?;
        check_range("commands.output_lines", self.commands.output_lines, 1, 50)?;
        Ok(())
    }

    /// Settings for a playback session
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            leave_delay: millis_to_duration(self.session.leave_delay_ms),
            status_interval: millis_to_duration(self.session.status_interval_ms),
            default_volume: self.session.default_volume,
            event_capacity: self.session.event_capacity,
        }
    }
}
