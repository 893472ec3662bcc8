//! Configuration file resolution and loading
//!
//! The configuration file path is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`<APP>_CONFIG`)
//! 3. Per-user config directory (`~/.config/<app>/config.toml` on Linux)
//! 4. No file: compiled defaults
//!
//! A missing or unreadable configuration file never terminates the process;
//! it is logged and the compiled defaults are used. A file that exists but is
//! malformed is an error, since silently ignoring typos hides real problems.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Logging configuration
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level or tracing filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locates the configuration file for an application
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    app_name: String,
    env_var_name: String,
}

impl ConfigResolver {
    /// Create a resolver for `app_name`
    ///
    /// The environment variable defaults to `<APP_NAME>_CONFIG` with dashes
    /// replaced by underscores.
    pub fn new(app_name: &str) -> Self {
        let env_var_name = format!("{}_CONFIG", app_name.to_uppercase().replace('-', "_"));
        Self {
            app_name: app_name.to_string(),
            env_var_name,
        }
    }

    /// Override the environment variable consulted in step 2
    pub fn with_env_var(mut self, env_var_name: &str) -> Self {
        self.env_var_name = env_var_name.to_string();
        self
    }

    /// Name of the environment variable consulted in step 2
    pub fn env_var_name(&self) -> &str {
        &self.env_var_name
    }

    /// Resolve the configuration file path
    ///
    /// Returns `None` when no source names a file and the per-user default
    /// does not exist.
    pub fn resolve(&self, cli_arg: Option<&Path>) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            return Some(path.to_path_buf());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(&self.env_var_name) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Per-user config directory
        self.default_config_path().filter(|path| path.exists())
    }

    /// Per-user configuration file location for this application
    pub fn default_config_path(&self) -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(&self.app_name).join("config.toml"))
    }
}

/// Load a TOML configuration, degrading to defaults when the file is absent
///
/// # Errors
///
/// Returns [`Error::Toml`] when the file exists but cannot be parsed, and
/// [`Error::Io`] when it exists but cannot be read.
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        info!("No configuration file found, using compiled defaults");
        return Ok(T::default());
    };

    if !path.exists() {
        warn!(
            "Configuration file {} does not exist, using compiled defaults",
            path.display()
        );
        return Ok(T::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config = toml::from_str(&content)?;
    info!("Loaded configuration from {}", path.display());
    Ok(config)
}

/// Validate that a value lies within an inclusive range
pub fn check_range<T>(name: &str, value: T, min: T, max: T) -> Result<T>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(Error::Config(format!(
            "{} must be between {} and {} (got {})",
            name, min, max, value
        )));
    }
    Ok(value)
}
