//! Common error types for jukebot

use thiserror::Error;

/// Common result type for jukebot operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types shared by the jukebot crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed TOML configuration file
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
