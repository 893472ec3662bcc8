//! Error types for jukebot
//!
//! Defines module-specific error types using thiserror for clear error propagation.
//!
//! Propagation policy:
//! - `Connection` and `Configuration` reach the caller
//! - `SourceAcquisition` and `StreamRuntime` are recovered inside the session
//!   (logged, reported as an event, queue advances)

use thiserror::Error;

/// Failure reported by a session host, connection, sink or stream provider
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// Joining or leaving a destination failed (network, permissions)
    #[error("voice connection failed: {0}")]
    Connect(String),

    /// The audio source could not be opened (bad or expired locator)
    #[error("audio source unavailable: {0}")]
    Source(String),

    /// The stream broke or was rejected by the connection
    #[error("audio stream failed: {0}")]
    Stream(String),
}

/// Failure reported by a track resolver
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No track matches the locator
    #[error("no track found for '{0}'")]
    NotFound(String),

    /// The locator could not be interpreted
    #[error("invalid locator '{0}'")]
    InvalidLocator(String),

    /// The lookup service failed
    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// Main error type for the playback session
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Join/leave failures, surfaced to the caller of `connect`
    #[error("Connection error: {0}")]
    Connection(String),

    /// Track locator invalid or stream unavailable
    #[error("Source acquisition error: {0}")]
    SourceAcquisition(String),

    /// Mid-playback stream failure
    #[error("Stream runtime error: {0}")]
    StreamRuntime(String),

    /// Operation not supported by this session variant
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The session task has shut down
    #[error("Session closed")]
    Closed,
}

impl From<HostError> for SessionError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Connect(msg) => SessionError::Connection(msg),
            HostError::Source(msg) => SessionError::SourceAcquisition(msg),
            HostError::Stream(msg) => SessionError::StreamRuntime(msg),
        }
    }
}

/// Convenience Result type using the session error
pub type Result<T> = std::result::Result<T, SessionError>;
