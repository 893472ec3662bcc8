//! Session-related type definitions
//!
//! Supporting types carried by session events.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Playback session state
///
/// - `Idle`: no connection, no sink
/// - `Active`: connected, a track is playing (or its successor is starting)
/// - `Draining`: queue ran dry, connection kept until the leave timer fires
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    #[default]
    Idle,
    Active,
    Draining,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Active => write!(f, "active"),
            SessionState::Draining => write!(f, "draining"),
        }
    }
}

/// Why a track was skipped automatically
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum FailureKind {
    /// The byte stream could not be opened or handed to the connection
    SourceAcquisition,
    /// The stream broke after playback had started
    StreamRuntime,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::SourceAcquisition => write!(f, "SourceAcquisition"),
            FailureKind::StreamRuntime => write!(f, "StreamRuntime"),
        }
    }
}

/// Track information for session events
///
/// `title` is only present when the track metadata was already resolved;
/// emitting an event never waits on a metadata lookup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrackInfo {
    /// Queue entry UUID (shared by clones of the same track)
    pub track_id: Uuid,
    /// Source locator (link) of the track
    pub locator: String,
    /// Resolved title, if known
    pub title: Option<String>,
}

impl TrackInfo {
    /// Name suitable for log lines and chat output
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.locator)
    }
}
