//! Read-only session snapshot
//!
//! The session task is the only writer; handles and status renderers read a
//! consistent copy through the shared lock.

use crate::host::Destination;
use crate::track::Track;
use jukebot_common::events::SessionState;
use std::time::Duration;
use tokio::time::Instant;

/// Playback position sampled from the sink
///
/// Between status ticks the position is extrapolated from the sample time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackPosition {
    /// Elapsed time reported by the sink at `sampled_at`
    pub base: Duration,
    pub sampled_at: Instant,
}

impl PlaybackPosition {
    pub fn new(base: Duration) -> Self {
        Self {
            base,
            sampled_at: Instant::now(),
        }
    }

    /// Position extrapolated to now
    pub fn elapsed(&self) -> Duration {
        self.base + self.sampled_at.elapsed()
    }
}

/// Snapshot of everything observable about a session
#[derive(Debug, Clone, Default)]
pub struct SessionView {
    pub state: SessionState,
    pub current: Option<Track>,
    /// Tracks waiting behind the current one, in play order
    pub queue: Vec<Track>,
    /// 0.0-1.0
    pub volume: f32,
    pub destination: Option<Destination>,
    /// Set while a sink is live
    pub position: Option<PlaybackPosition>,
}

impl SessionView {
    pub fn new(volume: f32) -> Self {
        Self {
            volume,
            ..Default::default()
        }
    }

    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    pub fn is_connected(&self) -> bool {
        self.destination.is_some()
    }

    /// Seconds played of the current track, 0 when nothing is playing
    pub fn elapsed_seconds(&self) -> f64 {
        self.position
            .map(|position| position.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}
