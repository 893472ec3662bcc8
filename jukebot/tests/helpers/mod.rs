//! Test helper modules for jukebot integration tests
//!
//! Provides reusable test infrastructure components:
//! - MockHost: scriptable host, connection and stream provider
//! - Harness: a session wired to a MockHost plus an event receiver

#![allow(dead_code)]

pub mod mock_host;

pub use mock_host::{MockHost, SinkHandle};

use jukebot::host::Destination;
use jukebot::playback::{FifoQueue, PlaybackSession, QueueDiscipline, SessionConfig};
use jukebot::track::Track;
use jukebot_common::events::SessionEvent;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::timeout;

/// Leave delay used by test sessions
pub const LEAVE_DELAY: Duration = Duration::from_secs(30);

pub struct Harness {
    pub session: PlaybackSession,
    pub host: Arc<MockHost>,
    pub events: broadcast::Receiver<SessionEvent>,
}

impl Harness {
    /// FIFO session without a status ticker
    pub fn new() -> Self {
        Self::with(Box::new(FifoQueue), Duration::ZERO)
    }

    pub fn with(discipline: Box<dyn QueueDiscipline>, status_interval: Duration) -> Self {
        let host = MockHost::new();
        let session = PlaybackSession::spawn(
            host.clone(),
            host.clone(),
            discipline,
            SessionConfig {
                leave_delay: LEAVE_DELAY,
                status_interval,
                default_volume: 0.5,
                event_capacity: 256,
            },
        );
        let events = session.subscribe();
        Self {
            session,
            host,
            events,
        }
    }

    /// Events emitted so far, without waiting
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            events.push(event);
        }
        events
    }

    /// Wait for the next event matching `predicate`, returning the skipped ones too
    pub async fn wait_for<F>(&mut self, predicate: F) -> Vec<SessionEvent>
    where
        F: Fn(&SessionEvent) -> bool,
    {
        let mut seen = Vec::new();
        loop {
            let event = timeout(Duration::from_secs(120), self.events.recv())
                .await
                .expect("timed out waiting for session event")
                .expect("event channel closed");
            let done = predicate(&event);
            seen.push(event);
            if done {
                return seen;
            }
        }
    }

    /// Round-trip through the session task so queued reports are processed
    pub async fn sync(&self) {
        let volume = self.session.volume().await;
        self.session.set_volume(volume).await.unwrap();
    }
}

pub fn music_room() -> Destination {
    Destination::new("100", "Music")
}

pub fn lounge() -> Destination {
    Destination::new("200", "Lounge")
}

/// Resolved track with locator `mock://<name>`
pub fn track(name: &str) -> Track {
    Track::new(name, 180, locator(name))
}

pub fn locator(name: &str) -> String {
    format!("mock://{}", name)
}

pub fn count(events: &[SessionEvent], event_type: &str) -> usize {
    events
        .iter()
        .filter(|event| event.event_type() == event_type)
        .count()
}

pub fn is_type(event_type: &'static str) -> impl Fn(&SessionEvent) -> bool {
    move |event| event.event_type() == event_type
}
