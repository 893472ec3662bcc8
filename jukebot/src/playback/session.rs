//! Playback session handle
//!
//! [`PlaybackSession`] is a cheap, cloneable handle to a session task. Every
//! mutating operation is sent to the task as a [`SessionCommand`] and
//! completes once the task has processed it, including the start of the next
//! track. Queries read the shared [`SessionView`] without involving the task.

use super::discipline::QueueDiscipline;
use super::task::SessionTask;
use super::view::SessionView;
use crate::error::{Result, SessionError};
use crate::host::{Destination, SessionHost, StreamProvider};
use crate::track::Track;
use jukebot_common::events::{EventBus, SessionEvent, SessionState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tracing::info;
use uuid::Uuid;

/// Session tuning
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// How long an idle connection is kept after the queue empties
    pub leave_delay: Duration,
    /// Status refresh period while active (zero disables the ticker)
    pub status_interval: Duration,
    /// Initial volume (0.0-1.0)
    pub default_volume: f32,
    /// Broadcast buffer for event subscribers
    pub event_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            leave_delay: Duration::from_secs(60),
            status_interval: Duration::from_secs(5),
            default_volume: 0.1,
            event_capacity: 100,
        }
    }
}

/// Requests processed by the session task
pub(super) enum SessionCommand {
    Connect {
        destination: Destination,
        reply: oneshot::Sender<Result<()>>,
    },
    Enqueue {
        tracks: Vec<Track>,
        reply: oneshot::Sender<()>,
    },
    Skip {
        reply: oneshot::Sender<()>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    SetVolume {
        volume: f32,
        reply: oneshot::Sender<f32>,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// Handle to a running playback session
#[derive(Clone)]
pub struct PlaybackSession {
    id: Uuid,
    tx: mpsc::UnboundedSender<SessionCommand>,
    view: Arc<RwLock<SessionView>>,
    events: EventBus,
    supports_bulk: bool,
    discipline: &'static str,
}

impl PlaybackSession {
    /// Spawn a session task on the current runtime
    pub fn spawn(
        host: Arc<dyn SessionHost>,
        streams: Arc<dyn StreamProvider>,
        discipline: Box<dyn QueueDiscipline>,
        config: SessionConfig,
    ) -> Self {
        let id = Uuid::new_v4();
        let events = EventBus::new(config.event_capacity.max(1));
        let view = Arc::new(RwLock::new(SessionView::new(clamp_volume(config.default_volume))));
        let (tx, rx) = mpsc::unbounded_channel();
        let supports_bulk = discipline.supports_bulk_enqueue();
        let discipline_name = discipline.name();

        info!(session_id = %id, discipline = discipline_name, "Starting playback session");

        let task = SessionTask::new(
            id,
            host,
            streams,
            discipline,
            &config,
            events.clone(),
            Arc::clone(&view),
            rx,
        );
        tokio::spawn(task.run());

        Self {
            id,
            tx,
            view,
            events,
            supports_bulk,
            discipline: discipline_name,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the queue discipline
    pub fn discipline(&self) -> &'static str {
        self.discipline
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> SessionCommand) -> Result<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Join `destination`, moving the session if it is connected elsewhere
    ///
    /// Starts playback when tracks are waiting. Fails with
    /// [`SessionError::Connection`] if the host refuses the join; the queue is
    /// kept and the session is left idle.
    pub async fn connect(&self, destination: Destination) -> Result<()> {
        self.request(|reply| SessionCommand::Connect { destination, reply })
            .await?
    }

    /// Append a track; starts playback if the session is connected and idle
    pub async fn enqueue(&self, track: Track) -> Result<()> {
        self.request(|reply| SessionCommand::Enqueue {
            tracks: vec![track],
            reply,
        })
        .await
    }

    /// Append several tracks in order
    pub async fn enqueue_many(&self, tracks: Vec<Track>) -> Result<()> {
        if !self.supports_bulk {
            return Err(SessionError::Configuration(format!(
                "bulk enqueue is not supported by the {} queue",
                self.discipline
            )));
        }
        self.request(|reply| SessionCommand::Enqueue { tracks, reply })
            .await
    }

    /// End the current track and advance; no-op when nothing is playing
    pub async fn skip(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Skip { reply }).await
    }

    /// Clear the queue and end the current track
    pub async fn stop(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Stop { reply }).await
    }

    /// Set the volume, clamped to 0.0-1.0; returns the applied value
    pub async fn set_volume(&self, volume: f32) -> Result<f32> {
        let volume = clamp_volume(volume);
        self.request(|reply| SessionCommand::SetVolume { volume, reply })
            .await
    }

    /// Stop playback, leave the destination and end the session task
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|reply| SessionCommand::Shutdown { reply }).await
    }

    /// Copy of the full session view
    pub async fn view(&self) -> SessionView {
        self.view.read().await.clone()
    }

    /// Tracks waiting behind the current one
    pub async fn queue_snapshot(&self) -> Vec<Track> {
        self.view.read().await.queue.clone()
    }

    pub async fn current_track(&self) -> Option<Track> {
        self.view.read().await.current.clone()
    }

    /// Seconds played of the current track
    pub async fn elapsed_seconds(&self) -> f64 {
        self.view.read().await.elapsed_seconds()
    }

    pub async fn state(&self) -> SessionState {
        self.view.read().await.state
    }

    pub async fn is_active(&self) -> bool {
        self.view.read().await.is_active()
    }

    pub async fn is_connected(&self) -> bool {
        self.view.read().await.is_connected()
    }

    pub async fn volume(&self) -> f32 {
        self.view.read().await.volume
    }

    pub async fn destination(&self) -> Option<Destination> {
        self.view.read().await.destination.clone()
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Register a handler run synchronously on the session task for every event
    pub fn on_event<F>(&self, handler: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.events.add_handler(handler);
    }
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("id", &self.id)
            .field("discipline", &self.discipline)
            .finish()
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_volume() {
        assert_eq!(clamp_volume(1.5), 1.0);
        assert_eq!(clamp_volume(-0.2), 0.0);
        assert_eq!(clamp_volume(f32::NAN), 0.0);
        assert_eq!(clamp_volume(0.35), 0.35);
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.leave_delay, Duration::from_secs(60));
        assert!(config.default_volume > 0.0 && config.default_volume <= 1.0);
    }
}
