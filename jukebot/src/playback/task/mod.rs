//! Session task
//!
//! The single owner of all mutable session state. Commands from handles,
//! sink reports and timer fires are all delivered as messages and processed
//! one at a time, so transitions never interleave.
//!
//! **Module Structure:**
//! - `mod.rs`: task state, message loop, view publishing, event emission
//! - `queue.rs`: enqueue, skip, stop, volume, advancing and sink reports
//! - `connection.rs`: connect, leave-timer handling, shutdown

mod connection;
mod queue;

use super::discipline::QueueDiscipline;
use super::session::{SessionCommand, SessionConfig};
use super::timers::{TimerFired, TimerKind, Timers};
use super::view::{PlaybackPosition, SessionView};
use crate::host::{Connection, SessionHost, Sink, SinkReport, StreamProvider};
use crate::track::Track;
use jukebot_common::events::{EventBus, FailureKind, SessionEvent, SessionState};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// The sink currently playing, tagged with the id its reports carry
struct ActiveSink {
    id: u64,
    sink: Box<dyn Sink>,
}

pub(super) struct SessionTask {
    id: Uuid,
    host: Arc<dyn SessionHost>,
    streams: Arc<dyn StreamProvider>,
    discipline: Box<dyn QueueDiscipline>,
    events: EventBus,
    view: Arc<RwLock<SessionView>>,

    state: SessionState,
    queue: VecDeque<Track>,
    /// Set together with `sink`
    current: Option<Track>,
    sink: Option<ActiveSink>,
    position: Option<PlaybackPosition>,
    connection: Option<Box<dyn Connection>>,
    volume: f32,
    next_sink_id: u64,
    timers: Timers,

    commands: mpsc::UnboundedReceiver<SessionCommand>,
    sink_tx: mpsc::UnboundedSender<SinkReport>,
    sink_rx: mpsc::UnboundedReceiver<SinkReport>,
    timer_rx: mpsc::UnboundedReceiver<TimerFired>,
}

impl SessionTask {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn new(
        id: Uuid,
        host: Arc<dyn SessionHost>,
        streams: Arc<dyn StreamProvider>,
        discipline: Box<dyn QueueDiscipline>,
        config: &SessionConfig,
        events: EventBus,
        view: Arc<RwLock<SessionView>>,
        commands: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> Self {
        let (sink_tx, sink_rx) = mpsc::unbounded_channel();
        let (timer_tx, timer_rx) = mpsc::unbounded_channel();
        let volume = config.default_volume.clamp(0.0, 1.0);
        Self {
            id,
            host,
            streams,
            discipline,
            events,
            view,
            state: SessionState::Idle,
            queue: VecDeque::new(),
            current: None,
            sink: None,
            position: None,
            connection: None,
            volume,
            next_sink_id: 0,
            timers: Timers::new(timer_tx, config.leave_delay, config.status_interval),
            commands,
            sink_tx,
            sink_rx,
            timer_rx,
        }
    }

    /// Process messages until shut down or every handle is dropped
    pub(super) async fn run(mut self) {
        loop {
            // Sink reports and timer fires already queued are handled before
            // the next command
            tokio::select! {
                biased;
                Some(report) = self.sink_rx.recv() => self.handle_sink_report(report).await,
                Some(fired) = self.timer_rx.recv() => self.handle_timer(fired).await,
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Shutdown { reply }) => {
                        self.shutdown().await;
                        let _ = reply.send(());
                        break;
                    }
                    Some(command) => self.handle_command(command).await,
                    None => {
                        debug!(session_id = %self.id, "All session handles dropped");
                        self.shutdown().await;
                        break;
                    }
                },
            }
        }
        info!(session_id = %self.id, "Playback session ended");
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::Connect { destination, reply } => {
                let result = self.connect(destination).await;
                let _ = reply.send(result);
            }
            SessionCommand::Enqueue { tracks, reply } => {
                self.enqueue(tracks).await;
                let _ = reply.send(());
            }
            SessionCommand::Skip { reply } => {
                self.skip().await;
                let _ = reply.send(());
            }
            SessionCommand::Stop { reply } => {
                self.stop().await;
                let _ = reply.send(());
            }
            SessionCommand::SetVolume { volume, reply } => {
                let applied = self.set_volume(volume).await;
                let _ = reply.send(applied);
            }
            // Handled by the loop
            SessionCommand::Shutdown { reply } => {
                let _ = reply.send(());
            }
        }
    }

    async fn handle_timer(&mut self, fired: TimerFired) {
        match fired.kind {
            TimerKind::Leave => {
                if !self.timers.take_leave(fired.generation) {
                    debug!(generation = fired.generation, "Ignoring cancelled leave timer");
                    return;
                }
                self.leave_after_quiescence().await;
            }
            TimerKind::StatusTick => {
                if !self.timers.is_live_tick(fired.generation) || self.state != SessionState::Active {
                    return;
                }
                if let Some(active) = &self.sink {
                    self.position = Some(PlaybackPosition::new(active.sink.elapsed()));
                }
                self.publish_view().await;
                self.emit_updated();
            }
        }
    }

    /// Copy the task state into the shared view
    async fn publish_view(&self) {
        let mut view = self.view.write().await;
        view.state = self.state;
        view.current = self.current.clone();
        view.queue = self.queue.iter().cloned().collect();
        view.volume = self.volume;
        view.destination = self
            .connection
            .as_ref()
            .map(|connection| connection.destination().clone());
        view.position = self.position;
    }

    fn emit(&self, event: SessionEvent) {
        debug!(session_id = %self.id, event = event.event_type(), "Session event");
        self.events.emit_lossy(event);
    }

    fn emit_updated(&self) {
        self.emit(SessionEvent::Updated {
            session_id: self.id,
            state: self.state,
            queue_len: self.queue.len(),
            timestamp: chrono::Utc::now(),
        });
    }

    fn report_failure(&self, track: &Track, kind: FailureKind, reason: String) {
        warn!(
            session_id = %self.id,
            locator = track.locator(),
            ?kind,
            "Track failed: {}",
            reason
        );
        self.emit(SessionEvent::TrackFailed {
            session_id: self.id,
            track: track.info(),
            kind,
            reason,
            timestamp: chrono::Utc::now(),
        });
    }
}
