//! Queue operations and track transitions

use super::{ActiveSink, SessionTask};
use crate::error::HostError;
use crate::host::{EndReason, SinkNotifier, SinkReport, SinkSignal};
use crate::playback::discipline::Advance;
use crate::playback::view::PlaybackPosition;
use crate::track::Track;
use jukebot_common::events::{FailureKind, SessionEvent, SessionState};
use std::time::Duration;
use tracing::{debug, info, warn};

impl SessionTask {
    pub(super) async fn enqueue(&mut self, tracks: Vec<Track>) {
        if tracks.is_empty() {
            return;
        }
        debug!(session_id = %self.id, count = tracks.len(), "Enqueue");
        self.queue.extend(tracks);

        match self.state {
            SessionState::Draining => {
                self.timers.cancel_leave();
                self.advance(None, Advance::Start).await;
            }
            // Active: plays later. Idle: waits for connect
            SessionState::Active | SessionState::Idle => {
                self.publish_view().await;
                self.emit_updated();
            }
        }
    }

    pub(super) async fn skip(&mut self) {
        if self.state != SessionState::Active {
            debug!(session_id = %self.id, "Nothing to skip");
            return;
        }
        let previous = self.release_sink();
        if let Some(track) = &previous {
            info!(session_id = %self.id, locator = track.locator(), "Skipping track");
        }
        self.advance(previous, Advance::Skipped).await;
    }

    pub(super) async fn stop(&mut self) {
        info!(session_id = %self.id, cleared = self.queue.len(), "Stopping playback");
        self.queue.clear();
        self.release_sink();

        if self.connection.is_none() {
            self.publish_view().await;
            self.emit_updated();
            return;
        }
        self.enter_draining().await;
    }

    pub(super) async fn set_volume(&mut self, volume: f32) -> f32 {
        self.volume = volume;
        if let Some(active) = self.sink.as_mut() {
            active.sink.set_volume(volume);
        }
        debug!(session_id = %self.id, volume, "Volume set");
        self.publish_view().await;
        self.emit_updated();
        volume
    }

    /// Forget the live sink, then ask it to stop
    ///
    /// The sink is detached before it is force-ended, so its end report no
    /// longer matches the current sink id and cannot advance the queue a
    /// second time. Returns the track that was playing.
    pub(super) fn release_sink(&mut self) -> Option<Track> {
        if let Some(mut active) = self.sink.take() {
            debug!(session_id = %self.id, sink_id = active.id, "Force-ending sink");
            active.sink.force_end(EndReason::Forced);
        }
        self.position = None;
        self.current.take()
    }

    /// Start the next track chosen by the discipline
    ///
    /// Tracks that fail to start are reported and skipped until one starts or
    /// the discipline has nothing left, in which case the session drains.
    pub(super) async fn advance(&mut self, mut previous: Option<Track>, mut cause: Advance) {
        loop {
            let Some(track) = self
                .discipline
                .next_track(&mut self.queue, previous.as_ref(), cause)
            else {
                self.enter_draining().await;
                return;
            };

            match self.start_sink(&track).await {
                Ok(active) => {
                    let was_active = self.state == SessionState::Active;
                    info!(
                        session_id = %self.id,
                        sink_id = active.id,
                        locator = track.locator(),
                        queued = self.queue.len(),
                        "Now playing"
                    );
                    self.current = Some(track.clone());
                    self.sink = Some(active);
                    self.position = Some(PlaybackPosition::new(Duration::ZERO));
                    self.state = SessionState::Active;
                    self.timers.cancel_leave();
                    self.timers.start_ticker();
                    self.publish_view().await;

                    if !was_active {
                        self.emit(SessionEvent::Started {
                            session_id: self.id,
                            track: track.info(),
                            timestamp: chrono::Utc::now(),
                        });
                    }
                    self.emit_updated();
                    return;
                }
                Err(e) => {
                    self.report_failure(&track, FailureKind::SourceAcquisition, e.to_string());
                    previous = Some(track);
                    cause = Advance::Failed;
                }
            }
        }
    }

    /// Open the stream for `track` and hand it to the connection
    async fn start_sink(&mut self, track: &Track) -> Result<ActiveSink, HostError> {
        let Some(connection) = self.connection.as_ref() else {
            return Err(HostError::Connect("not connected".to_string()));
        };
        let stream = self.streams.open(track).await?;

        self.next_sink_id += 1;
        let id = self.next_sink_id;
        let notifier = SinkNotifier::new(id, self.sink_tx.clone());
        let mut sink = connection.send_audio(stream, notifier).await?;
        sink.set_volume(self.volume);
        Ok(ActiveSink { id, sink })
    }

    /// No more tracks: keep the connection and arm the leave timer
    pub(super) async fn enter_draining(&mut self) {
        let was_active = self.state == SessionState::Active;
        self.sink = None;
        self.current = None;
        self.position = None;
        self.timers.stop_ticker();

        if self.connection.is_some() {
            self.state = SessionState::Draining;
            self.timers.arm_leave();
        } else {
            self.state = SessionState::Idle;
        }
        self.publish_view().await;

        if was_active {
            info!(session_id = %self.id, "Queue finished, draining");
            self.emit(SessionEvent::Stopped {
                session_id: self.id,
                timestamp: chrono::Utc::now(),
            });
        } else {
            self.emit_updated();
        }
    }

    pub(super) async fn handle_sink_report(&mut self, report: SinkReport) {
        let is_current = self
            .sink
            .as_ref()
            .is_some_and(|active| active.id == report.sink_id);
        if !is_current {
            debug!(
                session_id = %self.id,
                sink_id = report.sink_id,
                signal = ?report.signal,
                "Ignoring report from detached sink"
            );
            return;
        }

        // The sink already stopped on its own; drop it without ending it again
        self.sink = None;
        self.position = None;
        let previous = self.current.take();

        match report.signal {
            SinkSignal::Ended(EndReason::Natural) => {
                debug!(session_id = %self.id, sink_id = report.sink_id, "Track finished");
                self.advance(previous, Advance::Finished).await;
            }
            SinkSignal::Ended(EndReason::Forced) => {
                // The session detaches sinks before forcing them, so this came
                // from the host (e.g. the bot was moved or muted server-side)
                warn!(session_id = %self.id, sink_id = report.sink_id, "Sink ended by host");
                self.advance(previous, Advance::Skipped).await;
            }
            SinkSignal::Error(e) => {
                if let Some(track) = &previous {
                    self.report_failure(track, FailureKind::StreamRuntime, e.to_string());
                }
                self.advance(previous, Advance::Failed).await;
            }
        }
    }
}
