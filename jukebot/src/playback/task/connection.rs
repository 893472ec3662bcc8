//! Connection lifecycle

use super::SessionTask;
use crate::error::{Result, SessionError};
use crate::host::Destination;
use crate::playback::discipline::Advance;
use jukebot_common::events::{SessionEvent, SessionState};
use tracing::{debug, error, info, warn};

impl SessionTask {
    /// Join `destination`, restarting the current track there if moving
    pub(super) async fn connect(&mut self, destination: Destination) -> Result<()> {
        if let Some(connection) = &self.connection {
            if connection.destination() == &destination {
                debug!(session_id = %self.id, %destination, "Already connected");
                return Ok(());
            }
        }

        self.timers.cancel_leave();
        let resume = self.release_sink();
        self.disconnect().await;

        match self.host.join(&destination).await {
            Ok(connection) => {
                info!(session_id = %self.id, %destination, "Connected");
                self.connection = Some(connection);
                if let Some(track) = resume {
                    self.queue.push_front(track);
                }
                if self.queue.is_empty() {
                    self.enter_draining().await;
                } else {
                    self.advance(None, Advance::Start).await;
                }
                Ok(())
            }
            Err(e) => {
                error!(session_id = %self.id, %destination, "Failed to join: {}", e);
                if let Some(track) = resume {
                    self.queue.push_front(track);
                }
                let was_active = self.state == SessionState::Active;
                self.state = SessionState::Idle;
                self.timers.cancel_all();
                self.publish_view().await;
                if was_active {
                    self.emit(SessionEvent::Stopped {
                        session_id: self.id,
                        timestamp: chrono::Utc::now(),
                    });
                } else {
                    self.emit_updated();
                }
                Err(SessionError::from(e))
            }
        }
    }

    /// Leave the current destination, if any
    ///
    /// Returns the destination that was left.
    async fn disconnect(&mut self) -> Option<Destination> {
        let connection = self.connection.take()?;
        let destination = connection.destination().clone();
        if let Err(e) = connection.leave().await {
            warn!(session_id = %self.id, %destination, "Leave failed: {}", e);
        }
        Some(destination)
    }

    /// The leave timer fired while draining
    pub(super) async fn leave_after_quiescence(&mut self) {
        if self.state != SessionState::Draining {
            debug!(session_id = %self.id, state = %self.state, "Leave timer fired outside draining");
            return;
        }
        let Some(destination) = self.disconnect().await else {
            return;
        };
        info!(session_id = %self.id, %destination, "Left after inactivity");
        self.state = SessionState::Idle;
        self.publish_view().await;
        self.emit(SessionEvent::Disconnected {
            session_id: self.id,
            destination: destination.to_string(),
            timestamp: chrono::Utc::now(),
        });
    }

    /// Stop playback and release the connection before the task exits
    pub(super) async fn shutdown(&mut self) {
        if let Some(mut active) = self.sink.take() {
            active.sink.end();
        }
        self.current = None;
        self.position = None;
        self.timers.cancel_all();
        let was_active = self.state == SessionState::Active;
        self.disconnect().await;
        self.state = SessionState::Idle;
        self.publish_view().await;
        if was_active {
            self.emit(SessionEvent::Stopped {
                session_id: self.id,
                timestamp: chrono::Utc::now(),
            });
        }
    }
}
