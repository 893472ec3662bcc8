//! Event types for the playback session
//!
//! Provides the session event definitions and the EventBus that delivers them.

mod session_types;

pub use session_types::{FailureKind, SessionState, TrackInfo};

use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Session lifecycle events
///
/// Events are emitted by the session task in the order the corresponding
/// transitions happen and can be serialized for logging or remote display.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    /// Session went from not playing to playing
    ///
    /// Triggers:
    /// - Status display: create the now-playing message
    /// - Reaction controls: attach media reactions
    Started {
        /// Session that started playing
        session_id: Uuid,
        /// Track that started the session
        track: TrackInfo,
        /// When playback started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Something visible changed (track, queue, volume) or the periodic
    /// status tick fired
    Updated {
        /// Session that changed
        session_id: Uuid,
        /// State at the time of the update
        state: SessionState,
        /// Number of tracks waiting behind the current one
        queue_len: usize,
        /// When the update happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Session ran out of tracks (or was stopped) and is draining
    Stopped {
        /// Session that stopped
        session_id: Uuid,
        /// When playback stopped
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A track was skipped because it could not be played
    ///
    /// The surrounding system routes this to chat output so the requester
    /// knows why the track disappeared.
    TrackFailed {
        /// Session that skipped the track
        session_id: Uuid,
        /// Track that failed
        track: TrackInfo,
        /// Failure category
        kind: FailureKind,
        /// Human-readable failure reason
        reason: String,
        /// When the failure was detected
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Leave timer fired and the connection was released
    Disconnected {
        /// Session that disconnected
        session_id: Uuid,
        /// Destination that was left
        destination: String,
        /// When the connection was released
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SessionEvent {
    /// Event type name (matches the serialized `type` tag)
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Started { .. } => "Started",
            SessionEvent::Updated { .. } => "Updated",
            SessionEvent::Stopped { .. } => "Stopped",
            SessionEvent::TrackFailed { .. } => "TrackFailed",
            SessionEvent::Disconnected { .. } => "Disconnected",
        }
    }

    /// Session the event belongs to
    pub fn session_id(&self) -> Uuid {
        match self {
            SessionEvent::Started { session_id, .. }
            | SessionEvent::Updated { session_id, .. }
            | SessionEvent::Stopped { session_id, .. }
            | SessionEvent::TrackFailed { session_id, .. }
            | SessionEvent::Disconnected { session_id, .. } => *session_id,
        }
    }
}

/// Synchronous event handler
///
/// Handlers run on the emitting task, before the event is broadcast, so they
/// observe events strictly in emission order. They must not block.
pub type EventHandler = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for session events
///
/// Two delivery paths:
/// - **Handlers** registered with [`EventBus::add_handler`] are invoked
///   synchronously by the emitter
/// - **Subscribers** obtained with [`EventBus::subscribe`] receive events via
///   tokio::broadcast (non-blocking publish, lagged detection for slow readers)
///
/// # Examples
///
/// ```
/// use jukebot_common::events::{EventBus, SessionEvent};
/// use uuid::Uuid;
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(SessionEvent::Stopped {
///     session_id: Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert_eq!(rx.try_recv().unwrap().event_type(), "Stopped");
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
    handlers: Arc<RwLock<Vec<EventHandler>>>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            handlers: Arc::new(RwLock::new(Vec::new())),
            capacity,
        }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Register a synchronous handler for all future events
    pub fn add_handler<F>(&self, handler: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        let mut handlers = match self.handlers.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        handlers.push(Arc::new(handler));
    }

    /// Emit an event to all handlers and subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one broadcast subscriber exists.
    /// Returns `Err` if no subscribers are listening (handlers still ran).
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.run_handlers(&event);
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SessionEvent) {
        let _ = self.emit(event);
    }

    /// Get the current number of broadcast subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the number of registered synchronous handlers
    pub fn handler_count(&self) -> usize {
        match self.handlers.read() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn run_handlers(&self, event: &SessionEvent) {
        // Snapshot so a handler may register another handler without deadlocking
        let handlers: Vec<EventHandler> = match self.handlers.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        for handler in handlers {
            handler(event);
        }
    }
}
