//! Session host interfaces
//!
//! The playback session never talks to the chat platform directly. It goes
//! through these seams:
//! - [`SessionHost`] joins a voice [`Destination`] and returns a [`Connection`]
//! - [`StreamProvider`] opens the byte stream for a track
//! - [`Connection::send_audio`] turns a stream into a live [`Sink`]
//! - the sink reports its end or failure through the [`SinkNotifier`] it was
//!   given, never by calling back into the session
//!
//! [`simulated`] provides an in-process implementation used by the binary.

pub mod simulated;

use crate::error::HostError;
use crate::track::Track;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncRead;
use tokio::sync::mpsc;

/// Opaque audio byte stream handed from the provider to the connection
pub type AudioStream = Box<dyn AsyncRead + Send + Unpin>;

/// A joinable voice destination (voice channel)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Destination {
    /// Platform id of the destination
    pub id: String,
    /// Display name
    pub name: String,
}

impl Destination {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Destination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// Why a sink stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The stream played to its end
    Natural,
    /// The session asked the sink to stop (skip, stop, reconnect)
    Forced,
}

/// Lifecycle signal reported by a sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSignal {
    Ended(EndReason),
    Error(HostError),
}

/// A sink signal tagged with the sink that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkReport {
    pub sink_id: u64,
    pub signal: SinkSignal,
}

/// Reporting handle given to a connection together with the stream
///
/// Reports from a sink the session no longer considers current are ignored,
/// so hosts may report freely (including after a forced end).
#[derive(Debug, Clone)]
pub struct SinkNotifier {
    sink_id: u64,
    tx: mpsc::UnboundedSender<SinkReport>,
}

impl SinkNotifier {
    pub fn new(sink_id: u64, tx: mpsc::UnboundedSender<SinkReport>) -> Self {
        Self { sink_id, tx }
    }

    /// Id of the sink this notifier reports for
    pub fn sink_id(&self) -> u64 {
        self.sink_id
    }

    /// Report that the sink ended
    pub fn ended(&self, reason: EndReason) {
        self.send(SinkSignal::Ended(reason));
    }

    /// Report a stream failure during playback
    pub fn error(&self, err: HostError) {
        self.send(SinkSignal::Error(err));
    }

    fn send(&self, signal: SinkSignal) {
        // Receiver gone means the session shut down; nothing left to notify
        let _ = self.tx.send(SinkReport {
            sink_id: self.sink_id,
            signal,
        });
    }
}

/// Joins voice destinations
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Join a destination
    async fn join(&self, destination: &Destination) -> Result<Box<dyn Connection>, HostError>;
}

/// A joined voice destination
#[async_trait]
pub trait Connection: Send + Sync {
    /// Destination this connection is joined to
    fn destination(&self) -> &Destination;

    /// Start sending a stream; the returned sink reports through `notifier`
    async fn send_audio(
        &self,
        stream: AudioStream,
        notifier: SinkNotifier,
    ) -> Result<Box<dyn Sink>, HostError>;

    /// Leave the destination
    async fn leave(&self) -> Result<(), HostError>;
}

/// The live handle of audio being sent to a connection
pub trait Sink: Send + Sync {
    /// Stop immediately, reporting `reason`
    fn force_end(&mut self, reason: EndReason);

    /// Stop gracefully
    fn end(&mut self);

    /// Apply volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32);

    /// Time spent playing so far
    fn elapsed(&self) -> Duration;
}

/// Opens byte streams for tracks
#[async_trait]
pub trait StreamProvider: Send + Sync {
    async fn open(&self, track: &Track) -> Result<AudioStream, HostError>;
}
