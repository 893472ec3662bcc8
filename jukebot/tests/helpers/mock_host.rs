//! Scriptable session host
//!
//! Records every join, leave, stream open and sink so tests can assert on
//! them, and lets tests end or break sinks on demand.

use async_trait::async_trait;
use jukebot::error::HostError;
use jukebot::host::{
    AudioStream, Connection, Destination, EndReason, SessionHost, Sink, SinkNotifier,
    StreamProvider,
};
use jukebot::track::Track;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::time::Instant;

/// Shared view of one sink the host created
#[derive(Debug)]
pub struct SinkHandle {
    pub locator: String,
    pub destination: Destination,
    notifier: SinkNotifier,
    volume: Mutex<f32>,
    forced: AtomicBool,
    started: Instant,
}

impl SinkHandle {
    pub fn id(&self) -> u64 {
        self.notifier.sink_id()
    }

    pub fn volume(&self) -> f32 {
        *self.volume.lock().unwrap()
    }

    /// Whether the session force-ended this sink
    pub fn was_forced(&self) -> bool {
        self.forced.load(Ordering::SeqCst)
    }

    /// Simulate the stream playing to its end
    pub fn finish(&self) {
        self.notifier.ended(EndReason::Natural);
    }

    /// Simulate a mid-stream failure
    pub fn break_stream(&self, reason: &str) {
        self.notifier.error(HostError::Stream(reason.to_string()));
    }

    /// Simulate the platform stopping playback on its own
    pub fn host_force_end(&self) {
        self.notifier.ended(EndReason::Forced);
    }
}

#[derive(Debug, Default)]
struct HostLog {
    /// Locators the connection refuses to send
    refused_audio: HashSet<String>,
    joins: Vec<Destination>,
    leaves: Vec<Destination>,
    opens: Vec<String>,
    sinks: Vec<Arc<SinkHandle>>,
}

/// Host, connection factory and stream provider in one
#[derive(Debug, Default)]
pub struct MockHost {
    log: Arc<Mutex<HostLog>>,
    refuse_joins: AtomicBool,
    broken_locators: Mutex<HashSet<String>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following join fail
    pub fn refuse_joins(&self, refuse: bool) {
        self.refuse_joins.store(refuse, Ordering::SeqCst);
    }

    /// Make opening a stream for `locator` fail
    pub fn break_locator(&self, locator: &str) {
        self.broken_locators.lock().unwrap().insert(locator.to_string());
    }

    /// Make handing the stream for `locator` to the connection fail
    pub fn refuse_audio(&self, locator: &str) {
        self.log.lock().unwrap().refused_audio.insert(locator.to_string());
    }

    pub fn joins(&self) -> Vec<Destination> {
        self.log.lock().unwrap().joins.clone()
    }

    pub fn leaves(&self) -> Vec<Destination> {
        self.log.lock().unwrap().leaves.clone()
    }

    /// Locators of every stream open attempt, in order
    pub fn opens(&self) -> Vec<String> {
        self.log.lock().unwrap().opens.clone()
    }

    pub fn sinks(&self) -> Vec<Arc<SinkHandle>> {
        self.log.lock().unwrap().sinks.clone()
    }

    pub fn sink(&self, index: usize) -> Arc<SinkHandle> {
        Arc::clone(&self.log.lock().unwrap().sinks[index])
    }

    pub fn last_sink(&self) -> Arc<SinkHandle> {
        let log = self.log.lock().unwrap();
        Arc::clone(log.sinks.last().expect("no sink was created"))
    }

    /// Number of sinks created so far
    pub fn sink_count(&self) -> usize {
        self.log.lock().unwrap().sinks.len()
    }
}

#[async_trait]
impl SessionHost for MockHost {
    async fn join(&self, destination: &Destination) -> Result<Box<dyn Connection>, HostError> {
        if self.refuse_joins.load(Ordering::SeqCst) {
            return Err(HostError::Connect("missing permissions".to_string()));
        }
        self.log.lock().unwrap().joins.push(destination.clone());
        Ok(Box::new(MockConnection {
            destination: destination.clone(),
            log: Arc::clone(&self.log),
        }))
    }
}

/// Records into the log of the host that created it
struct MockConnection {
    destination: Destination,
    log: Arc<Mutex<HostLog>>,
}

#[async_trait]
impl Connection for MockConnection {
    fn destination(&self) -> &Destination {
        &self.destination
    }

    async fn send_audio(
        &self,
        mut stream: AudioStream,
        notifier: SinkNotifier,
    ) -> Result<Box<dyn Sink>, HostError> {
        // Mock streams carry their locator as content
        let mut locator = String::new();
        stream
            .read_to_string(&mut locator)
            .await
            .map_err(|e| HostError::Stream(e.to_string()))?;
        if self.log.lock().unwrap().refused_audio.contains(&locator) {
            return Err(HostError::Stream(format!("{} was rejected by the connection", locator)));
        }

        let handle = Arc::new(SinkHandle {
            locator,
            destination: self.destination.clone(),
            notifier,
            volume: Mutex::new(1.0),
            forced: AtomicBool::new(false),
            started: Instant::now(),
        });
        self.log.lock().unwrap().sinks.push(Arc::clone(&handle));
        Ok(Box::new(MockSink { handle }))
    }

    async fn leave(&self) -> Result<(), HostError> {
        self.log.lock().unwrap().leaves.push(self.destination.clone());
        Ok(())
    }
}

struct MockSink {
    handle: Arc<SinkHandle>,
}

impl Sink for MockSink {
    fn force_end(&mut self, reason: EndReason) {
        self.handle.forced.store(true, Ordering::SeqCst);
        // Real hosts report the forced end back; the session must ignore it
        self.handle.notifier.ended(reason);
    }

    fn end(&mut self) {
        self.handle.notifier.ended(EndReason::Natural);
    }

    fn set_volume(&mut self, volume: f32) {
        *self.handle.volume.lock().unwrap() = volume;
    }

    fn elapsed(&self) -> Duration {
        self.handle.started.elapsed()
    }
}

#[async_trait]
impl StreamProvider for MockHost {
    async fn open(&self, track: &Track) -> Result<AudioStream, HostError> {
        let locator = track.locator().to_string();
        self.log.lock().unwrap().opens.push(locator.clone());
        if self.broken_locators.lock().unwrap().contains(&locator) {
            return Err(HostError::Source(format!("{} is unavailable", locator)));
        }
        Ok(Box::new(std::io::Cursor::new(locator.into_bytes())))
    }
}
