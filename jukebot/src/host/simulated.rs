//! In-process simulated voice host
//!
//! Used by the binary to exercise the full session lifecycle without a chat
//! platform. Streams are paced byte pipes whose length matches the track
//! duration (scaled by `time_scale`); the sink drains the pipe and reports a
//! natural end on EOF.

use super::{
    AudioStream, Connection, Destination, EndReason, SessionHost, Sink, SinkNotifier,
    StreamProvider,
};
use crate::error::HostError;
use crate::resolver::CatalogResolver;
use crate::track::Track;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Interval between paced chunks
const CHUNK_INTERVAL: Duration = Duration::from_millis(100);
const CHUNK_SIZE: usize = 4096;

/// Host that accepts any destination with a non-empty id
#[derive(Debug, Default, Clone)]
pub struct SimulatedHost;

#[async_trait]
impl SessionHost for SimulatedHost {
    async fn join(&self, destination: &Destination) -> Result<Box<dyn Connection>, HostError> {
        if destination.id.is_empty() {
            return Err(HostError::Connect("destination has no id".to_string()));
        }
        info!("Joined voice destination {}", destination);
        Ok(Box::new(SimulatedConnection {
            destination: destination.clone(),
        }))
    }
}

struct SimulatedConnection {
    destination: Destination,
}

#[async_trait]
impl Connection for SimulatedConnection {
    fn destination(&self) -> &Destination {
        &self.destination
    }

    async fn send_audio(
        &self,
        mut stream: AudioStream,
        notifier: SinkNotifier,
    ) -> Result<Box<dyn Sink>, HostError> {
        let task_notifier = notifier.clone();
        let task = tokio::spawn(async move {
            match tokio::io::copy(&mut stream, &mut tokio::io::sink()).await {
                Ok(bytes) => {
                    debug!(sink_id = task_notifier.sink_id(), bytes, "Stream drained");
                    task_notifier.ended(EndReason::Natural);
                }
                Err(e) => task_notifier.error(HostError::Stream(e.to_string())),
            }
        });
        Ok(Box::new(SimulatedSink {
            task: Some(task),
            notifier,
            started: Instant::now(),
            volume: 1.0,
        }))
    }

    async fn leave(&self) -> Result<(), HostError> {
        info!("Left voice destination {}", self.destination);
        Ok(())
    }
}

struct SimulatedSink {
    task: Option<JoinHandle<()>>,
    notifier: SinkNotifier,
    started: Instant,
    volume: f32,
}

impl SimulatedSink {
    fn halt(&mut self, reason: EndReason) {
        if let Some(task) = self.task.take() {
            task.abort();
            self.notifier.ended(reason);
        }
    }
}

impl Sink for SimulatedSink {
    fn force_end(&mut self, reason: EndReason) {
        self.halt(reason);
    }

    fn end(&mut self) {
        self.halt(EndReason::Natural);
    }

    fn set_volume(&mut self, volume: f32) {
        debug!(sink_id = self.notifier.sink_id(), volume, "Sink volume");
        self.volume = volume;
    }

    fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl Drop for SimulatedSink {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Stream provider backed by the catalog
///
/// Entries marked unavailable (and unknown locators) fail to open, which is
/// how a dead link behaves on the real platform.
#[derive(Debug, Clone)]
pub struct SimulatedStreamProvider {
    catalog: Arc<CatalogResolver>,
    time_scale: f64,
}

impl SimulatedStreamProvider {
    /// `time_scale` shortens (< 1.0) or stretches playback time
    pub fn new(catalog: Arc<CatalogResolver>, time_scale: f64) -> Self {
        Self {
            catalog,
            time_scale: time_scale.max(0.0),
        }
    }
}

#[async_trait]
impl StreamProvider for SimulatedStreamProvider {
    async fn open(&self, track: &Track) -> Result<AudioStream, HostError> {
        let entry = self
            .catalog
            .entry(track.locator())
            .ok_or_else(|| HostError::Source(format!("unknown locator {}", track.locator())))?;
        if !entry.available {
            return Err(HostError::Source(format!("{} is unavailable", entry.title)));
        }

        let play_time = Duration::try_from_secs_f64(entry.duration_seconds as f64 * self.time_scale)
            .map_err(|e| HostError::Source(format!("cannot pace {}: {}", entry.title, e)))?;
        let chunks = (play_time.as_millis() / CHUNK_INTERVAL.as_millis()).max(1);

        let (mut writer, reader) = tokio::io::duplex(CHUNK_SIZE * 2);
        tokio::spawn(async move {
            let chunk = [0u8; CHUNK_SIZE];
            for _ in 0..chunks {
                tokio::time::sleep(CHUNK_INTERVAL).await;
                if writer.write_all(&chunk).await.is_err() {
                    // Reader dropped: the sink was ended
                    return;
                }
            }
        });

        Ok(Box::new(reader))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{SinkReport, SinkSignal};
    use crate::resolver::CatalogEntry;
    use std::collections::BTreeMap;
    use tokio::sync::mpsc;

    fn provider() -> SimulatedStreamProvider {
        let catalog = CatalogResolver::new(
            vec![
                CatalogEntry {
                    title: "Short".into(),
                    duration_seconds: 1,
                    locator: "sim://short".into(),
                    available: true,
                },
                CatalogEntry {
                    title: "Dead".into(),
                    duration_seconds: 1,
                    locator: "sim://dead".into(),
                    available: false,
                },
            ],
            BTreeMap::new(),
        );
        SimulatedStreamProvider::new(Arc::new(catalog), 0.5)
    }

    #[tokio::test]
    async fn test_join_requires_destination_id() {
        let host = SimulatedHost;
        assert!(host.join(&Destination::new("", "nowhere")).await.is_err());
        let connection = host.join(&Destination::new("1", "Music")).await.unwrap();
        assert_eq!(connection.destination().name, "Music");
    }

    #[tokio::test]
    async fn test_unavailable_entry_fails_to_open() {
        let provider = provider();
        let dead = Track::new("Dead", 1, "sim://dead");
        assert!(matches!(provider.open(&dead).await, Err(HostError::Source(_))));
        let unknown = Track::new("?", 1, "sim://unknown");
        assert!(matches!(provider.open(&unknown).await, Err(HostError::Source(_))));
    }

    #[tokio::test]
    async fn test_unrepresentable_play_time_fails_to_open() {
        let catalog = provider().catalog;
        let endless = SimulatedStreamProvider::new(catalog, f64::INFINITY);
        let short = Track::new("Short", 1, "sim://short");
        assert!(matches!(endless.open(&short).await, Err(HostError::Source(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_sink_reports_natural_end() {
        let provider = provider();
        let connection = SimulatedHost
            .join(&Destination::new("1", "Music"))
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let stream = provider.open(&Track::new("Short", 1, "sim://short")).await.unwrap();
        let _sink = connection
            .send_audio(stream, SinkNotifier::new(3, tx))
            .await
            .unwrap();

        let report = rx.recv().await.unwrap();
        assert_eq!(
            report,
            SinkReport {
                sink_id: 3,
                signal: SinkSignal::Ended(EndReason::Natural)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_end_reports_forced_once() {
        let provider = provider();
        let connection = SimulatedHost
            .join(&Destination::new("1", "Music"))
            .await
            .unwrap();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let stream = provider.open(&Track::new("Short", 1, "sim://short")).await.unwrap();
        let mut sink = connection
            .send_audio(stream, SinkNotifier::new(4, tx))
            .await
            .unwrap();
        sink.force_end(EndReason::Forced);
        sink.force_end(EndReason::Forced);

        assert_eq!(rx.recv().await.unwrap().signal, SinkSignal::Ended(EndReason::Forced));
        drop(sink);
        assert!(rx.try_recv().is_err());
    }
}
