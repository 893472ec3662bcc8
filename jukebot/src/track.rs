//! Playable track descriptors
//!
//! A [`Track`] is either resolved up front (title and duration known) or lazy:
//! only the locator is known and the metadata is fetched from a
//! [`TrackResolver`] on first read, then cached for the lifetime of the track.
//! Lazy resolution never fails: lookup errors and timeouts produce the
//! "Unavailable" placeholder so status displays cannot hang or crash on a bad
//! link.

use crate::resolver::TrackResolver;
use jukebot_common::events::TrackInfo;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use uuid::Uuid;

/// Title shown for tracks whose metadata could not be fetched
pub const UNAVAILABLE_TITLE: &str = "Unavailable";

/// Upper bound on a single lazy metadata lookup
pub const LAZY_RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolved track metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Display title
    pub title: String,
    /// Track length in whole seconds
    pub duration_seconds: u64,
}

impl TrackMetadata {
    pub fn new(title: impl Into<String>, duration_seconds: u64) -> Self {
        Self {
            title: title.into(),
            duration_seconds,
        }
    }

    /// Placeholder used when a lookup fails
    pub fn unavailable() -> Self {
        Self::new(UNAVAILABLE_TITLE, 0)
    }
}

/// A playable item
///
/// Cheap to clone; clones share the id and the metadata cache.
#[derive(Clone)]
pub struct Track {
    inner: Arc<TrackInner>,
}

struct TrackInner {
    id: Uuid,
    locator: String,
    metadata: OnceCell<TrackMetadata>,
    resolver: Option<Arc<dyn TrackResolver>>,
}

impl Track {
    /// Create a track whose metadata is already known
    pub fn new(title: impl Into<String>, duration_seconds: u64, locator: impl Into<String>) -> Self {
        Self::from_metadata(TrackMetadata::new(title, duration_seconds), locator)
    }

    /// Create a resolved track from metadata
    pub fn from_metadata(metadata: TrackMetadata, locator: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4(),
                locator: locator.into(),
                metadata: OnceCell::new_with(Some(metadata)),
                resolver: None,
            }),
        }
    }

    /// Create a track that resolves its metadata on first access
    pub fn lazy(locator: impl Into<String>, resolver: Arc<dyn TrackResolver>) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: Uuid::new_v4(),
                locator: locator.into(),
                metadata: OnceCell::new(),
                resolver: Some(resolver),
            }),
        }
    }

    /// Queue entry id, shared by all clones of this track
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Source locator (link) of the track
    pub fn locator(&self) -> &str {
        &self.inner.locator
    }

    /// Whether the metadata is available without a lookup
    pub fn is_resolved(&self) -> bool {
        self.inner.metadata.initialized()
    }

    /// Metadata if it has already been resolved
    pub fn cached_metadata(&self) -> Option<&TrackMetadata> {
        self.inner.metadata.get()
    }

    /// Metadata, resolving it on first access
    ///
    /// Concurrent first readers share a single lookup.
    pub async fn metadata(&self) -> &TrackMetadata {
        self.inner
            .metadata
            .get_or_init(|| async {
                let Some(resolver) = self.inner.resolver.as_ref() else {
                    return TrackMetadata::unavailable();
                };
                debug!(locator = %self.inner.locator, "Resolving track metadata");
                match tokio::time::timeout(
                    LAZY_RESOLVE_TIMEOUT,
                    resolver.metadata(&self.inner.locator),
                )
                .await
                {
                    Ok(Ok(metadata)) => metadata,
                    Ok(Err(e)) => {
                        warn!(locator = %self.inner.locator, "Metadata lookup failed: {}", e);
                        TrackMetadata::unavailable()
                    }
                    Err(_) => {
                        warn!(locator = %self.inner.locator, "Metadata lookup timed out");
                        TrackMetadata::unavailable()
                    }
                }
            })
            .await
    }

    /// Track title, resolving on first access
    pub async fn title(&self) -> String {
        self.metadata().await.title.clone()
    }

    /// Track length in seconds, resolving on first access
    pub async fn duration_seconds(&self) -> u64 {
        self.metadata().await.duration_seconds
    }

    /// Event payload for this track (never waits on a lookup)
    pub fn info(&self) -> TrackInfo {
        TrackInfo {
            track_id: self.inner.id,
            locator: self.inner.locator.clone(),
            title: self.cached_metadata().map(|m| m.title.clone()),
        }
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Track {}

impl std::fmt::Debug for Track {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Track")
            .field("id", &self.inner.id)
            .field("locator", &self.inner.locator)
            .field("metadata", &self.inner.metadata.get())
            .finish()
    }
}
