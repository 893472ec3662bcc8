//! Track resolution
//!
//! [`TrackResolver`] is the seam to the external search/metadata service.
//! The bot only needs metadata lookups, keyword search and playlist
//! expansion; [`CatalogResolver`] answers them from an in-memory catalog
//! loaded from the configuration file.

use crate::error::ResolveError;
use crate::track::{Track, TrackMetadata};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Maximum number of search results returned
pub const MAX_SEARCH_RESULTS: usize = 5;

/// Metadata and search lookups for tracks
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Fetch title and duration for a locator
    async fn metadata(&self, locator: &str) -> Result<TrackMetadata, ResolveError>;

    /// Resolve a locator into a fully resolved track
    async fn resolve_by_locator(&self, locator: &str) -> Result<Track, ResolveError> {
        let metadata = self.metadata(locator).await?;
        Ok(Track::from_metadata(metadata, locator))
    }

    /// Search by keywords, best match first
    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError>;

    /// Expand a playlist link into the locators of its items
    async fn playlist_locators(&self, locator: &str) -> Result<Vec<String>, ResolveError> {
        Err(ResolveError::InvalidLocator(locator.to_string()))
    }
}

/// Whether the argument looks like a link rather than search keywords
pub fn is_link(param: &str) -> bool {
    param.starts_with("http")
}

/// Extract the playlist id (`list=` query parameter) from a link
///
/// ```
/// use jukebot::resolver::playlist_id;
///
/// assert_eq!(playlist_id("https://video.example/playlist?list=PL_a1"), Some("PL_a1"));
/// assert_eq!(playlist_id("https://video.example/watch?v=1&list=x-y&t=3"), Some("x-y"));
/// assert_eq!(playlist_id("https://video.example/watch?v=1"), None);
/// ```
pub fn playlist_id(locator: &str) -> Option<&str> {
    let start = locator.find("list=")? + "list=".len();
    let rest = &locator[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    let id = &rest[..end];
    (!id.is_empty()).then_some(id)
}

/// One catalog entry
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogEntry {
    pub title: String,
    pub duration_seconds: u64,
    pub locator: String,
    /// Whether a byte stream can be opened for this entry
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// Resolver backed by an in-memory catalog
#[derive(Debug, Clone, Default)]
pub struct CatalogResolver {
    entries: Vec<CatalogEntry>,
    by_locator: HashMap<String, usize>,
    playlists: HashMap<String, Vec<String>>,
}

impl CatalogResolver {
    /// Build from catalog entries and playlists (playlist id → item locators)
    pub fn new(entries: Vec<CatalogEntry>, playlists: BTreeMap<String, Vec<String>>) -> Self {
        let by_locator = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| (entry.locator.clone(), index))
            .collect();
        Self {
            entries,
            by_locator,
            playlists: playlists.into_iter().collect(),
        }
    }

    /// Catalog entry for a locator
    pub fn entry(&self, locator: &str) -> Option<&CatalogEntry> {
        self.by_locator.get(locator).map(|&index| &self.entries[index])
    }

    /// Number of catalog entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl TrackResolver for CatalogResolver {
    async fn metadata(&self, locator: &str) -> Result<TrackMetadata, ResolveError> {
        self.entry(locator)
            .map(|entry| TrackMetadata::new(entry.title.clone(), entry.duration_seconds))
            .ok_or_else(|| ResolveError::NotFound(locator.to_string()))
    }

    async fn search(&self, query: &str) -> Result<Vec<Track>, ResolveError> {
        let keywords: Vec<String> = query
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect();
        if keywords.is_empty() {
            return Err(ResolveError::InvalidLocator(query.to_string()));
        }

        let results: Vec<Track> = self
            .entries
            .iter()
            .filter(|entry| {
                let title = entry.title.to_lowercase();
                keywords.iter().all(|word| title.contains(word.as_str()))
            })
            .take(MAX_SEARCH_RESULTS)
            .map(|entry| Track::new(entry.title.clone(), entry.duration_seconds, entry.locator.clone()))
            .collect();

        debug!(query, results = results.len(), "Catalog search");
        Ok(results)
    }

    async fn playlist_locators(&self, locator: &str) -> Result<Vec<String>, ResolveError> {
        let id = playlist_id(locator).ok_or_else(|| ResolveError::InvalidLocator(locator.to_string()))?;
        self.playlists
            .get(id)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(locator.to_string()))
    }
}
