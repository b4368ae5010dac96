use crate::traits::{CacheTtl, ContentCache, ContentCacheError, TrackBackend, TrackBackendError};
use crate::types::{PlaybackResource, RemoteHandle, TrackDescriptor, TrackId};
use async_lock::Semaphore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct ProviderLimits {
    pub search_concurrency: usize,
    pub download_concurrency: usize,
    pub resolve_timeout: Duration,
    pub search_ttl: CacheTtl,
}

impl Default for ProviderLimits {
    fn default() -> Self {
        Self {
            search_concurrency: 5,
            download_concurrency: 3,
            resolve_timeout: Duration::from_secs(180),
            search_ttl: CacheTtl::Seconds(3600),
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchFilters {
    pub decade: Option<String>,
    pub limit: usize,
}

impl SearchFilters {
    pub fn new(limit: usize) -> Self {
        Self { decade: None, limit }
    }

    pub fn with_decade(mut self, decade: Option<String>) -> Self {
        self.decade = decade;
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error(transparent)]
    Backend(#[from] TrackBackendError),
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error(transparent)]
    Backend(#[from] TrackBackendError),
    #[error("Resolving track {0} timed out after {1:?}")]
    Timeout(TrackId, Duration),
    #[error("Fetched file for track {0} is missing: {1}")]
    Missing(TrackId, PathBuf),
}

fn search_cache_key(query: &str, decade: &str, limit: usize) -> String {
    format!("search:{}:{}:{}", query, decade, limit)
}

fn handle_cache_key(track_id: &TrackId) -> String {
    format!("handle:{}", track_id)
}

/// Everything sessions and the HTTP layer know about tracks goes through
/// here: search results and delivered handles are cached, and the backend is
/// never hit by more than the configured number of concurrent searches and
/// downloads, whichever chat asks.
pub struct TrackProvider {
    backend: Arc<dyn TrackBackend>,
    cache: Arc<dyn ContentCache>,
    search_permits: Semaphore,
    download_permits: Semaphore,
    limits: ProviderLimits,
}

impl TrackProvider {
    pub fn new(
        backend: Arc<dyn TrackBackend>,
        cache: Arc<dyn ContentCache>,
        limits: ProviderLimits,
    ) -> Self {
        Self {
            backend,
            cache,
            search_permits: Semaphore::new(limits.search_concurrency.max(1)),
            download_permits: Semaphore::new(limits.download_concurrency.max(1)),
            limits,
        }
    }

    pub async fn search(
        &self,
        query: &str,
        filters: &SearchFilters,
    ) -> Result<Vec<TrackDescriptor>, SearchError> {
        let decade = filters.decade.as_deref().map(str::trim).unwrap_or_default();
        let cache_key = search_cache_key(query.trim(), decade, filters.limit);
        let query = match decade {
            "" => query.trim().to_string(),
            decade => format!("{} {}", query.trim(), decade),
        };

        if let Some(tracks) = self.cache_get::<Vec<TrackDescriptor>>(&cache_key).await {
            debug!(%query, found = tracks.len(), "Search results served from cache");
            return Ok(tracks);
        }

        let tracks = {
            let _permit = self.search_permits.acquire().await;
            self.backend.search(&query, filters.limit).await?
        };

        // Empty results are not cached so that a retry can find something.
        if !tracks.is_empty() {
            self.cache_set(&cache_key, &tracks, self.limits.search_ttl)
                .await;
        }

        Ok(tracks)
    }

    /// Prefers a remembered remote handle; otherwise fetches the audio to
    /// disk under the download limit and the resolve timeout.
    pub async fn resolve(&self, track_id: &TrackId) -> Result<PlaybackResource, ResolveError> {
        if let Some(handle) = self.cached_handle(track_id).await {
            debug!(%track_id, "Resolved track to cached remote handle");
            return Ok(PlaybackResource::Remote(handle));
        }

        let _permit = self.download_permits.acquire().await;

        // Another chat may have delivered the track while this one waited.
        if let Some(handle) = self.cached_handle(track_id).await {
            return Ok(PlaybackResource::Remote(handle));
        }

        self.fetch_with_timeout(track_id)
            .await
            .map(PlaybackResource::Local)
    }

    /// Fetches the audio file even if a remote handle is known.
    pub async fn fetch_local(&self, track_id: &TrackId) -> Result<PathBuf, ResolveError> {
        let _permit = self.download_permits.acquire().await;

        self.fetch_with_timeout(track_id).await
    }

    pub async fn remember_handle(
        &self,
        track_id: &TrackId,
        handle: &RemoteHandle,
    ) -> Result<(), ContentCacheError> {
        let value = serde_json::to_string(handle).map_err(ContentCacheError::new)?;

        self.cache
            .set(&handle_cache_key(track_id), &value, CacheTtl::Forever)
            .await
    }

    async fn fetch_with_timeout(&self, track_id: &TrackId) -> Result<PathBuf, ResolveError> {
        let timeout = self.limits.resolve_timeout;

        match tokio::time::timeout(timeout, self.backend.fetch(track_id)).await {
            Ok(Ok(path)) if tokio::fs::metadata(&path).await.is_ok() => Ok(path),
            Ok(Ok(path)) => Err(ResolveError::Missing(track_id.clone(), path)),
            Ok(Err(error)) => Err(error.into()),
            Err(_) => {
                warn!(%track_id, ?timeout, "Fetching track timed out");
                if let Err(error) = self.backend.discard(track_id).await {
                    warn!(%track_id, ?error, "Unable to discard partial download");
                }
                Err(ResolveError::Timeout(track_id.clone(), timeout))
            }
        }
    }

    async fn cached_handle(&self, track_id: &TrackId) -> Option<RemoteHandle> {
        self.cache_get::<RemoteHandle>(&handle_cache_key(track_id))
            .await
    }

    async fn cache_get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get(key).await {
            Ok(Some(value)) => match serde_json::from_str(&value) {
                Ok(value) => Some(value),
                Err(error) => {
                    warn!(key, ?error, "Dropping undecodable cache entry");
                    if let Err(error) = self.cache.delete(key).await {
                        warn!(key, ?error, "Unable to delete cache entry");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(error) => {
                warn!(key, ?error, "Cache read failed");
                None
            }
        }
    }

    async fn cache_set<T: Serialize>(&self, key: &str, value: &T, ttl: CacheTtl) {
        let value = match serde_json::to_string(value) {
            Ok(value) => value,
            Err(error) => {
                warn!(key, ?error, "Unable to encode cache entry");
                return;
            }
        };

        if let Err(error) = self.cache.set(key, &value, ttl).await {
            warn!(key, ?error, "Cache write failed");
        }
    }
}
