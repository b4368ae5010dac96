use crate::types::{AudioMessage, ChatId, MessageId, RemoteHandle, TrackDescriptor, TrackId};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct TrackBackendError(pub BoxError);

impl TrackBackendError {
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }
}

/// Raw source of tracks: free-text search and fetching audio to disk.
#[async_trait]
pub trait TrackBackend: Send + Sync {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TrackDescriptor>, TrackBackendError>;
    async fn fetch(&self, track_id: &TrackId) -> Result<PathBuf, TrackBackendError>;
    /// Drops whatever an interrupted `fetch` left behind.
    async fn discard(&self, _track_id: &TrackId) -> Result<(), TrackBackendError> {
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ContentCacheError(pub BoxError);

impl ContentCacheError {
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CacheTtl {
    Seconds(u64),
    Forever,
}

impl CacheTtl {
    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            CacheTtl::Seconds(seconds) => Some(Duration::from_secs(*seconds)),
            CacheTtl::Forever => None,
        }
    }
}

/// Key-value store with per-entry expiry. Implementations must make
/// read-check-expire-delete atomic per key.
#[async_trait]
pub trait ContentCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, ContentCacheError>;
    async fn set(&self, key: &str, value: &str, ttl: CacheTtl) -> Result<(), ContentCacheError>;
    async fn delete(&self, key: &str) -> Result<(), ContentCacheError>;
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct NotifierError(pub BoxError);

impl NotifierError {
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }
}

#[derive(Clone, Copy, Debug)]
pub enum AudioSource<'a> {
    Remote(&'a RemoteHandle),
    File(&'a Path),
}

/// Chat-facing output of the radio: text status messages and audio.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, NotifierError>;
    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), NotifierError>;
    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), NotifierError>;
    /// Returns the handle the platform assigned to the audio, when it
    /// reports one.
    async fn send_audio(
        &self,
        chat_id: ChatId,
        source: AudioSource<'_>,
        message: &AudioMessage,
    ) -> Result<Option<RemoteHandle>, NotifierError>;
}
