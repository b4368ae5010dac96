use async_trait::async_trait;
use radio_sessions::{TrackBackend, TrackBackendError, TrackDescriptor, TrackId};
use std::path::PathBuf;
use track_providers::{SearchEntry, VideoId, YtDlpClient};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub(crate) enum YtDlpBackendError {
    #[error("Not a valid video id: {0}")]
    InvalidTrackId(String),
}

/// Serves radio tracks from YouTube through yt-dlp.
pub(crate) struct YtDlpBackend {
    client: YtDlpClient,
}

impl YtDlpBackend {
    pub(crate) fn new(client: YtDlpClient) -> Self {
        Self { client }
    }

    fn video_id(track_id: &TrackId) -> Result<VideoId, TrackBackendError> {
        VideoId::parse(track_id)
            .ok_or_else(|| TrackBackendError::new(YtDlpBackendError::InvalidTrackId(track_id.to_string())))
    }
}

fn to_descriptor(entry: SearchEntry) -> TrackDescriptor {
    TrackDescriptor {
        id: TrackId(entry.video_id.to_string()),
        title: entry.title,
        artist: entry.artist,
        duration_seconds: entry.duration_seconds,
    }
}

#[async_trait]
impl TrackBackend for YtDlpBackend {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TrackDescriptor>, TrackBackendError> {
        let entries = self
            .client
            .search_music(query, limit)
            .await
            .map_err(TrackBackendError::new)?;

        Ok(entries.into_iter().map(to_descriptor).collect())
    }

    async fn fetch(&self, track_id: &TrackId) -> Result<PathBuf, TrackBackendError> {
        let video_id = Self::video_id(track_id)?;

        // Retained downloads are reused as they are.
        let path = self.client.audio_path(&video_id);
        if let Ok(true) = tokio::fs::try_exists(&path).await {
            debug!(%track_id, "Reusing downloaded file");
            return Ok(path);
        }

        self.client
            .download_audio(&video_id)
            .await
            .map_err(TrackBackendError::new)
    }

    async fn discard(&self, track_id: &TrackId) -> Result<(), TrackBackendError> {
        let video_id = Self::video_id(track_id)?;

        let removed = self
            .client
            .remove_artifacts(&video_id)
            .await
            .map_err(TrackBackendError::new)?;

        debug!(%track_id, removed, "Partial download discarded");

        Ok(())
    }
}
