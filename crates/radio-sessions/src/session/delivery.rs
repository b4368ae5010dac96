use super::settings::FileRetention;
use super::SessionDeps;
use crate::provider::ResolveError;
use crate::traits::{AudioSource, NotifierError};
use crate::types::{AudioMessage, ChatId, PlaybackResource, TrackId};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Notifier(#[from] NotifierError),
}

/// Resolves a track and sends it to the chat. Handles the platform returns
/// for uploaded files are remembered, so later deliveries skip the download.
pub async fn deliver_track(
    deps: &SessionDeps,
    chat_id: ChatId,
    track_id: &TrackId,
    message: &AudioMessage,
) -> Result<(), DeliveryError> {
    let path = match deps.provider.resolve(track_id).await? {
        PlaybackResource::Remote(handle) => {
            match deps
                .notifier
                .send_audio(chat_id, AudioSource::Remote(&handle), message)
                .await
            {
                Ok(_) => return Ok(()),
                Err(error) => {
                    warn!(%chat_id, %track_id, ?error, "Cached handle rejected, uploading the file");
                    deps.provider.fetch_local(track_id).await?
                }
            }
        }
        PlaybackResource::Local(path) => path,
    };

    let sent = deps
        .notifier
        .send_audio(chat_id, AudioSource::File(&path), message)
        .await;

    release_file(&path, deps.settings.file_retention).await;

    if let Some(handle) = sent? {
        if let Err(error) = deps.provider.remember_handle(track_id, &handle).await {
            warn!(%track_id, ?error, "Unable to remember remote handle");
        }
    }

    Ok(())
}

async fn release_file(path: &Path, retention: FileRetention) {
    match retention {
        FileRetention::Retain => {
            debug!(path = %path.display(), "Keeping delivered file");
        }
        FileRetention::DeleteAfterDelivery => match tokio::fs::remove_file(path).await {
            Ok(()) => debug!(path = %path.display(), "Removed delivered file"),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {}
            Err(error) => warn!(path = %path.display(), ?error, "Unable to remove delivered file"),
        },
    }
}
