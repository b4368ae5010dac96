use actix_web::web::{Data, Path, Query};
use actix_web::{HttpResponse, Responder};
use radio_sessions::{
    FileRetention, PlaybackResource, RadioSettings, SearchFilters, TrackId, TrackProvider,
};
use serde::Deserialize;
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tracing::{debug, warn};

const SEARCH_LIMIT: usize = 10;

#[derive(Deserialize)]
pub(crate) struct SearchQuery {
    q: String,
    #[serde(default)]
    decade: Option<String>,
}

pub(crate) async fn search_tracks(
    track_provider: Data<Arc<TrackProvider>>,
    query: Query<SearchQuery>,
) -> impl Responder {
    let query = query.into_inner();
    if query.q.trim().is_empty() {
        return HttpResponse::BadRequest().finish();
    }

    let filters = SearchFilters::new(SEARCH_LIMIT).with_decade(query.decade);

    match track_provider.search(&query.q, &filters).await {
        Ok(tracks) => HttpResponse::Ok().json(tracks),
        Err(error) => {
            warn!(?error, "Track search failed");
            HttpResponse::BadGateway().finish()
        }
    }
}

/// Serves the audio of a single track. Tracks only known by their remote
/// handle have no file to serve.
pub(crate) async fn get_track_audio(
    track_provider: Data<Arc<TrackProvider>>,
    settings: Data<Arc<RadioSettings>>,
    track_id: Path<String>,
) -> impl Responder {
    let track_id = TrackId(track_id.into_inner());

    let path = match track_provider.resolve(&track_id).await {
        Ok(PlaybackResource::Local(path)) => path,
        Ok(PlaybackResource::Remote(_)) => {
            debug!(%track_id, "Track is only available remotely");
            return HttpResponse::NotFound().finish();
        }
        Err(error) => {
            warn!(%track_id, ?error, "Unable to resolve track");
            return HttpResponse::NotFound().finish();
        }
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(error) => {
            warn!(%track_id, ?error, "Unable to open audio file");
            return HttpResponse::NotFound().finish();
        }
    };

    // The open handle keeps the data readable after the file is unlinked.
    if settings.file_retention == FileRetention::DeleteAfterDelivery {
        if let Err(error) = tokio::fs::remove_file(&path).await {
            warn!(%track_id, ?error, "Unable to remove served file");
        }
    }

    let mime = mime_guess::from_path(&path).first_or_octet_stream();

    HttpResponse::Ok()
        .content_type(mime.essence_str())
        .streaming(ReaderStream::new(file))
}
