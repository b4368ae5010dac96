use crate::config::{Config, FileRetentionMode};
use crate::impls::YtDlpBackend;
use crate::services::{CommandRouter, DownloadSweeper, MenuPresenter, TelegramClient};
use crate::storage::{InMemoryStorage, OnDiskStorage};
use actix_rt::signal::unix;
use actix_web::web::Data;
use actix_web::{web, App, HttpServer};
use futures_lite::FutureExt;
use radio_sessions::{
    ContentCache, DefaultTrackFilter, GenreCatalog, Notifier, RadioManager, SessionDeps,
    TrackProvider,
};
use std::sync::Arc;
use std::time::Duration;
use track_providers::YtDlpClient;
use tracing::{error, info, warn};

mod config;
mod http;
mod impls;
mod services;
mod storage;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

fn to_io_error(error: impl std::error::Error + Send + Sync + 'static) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, error)
}

#[actix_rt::main]
async fn main() -> std::io::Result<()> {
    let mut terminate = unix::signal(unix::SignalKind::terminate())?;
    let mut interrupt = unix::signal(unix::SignalKind::interrupt())?;

    dotenv::dotenv().ok();
    env_logger::init();

    let config = Arc::new(Config::from_env().map_err(to_io_error)?);

    info!(version = VERSION, "Starting application...");

    let cache: Arc<dyn ContentCache> = match &config.cache_directory {
        Some(directory) => {
            let storage = OnDiskStorage::create(directory.clone());
            match storage.purge_expired().await {
                Ok(purged) => info!(purged, "Expired cache entries purged"),
                Err(error) => warn!(?error, "Unable to purge expired cache entries"),
            }
            Arc::new(storage)
        }
        None => {
            let storage = Arc::new(InMemoryStorage::new());
            actix_rt::spawn(
                Arc::clone(&storage)
                    .purge_periodically(Duration::from_secs(config.sweep_interval)),
            );
            storage
        }
    };

    let ytdlp_client = YtDlpClient::create(
        config.ytdlp_path.clone(),
        config.download_directory.clone(),
        config.cookies_file.clone(),
    );
    let track_provider = Arc::new(TrackProvider::new(
        Arc::new(YtDlpBackend::new(ytdlp_client)),
        cache,
        config.provider_limits(),
    ));

    let telegram_client = Arc::new(
        TelegramClient::create(&config.telegram_api_url, &config.bot_token)
            .map_err(to_io_error)?,
    );

    let catalog = Arc::new(match &config.catalog_path {
        Some(path) => GenreCatalog::from_file(path).await,
        None => GenreCatalog::embedded(),
    }
    .map_err(to_io_error)?);

    info!(categories = catalog.categories().len(), "Genre catalog loaded");

    let settings = Arc::new(config.radio_settings());
    let deps = SessionDeps {
        provider: Arc::clone(&track_provider),
        notifier: Arc::clone(&telegram_client) as Arc<dyn Notifier>,
        filter: Arc::new(DefaultTrackFilter::new(
            config.track_min_duration,
            config.track_max_duration,
        )),
        settings: Arc::clone(&settings),
    };

    let radio_manager = Arc::new(RadioManager::new(deps.clone(), Arc::clone(&catalog)));
    let command_router = Arc::new(CommandRouter::new(
        Arc::clone(&radio_manager),
        Arc::clone(&catalog),
        deps,
        Arc::clone(&telegram_client) as Arc<dyn MenuPresenter>,
    ));

    if let Some(webhook_url) = &config.webhook_url {
        match telegram_client.set_webhook(webhook_url).await {
            Ok(()) => info!(%webhook_url, "Telegram webhook registered"),
            Err(error) => error!(?error, "Unable to register Telegram webhook"),
        }
    }

    if config.file_retention == FileRetentionMode::Retain {
        let sweeper = DownloadSweeper::new(
            config.download_directory.clone(),
            Duration::from_secs(config.retained_file_ttl),
        );
        actix_rt::spawn(sweeper.run(Duration::from_secs(config.sweep_interval)));
    }

    let shutdown_timeout = config.shutdown_timeout;
    let bind_address = config.bind_address.clone();

    let server = HttpServer::new({
        let radio_manager = Arc::clone(&radio_manager);

        move || {
            App::new()
                .app_data(Data::new(Arc::clone(&radio_manager)))
                .app_data(Data::new(Arc::clone(&command_router)))
                .app_data(Data::new(Arc::clone(&track_provider)))
                .app_data(Data::new(Arc::clone(&settings)))
                .service(web::resource("/health").route(web::get().to(http::health_check)))
                .service(
                    web::resource("/telegram")
                        .route(web::post().to(http::handle_telegram_update)),
                )
                .service(web::resource("/api/search").route(web::get().to(http::search_tracks)))
                .service(
                    web::resource("/api/audio/{track_id}")
                        .route(web::get().to(http::get_track_audio)),
                )
        }
    })
    .shutdown_timeout(shutdown_timeout)
    .bind(bind_address)?
    .run();

    let server_handle = server.handle();

    actix_rt::spawn({
        async move {
            if let Err(error) = server.await {
                error!(?error, "Error on http server");
            }
        }
    });

    info!("Application started");

    interrupt.recv().or(terminate.recv()).await;

    info!("Received shutdown signal. Shutting down gracefully...");

    server_handle.stop(true).await;
    radio_manager.stop_all().await;

    Ok(())
}
