mod content_cache;
mod menu_presenter;
mod notifier;
mod track_backend;

pub(crate) use track_backend::YtDlpBackend;
