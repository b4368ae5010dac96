mod api;
mod health;
mod telegram_webhook;

pub(crate) use api::{get_track_audio, search_tracks};
pub(crate) use health::health_check;
pub(crate) use telegram_webhook::handle_telegram_update;
