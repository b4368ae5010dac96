use radio_sessions::{FileRetention, ProviderLimits, RadioSettings};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_shutdown_timeout() -> u64 {
    30u64
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_download_directory() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_ytdlp_path() -> PathBuf {
    PathBuf::from("yt-dlp")
}

fn default_retained_file_ttl() -> u64 {
    3600u64
}

fn default_sweep_interval() -> u64 {
    600u64
}

fn default_play_window_cap() -> u64 {
    180u64
}

fn default_resolve_timeout() -> u64 {
    180u64
}

fn default_search_concurrency() -> usize {
    5
}

fn default_download_concurrency() -> usize {
    3
}

fn default_track_min_duration() -> u32 {
    60
}

fn default_track_max_duration() -> u32 {
    900
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum FileRetentionMode {
    #[default]
    Delete,
    Retain,
}

impl From<FileRetentionMode> for FileRetention {
    fn from(mode: FileRetentionMode) -> Self {
        match mode {
            FileRetentionMode::Delete => FileRetention::DeleteAfterDelivery,
            FileRetentionMode::Retain => FileRetention::Retain,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default = "default_bind_address")]
    pub(crate) bind_address: String,
    #[serde(default = "default_shutdown_timeout")]
    pub(crate) shutdown_timeout: u64,
    pub(crate) bot_token: String,
    #[serde(default = "default_telegram_api_url")]
    pub(crate) telegram_api_url: String,
    #[serde(default)]
    pub(crate) webhook_url: Option<String>,
    #[serde(default)]
    pub(crate) base_url: Option<String>,
    #[serde(default = "default_download_directory")]
    pub(crate) download_directory: PathBuf,
    #[serde(default)]
    pub(crate) cache_directory: Option<PathBuf>,
    #[serde(default)]
    pub(crate) catalog_path: Option<PathBuf>,
    #[serde(default = "default_ytdlp_path")]
    pub(crate) ytdlp_path: PathBuf,
    #[serde(default)]
    pub(crate) cookies_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) file_retention: FileRetentionMode,
    #[serde(default = "default_retained_file_ttl")]
    pub(crate) retained_file_ttl: u64,
    #[serde(default = "default_sweep_interval")]
    pub(crate) sweep_interval: u64,
    #[serde(default = "default_play_window_cap")]
    pub(crate) play_window_cap: u64,
    #[serde(default = "default_resolve_timeout")]
    pub(crate) resolve_timeout: u64,
    #[serde(default = "default_search_concurrency")]
    pub(crate) search_concurrency: usize,
    #[serde(default = "default_download_concurrency")]
    pub(crate) download_concurrency: usize,
    #[serde(default = "default_track_min_duration")]
    pub(crate) track_min_duration: u32,
    #[serde(default = "default_track_max_duration")]
    pub(crate) track_max_duration: u32,
}

impl Config {
    pub(crate) fn from_env() -> Result<Self, envy::Error> {
        envy::from_env::<Self>()
    }

    pub(crate) fn radio_settings(&self) -> RadioSettings {
        RadioSettings {
            play_window_cap: Duration::from_secs(self.play_window_cap),
            file_retention: self.file_retention.into(),
            player_url: self.base_url.clone(),
            ..RadioSettings::default()
        }
    }

    pub(crate) fn provider_limits(&self) -> ProviderLimits {
        ProviderLimits {
            search_concurrency: self.search_concurrency,
            download_concurrency: self.download_concurrency,
            resolve_timeout: Duration::from_secs(self.resolve_timeout),
            ..ProviderLimits::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_pairs(pairs: &[(&str, &str)]) -> Result<Config, envy::Error> {
        envy::from_iter(
            pairs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string())),
        )
    }

    #[test]
    fn should_apply_defaults() {
        let config = from_pairs(&[("BOT_TOKEN", "123:abc")]).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.telegram_api_url, "https://api.telegram.org");
        assert_eq!(config.download_directory, PathBuf::from("downloads"));
        assert_eq!(config.file_retention, FileRetentionMode::Delete);
        assert_eq!(config.cache_directory, None);

        let settings = config.radio_settings();
        assert_eq!(settings.play_window_cap, Duration::from_secs(180));
        assert_eq!(settings.file_retention, FileRetention::DeleteAfterDelivery);

        let limits = config.provider_limits();
        assert_eq!(limits.search_concurrency, 5);
        assert_eq!(limits.download_concurrency, 3);
        assert_eq!(limits.resolve_timeout, Duration::from_secs(180));
    }

    #[test]
    fn should_read_overrides() {
        let config = from_pairs(&[
            ("BOT_TOKEN", "123:abc"),
            ("FILE_RETENTION", "retain"),
            ("PLAY_WINDOW_CAP", "90"),
            ("CACHE_DIRECTORY", "/var/cache/radio"),
            ("BASE_URL", "https://radio.example"),
        ])
        .unwrap();

        let settings = config.radio_settings();
        assert_eq!(settings.file_retention, FileRetention::Retain);
        assert_eq!(settings.play_window_cap, Duration::from_secs(90));
        assert_eq!(settings.player_url.as_deref(), Some("https://radio.example"));
        assert_eq!(config.cache_directory, Some(PathBuf::from("/var/cache/radio")));
    }

    #[test]
    fn should_require_bot_token() {
        assert!(from_pairs(&[]).is_err());
    }

    #[test]
    fn should_reject_unknown_retention_mode() {
        assert!(from_pairs(&[("BOT_TOKEN", "t"), ("FILE_RETENTION", "forever")]).is_err());
    }
}
