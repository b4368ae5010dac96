use std::time::Duration;

/// What happens to a downloaded file once it has been sent to the chat.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum FileRetention {
    #[default]
    DeleteAfterDelivery,
    /// Kept for the HTTP audio endpoint; a periodic sweep removes it later.
    Retain,
}

#[derive(Clone, Debug)]
pub struct RadioSettings {
    /// Replenish when fewer tracks than this remain queued.
    pub low_watermark: usize,
    pub search_batch_size: usize,
    pub emergency_batch_size: usize,
    pub played_ids_cap: usize,
    /// Upper bound of the estimated play window of one track.
    pub play_window_cap: Duration,
    pub error_limit: u32,
    pub error_backoff_step: Duration,
    pub max_error_backoff: Duration,
    /// Pause between attempts when no search returns anything.
    pub empty_backoff: Duration,
    pub emergency_queries: Vec<String>,
    pub file_retention: FileRetention,
    pub player_url: Option<String>,
}

impl Default for RadioSettings {
    fn default() -> Self {
        Self {
            low_watermark: 3,
            search_batch_size: 20,
            emergency_batch_size: 10,
            played_ids_cap: 200,
            play_window_cap: Duration::from_secs(180),
            error_limit: 5,
            error_backoff_step: Duration::from_secs(2),
            max_error_backoff: Duration::from_secs(30),
            empty_backoff: Duration::from_secs(30),
            emergency_queries: vec![
                "lo-fi hip hop".into(),
                "top hits".into(),
                "classic rock radio".into(),
            ],
            file_retention: FileRetention::default(),
            player_url: None,
        }
    }
}

impl RadioSettings {
    pub fn error_backoff(&self, error_streak: u32) -> Duration {
        self.error_backoff_step
            .saturating_mul(error_streak)
            .min(self.max_error_backoff)
    }

    /// How long a track is assumed to play. Unknown durations get the cap.
    pub fn play_window(&self, duration_seconds: u32) -> Duration {
        match duration_seconds {
            0 => self.play_window_cap,
            seconds => Duration::from_secs(u64::from(seconds)).min(self.play_window_cap),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_grow_error_backoff_with_streak_up_to_max() {
        let settings = RadioSettings::default();

        assert_eq!(settings.error_backoff(1), Duration::from_secs(2));
        assert_eq!(settings.error_backoff(4), Duration::from_secs(8));
        assert_eq!(settings.error_backoff(100), Duration::from_secs(30));
    }

    #[test]
    fn should_cap_play_window() {
        let settings = RadioSettings::default();

        assert_eq!(settings.play_window(95), Duration::from_secs(95));
        assert_eq!(settings.play_window(1000), Duration::from_secs(180));
        assert_eq!(settings.play_window(0), Duration::from_secs(180));
    }
}
