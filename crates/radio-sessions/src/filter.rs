use crate::types::TrackDescriptor;

/// Decides whether a search result is worth queueing on a radio station.
pub trait TrackFilter: Send + Sync {
    fn accepts(&self, track: &TrackDescriptor) -> bool;
}

pub const DEFAULT_MIN_DURATION_SECONDS: u32 = 60;
pub const DEFAULT_MAX_DURATION_SECONDS: u32 = 900;
pub const DEFAULT_FORBIDDEN_WORDS: [&str; 6] = [
    "karaoke",
    "8d audio",
    "slowed",
    "sped up",
    "full album",
    "1 hour",
];

/// Rejects tracks whose known duration falls outside `[min, max]` and
/// titles containing a forbidden word. Unknown durations are accepted.
#[derive(Clone, Debug)]
pub struct DefaultTrackFilter {
    min_duration_seconds: u32,
    max_duration_seconds: u32,
    forbidden_words: Vec<String>,
}

impl DefaultTrackFilter {
    pub fn new(min_duration_seconds: u32, max_duration_seconds: u32) -> Self {
        Self {
            min_duration_seconds,
            max_duration_seconds,
            forbidden_words: DEFAULT_FORBIDDEN_WORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
        }
    }

    pub fn with_forbidden_words(mut self, words: Vec<String>) -> Self {
        self.forbidden_words = words.into_iter().map(|w| w.to_lowercase()).collect();
        self
    }
}

impl Default for DefaultTrackFilter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DURATION_SECONDS, DEFAULT_MAX_DURATION_SECONDS)
    }
}

impl TrackFilter for DefaultTrackFilter {
    fn accepts(&self, track: &TrackDescriptor) -> bool {
        let duration = track.duration_seconds;

        if duration != 0
            && (duration < self.min_duration_seconds || duration > self.max_duration_seconds)
        {
            return false;
        }

        let title = track.title.to_lowercase();

        !self
            .forbidden_words
            .iter()
            .any(|word| title.contains(word.as_str()))
    }
}

/// Accepts everything.
pub struct AcceptAll;

impl TrackFilter for AcceptAll {
    fn accepts(&self, _track: &TrackDescriptor) -> bool {
        true
    }
}
