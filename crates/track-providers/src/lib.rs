mod ytdlp;

use serde::{Deserialize, Serialize};
use std::ops::Deref;

pub use ytdlp::*;

#[derive(Debug, PartialEq, Clone)]
pub struct SearchEntry {
    pub video_id: VideoId,
    pub title: String,
    pub artist: String,
    pub duration_seconds: u32,
}

pub type SearchEntries = Vec<SearchEntry>;

#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct VideoId(pub(crate) String);

impl VideoId {
    /// Accepts only the characters YouTube uses in video ids, so the id is
    /// safe to use as a file name. Ids may start with `-`.
    pub fn parse(raw: &str) -> Option<VideoId> {
        let is_valid = !raw.is_empty()
            && raw.len() <= 64
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        is_valid.then(|| VideoId(raw.to_string()))
    }
}

impl Deref for VideoId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for VideoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
