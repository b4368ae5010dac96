use crate::{SearchEntries, SearchEntry, VideoId};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed yt-dlp output on line {line}: {source}")]
    MalformedLine {
        line: usize,
        source: serde_json::Error,
    },
}

const UNKNOWN_ARTIST: &str = "Unknown";
const ANONYMOUS_ARTISTS: [&str; 2] = [UNKNOWN_ARTIST, "Various Artists"];
const AUTO_GENERATED_CHANNEL_SUFFIX: &str = " - Topic";

#[derive(Deserialize)]
struct RawEntry {
    id: Option<String>,
    url: Option<String>,
    title: Option<String>,
    artist: Option<String>,
    creator: Option<String>,
    uploader: Option<String>,
    channel: Option<String>,
    duration: Option<f64>,
}

fn extract_video_id(entry: &RawEntry) -> Option<VideoId> {
    if let Some(id) = entry.id.as_deref() {
        return VideoId::parse(id);
    }

    let url = entry.url.as_deref()?;

    let raw_id = if let Some((_, tail)) = url.split_once("watch?v=") {
        tail.split('&').next()?
    } else if let Some((_, tail)) = url.split_once("youtu.be/") {
        tail.split('?').next()?
    } else {
        return None;
    };

    VideoId::parse(raw_id)
}

fn extract_artist(entry: &RawEntry) -> String {
    [&entry.artist, &entry.creator, &entry.uploader, &entry.channel]
        .into_iter()
        .filter_map(|value| value.as_deref())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(|value| {
            value
                .strip_suffix(AUTO_GENERATED_CHANNEL_SUFFIX)
                .unwrap_or(value)
                .to_string()
        })
        .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
}

fn parse_entry(entry: RawEntry) -> Option<SearchEntry> {
    let video_id = extract_video_id(&entry)?;
    let mut artist = extract_artist(&entry);
    let mut title = entry
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or("Unknown")
        .to_string();

    // "Artist - Title" uploads by aggregator channels
    if ANONYMOUS_ARTISTS.contains(&artist.as_str()) {
        if let Some((left, right)) = title.split_once(" - ") {
            let (left, right) = (left.trim().to_string(), right.trim().to_string());
            if !left.is_empty() && !right.is_empty() {
                artist = left;
                title = right;
            }
        }
    }

    let duration_seconds = entry
        .duration
        .filter(|d| d.is_finite() && *d > 0.0)
        .map(|d| d.round() as u32)
        .unwrap_or(0);

    Some(SearchEntry {
        video_id,
        title,
        artist,
        duration_seconds,
    })
}

/// Parses the `--dump-json` output of yt-dlp: one JSON document per line.
/// Entries without a usable video id are skipped.
pub(crate) fn parse_search_results(raw_output: &str) -> Result<SearchEntries, ParseError> {
    let mut results = vec![];

    for (index, line) in raw_output.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw_entry: RawEntry =
            serde_json::from_str(line).map_err(|source| ParseError::MalformedLine {
                line: index + 1,
                source,
            })?;

        if let Some(entry) = parse_entry(raw_entry) {
            results.push(entry);
        }
    }

    Ok(results)
}
