use crate::types::{Station, TrackDescriptor};
use rand::seq::SliceRandom;

const MUSIC_ICONS: [&str; 6] = ["🎵", "🎶", "🎧", "📻", "🎸", "🎹"];
const TITLE_MAX_CHARS: usize = 40;
const ARTIST_MAX_CHARS: usize = 30;

pub(crate) const SCANNING_FOR_SIGNAL: &str = "📡 scanning for signal…";
pub(crate) const STOPPED_AFTER_ERRORS: &str = "⛔ playback stopped due to repeated errors";

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut truncated = text.chars().take(max_chars - 1).collect::<String>();
    truncated.push('…');
    truncated
}

pub fn format_duration(duration_seconds: u32) -> String {
    format!("{}:{:02}", duration_seconds / 60, duration_seconds % 60)
}

// "1970s" and "80s" count as eras, anything else is not shown.
fn era_suffix(decade: Option<&str>) -> Option<&str> {
    let decade = decade?.trim();
    let digits = decade.strip_suffix('s')?;

    match digits.len() {
        2 | 4 if digits.chars().all(|c| c.is_ascii_digit()) => Some(decade),
        _ => None,
    }
}

pub(crate) fn searching(station: &Station) -> String {
    format!("🔎 searching new music for {}", station.display_name)
}

pub(crate) fn now_playing(track: &TrackDescriptor) -> String {
    format!("⏳ now playing: {}", truncate(&track.title, TITLE_MAX_CHARS))
}

pub(crate) fn backup_frequency(query: &str) -> String {
    format!("📻 switching to backup frequency: {}", query)
}

/// Caption under delivered audio.
pub fn track_caption(track: &TrackDescriptor, station: Option<&Station>) -> String {
    let icon = MUSIC_ICONS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or("🎵");

    let mut caption = format!(
        "{} {}\n👤 {}",
        icon,
        truncate(&track.title, TITLE_MAX_CHARS),
        truncate(&track.artist, ARTIST_MAX_CHARS),
    );

    if track.duration_seconds > 0 {
        caption.push_str(&format!("\n⏱ {}", format_duration(track.duration_seconds)));
    }

    if let Some(station) = station {
        caption.push_str(&format!("\n📻 {}", station.display_name));
        if let Some(era) = era_suffix(station.decade.as_deref()) {
            caption.push_str(&format!(" · {}", era));
        }
    }

    caption
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(title: &str, artist: &str, duration_seconds: u32) -> TrackDescriptor {
        TrackDescriptor {
            id: "id".into(),
            title: title.into(),
            artist: artist.into(),
            duration_seconds,
        }
    }

    #[test]
    fn should_format_duration() {
        assert_eq!(format_duration(0), "0:00");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3600), "60:00");
    }

    #[test]
    fn should_truncate_long_titles() {
        let title = "a".repeat(50);
        let text = now_playing(&track(&title, "Artist", 200));

        assert!(text.ends_with('…'));
        assert_eq!(text.chars().filter(|c| *c == 'a').count(), 39);
    }

    #[test]
    fn should_add_era_only_for_decades() {
        let track = track("Africa", "Toto", 295);
        let seventies = Station::new("soft rock".into(), Some("Soft Rock".into()), Some("1970s".into()));
        let other = Station::new("soft rock".into(), None, Some("yacht".into()));

        assert!(track_caption(&track, Some(&seventies)).ends_with("📻 Soft Rock · 1970s"));
        assert!(track_caption(&track, Some(&other)).ends_with("📻 soft rock"));
    }

    #[test]
    fn should_omit_unknown_duration() {
        let caption = track_caption(&track("Intro", "Band", 0), None);

        assert!(!caption.contains('⏱'));
        assert!(caption.contains("👤 Band"));
    }
}
