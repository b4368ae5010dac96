use serde::{Deserialize, Serialize};
use std::ops::Deref;
use std::path::PathBuf;

// ChatId
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub struct ChatId(pub i64);

impl Deref for ChatId {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<i64> for ChatId {
    fn from(value: i64) -> Self {
        ChatId(value)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// MessageId
#[derive(Eq, PartialEq, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub struct MessageId(pub i64);

impl Deref for MessageId {
    type Target = i64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<i64> for MessageId {
    fn from(value: i64) -> Self {
        MessageId(value)
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// TrackId
#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct TrackId(pub String);

impl Deref for TrackId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        TrackId(value.to_string())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        TrackId(value)
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to media the chat platform already stores, so it can be
/// sent again without fetching the source.
#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
pub struct RemoteHandle(pub String);

impl Deref for RemoteHandle {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for RemoteHandle {
    fn from(value: &str) -> Self {
        RemoteHandle(value.to_string())
    }
}

impl std::fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    /// Zero when the provider does not know the duration.
    pub duration_seconds: u32,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PlaybackResource {
    Remote(RemoteHandle),
    Local(PathBuf),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    #[default]
    Private,
    Group,
    Supergroup,
    Channel,
}

/// What a radio session plays: an immutable search definition.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Station {
    pub query: String,
    pub display_name: String,
    pub decade: Option<String>,
}

impl Station {
    pub fn new(query: String, display_name: Option<String>, decade: Option<String>) -> Self {
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| query.clone());

        Self {
            query,
            display_name,
            decade,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct StationRequest {
    pub query: String,
    pub chat_kind: ChatKind,
    pub display_name: Option<String>,
    pub decade: Option<String>,
}

impl StationRequest {
    pub const RANDOM_QUERY: &'static str = "random";

    pub fn new(query: impl Into<String>, chat_kind: ChatKind) -> Self {
        Self {
            query: query.into(),
            chat_kind,
            display_name: None,
            decade: None,
        }
    }

    pub fn random(chat_kind: ChatKind) -> Self {
        Self::new(Self::RANDOM_QUERY, chat_kind)
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_decade(mut self, decade: impl Into<String>) -> Self {
        self.decade = Some(decade.into());
        self
    }

    pub fn is_random(&self) -> bool {
        self.query == Self::RANDOM_QUERY
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SessionState {
    Idle,
    Running,
    Stopped,
}

/// Web player button attached to delivered audio.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PlayerButton {
    /// Opens the player inside the chat client; private chats only.
    WebApp(String),
    /// Plain link; safe in groups.
    Link(String),
}

impl PlayerButton {
    pub fn for_chat(base_url: Option<&str>, chat_kind: ChatKind) -> Option<PlayerButton> {
        let url = base_url.map(str::trim).filter(|url| url.starts_with("https"))?;

        match chat_kind {
            ChatKind::Private => Some(PlayerButton::WebApp(url.to_string())),
            ChatKind::Group | ChatKind::Supergroup => Some(PlayerButton::Link(url.to_string())),
            ChatKind::Channel => None,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct AudioMessage {
    pub caption: String,
    pub title: String,
    pub performer: String,
    pub duration_seconds: u32,
    pub button: Option<PlayerButton>,
}

impl AudioMessage {
    pub fn for_track(
        track: &TrackDescriptor,
        station: Option<&Station>,
        button: Option<PlayerButton>,
    ) -> Self {
        Self {
            caption: crate::session::track_caption(track, station),
            title: track.title.clone(),
            performer: track.artist.clone(),
            duration_seconds: track.duration_seconds,
            button,
        }
    }
}
