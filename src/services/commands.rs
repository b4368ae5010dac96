use crate::services::{
    category_menu, category_request, genres_menu, player_menu, start_menu, Menu, MenuAction,
    MenuCallback, MenuPresenter,
};
use radio_sessions::{
    deliver_track, AudioMessage, ChatId, ChatKind, GenreCatalog, GenreNode, PlayerButton,
    RadioManager, SearchFilters, SessionDeps, StationRequest,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Start,
    Genres,
    Radio(Option<String>),
    Stop,
    Skip,
    Play(String),
    Player,
    Unknown(String),
}

/// Parses a chat message into a bot command. Text that does not start with
/// `/` is not a command.
pub(crate) fn parse_command(text: &str) -> Option<Command> {
    let text = text.trim();
    let rest = text.strip_prefix('/')?;

    let (head, argument) = match rest.split_once(char::is_whitespace) {
        Some((head, argument)) => (head, argument.trim()),
        None => (rest, ""),
    };
    // "/radio@my_bot" in groups
    let name = head.split('@').next().unwrap_or_default().to_lowercase();
    let argument = (!argument.is_empty()).then(|| argument.to_string());

    let command = match name.as_str() {
        "start" | "help" => Command::Start,
        "genres" => Command::Genres,
        "radio" => Command::Radio(argument),
        "stop" => Command::Stop,
        "skip" | "next" => Command::Skip,
        "play" => match argument {
            Some(query) => Command::Play(query),
            None => Command::Unknown(name),
        },
        "player" => Command::Player,
        _ => Command::Unknown(name),
    };

    Some(command)
}

/// Splits a trailing era such as "1970s" or "80s" off a genre argument.
fn split_decade(argument: &str) -> (&str, Option<&str>) {
    let Some((genre, last)) = argument.trim().rsplit_once(char::is_whitespace) else {
        return (argument.trim(), None);
    };

    let is_era = last
        .strip_suffix('s')
        .map(|digits| {
            matches!(digits.len(), 2 | 4) && digits.chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false);

    match is_era {
        true => (genre.trim(), Some(last)),
        false => (argument.trim(), None),
    }
}

/// Turns the argument of `/radio` into a station request: a catalog leaf
/// plays its query, a category plays a random leaf inside it, anything else
/// is searched for as typed.
pub(crate) fn station_request(
    catalog: &GenreCatalog,
    argument: Option<&str>,
    chat_kind: ChatKind,
) -> StationRequest {
    let Some(argument) = argument.map(str::trim).filter(|a| !a.is_empty()) else {
        return StationRequest::random(chat_kind);
    };

    let (genre, decade) = split_decade(argument);

    let request = match catalog.find(genre) {
        Some(GenreNode::Leaf { name, query }) => {
            StationRequest::new(query.clone(), chat_kind).with_display_name(name.clone())
        }
        Some(node @ GenreNode::Category { .. }) => match node.random_leaf() {
            Some(leaf) => {
                StationRequest::new(leaf.query, chat_kind).with_display_name(leaf.display_name)
            }
            None => StationRequest::new(genre, chat_kind),
        },
        None => StationRequest::new(genre, chat_kind),
    };

    match decade {
        Some(decade) => request.with_decade(decade),
        None => request,
    }
}

/// Executes chat commands and menu button presses against the radio
/// manager and the track provider.
pub(crate) struct CommandRouter {
    manager: Arc<RadioManager>,
    catalog: Arc<GenreCatalog>,
    deps: SessionDeps,
    menus: Arc<dyn MenuPresenter>,
}

impl CommandRouter {
    pub(crate) fn new(
        manager: Arc<RadioManager>,
        catalog: Arc<GenreCatalog>,
        deps: SessionDeps,
        menus: Arc<dyn MenuPresenter>,
    ) -> Self {
        Self {
            manager,
            catalog,
            deps,
            menus,
        }
    }

    pub(crate) async fn handle(&self, chat_id: ChatId, chat_kind: ChatKind, text: &str) {
        let Some(command) = parse_command(text) else {
            return;
        };

        debug!(%chat_id, ?command, "Handling command");

        match command {
            Command::Start => {
                let button = self.player_button(chat_kind);
                self.show(chat_id, &start_menu(button.as_ref())).await
            }
            Command::Genres => self.show(chat_id, &genres_menu(&self.catalog)).await,
            Command::Radio(argument) => {
                let request = station_request(&self.catalog, argument.as_deref(), chat_kind);
                self.start_station(chat_id, request).await;
            }
            Command::Stop => {
                self.manager.stop(chat_id).await;
                self.reply(chat_id, "⏹ radio stopped").await;
            }
            Command::Skip => match self.manager.is_playing(chat_id) {
                true => self.manager.skip(chat_id),
                false => self.reply(chat_id, "radio is not playing, try /radio").await,
            },
            Command::Play(query) => self.play(chat_id, chat_kind, &query).await,
            Command::Player => match self.player_button(chat_kind) {
                Some(button) => self.show(chat_id, &player_menu(&button)).await,
                None => self.reply(chat_id, "web player is not available here").await,
            },
            Command::Unknown(name) => {
                debug!(%chat_id, %name, "Unknown command");
                self.reply(chat_id, "unknown command, see /start").await;
            }
        }
    }

    /// Menu navigation edits the message that carried the pressed button.
    pub(crate) async fn handle_callback(&self, callback: MenuCallback) {
        let chat_id = callback.chat_id;

        if let Err(error) = self.menus.acknowledge(&callback.id).await {
            warn!(%chat_id, ?error, "Unable to answer callback query");
        }

        let Some(action) = MenuAction::parse(&callback.data) else {
            debug!(%chat_id, data = %callback.data, "Unknown callback data");
            return;
        };

        debug!(%chat_id, ?action, "Handling menu action");

        match action {
            MenuAction::Start => {
                let button = self.player_button(callback.chat_kind);
                self.replace(&callback, &start_menu(button.as_ref())).await
            }
            MenuAction::Genres => self.replace(&callback, &genres_menu(&self.catalog)).await,
            MenuAction::Category(path) => {
                self.replace(&callback, &category_menu(&self.catalog, &path))
                    .await
            }
            MenuAction::PlayCategory(path) => {
                let request = category_request(&self.catalog, &path, callback.chat_kind);
                let name = request
                    .display_name
                    .clone()
                    .unwrap_or_else(|| request.query.clone());

                self.replace(&callback, &Menu::text(format!("🎵 Playing {}...", name)))
                    .await;
                self.start_station(chat_id, request).await;
            }
            MenuAction::PlayRandom => {
                self.replace(&callback, &Menu::text("🎲 Random mix..."))
                    .await;
                self.start_station(chat_id, StationRequest::random(callback.chat_kind))
                    .await;
            }
        }
    }

    async fn start_station(&self, chat_id: ChatId, request: StationRequest) {
        match self.manager.start(chat_id, request).await {
            Ok(station) => {
                self.reply(chat_id, &format!("📻 tuned in to {}", station.display_name))
                    .await
            }
            Err(error) => {
                warn!(%chat_id, ?error, "Unable to start radio");
                self.reply(chat_id, "⚠️ unable to start the radio").await;
            }
        }
    }

    fn player_button(&self, chat_kind: ChatKind) -> Option<PlayerButton> {
        PlayerButton::for_chat(self.deps.settings.player_url.as_deref(), chat_kind)
    }

    async fn play(&self, chat_id: ChatId, chat_kind: ChatKind, query: &str) {
        let tracks = match self
            .deps
            .provider
            .search(query, &SearchFilters::new(1))
            .await
        {
            Ok(tracks) => tracks,
            Err(error) => {
                warn!(%chat_id, %query, ?error, "Track search failed");
                self.reply(chat_id, "⚠️ search failed, try again later").await;
                return;
            }
        };

        let Some(track) = tracks.first() else {
            self.reply(chat_id, &format!("nothing found for {}", query))
                .await;
            return;
        };

        let button = self.player_button(chat_kind);
        let message = AudioMessage::for_track(track, None, button);

        match deliver_track(&self.deps, chat_id, &track.id, &message).await {
            Ok(()) => info!(%chat_id, track_id = %track.id, "Track delivered on request"),
            Err(error) => {
                warn!(%chat_id, track_id = %track.id, ?error, "Unable to deliver track");
                self.reply(chat_id, "⚠️ unable to send this track").await;
            }
        }
    }

    async fn show(&self, chat_id: ChatId, menu: &Menu) {
        if let Err(error) = self.menus.show_menu(chat_id, menu).await {
            warn!(%chat_id, ?error, "Unable to send menu");
        }
    }

    async fn replace(&self, callback: &MenuCallback, menu: &Menu) {
        let chat_id = callback.chat_id;

        if let Err(error) = self
            .menus
            .replace_menu(chat_id, callback.message_id, menu)
            .await
        {
            warn!(%chat_id, ?error, "Unable to update menu");
        }
    }

    async fn reply(&self, chat_id: ChatId, text: &str) {
        if let Err(error) = self.deps.notifier.send_text(chat_id, text).await {
            warn!(%chat_id, ?error, "Unable to reply to command");
        }
    }
}
