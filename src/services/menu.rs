use async_trait::async_trait;
use radio_sessions::{
    ChatId, ChatKind, GenreCatalog, GenreNode, MessageId, NotifierError, PlayerButton,
    StationRequest,
};

/// Telegram rejects buttons whose callback data is longer than this.
pub(crate) const CALLBACK_DATA_LIMIT: usize = 64;

pub(crate) const HELP_TEXT: &str = "📻 Welcome to the radio!\n\n\
/radio [genre] - play a station, random when no genre is given\n\
/genres - browse genres\n\
/skip - next track\n\
/stop - stop the radio\n\
/play <query> - find and send a single track\n\
/player - open the web player";

pub(crate) const PLAYER_BUTTON_TEXT: &str = "🎧 Open player";

const GENRE_EXAMPLES: usize = 4;
const PATH_SEPARATOR: &str = "|";

/// What a button press asks for. Encoded into callback data as
/// `main_menu_start`, `main_menu_genres`, `cat|<path>`, `play_cat|<path>`
/// or `play_random`, where `<path>` joins catalog names with `|`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MenuAction {
    Start,
    Genres,
    Category(String),
    PlayCategory(String),
    PlayRandom,
}

impl MenuAction {
    pub(crate) fn parse(data: &str) -> Option<MenuAction> {
        match data {
            "main_menu_start" => return Some(MenuAction::Start),
            "main_menu_genres" | "main_menu" => return Some(MenuAction::Genres),
            "play_random" => return Some(MenuAction::PlayRandom),
            _ => (),
        }

        let (kind, path) = data.split_once(PATH_SEPARATOR)?;
        let path = path.trim();

        match kind {
            "cat" if path.is_empty() => Some(MenuAction::Start),
            "cat" => Some(MenuAction::Category(path.to_string())),
            "play_cat" if !path.is_empty() => Some(MenuAction::PlayCategory(path.to_string())),
            _ => None,
        }
    }

    pub(crate) fn callback_data(&self) -> String {
        match self {
            MenuAction::Start => "main_menu_start".to_string(),
            MenuAction::Genres => "main_menu_genres".to_string(),
            MenuAction::Category(path) => format!("cat{}{}", PATH_SEPARATOR, path),
            MenuAction::PlayCategory(path) => format!("play_cat{}{}", PATH_SEPARATOR, path),
            MenuAction::PlayRandom => "play_random".to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ButtonTarget {
    Callback(String),
    Url(String),
    WebApp(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MenuButton {
    pub(crate) text: String,
    pub(crate) target: ButtonTarget,
}

impl MenuButton {
    /// `None` when the action does not fit into callback data.
    pub(crate) fn action(text: impl Into<String>, action: &MenuAction) -> Option<MenuButton> {
        let data = action.callback_data();

        (data.len() <= CALLBACK_DATA_LIMIT).then(|| MenuButton {
            text: text.into(),
            target: ButtonTarget::Callback(data),
        })
    }

    pub(crate) fn player(button: &PlayerButton) -> MenuButton {
        let target = match button {
            PlayerButton::WebApp(url) => ButtonTarget::WebApp(url.clone()),
            PlayerButton::Link(url) => ButtonTarget::Url(url.clone()),
        };

        MenuButton {
            text: PLAYER_BUTTON_TEXT.to_string(),
            target,
        }
    }
}

/// A message with an inline keyboard, one button per row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Menu {
    pub(crate) text: String,
    pub(crate) rows: Vec<Vec<MenuButton>>,
}

impl Menu {
    pub(crate) fn text(text: impl Into<String>) -> Menu {
        Menu {
            text: text.into(),
            rows: vec![],
        }
    }

    fn push(&mut self, button: Option<MenuButton>) {
        if let Some(button) = button {
            self.rows.push(vec![button]);
        }
    }

    pub(crate) fn callback_data(&self) -> Vec<&str> {
        self.rows
            .iter()
            .flatten()
            .filter_map(|button| match &button.target {
                ButtonTarget::Callback(data) => Some(data.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// A pressed inline button.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MenuCallback {
    pub(crate) id: String,
    pub(crate) chat_id: ChatId,
    pub(crate) chat_kind: ChatKind,
    pub(crate) message_id: MessageId,
    pub(crate) data: String,
}

/// Chat output that carries inline keyboards.
#[async_trait]
pub(crate) trait MenuPresenter: Send + Sync {
    async fn show_menu(&self, chat_id: ChatId, menu: &Menu) -> Result<(), NotifierError>;
    /// Replaces text and keyboard of a message sent earlier.
    async fn replace_menu(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        menu: &Menu,
    ) -> Result<(), NotifierError>;
    /// Stops the client's loading indicator on the pressed button.
    async fn acknowledge(&self, callback_id: &str) -> Result<(), NotifierError>;
}

fn path_segments(path: &str) -> Vec<&str> {
    path.split(PATH_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

fn node_button(path: &str, node: &GenreNode) -> Option<MenuButton> {
    let path = match path.is_empty() {
        true => node.name().to_string(),
        false => format!("{}{}{}", path, PATH_SEPARATOR, node.name()),
    };

    match node {
        GenreNode::Category { .. } => {
            MenuButton::action(format!("📂 {}", node.name()), &MenuAction::Category(path))
        }
        GenreNode::Leaf { .. } => {
            MenuButton::action(format!("▶️ {}", node.name()), &MenuAction::PlayCategory(path))
        }
    }
}

pub(crate) fn start_menu(player: Option<&PlayerButton>) -> Menu {
    let mut menu = Menu::text(HELP_TEXT);

    if let Some(button) = player {
        menu.rows.push(vec![MenuButton::player(button)]);
    }
    menu.push(MenuButton::action("🗂 Browse genres", &MenuAction::Genres));

    menu
}

pub(crate) fn player_menu(button: &PlayerButton) -> Menu {
    Menu {
        text: "👇 Player:".to_string(),
        rows: vec![vec![MenuButton::player(button)]],
    }
}

pub(crate) fn genres_text(catalog: &GenreCatalog) -> String {
    let mut lines = vec!["🎼 Genres:".to_string()];

    for root in catalog.roots() {
        let examples = root
            .children()
            .iter()
            .take(GENRE_EXAMPLES)
            .map(GenreNode::name)
            .collect::<Vec<_>>();

        match examples.is_empty() {
            true => lines.push(format!("• {}", root.name())),
            false => lines.push(format!("• {}: {}", root.name(), examples.join(", "))),
        }
    }

    lines.push(String::new());
    lines.push("Try /radio Rock or /radio Jazz 1960s".to_string());

    lines.join("\n")
}

/// Top level of the catalog plus a random mix.
pub(crate) fn genres_menu(catalog: &GenreCatalog) -> Menu {
    let mut menu = Menu::text(genres_text(catalog));

    for root in catalog.roots() {
        menu.push(node_button("", root));
    }
    menu.push(MenuButton::action("🎲 Random mix", &MenuAction::PlayRandom));

    menu
}

/// Children of the category at `path`. Buttons whose path would not fit
/// into callback data are left out.
pub(crate) fn category_menu(catalog: &GenreCatalog, path: &str) -> Menu {
    let segments = path_segments(path);
    let back = MenuButton::action("🔙 Back", &MenuAction::Genres);

    let node = match catalog.find(&segments.join("/")) {
        Some(node @ GenreNode::Category { .. }) => node,
        _ => {
            let mut menu = Menu::text("❌ This menu is out of date");
            menu.push(back);
            return menu;
        }
    };

    let path = segments.join(PATH_SEPARATOR);
    let mut menu = Menu::text(format!("💿 {}:", node.name()));

    for child in node.children() {
        menu.push(node_button(&path, child));
    }

    let back = match segments.split_last() {
        Some((_, parent)) if !parent.is_empty() => MenuButton::action(
            "🔙 Back",
            &MenuAction::Category(parent.join(PATH_SEPARATOR)),
        )
        .or(back),
        _ => back,
    };
    menu.push(back);

    menu
}

/// Station for a pressed `play_cat` button. A path the catalog no longer
/// knows is searched for as words.
pub(crate) fn category_request(
    catalog: &GenreCatalog,
    path: &str,
    chat_kind: ChatKind,
) -> StationRequest {
    let segments = path_segments(path);

    match catalog.find(&segments.join("/")) {
        Some(GenreNode::Leaf { name, query }) => {
            StationRequest::new(query.clone(), chat_kind).with_display_name(name.clone())
        }
        Some(node @ GenreNode::Category { .. }) => match node.random_leaf() {
            Some(leaf) => {
                StationRequest::new(leaf.query, chat_kind).with_display_name(leaf.display_name)
            }
            None => StationRequest::new(node.name(), chat_kind),
        },
        None => StationRequest::new(segments.join(" "), chat_kind),
    }
}
