use crate::services::{CommandRouter, MenuCallback};
use actix_web::web::{Bytes, Data};
use actix_web::{HttpResponse, Responder};
use radio_sessions::{ChatId, ChatKind, MessageId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Deserialize)]
pub(crate) struct Update {
    message: Option<IncomingMessage>,
    callback_query: Option<CallbackQuery>,
}

#[derive(Deserialize)]
struct IncomingMessage {
    #[serde(default)]
    message_id: i64,
    chat: Chat,
    text: Option<String>,
}

#[derive(Deserialize)]
struct Chat {
    id: i64,
    #[serde(rename = "type", default)]
    kind: ChatKind,
}

#[derive(Deserialize)]
struct CallbackQuery {
    id: String,
    data: Option<String>,
    /// Missing for buttons of inline-mode messages.
    message: Option<IncomingMessage>,
}

#[derive(Debug, PartialEq, Eq)]
enum Incoming {
    Command {
        chat_id: ChatId,
        chat_kind: ChatKind,
        text: String,
    },
    Callback(MenuCallback),
}

/// Telegram redelivers updates that are not acknowledged with 200, so this
/// always succeeds and does the work in the background.
pub(crate) async fn handle_telegram_update(
    command_router: Data<Arc<CommandRouter>>,
    body: Bytes,
) -> impl Responder {
    let update = match serde_json::from_slice::<Update>(&body) {
        Ok(update) => update,
        Err(error) => {
            warn!(?error, "Malformed Telegram update");
            return HttpResponse::Ok().finish();
        }
    };

    let Some(incoming) = incoming(update) else {
        debug!("Ignoring update without command or button");
        return HttpResponse::Ok().finish();
    };

    let command_router = Arc::clone(command_router.get_ref());
    actix_rt::spawn(async move {
        match incoming {
            Incoming::Command {
                chat_id,
                chat_kind,
                text,
            } => command_router.handle(chat_id, chat_kind, &text).await,
            Incoming::Callback(callback) => command_router.handle_callback(callback).await,
        }
    });

    HttpResponse::Ok().finish()
}

fn incoming(update: Update) -> Option<Incoming> {
    if let Some(query) = update.callback_query {
        let message = query.message?;

        return Some(Incoming::Callback(MenuCallback {
            id: query.id,
            chat_id: ChatId(message.chat.id),
            chat_kind: message.chat.kind,
            message_id: MessageId(message.message_id),
            data: query.data?,
        }));
    }

    let message = update.message?;

    Some(Incoming::Command {
        chat_id: ChatId(message.chat.id),
        chat_kind: message.chat.kind,
        text: message.text?,
    })
}
