use crate::services::{ButtonTarget, MenuButton};
use radio_sessions::{AudioMessage, ChatId, MessageId, PlayerButton, RemoteHandle};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio_util::codec::{BytesCodec, FramedRead};
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Debug, thiserror::Error)]
pub(crate) enum TelegramClientError {
    #[error(transparent)]
    Reqwest(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Telegram API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("Telegram API returned no result")]
    EmptyResult,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    error_code: Option<i64>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: i64,
    audio: Option<SentAudio>,
}

#[derive(Deserialize)]
struct SentAudio {
    file_id: String,
}

pub(crate) fn inline_keyboard(rows: &[Vec<MenuButton>]) -> serde_json::Value {
    let rows = rows
        .iter()
        .map(|row| row.iter().map(inline_button).collect::<Vec<_>>())
        .collect::<Vec<_>>();

    serde_json::json!({ "inline_keyboard": rows })
}

fn inline_button(button: &MenuButton) -> serde_json::Value {
    match &button.target {
        ButtonTarget::Callback(data) => serde_json::json!({
            "text": button.text,
            "callback_data": data,
        }),
        ButtonTarget::Url(url) => serde_json::json!({
            "text": button.text,
            "url": url,
        }),
        ButtonTarget::WebApp(url) => serde_json::json!({
            "text": button.text,
            "web_app": { "url": url },
        }),
    }
}

fn player_keyboard(button: &PlayerButton) -> serde_json::Value {
    inline_keyboard(&[vec![MenuButton::player(button)]])
}

/// Thin Bot API client covering the calls the radio needs.
pub(crate) struct TelegramClient {
    client: Client,
    endpoint: String,
}

impl TelegramClient {
    pub(crate) fn create(api_url: &str, bot_token: &str) -> Result<Self, TelegramClientError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            endpoint: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.endpoint, method)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T, TelegramClientError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&payload)
            .send()
            .await?
            .json::<ApiResponse<T>>()
            .await?;

        unwrap_response(response)
    }

    pub(crate) async fn send_message(
        &self,
        chat_id: ChatId,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<MessageId, TelegramClientError> {
        let mut payload = serde_json::json!({
            "chat_id": *chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(reply_markup) = reply_markup {
            payload["reply_markup"] = reply_markup;
        }

        let message = self.call::<SentMessage>("sendMessage", payload).await?;

        Ok(MessageId(message.message_id))
    }

    pub(crate) async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        reply_markup: Option<serde_json::Value>,
    ) -> Result<(), TelegramClientError> {
        let mut payload = serde_json::json!({
            "chat_id": *chat_id,
            "message_id": *message_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if let Some(reply_markup) = reply_markup {
            payload["reply_markup"] = reply_markup;
        }

        self.call::<serde_json::Value>("editMessageText", payload)
            .await?;

        Ok(())
    }

    pub(crate) async fn answer_callback_query(
        &self,
        callback_query_id: &str,
    ) -> Result<(), TelegramClientError> {
        self.call::<bool>(
            "answerCallbackQuery",
            serde_json::json!({ "callback_query_id": callback_query_id }),
        )
        .await?;

        Ok(())
    }

    pub(crate) async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), TelegramClientError> {
        self.call::<bool>(
            "deleteMessage",
            serde_json::json!({
                "chat_id": *chat_id,
                "message_id": *message_id,
            }),
        )
        .await?;

        Ok(())
    }

    /// Re-sends audio Telegram already stores.
    pub(crate) async fn send_audio_by_id(
        &self,
        chat_id: ChatId,
        file_id: &RemoteHandle,
        message: &AudioMessage,
    ) -> Result<Option<RemoteHandle>, TelegramClientError> {
        let mut payload = serde_json::json!({
            "chat_id": *chat_id,
            "audio": &**file_id,
            "caption": message.caption,
            "title": message.title,
            "performer": message.performer,
        });
        if message.duration_seconds > 0 {
            payload["duration"] = message.duration_seconds.into();
        }
        if let Some(button) = &message.button {
            payload["reply_markup"] = player_keyboard(button);
        }

        let sent = self.call::<SentMessage>("sendAudio", payload).await?;

        Ok(sent.audio.map(|audio| RemoteHandle(audio.file_id)))
    }

    /// Uploads a local file, streaming it from disk.
    pub(crate) async fn upload_audio(
        &self,
        chat_id: ChatId,
        path: &Path,
        message: &AudioMessage,
    ) -> Result<Option<RemoteHandle>, TelegramClientError> {
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("audio.mp3")
            .to_string();
        let mime = mime_guess::from_path(path).first_or_octet_stream();

        debug!(%chat_id, %file_name, length, "Uploading audio");

        let body = Body::wrap_stream(FramedRead::new(file, BytesCodec::new()));
        let part = Part::stream_with_length(body, length)
            .file_name(file_name)
            .mime_str(mime.essence_str())?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", message.caption.clone())
            .text("title", message.title.clone())
            .text("performer", message.performer.clone())
            .part("audio", part);
        if message.duration_seconds > 0 {
            form = form.text("duration", message.duration_seconds.to_string());
        }
        if let Some(button) = &message.button {
            form = form.text("reply_markup", serde_json::to_string(&player_keyboard(button))?);
        }

        let response = self
            .client
            .post(self.method_url("sendAudio"))
            .multipart(form)
            .send()
            .await?
            .json::<ApiResponse<SentMessage>>()
            .await?;

        let sent = unwrap_response(response)?;

        Ok(sent.audio.map(|audio| RemoteHandle(audio.file_id)))
    }

    pub(crate) async fn set_webhook(&self, url: &str) -> Result<(), TelegramClientError> {
        self.call::<bool>("setWebhook", serde_json::json!({ "url": url }))
            .await?;

        Ok(())
    }
}

fn unwrap_response<T>(response: ApiResponse<T>) -> Result<T, TelegramClientError> {
    if !response.ok {
        return Err(TelegramClientError::Api {
            code: response.error_code.unwrap_or_default(),
            description: response.description.unwrap_or_default(),
        });
    }

    response.result.ok_or(TelegramClientError::EmptyResult)
}
