use crate::services::{TelegramClient, TelegramClientError};
use async_trait::async_trait;
use radio_sessions::{
    AudioMessage, AudioSource, ChatId, MessageId, Notifier, NotifierError, RemoteHandle,
};

impl From<TelegramClientError> for NotifierError {
    fn from(error: TelegramClientError) -> Self {
        NotifierError::new(error)
    }
}

#[async_trait]
impl Notifier for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, NotifierError> {
        Ok(self.send_message(chat_id, text, None).await?)
    }

    async fn edit_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), NotifierError> {
        Ok(self.edit_message_text(chat_id, message_id, text, None).await?)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), NotifierError> {
        Ok(TelegramClient::delete_message(self, chat_id, message_id).await?)
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        source: AudioSource<'_>,
        message: &AudioMessage,
    ) -> Result<Option<RemoteHandle>, NotifierError> {
        let handle = match source {
            AudioSource::Remote(handle) => self.send_audio_by_id(chat_id, handle, message).await?,
            AudioSource::File(path) => self.upload_audio(chat_id, path, message).await?,
        };

        Ok(handle)
    }
}
