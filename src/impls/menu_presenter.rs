use crate::services::{inline_keyboard, Menu, MenuPresenter, TelegramClient};
use async_trait::async_trait;
use radio_sessions::{ChatId, MessageId, NotifierError};

fn reply_markup(menu: &Menu) -> Option<serde_json::Value> {
    (!menu.rows.is_empty()).then(|| inline_keyboard(&menu.rows))
}

#[async_trait]
impl MenuPresenter for TelegramClient {
    async fn show_menu(&self, chat_id: ChatId, menu: &Menu) -> Result<(), NotifierError> {
        self.send_message(chat_id, &menu.text, reply_markup(menu))
            .await?;

        Ok(())
    }

    async fn replace_menu(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        menu: &Menu,
    ) -> Result<(), NotifierError> {
        Ok(self
            .edit_message_text(chat_id, message_id, &menu.text, reply_markup(menu))
            .await?)
    }

    async fn acknowledge(&self, callback_id: &str) -> Result<(), NotifierError> {
        Ok(self.answer_callback_query(callback_id).await?)
    }
}
