use crate::traits::Notifier;
use crate::types::{ChatId, MessageId};
use tracing::{debug, warn};

/// The one "searching / now playing" message of a chat, edited in place.
#[derive(Default)]
pub(crate) struct StatusMessage {
    message_id: Option<MessageId>,
    text: Option<String>,
}

impl StatusMessage {
    #[cfg(test)]
    pub(crate) fn message_id(&self) -> Option<MessageId> {
        self.message_id
    }

    pub(crate) async fn show(&mut self, notifier: &dyn Notifier, chat_id: ChatId, text: &str) {
        if let Some(message_id) = self.message_id {
            if self.text.as_deref() == Some(text) {
                return;
            }

            match notifier.edit_text(chat_id, message_id, text).await {
                Ok(()) => {
                    self.text = Some(text.to_string());
                }
                Err(error) => {
                    // Most likely deleted by the user; the next update starts a new one.
                    debug!(%chat_id, %message_id, ?error, "Unable to edit status message");
                    self.message_id = None;
                    self.text = None;
                }
            }
            return;
        }

        match notifier.send_text(chat_id, text).await {
            Ok(message_id) => {
                self.message_id = Some(message_id);
                self.text = Some(text.to_string());
            }
            Err(error) => {
                warn!(%chat_id, ?error, "Unable to send status message");
            }
        }
    }

    pub(crate) async fn clear(&mut self, notifier: &dyn Notifier, chat_id: ChatId) {
        self.text = None;

        if let Some(message_id) = self.message_id.take() {
            if let Err(error) = notifier.delete_message(chat_id, message_id).await {
                debug!(%chat_id, %message_id, ?error, "Unable to delete status message");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatusMessage;
    use crate::test_mocks::{EventLog, NotifierMock};
    use crate::types::ChatId;
    use std::sync::atomic::Ordering;

    #[actix_rt::test]
    async fn should_edit_the_same_message_in_place() {
        let notifier = NotifierMock::new(EventLog::default());
        let mut status = StatusMessage::default();

        status.show(&notifier, ChatId(7), "searching").await;
        status.show(&notifier, ChatId(7), "now playing: Numb").await;

        assert_eq!(notifier.texts.lock().unwrap().len(), 1);
        assert_eq!(notifier.edits.lock().unwrap().len(), 1);
        assert_eq!(notifier.live_messages(), vec!["now playing: Numb".to_string()]);
    }

    #[actix_rt::test]
    async fn should_not_edit_with_identical_text() {
        let notifier = NotifierMock::new(EventLog::default());
        let mut status = StatusMessage::default();

        status.show(&notifier, ChatId(7), "scanning").await;
        status.show(&notifier, ChatId(7), "scanning").await;

        assert!(notifier.edits.lock().unwrap().is_empty());
    }

    #[actix_rt::test]
    async fn should_send_fresh_message_after_failed_edit() {
        let notifier = NotifierMock::new(EventLog::default());
        let mut status = StatusMessage::default();

        status.show(&notifier, ChatId(7), "searching").await;
        let first = status.message_id();

        notifier.fail_edits.store(true, Ordering::SeqCst);
        status.show(&notifier, ChatId(7), "now playing: Numb").await;
        assert_eq!(status.message_id(), None);

        status.show(&notifier, ChatId(7), "now playing: Numb").await;

        assert_eq!(notifier.texts.lock().unwrap().len(), 2);
        assert!(status.message_id().is_some());
        assert_ne!(status.message_id(), first);
    }

    #[actix_rt::test]
    async fn should_forget_message_on_clear_even_if_already_deleted() {
        let notifier = NotifierMock::new(EventLog::default());
        let mut status = StatusMessage::default();

        status.show(&notifier, ChatId(7), "searching").await;
        status.clear(&notifier, ChatId(7)).await;
        status.clear(&notifier, ChatId(7)).await;

        assert_eq!(status.message_id(), None);
        assert!(notifier.live_messages().is_empty());
    }
}
