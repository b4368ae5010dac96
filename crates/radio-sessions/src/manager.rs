use crate::catalog::GenreCatalog;
use crate::session::{RadioSession, SessionDeps};
use crate::types::{ChatId, Station, StationRequest};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{error, info};

const FALLBACK_QUERY: &str = "80s synth pop";
const FALLBACK_DISPLAY_NAME: &str = "Synth-Pop";

#[derive(Debug, thiserror::Error)]
pub enum RadioManagerError {
    #[error("Invalid chat id: {0}")]
    InvalidChatId(ChatId),
    #[error("Radio is shutting down")]
    ShuttingDown,
}

type ChatLock = Arc<async_lock::Mutex<()>>;

/// Registry of running radio sessions, one per chat.
pub struct RadioManager {
    deps: SessionDeps,
    catalog: Arc<GenreCatalog>,
    sessions: Mutex<HashMap<ChatId, Arc<RadioSession>>>,
    chat_locks: Mutex<HashMap<ChatId, ChatLock>>,
    closed: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl RadioManager {
    pub fn new(deps: SessionDeps, catalog: Arc<GenreCatalog>) -> Self {
        Self {
            deps,
            catalog,
            sessions: Mutex::new(HashMap::new()),
            chat_locks: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    fn chat_lock(&self, chat_id: ChatId) -> ChatLock {
        lock(&self.chat_locks)
            .entry(chat_id)
            .or_default()
            .clone()
    }

    // Forgets the chat's lock once nobody else holds or waits for it.
    fn release_chat_lock(&self, chat_id: ChatId, chat_lock: ChatLock) {
        let mut chat_locks = lock(&self.chat_locks);

        let is_last_holder = chat_locks
            .get(&chat_id)
            .map(|stored| Arc::ptr_eq(stored, &chat_lock) && Arc::strong_count(stored) == 2)
            .unwrap_or(false);
        if is_last_holder {
            chat_locks.remove(&chat_id);
        }
    }

    /// Replaces whatever the chat was playing with a new station. The old
    /// session is fully stopped before the new one starts.
    pub async fn start(
        &self,
        chat_id: ChatId,
        request: StationRequest,
    ) -> Result<Station, RadioManagerError> {
        if *chat_id == 0 {
            return Err(RadioManagerError::InvalidChatId(chat_id));
        }

        let chat_lock = self.chat_lock(chat_id);
        let result = self.restart(chat_id, request, &chat_lock).await;
        self.release_chat_lock(chat_id, chat_lock);

        result
    }

    async fn restart(
        &self,
        chat_id: ChatId,
        request: StationRequest,
        chat_lock: &async_lock::Mutex<()>,
    ) -> Result<Station, RadioManagerError> {
        let _guard = chat_lock.lock().await;

        if self.closed.load(Ordering::SeqCst) {
            return Err(RadioManagerError::ShuttingDown);
        }

        let previous = lock(&self.sessions).remove(&chat_id);
        if let Some(previous) = previous {
            previous.stop().await;
        }

        let station = self.resolve_station(&request);
        let session = Arc::new(RadioSession::new(
            chat_id,
            request.chat_kind,
            station.clone(),
            self.deps.clone(),
        ));

        lock(&self.sessions).insert(chat_id, session.clone());
        session.start();

        info!(%chat_id, station = %station.display_name, "Radio station tuned in");

        Ok(station)
    }

    pub async fn stop(&self, chat_id: ChatId) {
        let chat_lock = self.chat_lock(chat_id);
        {
            let _guard = chat_lock.lock().await;

            let session = lock(&self.sessions).remove(&chat_id);
            if let Some(session) = session {
                session.stop().await;
            }
        }
        self.release_chat_lock(chat_id, chat_lock);
    }

    pub fn skip(&self, chat_id: ChatId) {
        let session = lock(&self.sessions).get(&chat_id).cloned();
        if let Some(session) = session {
            session.skip();
        }
    }

    /// Stops every session and waits until all loops have exited. Later
    /// starts are refused with [`RadioManagerError::ShuttingDown`].
    pub async fn stop_all(&self) {
        self.closed.store(true, Ordering::SeqCst);

        // A start in flight already owns a chat lock entry, so stopping that
        // chat waits for it to finish registering.
        let mut chat_ids = lock(&self.sessions).keys().copied().collect::<HashSet<_>>();
        chat_ids.extend(lock(&self.chat_locks).keys().copied());

        for chat_id in chat_ids {
            self.stop(chat_id).await;
        }

        info!("All radio sessions stopped");
    }

    pub fn is_playing(&self, chat_id: ChatId) -> bool {
        lock(&self.sessions)
            .get(&chat_id)
            .map(|session| session.is_running())
            .unwrap_or(false)
    }

    /// Chats whose radio loop is currently running.
    pub fn active_sessions(&self) -> Vec<ChatId> {
        lock(&self.sessions)
            .values()
            .filter(|session| session.is_running())
            .map(|session| session.chat_id())
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn tracked_chat_locks(&self) -> usize {
        lock(&self.chat_locks).len()
    }

    pub(crate) fn resolve_station(&self, request: &StationRequest) -> Station {
        if request.is_random() || request.query.trim().is_empty() {
            return self.random_station();
        }

        Station::new(
            request.query.trim().to_string(),
            request.display_name.clone(),
            request.decade.clone(),
        )
    }

    fn random_station(&self) -> Station {
        match self.catalog.random_leaf() {
            Some(leaf) => Station::new(
                leaf.query.to_string(),
                Some(leaf.display_name.to_string()),
                None,
            ),
            None => {
                error!("Genre catalog has no playable entries, using fallback station");
                Station::new(
                    FALLBACK_QUERY.to_string(),
                    Some(FALLBACK_DISPLAY_NAME.to_string()),
                    None,
                )
            }
        }
    }
}
