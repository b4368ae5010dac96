use crate::filter::AcceptAll;
use crate::provider::{ProviderLimits, TrackProvider};
use crate::session::{FileRetention, RadioSettings, SessionDeps};
use crate::traits::{
    AudioSource, CacheTtl, ContentCache, ContentCacheError, Notifier, NotifierError, TrackBackend,
    TrackBackendError,
};
use crate::types::{AudioMessage, ChatId, MessageId, RemoteHandle, TrackDescriptor, TrackId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn track(id: &str, duration_seconds: u32) -> TrackDescriptor {
    TrackDescriptor {
        id: id.into(),
        title: format!("Song {}", id),
        artist: "Band".into(),
        duration_seconds,
    }
}

pub(crate) fn tracks(ids: &[&str]) -> Vec<TrackDescriptor> {
    ids.iter().map(|id| track(id, 200)).collect()
}

pub(crate) async fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let started = Instant::now();

    while started.elapsed() < timeout {
        if condition() {
            return true;
        }
        actix_rt::time::sleep(Duration::from_millis(5)).await;
    }

    condition()
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum FetchMode {
    Succeed,
    Fail,
    Hang,
    /// Reports a path that was never written.
    Vanish,
}

pub(crate) struct BackendMock {
    directory: PathBuf,
    results: Mutex<HashMap<String, Vec<TrackDescriptor>>>,
    failing_queries: Mutex<HashSet<String>>,
    fetch_mode: Mutex<FetchMode>,
    delay: Mutex<Duration>,
    log: EventLog,
    pub(crate) search_calls: AtomicUsize,
    pub(crate) fetch_calls: AtomicUsize,
    pub(crate) discarded: Mutex<Vec<TrackId>>,
    in_flight_searches: AtomicUsize,
    in_flight_fetches: AtomicUsize,
    pub(crate) max_parallel_searches: AtomicUsize,
    pub(crate) max_parallel_fetches: AtomicUsize,
}

impl BackendMock {
    pub(crate) fn new(directory: &Path, log: EventLog) -> Self {
        Self {
            directory: directory.to_path_buf(),
            results: Mutex::new(HashMap::new()),
            failing_queries: Mutex::new(HashSet::new()),
            fetch_mode: Mutex::new(FetchMode::Succeed),
            delay: Mutex::new(Duration::ZERO),
            log,
            search_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
            discarded: Mutex::new(vec![]),
            in_flight_searches: AtomicUsize::new(0),
            in_flight_fetches: AtomicUsize::new(0),
            max_parallel_searches: AtomicUsize::new(0),
            max_parallel_fetches: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_results(&self, query: &str, tracks: Vec<TrackDescriptor>) {
        self.results
            .lock()
            .unwrap()
            .insert(query.to_string(), tracks);
    }

    pub(crate) fn fail_query(&self, query: &str) {
        self.failing_queries
            .lock()
            .unwrap()
            .insert(query.to_string());
    }

    pub(crate) fn set_fetch_mode(&self, mode: FetchMode) {
        *self.fetch_mode.lock().unwrap() = mode;
    }

    pub(crate) fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub(crate) fn path_of(&self, track_id: &str) -> PathBuf {
        self.directory.join(format!("{}.mp3", track_id))
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            actix_rt::time::sleep(delay).await;
        }
    }
}

fn enter(in_flight: &AtomicUsize, max: &AtomicUsize) {
    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    max.fetch_max(now, Ordering::SeqCst);
}

#[async_trait]
impl TrackBackend for BackendMock {
    async fn search(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<TrackDescriptor>, TrackBackendError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.log.lock().unwrap().push(format!("search:{}", query));

        enter(&self.in_flight_searches, &self.max_parallel_searches);
        self.pause().await;
        self.in_flight_searches.fetch_sub(1, Ordering::SeqCst);

        if self.failing_queries.lock().unwrap().contains(query) {
            return Err(TrackBackendError::new(Error::new(
                ErrorKind::Other,
                "search failed",
            )));
        }

        let mut tracks = self
            .results
            .lock()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        tracks.truncate(limit);

        Ok(tracks)
    }

    async fn fetch(&self, track_id: &TrackId) -> Result<PathBuf, TrackBackendError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);

        enter(&self.in_flight_fetches, &self.max_parallel_fetches);
        self.pause().await;

        let mode = *self.fetch_mode.lock().unwrap();
        if mode == FetchMode::Hang {
            std::future::pending::<()>().await;
        }
        self.in_flight_fetches.fetch_sub(1, Ordering::SeqCst);

        let path = self.path_of(track_id);

        match mode {
            FetchMode::Fail => Err(TrackBackendError::new(Error::new(
                ErrorKind::Other,
                "video unavailable",
            ))),
            FetchMode::Vanish => Ok(path),
            _ => {
                tokio::fs::write(&path, b"ID3")
                    .await
                    .map_err(TrackBackendError::new)?;
                Ok(path)
            }
        }
    }

    async fn discard(&self, track_id: &TrackId) -> Result<(), TrackBackendError> {
        self.discarded.lock().unwrap().push(track_id.clone());
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct CacheMock {
    entries: Mutex<HashMap<String, (String, CacheTtl)>>,
}

impl CacheMock {
    pub(crate) fn ttl_of(&self, key: &str) -> Option<CacheTtl> {
        self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        self.entries.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl ContentCache for CacheMock {
    async fn get(&self, key: &str) -> Result<Option<String>, ContentCacheError> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .get(key)
            .map(|(value, _)| value.clone()))
    }

    async fn set(&self, key: &str, value: &str, ttl: CacheTtl) -> Result<(), ContentCacheError> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), (value.to_string(), ttl));
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), ContentCacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Stores nothing, so every search reaches the backend.
pub(crate) struct NoCache;

#[async_trait]
impl ContentCache for NoCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, ContentCacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: &str, _ttl: CacheTtl) -> Result<(), ContentCacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), ContentCacheError> {
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SentAudio {
    pub(crate) chat_id: ChatId,
    pub(crate) title: String,
    pub(crate) remote: Option<RemoteHandle>,
    pub(crate) file: Option<PathBuf>,
    pub(crate) file_existed: bool,
    pub(crate) caption: String,
}

pub(crate) struct NotifierMock {
    log: EventLog,
    next_message_id: AtomicI64,
    live_messages: Mutex<HashMap<MessageId, String>>,
    pub(crate) texts: Mutex<Vec<(ChatId, String)>>,
    pub(crate) edits: Mutex<Vec<(MessageId, String)>>,
    pub(crate) audio: Mutex<Vec<SentAudio>>,
    pub(crate) fail_edits: AtomicBool,
    pub(crate) reject_remote: AtomicBool,
}

impl NotifierMock {
    pub(crate) fn new(log: EventLog) -> Self {
        Self {
            log,
            next_message_id: AtomicI64::new(1),
            live_messages: Mutex::new(HashMap::new()),
            texts: Mutex::new(vec![]),
            edits: Mutex::new(vec![]),
            audio: Mutex::new(vec![]),
            fail_edits: AtomicBool::new(false),
            reject_remote: AtomicBool::new(false),
        }
    }

    pub(crate) fn audio_count(&self) -> usize {
        self.audio.lock().unwrap().len()
    }

    pub(crate) fn audio_titles(&self) -> Vec<String> {
        self.audio
            .lock()
            .unwrap()
            .iter()
            .map(|sent| sent.title.clone())
            .collect()
    }

    /// Messages sent and not deleted yet.
    pub(crate) fn live_messages(&self) -> Vec<String> {
        self.live_messages.lock().unwrap().values().cloned().collect()
    }

    pub(crate) fn text_count(&self, text: &str) -> usize {
        self.texts
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, sent)| sent == text)
            .count()
    }
}

fn notifier_error(message: &str) -> NotifierError {
    NotifierError::new(Error::new(ErrorKind::Other, message.to_string()))
}

#[async_trait]
impl Notifier for NotifierMock {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<MessageId, NotifierError> {
        let message_id = MessageId(self.next_message_id.fetch_add(1, Ordering::SeqCst));

        self.texts
            .lock()
            .unwrap()
            .push((chat_id, text.to_string()));
        self.live_messages
            .lock()
            .unwrap()
            .insert(message_id, text.to_string());

        Ok(message_id)
    }

    async fn edit_text(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), NotifierError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(notifier_error("message to edit not found"));
        }

        self.edits
            .lock()
            .unwrap()
            .push((message_id, text.to_string()));

        match self.live_messages.lock().unwrap().get_mut(&message_id) {
            Some(live) => {
                *live = text.to_string();
                Ok(())
            }
            None => Err(notifier_error("message to edit not found")),
        }
    }

    async fn delete_message(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), NotifierError> {
        match self.live_messages.lock().unwrap().remove(&message_id) {
            Some(_) => Ok(()),
            None => Err(notifier_error("message to delete not found")),
        }
    }

    async fn send_audio(
        &self,
        chat_id: ChatId,
        source: AudioSource<'_>,
        message: &AudioMessage,
    ) -> Result<Option<RemoteHandle>, NotifierError> {
        let (remote, file) = match source {
            AudioSource::Remote(handle) => {
                if self.reject_remote.load(Ordering::SeqCst) {
                    return Err(notifier_error("wrong file identifier"));
                }
                (Some(handle.clone()), None)
            }
            AudioSource::File(path) => (None, Some(path.to_path_buf())),
        };

        let file_existed = file.as_ref().map(|path| path.exists()).unwrap_or(false);

        self.log
            .lock()
            .unwrap()
            .push(format!("audio:{}", message.title));
        self.audio.lock().unwrap().push(SentAudio {
            chat_id,
            title: message.title.clone(),
            remote: remote.clone(),
            file,
            file_existed,
            caption: message.caption.clone(),
        });

        Ok(Some(
            remote.unwrap_or_else(|| RemoteHandle(format!("remote-{}", message.title))),
        ))
    }
}

pub(crate) fn test_settings() -> RadioSettings {
    RadioSettings {
        play_window_cap: Duration::from_millis(20),
        error_backoff_step: Duration::from_millis(1),
        max_error_backoff: Duration::from_millis(5),
        empty_backoff: Duration::from_millis(20),
        emergency_queries: vec!["backup".into()],
        ..RadioSettings::default()
    }
}

pub(crate) struct TestRadio {
    pub(crate) backend: Arc<BackendMock>,
    pub(crate) notifier: Arc<NotifierMock>,
    pub(crate) provider: Arc<TrackProvider>,
    pub(crate) log: EventLog,
    pub(crate) deps: SessionDeps,
    pub(crate) directory: tempfile::TempDir,
}

impl TestRadio {
    pub(crate) fn new(settings: RadioSettings) -> Self {
        Self::with_cache(settings, Arc::new(CacheMock::default()))
    }

    pub(crate) fn with_cache(settings: RadioSettings, cache: Arc<dyn ContentCache>) -> Self {
        let directory = tempfile::tempdir().unwrap();
        let log = EventLog::default();
        let backend = Arc::new(BackendMock::new(directory.path(), log.clone()));
        let notifier = Arc::new(NotifierMock::new(log.clone()));
        let provider = Arc::new(TrackProvider::new(
            backend.clone(),
            cache,
            ProviderLimits::default(),
        ));

        let deps = SessionDeps {
            provider: provider.clone(),
            notifier: notifier.clone(),
            filter: Arc::new(AcceptAll),
            settings: Arc::new(settings),
        };

        Self {
            backend,
            notifier,
            provider,
            log,
            deps,
            directory,
        }
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

pub(crate) fn retaining(settings: RadioSettings) -> RadioSettings {
    RadioSettings {
        file_retention: FileRetention::Retain,
        ..settings
    }
}
