use super::captions::{self, SCANNING_FOR_SIGNAL, STOPPED_AFTER_ERRORS};
use super::delivery::{deliver_track, DeliveryError};
use super::playlist::Playlist;
use super::signal::SkipSignal;
use super::status::StatusMessage;
use super::SessionDeps;
use crate::provider::SearchFilters;
use crate::types::{
    AudioMessage, ChatId, ChatKind, PlayerButton, SessionState, Station, TrackDescriptor,
};
use actix_rt::task::JoinHandle;
use rand::seq::SliceRandom;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

struct Shared {
    chat_id: ChatId,
    chat_kind: ChatKind,
    station: Station,
    deps: SessionDeps,
    started: AtomicBool,
    running: AtomicBool,
    skip: SkipSignal,
    status: async_lock::Mutex<StatusMessage>,
    playlist: Mutex<Playlist>,
    tracks_played: AtomicU64,
}

// Flips the session to stopped however the loop task ends.
struct RunningGuard(Arc<Shared>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// One chat's radio: a background loop that keeps a shuffled queue topped
/// up from the station query and plays it track after track until stopped.
pub struct RadioSession {
    shared: Arc<Shared>,
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
    stop_logged: AtomicBool,
}

impl RadioSession {
    pub fn new(chat_id: ChatId, chat_kind: ChatKind, station: Station, deps: SessionDeps) -> Self {
        let playlist = Playlist::new(deps.settings.played_ids_cap);

        Self {
            shared: Arc::new(Shared {
                chat_id,
                chat_kind,
                station,
                deps,
                started: AtomicBool::new(false),
                running: AtomicBool::new(false),
                skip: SkipSignal::default(),
                status: async_lock::Mutex::new(StatusMessage::default()),
                playlist: Mutex::new(playlist),
                tracks_played: AtomicU64::new(0),
            }),
            cancel: CancellationToken::new(),
            task: Mutex::new(None),
            stop_logged: AtomicBool::new(false),
        }
    }

    pub fn chat_id(&self) -> ChatId {
        self.shared.chat_id
    }

    pub fn station(&self) -> &Station {
        &self.shared.station
    }

    pub fn tracks_played(&self) -> u64 {
        self.shared.tracks_played.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> SessionState {
        match (
            self.shared.started.load(Ordering::SeqCst),
            self.is_running(),
        ) {
            (_, true) => SessionState::Running,
            (true, false) => SessionState::Stopped,
            (false, false) => SessionState::Idle,
        }
    }

    /// Launches the loop. Only an idle session starts; anything else is a
    /// no-op.
    pub fn start(&self) {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.running.store(true, Ordering::SeqCst);

        info!(
            chat_id = %self.shared.chat_id,
            query = %self.shared.station.query,
            "Radio session started"
        );

        let handle = actix_rt::spawn({
            let guard = RunningGuard(self.shared.clone());
            let cancel = self.cancel.clone();

            async move {
                let shared = &guard.0;

                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!(chat_id = %shared.chat_id, "Radio loop cancelled");
                    }
                    _ = shared.radio_loop() => {
                        info!(chat_id = %shared.chat_id, "Radio loop finished on its own");
                    }
                }
            }
        });

        *lock(&self.task) = Some(handle);
    }

    /// Cancels the loop, waits for it to exit and removes the status
    /// message. Safe to call any number of times.
    pub async fn stop(&self) {
        self.shared.started.store(true, Ordering::SeqCst);
        self.shared.running.store(false, Ordering::SeqCst);
        self.cancel.cancel();

        let task = lock(&self.task).take();
        if let Some(task) = task {
            if let Err(error) = task.await {
                error!(chat_id = %self.shared.chat_id, ?error, "Radio loop task failed");
            }
        }

        self.shared.clear_status().await;

        if !self.stop_logged.swap(true, Ordering::SeqCst) {
            info!(
                chat_id = %self.shared.chat_id,
                tracks_played = self.tracks_played(),
                "Radio session stopped"
            );
        }
    }

    /// Cuts the current track's play window short. Ignored while nothing
    /// is playing.
    pub fn skip(&self) {
        if self.is_running() {
            self.shared.skip.set();
        }
    }

    #[cfg(test)]
    pub(crate) fn has_status_message(&self) -> bool {
        self.shared
            .status
            .try_lock()
            .map(|status| status.message_id().is_some())
            .unwrap_or(true)
    }

    #[cfg(test)]
    pub(crate) fn played_ids_len(&self) -> usize {
        self.shared.playlist().played().len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shared {
    fn playlist(&self) -> MutexGuard<'_, Playlist> {
        lock(&self.playlist)
    }

    async fn show_status(&self, text: &str) {
        self.status
            .lock()
            .await
            .show(self.deps.notifier.as_ref(), self.chat_id, text)
            .await;
    }

    async fn clear_status(&self) {
        self.status
            .lock()
            .await
            .clear(self.deps.notifier.as_ref(), self.chat_id)
            .await;
    }

    async fn radio_loop(&self) {
        let settings = self.deps.settings.clone();
        let mut error_streak = 0u32;

        loop {
            if self.playlist().len() < settings.low_watermark {
                self.replenish().await;
            }

            if self.playlist().is_empty() {
                self.replenish_emergency().await;
            }

            let next = self.playlist().pop_next();
            let track = match next {
                Some(track) => track,
                None => {
                    warn!(
                        chat_id = %self.chat_id,
                        backoff = ?settings.empty_backoff,
                        "Nothing to play, retrying later"
                    );
                    self.show_status(SCANNING_FOR_SIGNAL).await;
                    sleep(settings.empty_backoff).await;
                    // Nothing was playing, so a skip sent meanwhile is stale.
                    self.skip.clear();
                    continue;
                }
            };

            match self.play_track(&track).await {
                Ok(()) => {
                    error_streak = 0;
                    self.tracks_played.fetch_add(1, Ordering::SeqCst);

                    let window = settings.play_window(track.duration_seconds);
                    tokio::select! {
                        _ = self.skip.wait() => {
                            debug!(chat_id = %self.chat_id, track_id = %track.id, "Track skipped");
                        }
                        _ = sleep(window) => {}
                    }
                }
                Err(error) => {
                    error_streak += 1;
                    warn!(
                        chat_id = %self.chat_id,
                        track_id = %track.id,
                        error_streak,
                        ?error,
                        "Unable to play track"
                    );

                    if error_streak >= settings.error_limit {
                        error!(
                            chat_id = %self.chat_id,
                            error_streak,
                            "Too many failed tracks in a row, stopping radio"
                        );
                        self.clear_status().await;
                        if let Err(error) = self
                            .deps
                            .notifier
                            .send_text(self.chat_id, STOPPED_AFTER_ERRORS)
                            .await
                        {
                            warn!(chat_id = %self.chat_id, ?error, "Unable to send stop notice");
                        }
                        return;
                    }

                    sleep(settings.error_backoff(error_streak)).await;
                }
            }

            self.skip.clear();
        }
    }

    async fn replenish(&self) {
        let settings = &self.deps.settings;

        if self.playlist().is_empty() {
            self.show_status(&captions::searching(&self.station)).await;
        }

        let filters = SearchFilters::new(settings.search_batch_size)
            .with_decade(self.station.decade.clone());

        match self
            .deps
            .provider
            .search(&self.station.query, &filters)
            .await
        {
            Ok(tracks) => {
                let found = tracks.len();
                let added = self
                    .playlist()
                    .extend_fresh(tracks, self.deps.filter.as_ref());
                debug!(
                    chat_id = %self.chat_id,
                    query = %self.station.query,
                    found,
                    added,
                    "Playlist replenished"
                );
            }
            Err(error) => {
                warn!(chat_id = %self.chat_id, ?error, "Station search failed");
            }
        }
    }

    async fn replenish_emergency(&self) {
        let settings = &self.deps.settings;

        let query = match settings.emergency_queries.choose(&mut rand::thread_rng()) {
            Some(query) => query.clone(),
            None => return,
        };

        info!(chat_id = %self.chat_id, %query, "Switching to backup frequency");
        self.show_status(&captions::backup_frequency(&query)).await;

        let filters = SearchFilters::new(settings.emergency_batch_size);

        match self.deps.provider.search(&query, &filters).await {
            Ok(tracks) => {
                let added = self.playlist().extend_unfiltered(tracks);
                debug!(chat_id = %self.chat_id, %query, added, "Backup tracks queued");
            }
            Err(error) => {
                warn!(chat_id = %self.chat_id, %query, ?error, "Backup search failed");
            }
        }
    }

    async fn play_track(&self, track: &TrackDescriptor) -> Result<(), DeliveryError> {
        self.show_status(&captions::now_playing(track)).await;

        let button =
            PlayerButton::for_chat(self.deps.settings.player_url.as_deref(), self.chat_kind);
        let message = AudioMessage::for_track(track, Some(&self.station), button);

        deliver_track(&self.deps, self.chat_id, &track.id, &message).await?;

        self.clear_status().await;

        Ok(())
    }
}

impl Drop for RadioSession {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
