use crate::filter::TrackFilter;
use crate::types::{TrackDescriptor, TrackId};
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};

/// Ids already played in a session, oldest first. Once the history grows
/// past its cap the oldest half is forgotten.
pub(crate) struct PlayedHistory {
    ids: HashSet<TrackId>,
    order: VecDeque<TrackId>,
    cap: usize,
}

impl PlayedHistory {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            ids: HashSet::new(),
            order: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    pub(crate) fn contains(&self, track_id: &TrackId) -> bool {
        self.ids.contains(track_id)
    }

    pub(crate) fn len(&self) -> usize {
        self.ids.len()
    }

    pub(crate) fn record(&mut self, track_id: TrackId) {
        if !self.ids.insert(track_id.clone()) {
            return;
        }
        self.order.push_back(track_id);

        if self.ids.len() > self.cap {
            let forget = self.ids.len() / 2;
            for forgotten in self.order.drain(..forget) {
                self.ids.remove(&forgotten);
            }
        }
    }
}

pub(crate) struct Playlist {
    queue: VecDeque<TrackDescriptor>,
    played: PlayedHistory,
}

impl Playlist {
    pub(crate) fn new(played_ids_cap: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            played: PlayedHistory::new(played_ids_cap),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.queue.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub(crate) fn played(&self) -> &PlayedHistory {
        &self.played
    }

    pub(crate) fn queued_ids(&self) -> impl Iterator<Item = &TrackId> {
        self.queue.iter().map(|track| &track.id)
    }

    /// Appends search results in random order, skipping tracks that were
    /// played recently, are already queued, or the filter rejects.
    /// Returns the number of tracks added.
    pub(crate) fn extend_fresh(
        &mut self,
        tracks: Vec<TrackDescriptor>,
        filter: &dyn TrackFilter,
    ) -> usize {
        let mut seen = self.queue.iter().map(|t| t.id.clone()).collect::<HashSet<_>>();

        let mut fresh = tracks
            .into_iter()
            .filter(|track| !self.played.contains(&track.id))
            .filter(|track| filter.accepts(track))
            .filter(|track| seen.insert(track.id.clone()))
            .collect::<Vec<_>>();

        fresh.shuffle(&mut rand::thread_rng());

        let added = fresh.len();
        self.queue.extend(fresh);
        added
    }

    /// Appends fallback results as they come; only exact duplicates of
    /// queued tracks are dropped.
    pub(crate) fn extend_unfiltered(&mut self, tracks: Vec<TrackDescriptor>) -> usize {
        let mut seen = self.queue.iter().map(|t| t.id.clone()).collect::<HashSet<_>>();
        let before = self.queue.len();

        self.queue
            .extend(tracks.into_iter().filter(|track| seen.insert(track.id.clone())));

        self.queue.len() - before
    }

    /// Takes the next track and records it as played.
    pub(crate) fn pop_next(&mut self) -> Option<TrackDescriptor> {
        let track = self.queue.pop_front()?;
        self.played.record(track.id.clone());
        Some(track)
    }
}
