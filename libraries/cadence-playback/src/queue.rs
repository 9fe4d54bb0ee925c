//! Play queue
//!
//! A single ordered list of tracks plus the index of the selected entry.
//! Insertion order is playback order.
//!
//! ```text
//!   0  Track A
//! > 1  Track B   <- current_index
//!   2  Track C   <- next()
//! ```
//!
//! Invariant: `current_index` is `Some(i)` with `i < len` whenever the queue
//! is non-empty, and `None` when it is empty. Every mutation re-establishes
//! it before returning.

use crate::types::{Track, TrackId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Ordered play queue with a current position
#[derive(Debug, Clone, Default)]
pub struct Queue {
    tracks: Vec<Track>,
    current_index: Option<usize>,
}

/// Read-only copy of the queue handed to subscribers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueSnapshot {
    /// Tracks in playback order
    pub tracks: Vec<Track>,

    /// Selected entry
    pub current_index: Option<usize>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a track
    ///
    /// No-op when a track with the same id is already queued, so repeated
    /// "play" requests for one song never duplicate it. Returns whether the
    /// track was added.
    pub fn enqueue(&mut self, track: Track) -> bool {
        if self.contains(&track.id) {
            return false;
        }

        self.tracks.push(track);
        if self.current_index.is_none() {
            self.current_index = Some(0);
        }
        true
    }

    /// Insert a track right after the current one ("play next")
    ///
    /// The current index is unchanged. A track already queued elsewhere is
    /// moved rather than duplicated.
    pub fn insert_after_current(&mut self, track: Track) {
        if let Some(existing) = self.position_of(&track.id) {
            if Some(existing) == self.current_index {
                return;
            }
            self.remove_at(existing);
        }

        match self.current_index {
            Some(current) => self.tracks.insert(current + 1, track),
            None => {
                self.tracks.insert(0, track);
                self.current_index = Some(0);
            }
        }
    }

    /// Remove the track at `index`
    ///
    /// Removing an entry before the current one shifts the index down so it
    /// keeps pointing at the same track. Removing the current entry leaves
    /// the index on the following track (or the new last track). The queue
    /// never advances playback by itself; the engine reacts to the removal.
    pub fn remove_at(&mut self, index: usize) -> Option<Track> {
        if index >= self.tracks.len() {
            return None;
        }

        let removed = self.tracks.remove(index);

        self.current_index = match self.current_index {
            _ if self.tracks.is_empty() => None,
            Some(current) if index < current => Some(current - 1),
            Some(current) if current >= self.tracks.len() => Some(self.tracks.len() - 1),
            other => other,
        };

        Some(removed)
    }

    /// Move a track from `from` to `to`, keeping the current track selected
    pub fn move_track(&mut self, from: usize, to: usize) -> bool {
        let len = self.tracks.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let track = self.tracks.remove(from);
        self.tracks.insert(to, track);

        if let Some(current) = self.current_index {
            self.current_index = Some(if current == from {
                to
            } else if from < current && to >= current {
                current - 1
            } else if from > current && to <= current {
                current + 1
            } else {
                current
            });
        }
        true
    }

    /// Empty the queue
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.current_index = None;
    }

    /// Swap the whole queue at once
    ///
    /// `start_index` outside the new queue falls back to 0. Repeated ids keep
    /// their first entry only; a start index naming a dropped repeat selects
    /// the surviving entry.
    pub fn replace_all(&mut self, tracks: Vec<Track>, start_index: usize) {
        let start_id = tracks
            .get(start_index)
            .or_else(|| tracks.first())
            .map(|track| track.id.clone());

        let mut seen = HashSet::new();
        self.tracks = tracks
            .into_iter()
            .filter(|track| seen.insert(track.id.clone()))
            .collect();
        self.current_index = start_id.and_then(|id| self.position_of(&id));
    }

    /// Step to the following track
    ///
    /// At the last entry nothing changes and `None` is returned (no wrap).
    pub fn next(&mut self) -> Option<&Track> {
        let target = self.current_index? + 1;
        if target < self.tracks.len() {
            self.current_index = Some(target);
            self.tracks.get(target)
        } else {
            None
        }
    }

    /// Step to the preceding track
    ///
    /// At the first entry nothing changes and `None` is returned.
    pub fn previous(&mut self) -> Option<&Track> {
        let current = self.current_index?;
        if current == 0 {
            return None;
        }
        self.current_index = Some(current - 1);
        self.tracks.get(current - 1)
    }

    /// Track after the current one, without moving
    pub fn peek_next(&self) -> Option<&Track> {
        self.current_index.and_then(|current| self.tracks.get(current + 1))
    }

    /// Select the entry at `index`
    pub fn select(&mut self, index: usize) -> Option<&Track> {
        if index < self.tracks.len() {
            self.current_index = Some(index);
            self.tracks.get(index)
        } else {
            None
        }
    }

    /// Index of the first entry with this id
    pub fn position_of(&self, id: &TrackId) -> Option<usize> {
        self.tracks.iter().position(|track| &track.id == id)
    }

    /// Whether a track with this id is queued
    pub fn contains(&self, id: &TrackId) -> bool {
        self.position_of(id).is_some()
    }

    /// Currently selected track
    pub fn current(&self) -> Option<&Track> {
        self.current_index.and_then(|index| self.tracks.get(index))
    }

    /// Current index
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    /// Track at index
    pub fn get(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// All tracks in playback order
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Total number of tracks in queue
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Copy for subscribers
    pub fn snapshot(&self) -> QueueSnapshot {
        QueueSnapshot {
            tracks: self.tracks.clone(),
            current_index: self.current_index,
        }
    }
}
