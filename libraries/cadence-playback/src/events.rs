//! Playback Events
//!
//! Notifications delivered to subscribers. A `StateChanged` is emitted once
//! per state mutation and carries the complete new snapshot, so observers
//! never have to stitch partial updates together.

use crate::queue::QueueSnapshot;
use crate::types::{PlaybackState, TrackId};
use serde::{Deserialize, Serialize};

/// Playback state plus queue, as seen by observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    /// Playback state
    pub state: PlaybackState,

    /// Queue contents and selection
    pub queue: QueueSnapshot,
}

/// Events emitted by the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlaybackEvent {
    /// State or queue changed
    StateChanged(PlaybackSnapshot),

    /// Device could not play a track (one-shot, for user-facing messaging)
    Error {
        /// Track that failed, if one was loading
        track_id: Option<TrackId>,
        /// Error message
        message: String,
    },
}

impl PlaybackEvent {
    /// Snapshot carried by a `StateChanged` event
    pub fn snapshot(&self) -> Option<&PlaybackSnapshot> {
        match self {
            PlaybackEvent::StateChanged(snapshot) => Some(snapshot),
            PlaybackEvent::Error { .. } => None,
        }
    }
}
