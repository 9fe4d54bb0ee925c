//! Core types for playback management

use serde::{Deserialize, Serialize};
use std::fmt;

/// Catalog track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Create a new track ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Track record as supplied by the catalog service
///
/// Immutable once fetched. The engine keeps clones and never edits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique catalog identifier
    pub id: TrackId,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Source locator handed to the device (`None` when unavailable)
    #[serde(default)]
    pub source: Option<String>,

    /// Cover art locator
    #[serde(default)]
    pub cover_art: Option<String>,

    /// Known duration in seconds (may be absent until the device reports it)
    #[serde(default)]
    pub duration: Option<f64>,

    /// Catalog play count
    #[serde(default)]
    pub play_count: Option<u64>,
}

impl Track {
    /// Create a track with just the fields needed for playback
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        source: Option<String>,
    ) -> Self {
        Self {
            id: TrackId::new(id),
            title: title.into(),
            artist: artist.into(),
            source,
            cover_art: None,
            duration: None,
            play_count: None,
        }
    }

    /// Set the known duration
    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// Playback status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackStatus {
    /// Nothing loaded, or stopped
    Idle,

    /// Waiting for the device to finish loading
    Loading,

    /// Device confirmed audio is flowing
    Playing,

    /// Device confirmed pause
    Paused,

    /// Queue ran out
    Ended,
}

impl PlaybackStatus {
    /// Whether a device is (or is about to be) producing audio
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackStatus::Loading | PlaybackStatus::Playing)
    }
}

/// The single process-wide playback state
///
/// Owned by [`crate::PlaybackEngine`]. Everything else sees clones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Track selected in the queue
    pub current_track: Option<Track>,

    /// Current status
    pub status: PlaybackStatus,

    /// Last position reported by the device (seconds)
    pub position: f64,

    /// Track duration (seconds), `None` while unknown
    pub duration: Option<f64>,

    /// Volume level in [0, 1], preserved while muted
    pub volume: f32,

    /// Mute flag
    pub muted: bool,
}

impl PlaybackState {
    /// Fresh idle state
    pub fn new(volume: f32) -> Self {
        Self {
            current_track: None,
            status: PlaybackStatus::Idle,
            position: 0.0,
            duration: None,
            volume,
            muted: false,
        }
    }

    /// Current track ID, if any
    pub fn current_track_id(&self) -> Option<&TrackId> {
        self.current_track.as_ref().map(|track| &track.id)
    }
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new(EngineConfig::default().initial_volume)
    }
}

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Initial volume (0.0-1.0, default: 0.8)
    #[serde(default = "default_initial_volume")]
    pub initial_volume: f32,

    /// Past this position "previous" restarts the current track (default: 3s)
    #[serde(default = "default_restart_threshold")]
    pub restart_threshold_secs: f64,
}

fn default_initial_volume() -> f32 {
    0.8
}

fn default_restart_threshold() -> f64 {
    3.0
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_volume: default_initial_volume(),
            restart_threshold_secs: default_restart_threshold(),
        }
    }
}
