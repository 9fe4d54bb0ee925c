//! Player clock
//!
//! Bridges raw device events onto [`PlaybackState`] fields. No transitions
//! are decided here: load completion, end of track and failures are handed
//! back to the engine as [`ClockUpdate`] variants.

use crate::device::DeviceEventKind;
use crate::types::{PlaybackState, PlaybackStatus, Track};

/// Result of applying one device event to the state
#[derive(Debug, Clone, PartialEq)]
pub enum ClockUpdate {
    /// One or more fields changed
    Applied,

    /// Event carried nothing usable (e.g. a NaN time before a source loads)
    Ignored,

    /// Source is ready; the engine decides whether to start it
    Loaded,

    /// Source reached its end; the engine advances
    Finished,

    /// Device gave up on the source
    Failed(String),
}

/// Source of truth for "now"
pub struct PlayerClock;

impl PlayerClock {
    /// Apply a device event to `state`
    pub fn apply(state: &mut PlaybackState, event: &DeviceEventKind) -> ClockUpdate {
        match event {
            DeviceEventKind::TimeAdvanced(position) => {
                if !position.is_finite() || *position < 0.0 {
                    return ClockUpdate::Ignored;
                }
                state.position = *position;
                ClockUpdate::Applied
            }
            DeviceEventKind::DurationKnown(duration) => {
                if !duration.is_finite() || *duration < 0.0 {
                    return ClockUpdate::Ignored;
                }
                state.duration = Some(*duration);
                ClockUpdate::Applied
            }
            DeviceEventKind::Started => {
                state.status = PlaybackStatus::Playing;
                ClockUpdate::Applied
            }
            DeviceEventKind::Paused => {
                state.status = PlaybackStatus::Paused;
                ClockUpdate::Applied
            }
            DeviceEventKind::Loaded => ClockUpdate::Loaded,
            DeviceEventKind::Finished => ClockUpdate::Finished,
            DeviceEventKind::Failed(message) => ClockUpdate::Failed(message.clone()),
        }
    }

    /// Rewind the clock for a freshly selected track
    ///
    /// Duration starts at the catalog value, if any, until the device
    /// reports its own.
    pub fn reset_for(state: &mut PlaybackState, track: Option<&Track>) {
        state.position = 0.0;
        state.duration = track
            .and_then(|track| track.duration)
            .filter(|duration| duration.is_finite() && *duration >= 0.0);
    }
}
