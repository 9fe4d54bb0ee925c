//! Error types for playback management

use crate::types::TrackId;
use thiserror::Error;

/// Playback errors
///
/// Only device failures and a dead control loop are errors. Transport calls
/// that race with an empty queue are silent no-ops, not errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// Track has no source locator
    #[error("Track {0} has no playable source")]
    SourceUnavailable(TrackId),

    /// Device rejected or failed a request
    #[error("Device error: {0}")]
    Device(String),

    /// Control loop is no longer running
    #[error("Playback service has shut down")]
    ServiceClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
