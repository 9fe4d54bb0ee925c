/// Track catalog loading
use crate::error::{PlayerError, Result};
use cadence_playback::Track;
use std::path::Path;

/// Read a JSON array of tracks from `path`
pub fn load(path: &Path) -> Result<Vec<Track>> {
    let text = std::fs::read_to_string(path).map_err(|source| PlayerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&text)
}

pub fn parse(json: &str) -> Result<Vec<Track>> {
    Ok(serde_json::from_str(json)?)
}
