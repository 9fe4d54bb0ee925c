//! Time-synchronised lyrics
//!
//! Parses LRC text and follows the playback clock to pick the active line.
//! [`LyricsView`] is a ready-made subscriber: feed it every
//! [`PlaybackEvent`] and it reports when the highlighted line changes.

use crate::events::PlaybackEvent;
use crate::types::TrackId;
use serde::{Deserialize, Serialize};

/// One timed line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LyricLine {
    /// Start time in seconds
    pub time: f64,

    /// Line text (may be empty for instrumental breaks)
    pub text: String,
}

/// Lines sorted by start time
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lyrics {
    lines: Vec<LyricLine>,
}

impl Lyrics {
    /// Build from already-timed lines (sorted here)
    pub fn new(mut lines: Vec<LyricLine>) -> Self {
        lines.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { lines }
    }

    /// Parse LRC text
    ///
    /// Supports several time tags per line (`[00:12.00][01:30.50]chorus`) and
    /// the `[offset:±ms]` header. Metadata tags and untimed lines are skipped.
    pub fn parse_lrc(text: &str) -> Self {
        let mut offset_secs = 0.0;
        let mut lines = Vec::new();

        for raw in text.lines() {
            let mut rest = raw.trim();
            let mut times = Vec::new();

            while let Some(tag_end) = rest.strip_prefix('[').and_then(|r| r.find(']')) {
                let tag = &rest[1..=tag_end];
                rest = &rest[tag_end + 2..];

                if let Some(time) = parse_timestamp(tag) {
                    times.push(time);
                } else if let Some(value) = tag.strip_prefix("offset:") {
                    if let Ok(ms) = value.trim().parse::<i64>() {
                        offset_secs = ms as f64 / 1000.0;
                    }
                }
            }

            let text = rest.trim();
            lines.extend(times.into_iter().map(|time| LyricLine {
                time,
                text: text.to_string(),
            }));
        }

        // Positive offset shows lines earlier
        if offset_secs != 0.0 {
            for line in &mut lines {
                line.time = (line.time - offset_secs).max(0.0);
            }
        }

        Self::new(lines)
    }

    /// Index of the line active at `position` seconds
    ///
    /// The last line starting at or before `position`; `None` before the
    /// first line or for non-finite positions.
    pub fn line_index_at(&self, position: f64) -> Option<usize> {
        if !position.is_finite() {
            return None;
        }
        let upcoming = self.lines.partition_point(|line| line.time <= position);
        upcoming.checked_sub(1)
    }

    /// Line at index
    pub fn line(&self, index: usize) -> Option<&LyricLine> {
        self.lines.get(index)
    }

    /// All lines
    pub fn lines(&self) -> &[LyricLine] {
        &self.lines
    }

    /// Whether there are no timed lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// `mm:ss`, `mm:ss.xx` or `mm:ss:xx`
fn parse_timestamp(tag: &str) -> Option<f64> {
    let (minutes, seconds) = tag.split_once(':')?;
    let minutes: u32 = minutes.trim().parse().ok()?;

    let seconds = match seconds.split_once(':') {
        Some((whole, fraction)) => format!("{}.{}", whole, fraction),
        None => seconds.to_string(),
    };
    if !seconds.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let seconds: f64 = seconds.parse().ok()?;

    Some(f64::from(minutes) * 60.0 + seconds)
}

/// Change reported by [`LyricsView::on_event`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LyricsUpdate {
    /// Highlight moved to this line (or to none, before the first line)
    Line(Option<usize>),

    /// A different track became current; these lyrics no longer apply
    TrackChanged,
}

/// Lyrics panel following the playback clock
#[derive(Debug, Clone)]
pub struct LyricsView {
    track_id: TrackId,
    lyrics: Lyrics,
    active: Option<usize>,
    detached: bool,
}

impl LyricsView {
    /// Create a view for one track's lyrics
    pub fn new(track_id: TrackId, lyrics: Lyrics) -> Self {
        Self {
            track_id,
            lyrics,
            active: None,
            detached: false,
        }
    }

    /// Track these lyrics belong to
    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    /// Currently highlighted line
    pub fn active_line(&self) -> Option<&LyricLine> {
        self.active.and_then(|index| self.lyrics.line(index))
    }

    /// Currently highlighted index
    pub fn active_index(&self) -> Option<usize> {
        self.active
    }

    /// Follow one playback notification
    ///
    /// Returns `Some` only when what the view shows actually changes.
    pub fn on_event(&mut self, event: &PlaybackEvent) -> Option<LyricsUpdate> {
        let snapshot = event.snapshot()?;

        if snapshot.state.current_track_id() != Some(&self.track_id) {
            if self.detached {
                return None;
            }
            self.detached = true;
            self.active = None;
            return Some(LyricsUpdate::TrackChanged);
        }
        self.detached = false;

        let index = self.lyrics.line_index_at(snapshot.state.position);
        if index == self.active {
            return None;
        }
        self.active = index;
        Some(LyricsUpdate::Line(index))
    }
}
