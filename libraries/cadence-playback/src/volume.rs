//! Volume control
//!
//! Level is a linear factor in [0, 1]. Muting keeps the level untouched so
//! un-muting restores it exactly.

/// Volume controller with mute
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    /// Volume level (0.0-1.0)
    level: f32,

    /// Mute state (preserves volume level)
    muted: bool,
}

impl Volume {
    /// Create new volume controller
    ///
    /// Out-of-range levels are clamped; non-finite levels fall back to 1.0.
    pub fn new(level: f32) -> Self {
        Self {
            level: Self::sanitize(level).unwrap_or(1.0),
            muted: false,
        }
    }

    /// Set volume level
    ///
    /// Returns `false` (and keeps the old level) for NaN or infinite input.
    pub fn set_level(&mut self, level: f32) -> bool {
        match Self::sanitize(level) {
            Some(level) => {
                self.level = level;
                true
            }
            None => false,
        }
    }

    /// Get current volume level
    pub fn level(&self) -> f32 {
        self.level
    }

    /// Toggle mute state
    pub fn toggle_mute(&mut self) {
        self.muted = !self.muted;
    }

    /// Check if muted
    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// Effective gain sent to the device
    ///
    /// Returns 0.0 if muted, otherwise the level.
    pub fn gain(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.level
        }
    }

    fn sanitize(level: f32) -> Option<f32> {
        level.is_finite().then(|| level.clamp(0.0, 1.0))
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new(0.8)
    }
}
