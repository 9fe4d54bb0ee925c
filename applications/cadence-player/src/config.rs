/// Player configuration
use crate::error::{PlayerError, Result};
use cadence_playback::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub device: DeviceSettings,
}

/// Simulated output device timing
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DeviceSettings {
    /// Interval between position reports
    #[serde(default = "default_tick_ms")]
    pub tick_ms: u64,

    /// Time a load takes before the device reports it ready
    #[serde(default = "default_load_delay_ms")]
    pub load_delay_ms: u64,

    /// Playback speed multiplier (2.0 plays a 3 minute track in 90 seconds)
    #[serde(default = "default_speed")]
    pub speed: f64,
}

impl Default for DeviceSettings {
    fn default() -> Self {
        Self {
            tick_ms: default_tick_ms(),
            load_delay_ms: default_load_delay_ms(),
            speed: default_speed(),
        }
    }
}

impl PlayerConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; otherwise `cadence.toml` in the working
    /// directory is read when present. `CADENCE_*` variables override both,
    /// with `__` between section and key (`CADENCE_DEVICE__TICK_MS=100`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()).required(true));
            }
            None => {
                let default_path = PathBuf::from("cadence.toml");
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("CADENCE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Self::build(settings)
    }

    fn build(settings: config::ConfigBuilder<config::builder::DefaultState>) -> Result<Self> {
        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let volume = self.engine.initial_volume;
        if !(0.0..=1.0).contains(&volume) {
            return Err(PlayerError::Config(format!(
                "engine.initial_volume must be within 0.0..=1.0, got {}",
                volume
            )));
        }

        let threshold = self.engine.restart_threshold_secs;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(PlayerError::Config(format!(
                "engine.restart_threshold_secs must be a non-negative number, got {}",
                threshold
            )));
        }

        if self.device.tick_ms == 0 {
            return Err(PlayerError::Config(
                "device.tick_ms must be greater than zero".to_string(),
            ));
        }

        if !self.device.speed.is_finite() || self.device.speed <= 0.0 {
            return Err(PlayerError::Config(format!(
                "device.speed must be positive, got {}",
                self.device.speed
            )));
        }

        Ok(())
    }
}

// Default values
fn default_tick_ms() -> u64 {
    250
}

fn default_load_delay_ms() -> u64 {
    150
}

fn default_speed() -> f64 {
    1.0
}
