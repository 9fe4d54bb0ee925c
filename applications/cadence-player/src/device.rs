//! Simulated output device
//!
//! Stands in for a real audio backend. Loads complete after a configurable
//! delay and playback advances on a timer, so the engine sees the same event
//! sequence it would get from real hardware, including late completions.

use crate::config::DeviceSettings;
use cadence_playback::{
    DeviceEvent, DeviceEventKind, DeviceEventSender, LoadGeneration, PlaybackDevice,
    PlaybackError, Result, Track,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct LoadedSource {
    generation: LoadGeneration,
    duration: f64,
}

/// Playhead position in seconds, shared with the ticker task
#[derive(Debug, Clone, Default)]
struct Playhead(Arc<AtomicU64>);

impl Playhead {
    fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn set(&self, position: f64) {
        self.0.store(position.to_bits(), Ordering::Relaxed);
    }
}

/// Timer-driven device that "plays" catalog entries by their known duration
///
/// A source with no known duration cannot be decoded and fails its load.
#[derive(Debug)]
pub struct SimulatedDevice {
    settings: DeviceSettings,
    events: DeviceEventSender,
    durations: HashMap<String, f64>,
    loaded: Option<LoadedSource>,
    playhead: Playhead,
    gain: f32,
    loader: Option<JoinHandle<()>>,
    ticker: Option<JoinHandle<()>>,
}

impl SimulatedDevice {
    pub fn new(settings: DeviceSettings, events: DeviceEventSender, catalog: &[Track]) -> Self {
        let durations = catalog
            .iter()
            .filter_map(|track| {
                let source = track.source.clone()?;
                let duration = track.duration.filter(|d| d.is_finite() && *d > 0.0)?;
                Some((source, duration))
            })
            .collect();

        Self {
            settings,
            events,
            durations,
            loaded: None,
            playhead: Playhead::default(),
            gain: 1.0,
            loader: None,
            ticker: None,
        }
    }

    /// Gain most recently applied by the engine
    pub fn gain(&self) -> f32 {
        self.gain
    }

    fn emit(&self, generation: LoadGeneration, kind: DeviceEventKind) {
        // Engine gone means shutdown
        let _ = self.events.send(DeviceEvent::new(generation, kind));
    }

    fn abort_tasks(&mut self) {
        if let Some(loader) = self.loader.take() {
            loader.abort();
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl PlaybackDevice for SimulatedDevice {
    fn load(&mut self, source: &str, generation: LoadGeneration) -> Result<()> {
        self.abort_tasks();
        self.playhead.set(0.0);

        let duration = self.durations.get(source).copied();
        self.loaded = duration.map(|duration| LoadedSource {
            generation,
            duration,
        });
        debug!(source, %generation, ?duration, "Simulated load started");

        let events = self.events.clone();
        let delay = Duration::from_millis(self.settings.load_delay_ms);
        let source = source.to_string();
        self.loader = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            let kinds = match duration {
                Some(duration) => vec![
                    DeviceEventKind::DurationKnown(duration),
                    DeviceEventKind::Loaded,
                ],
                None => vec![DeviceEventKind::Failed(format!(
                    "Cannot decode {}",
                    source
                ))],
            };
            for kind in kinds {
                if events.send(DeviceEvent::new(generation, kind)).is_err() {
                    return;
                }
            }
        }));

        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let Some(loaded) = self.loaded else {
            return Err(PlaybackError::Device("Nothing loaded".to_string()));
        };
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }

        let events = self.events.clone();
        let playhead = self.playhead.clone();
        let tick = Duration::from_millis(self.settings.tick_ms);
        let step = tick.as_secs_f64() * self.settings.speed;

        self.ticker = Some(tokio::spawn(async move {
            let send = |kind: DeviceEventKind| {
                events
                    .send(DeviceEvent::new(loaded.generation, kind))
                    .is_ok()
            };

            if !send(DeviceEventKind::Started) {
                return;
            }

            let mut interval = tokio::time::interval(tick);
            // First tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let position = (playhead.get() + step).min(loaded.duration);
                playhead.set(position);

                if !send(DeviceEventKind::TimeAdvanced(position)) {
                    return;
                }
                if position >= loaded.duration {
                    send(DeviceEventKind::Finished);
                    return;
                }
            }
        }));

        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let Some(ticker) = self.ticker.take() else {
            return Ok(());
        };
        ticker.abort();
        debug!(position = self.playhead.get(), "Simulated pause");
        if let Some(loaded) = self.loaded {
            self.emit(loaded.generation, DeviceEventKind::Paused);
        }
        Ok(())
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        let Some(loaded) = self.loaded else {
            return Err(PlaybackError::Device("Nothing loaded".to_string()));
        };
        let position = position.clamp(0.0, loaded.duration);
        self.playhead.set(position);
        self.emit(loaded.generation, DeviceEventKind::TimeAdvanced(position));
        Ok(())
    }

    fn set_volume(&mut self, gain: f32) -> Result<()> {
        debug!(gain, "Simulated volume");
        self.gain = gain;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.abort_tasks();
        self.loaded = None;
        self.playhead.set(0.0);
        Ok(())
    }
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        self.abort_tasks();
    }
}
