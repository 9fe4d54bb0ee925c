//! Shared helpers for integration tests

#![allow(dead_code)]

use cadence_playback::{
    DeviceEvent, DeviceEventKind, EngineConfig, LoadGeneration, PlaybackDevice, PlaybackEngine,
    PlaybackEvent, Result, Track,
};
use std::sync::{Arc, Mutex};

/// Request received by the device
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Load(String, LoadGeneration),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    Stop,
}

/// Device that records every request and answers nothing on its own
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    calls: Arc<Mutex<Vec<DeviceCall>>>,
}

impl RecordingDevice {
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Generation passed to the most recent load of `source`
    pub fn generation_of(&self, source: &str) -> Option<LoadGeneration> {
        self.calls().iter().rev().find_map(|call| match call {
            DeviceCall::Load(loaded, generation) if loaded == source => Some(*generation),
            _ => None,
        })
    }

    fn record(&self, call: DeviceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl PlaybackDevice for RecordingDevice {
    fn load(&mut self, source: &str, generation: LoadGeneration) -> Result<()> {
        self.record(DeviceCall::Load(source.to_string(), generation));
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        self.record(DeviceCall::Play);
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        self.record(DeviceCall::Pause);
        Ok(())
    }

    fn seek(&mut self, position: f64) -> Result<()> {
        self.record(DeviceCall::Seek(position));
        Ok(())
    }

    fn set_volume(&mut self, gain: f32) -> Result<()> {
        self.record(DeviceCall::SetVolume(gain));
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.record(DeviceCall::Stop);
        Ok(())
    }
}

pub fn create_test_track(id: &str) -> Track {
    Track::new(
        id,
        format!("Track {}", id),
        "Test Artist",
        Some(source_of(id)),
    )
}

pub fn source_of(id: &str) -> String {
    format!("https://cdn.example/{}.mp3", id)
}

pub fn create_engine() -> (PlaybackEngine, RecordingDevice) {
    let device = RecordingDevice::default();
    let engine = PlaybackEngine::new(EngineConfig::default(), Box::new(device.clone()));
    device.clear();
    (engine, device)
}

/// Collect every event the engine publishes
pub fn record_events(engine: &mut PlaybackEngine) -> Arc<Mutex<Vec<PlaybackEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&events);
    engine.subscribe(Box::new(move |event| sink.lock().unwrap().push(event.clone())));
    events
}

/// Deliver an event tagged with the engine's current generation
pub fn device_says(engine: &mut PlaybackEngine, kind: DeviceEventKind) {
    let generation = engine.generation();
    engine.handle_device_event(DeviceEvent::new(generation, kind));
}

/// Load completes and audio starts
pub fn start_current(engine: &mut PlaybackEngine) {
    device_says(engine, DeviceEventKind::Loaded);
    device_says(engine, DeviceEventKind::Started);
}
