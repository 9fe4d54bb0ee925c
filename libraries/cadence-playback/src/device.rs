//! Platform-agnostic playback device trait
//!
//! Abstracts the one audio output the engine drives (a browser audio element,
//! a CPAL stream, a remote renderer, ...). Requests go in through
//! [`PlaybackDevice`]; everything the device observes comes back as
//! [`DeviceEvent`]s on a channel that only the control loop reads.

use crate::error::Result;
use std::fmt;
use tokio::sync::mpsc;

/// Monotonic tag identifying one load request
///
/// Every load (and every stop) moves the engine to a new generation. Events
/// carrying an older generation belong to a superseded load and are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LoadGeneration(u64);

impl LoadGeneration {
    /// Initial generation (nothing loaded yet)
    pub const INITIAL: Self = Self(0);

    /// The following generation
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Raw counter value
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LoadGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}

/// What the device observed
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceEventKind {
    /// Playback clock moved (seconds). May be NaN before a source is ready.
    TimeAdvanced(f64),

    /// Source duration became known (seconds)
    DurationKnown(f64),

    /// Source finished loading and can start
    Loaded,

    /// Audio is flowing
    Started,

    /// Audio stopped flowing at the device's request or ours
    Paused,

    /// Source played to its end
    Finished,

    /// Source missing, unreachable or unsupported
    Failed(String),
}

/// Device event tagged with the load it belongs to
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceEvent {
    /// Generation passed to [`PlaybackDevice::load`]
    pub generation: LoadGeneration,

    /// What happened
    pub kind: DeviceEventKind,
}

impl DeviceEvent {
    /// Create a new event
    pub fn new(generation: LoadGeneration, kind: DeviceEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Sending half given to the device
pub type DeviceEventSender = mpsc::UnboundedSender<DeviceEvent>;

/// Receiving half consumed by the control loop
pub type DeviceEventReceiver = mpsc::UnboundedReceiver<DeviceEvent>;

/// Create the channel a device reports through
pub fn device_channel() -> (DeviceEventSender, DeviceEventReceiver) {
    mpsc::unbounded_channel()
}

/// One audio output
///
/// All methods are requests: they must return quickly and report their
/// effect later through [`DeviceEvent`]s. Implementations may do real work on
/// other threads, but must never touch engine state directly.
pub trait PlaybackDevice: Send {
    /// Start loading `source`
    ///
    /// Every event produced for this source must carry `generation`.
    /// Replaces whatever was loaded before.
    fn load(&mut self, source: &str, generation: LoadGeneration) -> Result<()>;

    /// Start or resume output of the loaded source
    fn play(&mut self) -> Result<()>;

    /// Pause output
    fn pause(&mut self) -> Result<()>;

    /// Seek to `position` seconds (already clamped by the engine)
    fn seek(&mut self, position: f64) -> Result<()>;

    /// Set output gain (0.0-1.0, 0.0 while muted)
    fn set_volume(&mut self, gain: f32) -> Result<()>;

    /// Stop output and drop the loaded source
    fn stop(&mut self) -> Result<()>;
}

/// Call recorded by [`RecordingDevice`]
#[cfg(test)]
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    Load(String, LoadGeneration),
    Play,
    Pause,
    Seek(f64),
    SetVolume(f32),
    Stop,
}

/// Device that only records requests, for engine unit tests
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct RecordingDevice {
    pub calls: std::sync::Arc<std::sync::Mutex<Vec<DeviceCall>>>,
    pub fail_loads: bool,
}

#[cfg(test)]
impl RecordingDevice {
    fn record(&self, call: DeviceCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[cfg(test)]
impl PlaybackDevice for RecordingDevice {
    fn load(&mut self, source: &str, generation: LoadGeneration) -> Result<()> {
        if self.fail_loads {
            return Err(crate::error::PlaybackError::Device(format!(
                "unsupported source {}",
                source
            )));
        }
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
