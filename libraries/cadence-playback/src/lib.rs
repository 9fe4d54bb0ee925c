//! Cadence - Playback Engine
//!
//! Platform-agnostic playback core for Cadence.
//!
//! This crate provides:
//! - A single play queue with a current position (no wraparound)
//! - A playback state machine (Idle, Loading, Playing, Paused, Ended)
//! - A clock bridge that turns device events into state updates
//! - Generation-tagged loads, so a late load can never hijack playback
//! - Volume and mute (mute preserves the level)
//! - Synchronous subscriber notifications with full snapshots
//! - A tokio control loop that serialises commands and device events
//! - Time-synchronised lyrics
//!
//! # Architecture
//!
//! `cadence-playback` does no decoding and owns no audio output. The audio
//! output is supplied through the [`PlaybackDevice`] trait and reports back
//! over a channel of [`DeviceEvent`]s.
//!
//! # Example: Driving the engine directly
//!
//! ```rust
//! use cadence_playback::{
//!     DeviceEvent, DeviceEventKind, EngineConfig, LoadGeneration, PlaybackDevice,
//!     PlaybackEngine, PlaybackStatus, Result, Track,
//! };
//!
//! // A device that accepts every request
//! struct NullDevice;
//!
//! impl PlaybackDevice for NullDevice {
//!     fn load(&mut self, _source: &str, _generation: LoadGeneration) -> Result<()> { Ok(()) }
//!     fn play(&mut self) -> Result<()> { Ok(()) }
//!     fn pause(&mut self) -> Result<()> { Ok(()) }
//!     fn seek(&mut self, _position: f64) -> Result<()> { Ok(()) }
//!     fn set_volume(&mut self, _gain: f32) -> Result<()> { Ok(()) }
//!     fn stop(&mut self) -> Result<()> { Ok(()) }
//! }
//!
//! let mut engine = PlaybackEngine::new(EngineConfig::default(), Box::new(NullDevice));
//!
//! let track = Track::new("t1", "My Song", "Artist Name", Some("https://cdn.example/t1.mp3".into()));
//! engine.play(Some(track));
//! assert_eq!(engine.state().status, PlaybackStatus::Loading);
//!
//! // The device reports back, tagged with the load's generation
//! let generation = engine.generation();
//! engine.handle_device_event(DeviceEvent::new(generation, DeviceEventKind::Loaded));
//! engine.handle_device_event(DeviceEvent::new(generation, DeviceEventKind::Started));
//! assert_eq!(engine.state().status, PlaybackStatus::Playing);
//! ```
//!
//! # Example: Running the control loop
//!
//! ```rust,no_run
//! use cadence_playback::{device_channel, EngineConfig, PlaybackEngine, PlaybackService};
//! # use cadence_playback::{LoadGeneration, PlaybackDevice, Result};
//! # struct MyDevice;
//! # impl PlaybackDevice for MyDevice {
//! #     fn load(&mut self, _: &str, _: LoadGeneration) -> Result<()> { Ok(()) }
//! #     fn play(&mut self) -> Result<()> { Ok(()) }
//! #     fn pause(&mut self) -> Result<()> { Ok(()) }
//! #     fn seek(&mut self, _: f64) -> Result<()> { Ok(()) }
//! #     fn set_volume(&mut self, _: f32) -> Result<()> { Ok(()) }
//! #     fn stop(&mut self) -> Result<()> { Ok(()) }
//! # }
//!
//! # async fn example() -> Result<()> {
//! let (event_tx, event_rx) = device_channel();
//! // The device keeps `event_tx` and reports through it
//! # let _ = event_tx;
//! let engine = PlaybackEngine::new(EngineConfig::default(), Box::new(MyDevice));
//! let (handle, _task) = PlaybackService::spawn(engine, event_rx);
//!
//! let mut events = handle.subscribe();
//! handle.set_volume(0.5)?;
//! while let Ok(event) = events.recv().await {
//!     println!("{:?}", event);
//! }
//! # Ok(())
//! # }
//! ```

mod clock;
pub mod device;
mod engine;
mod error;
mod events;
pub mod lyrics;
mod queue;
mod service;
mod subscribers;
pub mod types;
mod volume;

// Public exports
pub use clock::{ClockUpdate, PlayerClock};
pub use device::{
    device_channel, DeviceEvent, DeviceEventKind, DeviceEventReceiver, DeviceEventSender,
    LoadGeneration, PlaybackDevice,
};
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use events::{PlaybackEvent, PlaybackSnapshot};
pub use lyrics::{LyricLine, Lyrics, LyricsUpdate, LyricsView};
pub use queue::{Queue, QueueSnapshot};
pub use service::{Command, PlaybackHandle, PlaybackService};
pub use subscribers::{Listener, Subscribers, Subscription};
pub use types::{EngineConfig, PlaybackState, PlaybackStatus, Track, TrackId};
pub use volume::Volume;
