//! Playback service - the control loop
//!
//! Moves a [`PlaybackEngine`] onto one tokio task. User commands and device
//! events are both funnelled into that task, so no two mutations ever run
//! concurrently and device callbacks never touch state from their own thread.
//!
//! ```text
//! UI ──PlaybackHandle──► commands ─┐
//!                                  ├─► control task ─► PlaybackEngine ─► watch + broadcast
//! device ──DeviceEventSender──────┘
//! ```

use crate::{
    device::DeviceEventReceiver,
    engine::PlaybackEngine,
    error::{PlaybackError, Result},
    events::{PlaybackEvent, PlaybackSnapshot},
    queue::QueueSnapshot,
    types::{PlaybackState, Track},
};
use std::ops::ControlFlow;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::debug;

/// Buffered notifications per subscriber before it starts lagging
const EVENT_CAPACITY: usize = 256;

/// Commands sent to the control loop
#[derive(Debug, Clone)]
pub enum Command {
    /// Play a track, or resume when `None`
    Play(Option<Track>),

    /// Pause playback
    Pause,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Skip to next track
    Next,

    /// Go to previous track
    Previous,

    /// Stop playback
    Stop,

    /// Set volume (0.0-1.0)
    SetVolume(f32),

    /// Toggle mute
    ToggleMute,

    /// Append track to queue
    Enqueue(Track),

    /// Insert track after the current one
    PlayNext(Track),

    /// Remove track from queue
    RemoveAt(usize),

    /// Reorder queue
    MoveTrack { from: usize, to: usize },

    /// Clear queue
    Clear,

    /// Replace queue and start at index
    PlayQueue { tracks: Vec<Track>, start_index: usize },

    /// Stop the control loop
    Shutdown,
}

/// Spawns the control loop
pub struct PlaybackService;

impl PlaybackService {
    /// Move `engine` onto a new task fed by `device_events`
    ///
    /// Must be called from within a tokio runtime. The returned join handle
    /// completes after [`PlaybackHandle::shutdown`] or once every handle is
    /// dropped.
    pub fn spawn(
        mut engine: PlaybackEngine,
        device_events: DeviceEventReceiver,
    ) -> (PlaybackHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());
        let (event_tx, _) = broadcast::channel(EVENT_CAPACITY);

        let forward = event_tx.clone();
        engine.subscribe(Box::new(move |event| {
            if let Some(snapshot) = event.snapshot() {
                snapshot_tx.send_replace(snapshot.clone());
            }
            // No receivers is fine
            let _ = forward.send(event.clone());
        }));

        let task = tokio::spawn(Self::run(engine, command_rx, device_events));

        let handle = PlaybackHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
            events: event_tx,
        };
        (handle, task)
    }

    async fn run(
        mut engine: PlaybackEngine,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut device_events: DeviceEventReceiver,
    ) {
        debug!("Playback service started");

        loop {
            tokio::select! {
                command = commands.recv() => {
                    let Some(command) = command else { break };
                    if Self::dispatch(&mut engine, command).is_break() {
                        break;
                    }
                }
                Some(event) = device_events.recv() => engine.handle_device_event(event),
            }
        }

        engine.stop();
        debug!("Playback service stopped");
    }

    /// Apply one command; `Break` ends the loop
    fn dispatch(engine: &mut PlaybackEngine, command: Command) -> ControlFlow<()> {
        match command {
            Command::Play(track) => engine.play(track),
            Command::Pause => engine.pause(),
            Command::Seek(position) => engine.seek(position),
            Command::Next => engine.advance_to_next(),
            Command::Previous => engine.previous(),
            Command::Stop => engine.stop(),
            Command::SetVolume(level) => engine.set_volume(level),
            Command::ToggleMute => engine.toggle_mute(),
            Command::Enqueue(track) => engine.enqueue(track),
            Command::PlayNext(track) => engine.play_next(track),
            Command::RemoveAt(index) => engine.remove_at(index),
            Command::MoveTrack { from, to } => engine.move_track(from, to),
            Command::Clear => engine.clear(),
            Command::PlayQueue {
                tracks,
                start_index,
            } => engine.play_queue(tracks, start_index),
            Command::Shutdown => return ControlFlow::Break(()),
        }
        ControlFlow::Continue(())
    }
}

/// Cloneable handle used by UI surfaces
///
/// Every method is fire-and-forget: it returns once the request is queued,
/// and its effect shows up in later snapshots.
#[derive(Debug, Clone)]
pub struct PlaybackHandle {
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<PlaybackSnapshot>,
    events: broadcast::Sender<PlaybackEvent>,
}

impl PlaybackHandle {
    /// Send a raw command
    pub fn send(&self, command: Command) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| PlaybackError::ServiceClosed)
    }

    /// Play a track, or resume when `None`
    pub fn play(&self, track: Option<Track>) -> Result<()> {
        self.send(Command::Play(track))
    }

    /// Pause playback
    pub fn pause(&self) -> Result<()> {
        self.send(Command::Pause)
    }

    /// Seek to position (in seconds)
    pub fn seek(&self, position: f64) -> Result<()> {
        self.send(Command::Seek(position))
    }

    /// Skip to next track
    pub fn next(&self) -> Result<()> {
        self.send(Command::Next)
    }

    /// Go to previous track
    pub fn previous(&self) -> Result<()> {
        self.send(Command::Previous)
    }

    /// Stop playback
    pub fn stop(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// Set volume (0.0-1.0)
    pub fn set_volume(&self, level: f32) -> Result<()> {
        self.send(Command::SetVolume(level))
    }

    /// Toggle mute
    pub fn toggle_mute(&self) -> Result<()> {
        self.send(Command::ToggleMute)
    }

    /// Append track to queue
    pub fn enqueue(&self, track: Track) -> Result<()> {
        self.send(Command::Enqueue(track))
    }

    /// Insert track after the current one
    pub fn play_next(&self, track: Track) -> Result<()> {
        self.send(Command::PlayNext(track))
    }

    /// Remove track from queue
    pub fn remove_at(&self, index: usize) -> Result<()> {
        self.send(Command::RemoveAt(index))
    }

    /// Reorder queue
    pub fn move_track(&self, from: usize, to: usize) -> Result<()> {
        self.send(Command::MoveTrack { from, to })
    }

    /// Clear queue
    pub fn clear(&self) -> Result<()> {
        self.send(Command::Clear)
    }

    /// Replace queue and start at index
    pub fn play_queue(&self, tracks: Vec<Track>, start_index: usize) -> Result<()> {
        self.send(Command::PlayQueue {
            tracks,
            start_index,
        })
    }

    /// Stop the control loop
    pub fn shutdown(&self) -> Result<()> {
        self.send(Command::Shutdown)
    }

    /// Latest published snapshot
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Latest published state
    pub fn state(&self) -> PlaybackState {
        self.snapshots.borrow().state.clone()
    }

    /// Latest published queue
    pub fn queue(&self) -> QueueSnapshot {
        self.snapshots.borrow().queue.clone()
    }

    /// Receiver that wakes on every new snapshot
    pub fn watch(&self) -> watch::Receiver<PlaybackSnapshot> {
        self.snapshots.clone()
    }

    /// Receive every subsequent event; drop the receiver to unsubscribe
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }
}
