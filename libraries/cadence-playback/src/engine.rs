//! Playback engine - the state machine
//!
//! Binds [`Queue`], [`PlayerClock`] and one [`PlaybackDevice`]. The engine is
//! the only writer of [`PlaybackState`]:
//!
//! ```text
//! Idle -> Loading -> Playing <-> Paused -> Ended -> Loading (next track)
//!            |                     ^          \-> Idle    (clear)
//!            +---------------------+  pause held during the load
//! ```
//!
//! Transport calls are requests. `play`, `pause` and `seek` hand work to the
//! device and return; the resulting status and position arrive later through
//! [`PlaybackEngine::handle_device_event`]. Calls that make no sense right now
//! (pause with nothing loaded, next on an empty queue) are silent no-ops.

use crate::{
    clock::{ClockUpdate, PlayerClock},
    device::{DeviceEvent, LoadGeneration, PlaybackDevice},
    error::PlaybackError,
    events::{PlaybackEvent, PlaybackSnapshot},
    queue::Queue,
    subscribers::{Listener, Subscribers, Subscription},
    types::{EngineConfig, PlaybackState, PlaybackStatus, Track},
    volume::Volume,
};
use tracing::{debug, trace, warn};

/// Central playback state machine
pub struct PlaybackEngine {
    config: EngineConfig,
    state: PlaybackState,
    queue: Queue,
    volume: Volume,
    device: Box<dyn PlaybackDevice>,

    // Bumped on every load and stop; device events from older generations are dropped
    generation: LoadGeneration,

    // Generation of the source the device currently holds, if any
    active_load: Option<LoadGeneration>,

    subscribers: Subscribers,

    // Pause asked for while the active load was still in flight
    pause_requested: bool,

    // Device error raised during the current operation, delivered after the snapshot
    pending_error: Option<PlaybackEvent>,
}

impl PlaybackEngine {
    /// Create new playback engine driving `device`
    pub fn new(config: EngineConfig, device: Box<dyn PlaybackDevice>) -> Self {
        let volume = Volume::new(config.initial_volume);
        let mut engine = Self {
            state: PlaybackState::new(volume.level()),
            config,
            queue: Queue::new(),
            volume,
            device,
            generation: LoadGeneration::INITIAL,
            active_load: None,
            pause_requested: false,
            subscribers: Subscribers::new(),
            pending_error: None,
        };
        engine.push_volume();
        engine
    }

    // ===== Observers =====

    /// Current playback state
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Current queue
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Copy of state and queue
    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            state: self.state.clone(),
            queue: self.queue.snapshot(),
        }
    }

    /// Generation of the most recent load or stop
    pub fn generation(&self) -> LoadGeneration {
        self.generation
    }

    /// Register a listener for every subsequent [`PlaybackEvent`]
    pub fn subscribe(&mut self, listener: Listener) -> Subscription {
        self.subscribers.subscribe(listener)
    }

    /// Remove a listener
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    // ===== Transport =====

    /// Play `track`, or resume the current track when `None`
    ///
    /// A track other than the current one is loaded (and queued if absent).
    /// Loading supersedes any load still in flight.
    pub fn play(&mut self, track: Option<Track>) {
        let Some(track) = track else {
            self.resume();
            return;
        };

        let is_current = self.state.current_track_id() == Some(&track.id);
        if is_current
            && matches!(
                self.state.status,
                PlaybackStatus::Loading | PlaybackStatus::Playing | PlaybackStatus::Paused
            )
        {
            self.resume();
            return;
        }

        // First entry with this id wins; the queued copy is what plays
        let index = match self.queue.position_of(&track.id) {
            Some(index) => index,
            None => {
                self.queue.enqueue(track);
                self.queue.len() - 1
            }
        };

        self.load(index);
        self.publish();
    }

    fn resume(&mut self) {
        match self.state.status {
            PlaybackStatus::Paused => {
                if let Err(e) = self.device.play() {
                    self.fail(e);
                    self.publish();
                }
            }
            PlaybackStatus::Idle if self.state.current_track.is_some() => {
                let current_id = self.state.current_track_id();
                let selected = self
                    .queue
                    .current_index()
                    .filter(|_| self.queue.current().map(|t| &t.id) == current_id);
                let index = selected
                    .or_else(|| current_id.and_then(|id| self.queue.position_of(id)))
                    .or_else(|| self.queue.current_index());
                match index {
                    Some(index) => {
                        self.load(index);
                        self.publish();
                    }
                    None => trace!("Resume ignored: current track no longer queued"),
                }
            }
            PlaybackStatus::Loading if self.pause_requested => {
                debug!("Held pause withdrawn");
                self.pause_requested = false;
            }
            status => trace!(?status, "Resume ignored"),
        }
    }

    /// Ask the device to pause
    ///
    /// Status stays `Playing` until the device confirms with `Paused`. While
    /// `Loading`, the request is held and the load ends without starting
    /// playback; a later `play(None)` starts it.
    pub fn pause(&mut self) {
        if self.state.status == PlaybackStatus::Loading {
            debug!(generation = %self.generation, "Pause held until load completes");
            self.pause_requested = true;
            return;
        }
        if self.state.status != PlaybackStatus::Playing {
            trace!(status = ?self.state.status, "Pause ignored");
            return;
        }

        if let Err(e) = self.device.pause() {
            warn!("Device rejected pause: {}", e);
        }
    }

    /// Ask the device to seek to `position` seconds
    ///
    /// Clamped to `[0, duration]` when the duration is known. The reported
    /// position only moves once the device confirms with `TimeAdvanced`.
    pub fn seek(&mut self, position: f64) {
        if self.state.current_track.is_none()
            || matches!(
                self.state.status,
                PlaybackStatus::Idle | PlaybackStatus::Ended
            )
            || position.is_nan()
        {
            trace!(position, status = ?self.state.status, "Seek ignored");
            return;
        }

        let upper = self.state.duration.unwrap_or(f64::INFINITY);
        let target = position.clamp(0.0, upper);
        if !target.is_finite() {
            trace!(position, "Seek ignored: unbounded target");
            return;
        }

        if let Err(e) = self.device.seek(target) {
            warn!("Device rejected seek to {:.2}s: {}", target, e);
        }
    }

    /// Move to the next queued track, or end playback at the last one
    ///
    /// `Ended` is terminal: only an explicit `play` or a new queue restarts.
    pub fn advance_to_next(&mut self) {
        if self.advance() {
            self.publish();
        }
    }

    fn advance(&mut self) -> bool {
        if self.state.current_track.is_none()
            || self.queue.is_empty()
            || self.state.status == PlaybackStatus::Ended
        {
            trace!(status = ?self.state.status, "Advance ignored");
            return false;
        }

        let next_index = if self.queue.next().is_some() {
            self.queue.current_index()
        } else {
            None
        };
        match next_index {
            Some(index) => {
                debug!(index, "Advancing to next track");
                self.load(index);
            }
            None => {
                debug!("Reached end of queue");
                self.halt();
                self.state.status = PlaybackStatus::Ended;
            }
        }
        true
    }

    /// Go back one track (explicit user action only)
    ///
    /// Past the restart threshold the current track restarts instead.
    pub fn previous(&mut self) {
        if self.state.current_track.is_none() || self.queue.is_empty() {
            trace!("Previous ignored: nothing playing");
            return;
        }

        let restartable = matches!(
            self.state.status,
            PlaybackStatus::Playing | PlaybackStatus::Paused
        );
        if restartable && self.state.position > self.config.restart_threshold_secs {
            self.seek(0.0);
            return;
        }

        let previous_index = if self.queue.previous().is_some() {
            self.queue.current_index()
        } else {
            None
        };
        match previous_index {
            Some(index) => {
                self.load(index);
                self.publish();
            }
            None if restartable => self.seek(0.0),
            None => trace!("Previous ignored: at first track"),
        }
    }

    /// Stop output, keeping the current track selected
    pub fn stop(&mut self) {
        if self.state.current_track.is_none() {
            return;
        }

        self.halt();
        self.state.status = PlaybackStatus::Idle;
        self.state.position = 0.0;
        self.publish();
    }

    // ===== Volume =====

    /// Set volume (clamped to [0, 1]); mute state is kept
    pub fn set_volume(&mut self, level: f32) {
        if !self.volume.set_level(level) {
            trace!(level, "Ignoring non-finite volume");
            return;
        }

        self.state.volume = self.volume.level();
        self.push_volume();
        self.publish();
    }

    /// Toggle mute; un-muting restores the previous level exactly
    pub fn toggle_mute(&mut self) {
        self.volume.toggle_mute();
        self.state.muted = self.volume.is_muted();
        self.push_volume();
        self.publish();
    }

    fn push_volume(&mut self) {
        if let Err(e) = self.device.set_volume(self.volume.gain()) {
            warn!("Device rejected volume change: {}", e);
        }
    }

    // ===== Queue =====

    /// Append a track (no-op if its id is already queued)
    pub fn enqueue(&mut self, track: Track) {
        if self.queue.enqueue(track) {
            self.publish();
        }
    }

    /// Queue a track to play right after the current one
    pub fn play_next(&mut self, track: Track) {
        let before = self.queue.snapshot();
        self.queue.insert_after_current(track);
        if self.queue.snapshot() != before {
            self.publish();
        }
    }

    /// Remove the queue entry at `index`
    ///
    /// Removing the playing entry stops it. If it was loading or playing and
    /// a following entry exists, that entry starts; otherwise the entry now
    /// selected stays idle.
    pub fn remove_at(&mut self, index: usize) {
        let was_selected = self.queue.current_index() == Some(index);
        let Some(removed) = self.queue.remove_at(index) else {
            trace!(index, "Remove ignored: out of range");
            return;
        };

        let removed_current = was_selected && self.state.current_track_id() == Some(&removed.id);
        if removed_current {
            let was_active = self.state.status.is_active();
            let has_follower = index < self.queue.len();
            self.halt();

            match self.queue.current_index() {
                None => self.reset(),
                Some(current) if was_active && has_follower => self.load(current),
                Some(_) => {
                    self.state.current_track = self.queue.current().cloned();
                    self.state.status = PlaybackStatus::Idle;
                    PlayerClock::reset_for(&mut self.state, self.queue.current());
                }
            }
        }

        self.publish();
    }

    /// Reorder the queue; the current track stays selected
    pub fn move_track(&mut self, from: usize, to: usize) {
        if from != to && self.queue.move_track(from, to) {
            self.publish();
        }
    }

    /// Empty the queue and return to `Idle`
    pub fn clear(&mut self) {
        if self.queue.is_empty() && self.state.current_track.is_none() {
            return;
        }

        self.queue.clear();
        self.halt();
        self.reset();
        self.publish();
    }

    /// Replace the queue and start playing at `start_index`
    ///
    /// An out-of-range start index plays the first track; an empty list clears.
    pub fn play_queue(&mut self, tracks: Vec<Track>, start_index: usize) {
        if tracks.is_empty() {
            self.clear();
            return;
        }

        self.queue.replace_all(tracks, start_index);
        if let Some(index) = self.queue.current_index() {
            self.load(index);
        }
        self.publish();
    }

    // ===== Device events =====

    /// Apply an event reported by the device
    ///
    /// Events from a superseded load, or arriving while nothing is loaded,
    /// are discarded. Each applied event produces exactly one state
    /// notification.
    pub fn handle_device_event(&mut self, event: DeviceEvent) {
        if self.active_load != Some(event.generation) {
            trace!(
                event_generation = %event.generation,
                current = %self.generation,
                kind = ?event.kind,
                "Discarding stale device event"
            );
            return;
        }

        match PlayerClock::apply(&mut self.state, &event.kind) {
            ClockUpdate::Applied => {}
            ClockUpdate::Ignored => {
                trace!(kind = ?event.kind, "Ignoring device event");
                return;
            }
            ClockUpdate::Loaded => {
                if self.state.status != PlaybackStatus::Loading {
                    return;
                }
                if self.pause_requested {
                    self.pause_requested = false;
                    debug!("Load completed while paused");
                    self.state.status = PlaybackStatus::Paused;
                    self.publish();
                    return;
                }
                match self.device.play() {
                    Ok(()) => return,
                    Err(e) => self.fail(e),
                }
            }
            ClockUpdate::Finished => {
                if !self.advance() {
                    return;
                }
            }
            ClockUpdate::Failed(message) => self.fail(PlaybackError::Device(message)),
        }

        self.publish();
    }

    // ===== Internals =====

    /// Select queue entry `index` and hand its source to the device
    fn load(&mut self, index: usize) {
        let Some(track) = self.queue.select(index).cloned() else {
            return;
        };

        self.generation = self.generation.next();
        self.active_load = Some(self.generation);
        self.pause_requested = false;
        debug!(
            track_id = %track.id,
            generation = %self.generation,
            "Loading track"
        );

        PlayerClock::reset_for(&mut self.state, Some(&track));
        self.state.status = PlaybackStatus::Loading;
        self.state.current_track = Some(track.clone());

        let result = match track.source.as_deref() {
            Some(source) => self.device.load(source, self.generation),
            None => Err(PlaybackError::SourceUnavailable(track.id.clone())),
        };
        if let Err(e) = result {
            self.fail(e);
        }
    }

    /// Stop the device and invalidate everything it may still report
    fn halt(&mut self) {
        self.generation = self.generation.next();
        self.active_load = None;
        self.pause_requested = false;
        if let Err(e) = self.device.stop() {
            warn!("Device rejected stop: {}", e);
        }
    }

    fn reset(&mut self) {
        self.state.current_track = None;
        self.state.status = PlaybackStatus::Idle;
        PlayerClock::reset_for(&mut self.state, None);
    }

    /// Device error: drop back to `Idle` and queue a one-shot error event
    fn fail(&mut self, error: PlaybackError) {
        let track_id = self.state.current_track_id().cloned();
        warn!(track_id = ?track_id, "Playback failed: {}", error);

        self.state.status = PlaybackStatus::Idle;
        self.active_load = None;
        self.pending_error = Some(PlaybackEvent::Error {
            track_id,
            message: error.to_string(),
        });
    }

    fn publish(&mut self) {
        let event = PlaybackEvent::StateChanged(self.snapshot());
        self.subscribers.notify(&event);

        if let Some(error) = self.pending_error.take() {
            self.subscribers.notify(&error);
        }
    }
}

impl std::fmt::Debug for PlaybackEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackEngine")
            .field("state", &self.state)
            .field("queue", &self.queue)
            .field("generation", &self.generation)
            .field("subscribers", &self.subscribers)
            .finish_non_exhaustive()
    }
}
