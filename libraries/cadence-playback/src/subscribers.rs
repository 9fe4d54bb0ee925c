//! Subscriber registry
//!
//! Listeners are plain callbacks invoked synchronously, in registration
//! order, on the thread that mutated the engine.

use crate::events::PlaybackEvent;

/// Callback invoked for every [`PlaybackEvent`]
pub type Listener = Box<dyn FnMut(&PlaybackEvent) + Send>;

/// Token returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(u64);

/// Registered listeners
#[derive(Default)]
pub struct Subscribers {
    next_id: u64,
    listeners: Vec<(Subscription, Listener)>,
}

impl Subscribers {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener
    pub fn subscribe(&mut self, listener: Listener) -> Subscription {
        let subscription = Subscription(self.next_id);
        self.next_id += 1;
        self.listeners.push((subscription, listener));
        subscription
    }

    /// Remove a listener; returns whether it was registered
    pub fn unsubscribe(&mut self, subscription: Subscription) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(id, _)| *id != subscription);
        self.listeners.len() != before
    }

    /// Deliver an event to every listener
    pub fn notify(&mut self, event: &PlaybackEvent) {
        for (_, listener) in &mut self.listeners {
            listener(event);
        }
    }

    /// Number of listeners
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether nobody is listening
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
