//! Process-wide event delivery.
//!
//! The bus plays the part of the window/document: hosts publish keyboard,
//! fullscreen and media events on it, and each listener owns a
//! [`Subscription`] whose queue it drains from the event loop. Dropping the
//! subscription removes the listener, so a closed player can never be
//! reached by events meant for its successor.

use std::collections::BTreeMap;
use std::sync::{Arc, Weak};

use log::trace;
use parking_lot::Mutex;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::media::{ElementId, MediaEvent};

/// Keys the control surface cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Space,
    Left,
    Right,
    Char(char),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostEvent {
    /// Window-level keydown
    Key(Key),
    /// Document-level fullscreen change, `active` is the confirmed state
    FullscreenChange { active: bool },
    /// The host refused a fullscreen request after accepting it
    FullscreenError,
    /// Lifecycle event from a media element, stamped with the load it belongs to
    Media {
        element: ElementId,
        generation: u64,
        event: MediaEvent,
    },
}

/// Which slice of events a listener receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topic {
    Keyboard,
    Fullscreen,
    Media(ElementId),
}

impl HostEvent {
    pub fn topic(&self) -> Topic {
        match self {
            HostEvent::Key(_) => Topic::Keyboard,
            HostEvent::FullscreenChange { .. } | HostEvent::FullscreenError => Topic::Fullscreen,
            HostEvent::Media { element, .. } => Topic::Media(*element),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

struct Listener {
    topics: Vec<Topic>,
    tx: UnboundedSender<HostEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: BTreeMap<ListenerId, Listener>,
}

/// Shared listener registry. Cloning yields another handle to the same bus.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Registry>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for one or more topics
    pub fn subscribe(&self, topics: &[Topic]) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut registry = self.inner.lock();
        let id = ListenerId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.insert(
            id,
            Listener {
                topics: topics.to_vec(),
                tx,
            },
        );
        trace!("Listener {:?} bound to {:?}", id, topics);

        Subscription {
            id,
            rx,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver an event to every listener of its topic. Returns how many received it.
    pub fn dispatch(&self, event: HostEvent) -> usize {
        let topic = event.topic();
        let registry = self.inner.lock();
        registry
            .listeners
            .values()
            .filter(|listener| listener.topics.contains(&topic))
            .filter(|listener| listener.tx.send(event.clone()).is_ok())
            .count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn listeners_for(&self, topic: Topic) -> usize {
        self.inner
            .lock()
            .listeners
            .values()
            .filter(|listener| listener.topics.contains(&topic))
            .count()
    }
}

/// A bound listener. Unbinds itself when dropped.
pub struct Subscription {
    id: ListenerId,
    rx: UnboundedReceiver<HostEvent>,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Next queued event, if any
    pub fn try_next(&mut self) -> Option<HostEvent> {
        self.rx.try_recv().ok()
    }

    /// Take every queued event in arrival order
    pub fn drain(&mut self) -> Vec<HostEvent> {
        let mut events = Vec::new();
        while let Some(event) = self.try_next() {
            events.push(event);
        }
        events
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.remove(&self.id);
            trace!("Listener {:?} unbound", self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
