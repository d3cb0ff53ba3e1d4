//! The environment a player is mounted into.
//!
//! A [`Host`] owns the process-wide [`EventBus`], hands out media elements
//! for the direct backend and mediates fullscreen requests. Fullscreen is
//! asynchronous: a request that returns `Ok` is only a request, the outcome
//! arrives later as [`HostEvent::FullscreenChange`] or
//! [`HostEvent::FullscreenError`].

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use log::{debug, warn};
use parking_lot::Mutex;
use thiserror::Error;

use crate::events::{EventBus, HostEvent, Key};
use crate::media::{
    ElementId, ElementState, LoadOutcome, MediaElement, MediaErrorKind, SimulatedElement,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FullscreenError {
    /// Refused, typically because no user gesture is active
    #[error("fullscreen request was not allowed")]
    NotAllowed,
    #[error("fullscreen is not supported by this host")]
    NotSupported,
    #[error("not in fullscreen")]
    NotActive,
}

pub trait Host {
    fn events(&self) -> &EventBus;

    /// A fresh media element with nothing loaded
    fn create_media_element(&mut self) -> Box<dyn MediaElement>;

    /// Ask for the player container to go fullscreen
    fn request_fullscreen(&mut self) -> Result<(), FullscreenError>;

    fn exit_fullscreen(&mut self) -> Result<(), FullscreenError>;
}

/// How the simulated host answers fullscreen requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FullscreenPolicy {
    #[default]
    Allow,
    /// Refuse synchronously
    Deny,
    /// Accept the request, then fail it asynchronously
    FailLater,
}

struct HostState {
    next_element: u64,
    elements: Vec<Weak<Mutex<ElementState>>>,
    durations: HashMap<String, f64>,
    failures: HashMap<String, MediaErrorKind>,
    default_duration: f64,
    autoplay_blocked: bool,
    fullscreen: bool,
    fullscreen_pending: Option<bool>,
    fullscreen_policy: FullscreenPolicy,
}

/// A deterministic host: elements run on a virtual clock advanced by
/// [`SimulatedHost::advance`]. Cloning gives another handle to the same host.
#[derive(Clone)]
pub struct SimulatedHost {
    bus: EventBus,
    inner: Arc<Mutex<HostState>>,
}

impl SimulatedHost {
    pub fn new(bus: EventBus) -> Self {
        Self {
            bus,
            inner: Arc::new(Mutex::new(HostState {
                next_element: 1,
                elements: Vec::new(),
                durations: HashMap::new(),
                failures: HashMap::new(),
                default_duration: 120.,
                autoplay_blocked: false,
                fullscreen: false,
                fullscreen_pending: None,
                fullscreen_policy: FullscreenPolicy::Allow,
            })),
        }
    }

    /// Duration reported for sources with no explicit entry
    pub fn set_default_duration(&self, secs: f64) {
        self.inner.lock().default_duration = secs.max(0.);
    }

    pub fn set_duration(&self, url: impl Into<String>, secs: f64) {
        self.inner.lock().durations.insert(url.into(), secs.max(0.));
    }

    /// Make every load of `url` fail with `kind`
    pub fn fail_source(&self, url: impl Into<String>, kind: MediaErrorKind) {
        self.inner.lock().failures.insert(url.into(), kind);
    }

    pub fn set_autoplay_blocked(&self, blocked: bool) {
        let mut state = self.inner.lock();
        state.autoplay_blocked = blocked;
        for element in state.elements.iter().filter_map(Weak::upgrade) {
            element.lock().autoplay_blocked = blocked;
        }
    }

    pub fn set_fullscreen_policy(&self, policy: FullscreenPolicy) {
        self.inner.lock().fullscreen_policy = policy;
    }

    pub fn is_fullscreen(&self) -> bool {
        self.inner.lock().fullscreen
    }

    /// Elements that are still mounted somewhere
    pub fn live_elements(&self) -> usize {
        self.inner
            .lock()
            .elements
            .iter()
            .filter(|element| element.strong_count() > 0)
            .count()
    }

    /// Output volume of a live element
    pub fn element_volume(&self, id: ElementId) -> Option<f64> {
        self.inner
            .lock()
            .elements
            .iter()
            .filter_map(Weak::upgrade)
            .find_map(|element| {
                let state = element.lock();
                (state.id == id).then_some(state.volume)
            })
    }

    /// Simulate a keydown on the window
    pub fn press(&self, key: Key) -> usize {
        self.bus.dispatch(HostEvent::Key(key))
    }

    /// Run the virtual clock: settle pending fullscreen transitions, then let
    /// every live element report loads and time progress
    pub fn advance(&self, dt: f64) {
        let (fullscreen_event, elements) = {
            let mut state = self.inner.lock();
            state.elements.retain(|element| element.strong_count() > 0);

            let event = state.fullscreen_pending.take().map(|target| {
                if state.fullscreen_policy == FullscreenPolicy::FailLater {
                    HostEvent::FullscreenError
                } else {
                    state.fullscreen = target;
                    HostEvent::FullscreenChange { active: target }
                }
            });
            let elements: Vec<_> = state.elements.iter().filter_map(Weak::upgrade).collect();
            (event, elements)
        };

        if let Some(event) = fullscreen_event {
            self.bus.dispatch(event);
        }
        for element in elements {
            element.lock().advance(dt);
        }
    }
}

impl Host for SimulatedHost {
    fn events(&self) -> &EventBus {
        &self.bus
    }

    fn create_media_element(&mut self) -> Box<dyn MediaElement> {
        let mut state = self.inner.lock();
        let id = ElementId(state.next_element);
        state.next_element += 1;

        let element = Arc::new(Mutex::new(ElementState::new(
            id,
            self.bus.clone(),
            state.autoplay_blocked,
        )));
        state.elements.push(Arc::downgrade(&element));
        debug!("Created media element {:?}", id);

        let inner = Arc::downgrade(&self.inner);
        let resolve = move |url: &str| {
            let Some(host) = inner.upgrade() else {
                return LoadOutcome::Failure(MediaErrorKind::Aborted);
            };
            let host = host.lock();
            if let Some(kind) = host.failures.get(url) {
                return LoadOutcome::Failure(*kind);
            }
            LoadOutcome::Metadata(host.durations.get(url).copied().unwrap_or(host.default_duration))
        };

        Box::new(SimulatedElement::new(element, Box::new(resolve)))
    }

    fn request_fullscreen(&mut self) -> Result<(), FullscreenError> {
        let mut state = self.inner.lock();
        if state.fullscreen_policy == FullscreenPolicy::Deny {
            warn!("Fullscreen request denied");
            return Err(FullscreenError::NotAllowed);
        }
        state.fullscreen_pending = Some(true);
        Ok(())
    }

    fn exit_fullscreen(&mut self) -> Result<(), FullscreenError> {
        let mut state = self.inner.lock();
        if !state.fullscreen && state.fullscreen_pending != Some(true) {
            return Err(FullscreenError::NotActive);
        }
        state.fullscreen_pending = Some(false);
        Ok(())
    }
}
