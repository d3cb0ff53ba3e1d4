use std::sync::Arc;

use log::debug;
use parking_lot::Mutex;

use crate::events::{EventBus, HostEvent};
use crate::media::{ElementId, MediaElement, MediaElementError, MediaErrorKind, MediaEvent};

/// Clock state shared between an element and the host that advances it
pub(crate) struct ElementState {
    pub(crate) id: ElementId,
    pub(crate) src: String,
    pub(crate) generation: u64,
    pub(crate) current_timestamp: f64,
    pub(crate) duration: Option<f64>,
    pub(crate) paused: bool,
    pub(crate) volume: f64,
    /// Metadata (or a load failure) not yet reported for the current load
    pub(crate) pending_load: Option<LoadOutcome>,
    pub(crate) autoplay_blocked: bool,
    bus: EventBus,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum LoadOutcome {
    Metadata(f64),
    Failure(MediaErrorKind),
}

impl ElementState {
    pub(crate) fn new(id: ElementId, bus: EventBus, autoplay_blocked: bool) -> Self {
        Self {
            id,
            src: String::new(),
            generation: 0,
            current_timestamp: 0.,
            duration: None,
            paused: true,
            volume: 1.,
            pending_load: None,
            autoplay_blocked,
            bus,
        }
    }

    fn emit(&self, event: MediaEvent) {
        self.bus.dispatch(HostEvent::Media {
            element: self.id,
            generation: self.generation,
            event,
        });
    }

    /// Advance the element clock by `dt` seconds, emitting whatever a real
    /// element would have reported in that time
    pub(crate) fn advance(&mut self, dt: f64) {
        match self.pending_load.take() {
            Some(LoadOutcome::Metadata(duration)) => {
                self.duration = Some(duration);
                self.current_timestamp = self.current_timestamp.min(duration);
                self.emit(MediaEvent::LoadedMetadata { duration });
                return;
            }
            Some(LoadOutcome::Failure(kind)) => {
                self.paused = true;
                self.emit(MediaEvent::Error(kind));
                return;
            }
            None => {}
        }

        let Some(duration) = self.duration else {
            return;
        };
        if self.paused {
            return;
        }

        self.current_timestamp = (self.current_timestamp + dt).min(duration);
        self.emit(MediaEvent::TimeUpdate {
            current_time: self.current_timestamp,
        });

        if self.current_timestamp >= duration {
            debug!("End of video reached on {:?}", self.id);
            self.paused = true;
            self.emit(MediaEvent::Ended);
        }
    }
}

/// A media element driven by a virtual clock instead of a decoder.
///
/// Loads complete and time advances only when the owning
/// [`SimulatedHost`](crate::host::SimulatedHost) is advanced, which keeps the
/// asynchronous callback order deterministic.
pub struct SimulatedElement {
    state: Arc<Mutex<ElementState>>,
    resolve: Box<dyn Fn(&str) -> LoadOutcome>,
}

impl SimulatedElement {
    pub(crate) fn new(
        state: Arc<Mutex<ElementState>>,
        resolve: Box<dyn Fn(&str) -> LoadOutcome>,
    ) -> Self {
        Self { state, resolve }
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused
    }
}

impl MediaElement for SimulatedElement {
    fn id(&self) -> ElementId {
        self.state.lock().id
    }

    fn src(&self) -> String {
        self.state.lock().src.clone()
    }

    fn load(&mut self, url: &str) -> u64 {
        let outcome = (self.resolve)(url);
        let mut state = self.state.lock();
        state.src = url.to_string();
        state.generation += 1;
        state.current_timestamp = 0.;
        state.duration = None;
        state.paused = true;
        state.pending_load = Some(outcome);
        debug!("Element {:?} loading {} (generation {})", state.id, url, state.generation);
        state.generation
    }

    fn play(&mut self) -> Result<(), MediaElementError> {
        let mut state = self.state.lock();
        if state.src.is_empty() {
            return Err(MediaElementError::NoSource);
        }
        if state.autoplay_blocked {
            return Err(MediaElementError::NotAllowed);
        }
        // Playing an ended element starts it over
        if state.duration.is_some_and(|duration| state.current_timestamp >= duration) {
            state.current_timestamp = 0.;
        }
        state.paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().paused = true;
    }

    fn current_time(&self) -> f64 {
        self.state.lock().current_timestamp
    }

    fn set_current_time(&mut self, secs: f64) {
        let mut state = self.state.lock();
        let secs = secs.max(0.);
        state.current_timestamp = match state.duration {
            Some(duration) => secs.min(duration),
            None => secs,
        };
        if state.duration.is_some() {
            state.emit(MediaEvent::TimeUpdate {
                current_time: state.current_timestamp,
            });
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.state.lock().volume = volume.clamp(0., 1.);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Topic;

    fn element(bus: &EventBus, outcome: LoadOutcome) -> SimulatedElement {
        let state = Arc::new(Mutex::new(ElementState::new(ElementId(7), bus.clone(), false)));
        SimulatedElement::new(state, Box::new(move |_: &str| outcome))
    }

    #[test]
    fn test_metadata_arrives_on_first_advance() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(&[Topic::Media(ElementId(7))]);
        let mut el = element(&bus, LoadOutcome::Metadata(90.));

        let generation = el.load("/a.mp4");
        assert!(sub.drain().is_empty());

        el.state.lock().advance(0.5);
        assert_eq!(
            sub.drain(),
            vec![HostEvent::Media {
                element: ElementId(7),
                generation,
                event: MediaEvent::LoadedMetadata { duration: 90. },
            }]
        );
    }

    #[test]
    fn test_playback_runs_to_end() {
        let bus = EventBus::new();
        let mut sub = bus.subscribe(&[Topic::Media(ElementId(7))]);
        let mut el = element(&bus, LoadOutcome::Metadata(2.));
        el.load("/a.mp4");
        el.state.lock().advance(0.);
        el.play().unwrap();
        el.state.lock().advance(5.);

        let events: Vec<_> = sub
            .drain()
            .into_iter()
            .filter_map(|e| match e {
                HostEvent::Media { event, .. } => Some(event),
                _ => None,
            })
            .collect();
        assert_eq!(
            events,
            vec![
                MediaEvent::LoadedMetadata { duration: 2. },
                MediaEvent::TimeUpdate { current_time: 2. },
                MediaEvent::Ended,
            ]
        );
        assert!(el.is_paused());
    }

    #[test]
    fn test_play_after_end_starts_over() {
        let bus = EventBus::new();
        let mut el = element(&bus, LoadOutcome::Metadata(2.));
        el.load("/a.mp4");
        el.state.lock().advance(0.);
        el.play().unwrap();
        el.state.lock().advance(5.);
        assert_eq!(el.current_time(), 2.);

        el.play().unwrap();
        assert_eq!(el.current_time(), 0.);
        el.state.lock().advance(0.5);
        assert_eq!(el.current_time(), 0.5);
        assert!(!el.is_paused());
    }

    #[test]
    fn test_play_without_source_fails() {
        let bus = EventBus::new();
        let mut el = element(&bus, LoadOutcome::Metadata(2.));
        assert_eq!(el.play(), Err(MediaElementError::NoSource));
    }
}
