use log::{debug, trace, warn};

use crate::error::{PlayerError, Result};
use crate::events::{EventBus, HostEvent, Subscription, Topic};
use crate::host::Host;
use crate::media::{ClassifyError, MediaElement, MediaErrorKind, MediaEvent};

/// Live transport state of one open player
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackState {
    pub active_source_index: usize,
    pub current_time: f64,
    /// `None` until the backend reports metadata
    pub duration: Option<f64>,
    pub is_playing: bool,
    /// Requested volume, kept while muted
    pub volume: f64,
    pub is_muted: bool,
    /// Last fullscreen state confirmed by the host
    pub is_fullscreen: bool,
    /// Native media failure on the current source
    pub error: Option<MediaErrorKind>,
}

impl PlaybackState {
    pub fn new(volume: f64) -> Self {
        let volume = volume.clamp(0., 1.);
        Self {
            active_source_index: 0,
            current_time: 0.,
            duration: None,
            is_playing: false,
            volume,
            is_muted: volume == 0.,
            is_fullscreen: false,
            error: None,
        }
    }

    /// Volume the element should actually output
    pub fn effective_volume(&self) -> f64 {
        if self.is_muted { 0. } else { self.volume }
    }

    /// Scrubber position in percent, 0 while the duration is unknown
    pub fn progress_percent(&self) -> f64 {
        match self.duration {
            Some(duration) if duration > 0. => (self.current_time / duration * 100.).clamp(0., 100.),
            _ => 0.,
        }
    }

    fn reset_position(&mut self) {
        self.current_time = 0.;
        self.duration = None;
        self.error = None;
    }
}

/// A mounted media element plus the listener for its events
pub(crate) struct Attachment {
    element: Box<dyn MediaElement>,
    events: Subscription,
    generation: u64,
    metadata_seen: bool,
}

impl Attachment {
    /// Bind to the element's events and start the first load
    fn open(mut element: Box<dyn MediaElement>, volume: f64, url: &str, bus: &EventBus) -> Self {
        element.set_volume(volume);
        let events = bus.subscribe(&[Topic::Media(element.id())]);
        let generation = element.load(url);
        Self {
            element,
            events,
            generation,
            metadata_seen: false,
        }
    }

    pub(crate) fn src(&self) -> String {
        self.element.src()
    }

    /// Load a new resource; events from earlier loads are discarded from here on
    fn load(&mut self, url: &str, bus: &EventBus) {
        self.events = bus.subscribe(&[Topic::Media(self.element.id())]);
        self.generation = self.element.load(url);
        self.metadata_seen = false;
    }
}

/// Whatever currently renders the active source
pub(crate) enum Backend {
    Detached,
    Embedded { embed_url: String },
    Direct(Attachment),
    /// The source could not be classified into a playable backend
    Broken(ClassifyError),
}

/// What a media event changed
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum MediaUpdate {
    MetadataLoaded,
    Progress,
    Ended,
    Failed(MediaErrorKind),
    Ignored,
}

/// Owns [`PlaybackState`] and drives whichever backend is mounted
pub struct PlaybackController {
    state: PlaybackState,
    backend: Backend,
    last_audible_volume: f64,
    fullscreen_pending: bool,
}

impl PlaybackController {
    pub fn new(initial_volume: f64) -> Self {
        let state = PlaybackState::new(initial_volume);
        let last_audible_volume = if state.volume > 0. { state.volume } else { 1. };
        Self {
            state,
            backend: Backend::Detached,
            last_audible_volume,
            fullscreen_pending: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn is_direct(&self) -> bool {
        matches!(self.backend, Backend::Direct(_))
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self.backend, Backend::Embedded { .. })
    }

    pub fn fullscreen_pending(&self) -> bool {
        self.fullscreen_pending
    }

    pub(crate) fn backend(&self) -> &Backend {
        &self.backend
    }

    pub(crate) fn select(&mut self, index: usize) {
        self.state.active_source_index = index;
    }

    /// Mount a fresh element on `url`
    pub(crate) fn mount_direct(&mut self, element: Box<dyn MediaElement>, url: &str, bus: &EventBus) {
        let attachment = Attachment::open(element, self.state.effective_volume(), url, bus);
        debug!("Direct backend mounted on {}", url);

        self.state.reset_position();
        self.state.is_playing = false;
        self.backend = Backend::Direct(attachment);
    }

    /// Point the mounted element at a new resource, keeping the element itself.
    /// Position, duration and `is_playing` keep their captured values so the
    /// controls stay steady until the switch is restored.
    pub(crate) fn reattach(&mut self, url: &str, bus: &EventBus) -> bool {
        let Backend::Direct(attachment) = &mut self.backend else {
            return false;
        };
        attachment.load(url, bus);
        self.state.error = None;
        debug!("Direct backend reattached to {}", url);
        true
    }

    /// A switch that never got metadata has nothing left to show
    pub(crate) fn abandon_restore(&mut self) {
        self.state.current_time = 0.;
        self.state.duration = None;
    }

    pub(crate) fn mount_embedded(&mut self, embed_url: String) {
        debug!("Embedded backend mounted on {}", embed_url);
        self.backend = Backend::Embedded { embed_url };
        self.state.reset_position();
        self.state.is_playing = false;
    }

    pub(crate) fn mount_broken(&mut self, error: ClassifyError) {
        warn!("Source cannot be played: {}", error);
        self.backend = Backend::Broken(error);
        self.state.reset_position();
        self.state.is_playing = false;
    }

    /// Drop the backend and every listener it holds
    pub(crate) fn detach(&mut self) {
        if !matches!(self.backend, Backend::Detached) {
            debug!("Backend detached");
        }
        self.backend = Backend::Detached;
        self.state.is_playing = false;
    }

    fn element(&mut self) -> Result<&mut Box<dyn MediaElement>> {
        match &mut self.backend {
            Backend::Direct(attachment) => Ok(&mut attachment.element),
            _ => Err(PlayerError::NotControllable),
        }
    }

    pub fn play(&mut self) -> Result<()> {
        if self.state.is_playing {
            return Ok(());
        }
        self.element()?.play()?;
        self.state.is_playing = true;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        if !self.state.is_playing {
            return Ok(());
        }
        self.element()?.pause();
        self.state.is_playing = false;
        Ok(())
    }

    pub fn toggle_play(&mut self) -> Result<()> {
        if self.state.is_playing { self.pause() } else { self.play() }
    }

    /// Seek to a point given in percent of the duration. An unknown duration
    /// counts as zero. Returns the target in seconds.
    pub fn seek_to(&mut self, percent: f64) -> Result<f64> {
        if percent.is_nan() {
            return Err(PlayerError::InvalidValue {
                what: "seek percent",
                value: percent,
            });
        }
        let duration = self.state.duration.unwrap_or(0.);
        let target = percent.clamp(0., 100.) / 100. * duration;
        self.seek_secs(target)
    }

    /// Relative seek, clamped to the known duration
    pub fn seek_by(&mut self, delta_secs: f64) -> Result<f64> {
        if delta_secs.is_nan() {
            return Err(PlayerError::InvalidValue {
                what: "seek offset",
                value: delta_secs,
            });
        }
        let duration = self.state.duration.unwrap_or(0.);
        let target = (self.state.current_time + delta_secs).clamp(0., duration);
        self.seek_secs(target)
    }

    fn seek_secs(&mut self, target: f64) -> Result<f64> {
        self.element()?.set_current_time(target);
        self.state.current_time = target;
        trace!("Seek to {:.2}s", target);
        Ok(target)
    }

    /// Set the volume; zero mutes, anything above unmutes
    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        if volume.is_nan() {
            return Err(PlayerError::InvalidValue {
                what: "volume",
                value: volume,
            });
        }
        let volume = volume.clamp(0., 1.);
        self.element()?;

        self.state.volume = volume;
        self.state.is_muted = volume == 0.;
        if volume > 0. {
            self.last_audible_volume = volume;
        }
        self.apply_volume();
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<()> {
        self.element()?;
        if self.state.is_muted {
            if self.state.volume == 0. {
                self.state.volume = self.last_audible_volume;
            }
            self.state.is_muted = false;
        } else {
            self.state.is_muted = true;
        }
        self.apply_volume();
        Ok(())
    }

    fn apply_volume(&mut self) {
        let effective = self.state.effective_volume();
        if let Backend::Direct(attachment) = &mut self.backend {
            attachment.element.set_volume(effective);
        }
    }

    /// Ask the host for fullscreen. `is_fullscreen` only changes once the
    /// host confirms through a fullscreen-change event.
    pub fn request_fullscreen(&mut self, host: &mut dyn Host) -> Result<()> {
        if self.state.is_fullscreen || self.fullscreen_pending {
            return Ok(());
        }
        if let Err(e) = host.request_fullscreen() {
            warn!("Fullscreen request refused: {}", e);
            return Err(e.into());
        }
        self.fullscreen_pending = true;
        Ok(())
    }

    pub fn exit_fullscreen(&mut self, host: &mut dyn Host) -> Result<()> {
        if !self.state.is_fullscreen {
            return Ok(());
        }
        host.exit_fullscreen()?;
        self.fullscreen_pending = true;
        Ok(())
    }

    pub fn toggle_fullscreen(&mut self, host: &mut dyn Host) -> Result<()> {
        if self.state.is_fullscreen {
            self.exit_fullscreen(host)
        } else {
            self.request_fullscreen(host)
        }
    }

    pub(crate) fn on_fullscreen_change(&mut self, active: bool) {
        self.fullscreen_pending = false;
        self.state.is_fullscreen = active;
    }

    pub(crate) fn on_fullscreen_error(&mut self) {
        if self.fullscreen_pending {
            warn!("Fullscreen transition failed");
        }
        self.fullscreen_pending = false;
    }

    /// Queued events for the current load of the mounted element
    pub(crate) fn drain_media(&mut self) -> Vec<MediaEvent> {
        let Backend::Direct(attachment) = &mut self.backend else {
            return Vec::new();
        };
        let id = attachment.element.id();
        let generation = attachment.generation;

        attachment
            .events
            .drain()
            .into_iter()
            .filter_map(|event| match event {
                HostEvent::Media {
                    element,
                    generation: g,
                    event,
                } if element == id && g == generation => Some(event),
                stale => {
                    trace!("Dropping stale event {:?}", stale);
                    None
                }
            })
            .collect()
    }

    pub(crate) fn apply_media_event(&mut self, event: MediaEvent) -> MediaUpdate {
        let Backend::Direct(attachment) = &mut self.backend else {
            return MediaUpdate::Ignored;
        };

        match event {
            MediaEvent::LoadedMetadata { duration } => {
                if attachment.metadata_seen {
                    return MediaUpdate::Ignored;
                }
                attachment.metadata_seen = true;
                let duration = if duration.is_finite() { duration.max(0.) } else { 0. };
                self.state.duration = Some(duration);
                self.state.current_time = self.state.current_time.min(duration);
                debug!("Metadata loaded, duration {:.2}s", duration);
                MediaUpdate::MetadataLoaded
            }
            MediaEvent::TimeUpdate { current_time } => {
                let mut time = current_time.max(0.);
                if let Some(duration) = self.state.duration {
                    time = time.min(duration);
                }
                self.state.current_time = time;
                MediaUpdate::Progress
            }
            MediaEvent::Ended => {
                self.state.is_playing = false;
                if let Some(duration) = self.state.duration {
                    self.state.current_time = duration;
                }
                MediaUpdate::Ended
            }
            MediaEvent::Error(kind) => {
                warn!("Media error: {}", kind);
                self.state.error = Some(kind);
                self.state.is_playing = false;
                MediaUpdate::Failed(kind)
            }
        }
    }

    /// Finish a load: seek to `at` (clamped to the new duration) and start
    /// playing if `resume`. Returns whether playback is running afterwards.
    pub(crate) fn restore(&mut self, at: Option<f64>, resume: bool) -> bool {
        let duration = self.state.duration.unwrap_or(0.);
        let Backend::Direct(attachment) = &mut self.backend else {
            return false;
        };

        if let Some(at) = at {
            let at = at.clamp(0., duration);
            attachment.element.set_current_time(at);
            self.state.current_time = at;
        }

        self.state.is_playing = false;
        if resume {
            match attachment.element.play() {
                Ok(()) => self.state.is_playing = true,
                Err(e) => warn!("Could not resume playback: {}", e),
            }
        }
        self.state.is_playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FullscreenPolicy, SimulatedHost};

    fn loaded_controller(duration: f64) -> (PlaybackController, SimulatedHost) {
        let bus = EventBus::new();
        let mut host = SimulatedHost::new(bus.clone());
        host.set_default_duration(duration);
        let mut controller = PlaybackController::new(1.);
        let element = host.create_media_element();
        controller.mount_direct(element, "/movie.mp4", &bus);

        host.advance(0.);
        for event in controller.drain_media() {
            controller.apply_media_event(event);
        }
        (controller, host)
    }

    #[test]
    fn test_seek_maps_percent_to_duration() {
        let (mut controller, _host) = loaded_controller(200.);
        assert_eq!(controller.seek_to(25.).unwrap(), 50.);
        assert_eq!(controller.state().current_time, 50.);
        assert_eq!(controller.seek_to(150.).unwrap(), 200.);
        assert!(controller.seek_to(f64::NAN).is_err());
    }

    #[test]
    fn test_seek_with_unknown_duration_goes_to_zero() {
        let bus = EventBus::new();
        let mut host = SimulatedHost::new(bus.clone());
        let mut controller = PlaybackController::new(1.);
        controller.mount_direct(host.create_media_element(), "/movie.mp4", &bus);

        assert_eq!(controller.seek_to(80.).unwrap(), 0.);
        assert_eq!(controller.state().current_time, 0.);
    }

    #[test]
    fn test_seek_by_is_clamped() {
        let (mut controller, _host) = loaded_controller(30.);
        assert_eq!(controller.seek_by(-5.).unwrap(), 0.);
        assert_eq!(controller.seek_by(45.).unwrap(), 30.);
    }

    #[test]
    fn test_mute_round_trip_keeps_volume() {
        let (mut controller, _host) = loaded_controller(30.);
        controller.set_volume(0.6).unwrap();
        controller.toggle_mute().unwrap();
        assert!(controller.state().is_muted);
        assert_eq!(controller.state().volume, 0.6);
        assert_eq!(controller.state().effective_volume(), 0.);

        controller.toggle_mute().unwrap();
        assert!(!controller.state().is_muted);
        assert_eq!(controller.state().volume, 0.6);
    }

    #[test]
    fn test_zero_volume_mutes_and_unmute_restores_last_audible() {
        let (mut controller, _host) = loaded_controller(30.);
        controller.set_volume(0.4).unwrap();
        controller.set_volume(0.).unwrap();
        assert!(controller.state().is_muted);

        controller.toggle_mute().unwrap();
        assert!(!controller.state().is_muted);
        assert_eq!(controller.state().volume, 0.4);

        controller.set_volume(7.).unwrap();
        assert_eq!(controller.state().volume, 1.);
    }

    #[test]
    fn test_metadata_applied_once_per_load() {
        let (mut controller, _host) = loaded_controller(30.);
        assert_eq!(
            controller.apply_media_event(MediaEvent::LoadedMetadata { duration: 99. }),
            MediaUpdate::Ignored
        );
        assert_eq!(controller.state().duration, Some(30.));
    }

    #[test]
    fn test_time_update_never_exceeds_duration() {
        let (mut controller, _host) = loaded_controller(30.);
        controller.apply_media_event(MediaEvent::TimeUpdate { current_time: 31.5 });
        assert_eq!(controller.state().current_time, 30.);
    }

    #[test]
    fn test_stale_generation_is_dropped() {
        let bus = EventBus::new();
        let mut host = SimulatedHost::new(bus.clone());
        let mut controller = PlaybackController::new(1.);
        controller.mount_direct(host.create_media_element(), "/a.mp4", &bus);

        let Backend::Direct(attachment) = &controller.backend else {
            panic!("expected direct backend");
        };
        let id = attachment.element.id();
        let old = attachment.generation;

        controller.reattach("/b.mp4", &bus);
        bus.dispatch(HostEvent::Media {
            element: id,
            generation: old,
            event: MediaEvent::LoadedMetadata { duration: 10. },
        });
        assert!(controller.drain_media().is_empty());
    }

    #[test]
    fn test_embedded_backend_is_not_controllable() {
        let mut controller = PlaybackController::new(1.);
        controller.mount_embedded("https://www.youtube.com/embed/abc".to_string());
        assert_eq!(controller.play(), Err(PlayerError::NotControllable));
        assert_eq!(controller.seek_to(10.), Err(PlayerError::NotControllable));
        assert_eq!(controller.set_volume(0.3), Err(PlayerError::NotControllable));
        assert_eq!(controller.state().volume, 1.);
    }

    #[test]
    fn test_fullscreen_waits_for_confirmation() {
        let (mut controller, mut host) = loaded_controller(30.);
        controller.request_fullscreen(&mut host).unwrap();
        assert!(!controller.state().is_fullscreen);
        assert!(controller.fullscreen_pending());

        controller.on_fullscreen_change(true);
        assert!(controller.state().is_fullscreen);
        assert!(!controller.fullscreen_pending());
    }

    #[test]
    fn test_refused_fullscreen_does_not_flip() {
        let (mut controller, mut host) = loaded_controller(30.);
        host.set_fullscreen_policy(FullscreenPolicy::Deny);
        assert!(matches!(
            controller.request_fullscreen(&mut host),
            Err(PlayerError::Fullscreen(_))
        ));
        assert!(!controller.state().is_fullscreen);
        assert!(!controller.fullscreen_pending());
    }

    #[test]
    fn test_blocked_autoplay_leaves_player_paused() {
        let (mut controller, host) = loaded_controller(30.);
        host.set_autoplay_blocked(true);
        assert!(!controller.restore(None, true));
        assert!(!controller.state().is_playing);
    }
}
