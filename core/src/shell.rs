//! The player control surface.
//!
//! A [`PlayerShell`] is mounted for one movie, owns the playback controller
//! and the quality switcher, and holds the keyboard and fullscreen listeners
//! for exactly as long as it is open. Hosts drive it by calling [`pump`]
//! from their event loop and draw whatever [`view`] returns.
//!
//! [`pump`]: PlayerShell::pump
//! [`view`]: PlayerShell::view

mod view;


pub use view::{QualityOption, ShellView, Surface, TransportView, format_time};

use log::{debug, info, warn};

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::events::{HostEvent, Key, Subscription, Topic};
use crate::host::Host;
use crate::media::{self, BackendKind, MediaEvent};
use crate::movie::MovieDescriptor;
use crate::playback::{Backend, MediaUpdate, PlaybackController, PlaybackState};
use crate::quality::QualitySwitcher;
use crate::state::{PhaseMachine, ShellPhase};

/// Treat `NotControllable` as a no-op; the embedded frame owns its own controls
fn reach<T>(action: &str, outcome: Result<T>) -> Result<Option<T>> {
    match outcome {
        Ok(value) => Ok(Some(value)),
        Err(PlayerError::NotControllable) => {
            debug!("{} ignored, active backend owns its controls", action);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Phase changes driven by host events have nowhere to report to
fn settle(outcome: Result<ShellPhase>) {
    if let Err(e) = outcome {
        warn!("Phase change skipped: {}", e);
    }
}

pub struct PlayerShell<H: Host> {
    movie: MovieDescriptor,
    config: PlayerConfig,
    host: H,
    phase: PhaseMachine,
    controller: PlaybackController,
    switcher: QualitySwitcher,
    /// Keyboard and fullscreen listeners, `None` once torn down
    listeners: Option<Subscription>,
    on_close: Option<Box<dyn FnOnce()>>,
    pointer_inside: bool,
}

impl<H: Host> PlayerShell<H> {
    /// Open a player for `movie`. The first source is classified and mounted
    /// right away; `on_close` runs once when the player is closed.
    pub fn mount<F>(movie: MovieDescriptor, config: PlayerConfig, host: H, on_close: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        let listeners = host.events().subscribe(&[Topic::Keyboard, Topic::Fullscreen]);
        let controller = PlaybackController::new(config.initial_volume);

        let mut shell = Self {
            movie,
            config,
            host,
            phase: PhaseMachine::new(),
            controller,
            switcher: QualitySwitcher::new(),
            listeners: Some(listeners),
            on_close: Some(Box::new(on_close)),
            pointer_inside: false,
        };
        shell.start();
        shell
    }

    fn start(&mut self) {
        info!("Opening player for {}", self.movie.title);
        let has_sources = self.movie.is_playable();
        settle(self.phase.mount(has_sources));

        let Some(source) = self.movie.videos.first() else {
            warn!("{} has no playable sources", self.movie.title);
            return;
        };

        match media::classify(source, &self.config.embed) {
            Ok(BackendKind::Direct(source)) => {
                let element = self.host.create_media_element();
                self.controller.mount_direct(element, &source.url, self.host.events());
            }
            Ok(BackendKind::Embedded(embed_url)) => {
                self.controller.mount_embedded(embed_url);
                settle(self.phase.loaded(false));
            }
            Err(e) => {
                self.controller.mount_broken(e);
                settle(self.phase.loaded(false));
            }
        }
    }

    pub fn phase(&self) -> ShellPhase {
        self.phase.phase()
    }

    pub fn state(&self) -> &PlaybackState {
        self.controller.state()
    }

    pub fn movie(&self) -> &MovieDescriptor {
        &self.movie
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_closed(&self) -> bool {
        self.phase.phase() == ShellPhase::Closed
    }

    pub fn play(&mut self) -> Result<()> {
        self.phase.require_transport("play")?;
        if reach("play", self.controller.play())?.is_some() {
            self.phase.play()?;
        }
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.phase.require_transport("pause")?;
        if reach("pause", self.controller.pause())?.is_some() {
            self.phase.pause()?;
        }
        Ok(())
    }

    /// Surface click and the play overlay both land here
    pub fn toggle_play(&mut self) -> Result<()> {
        if self.controller.state().is_playing {
            self.pause()
        } else {
            self.play()
        }
    }

    /// Seek to `percent` (0-100) of the duration
    pub fn seek_to(&mut self, percent: f64) -> Result<()> {
        self.phase.require_transport("seek")?;
        reach("seek", self.controller.seek_to(percent))?;
        Ok(())
    }

    pub fn seek_by(&mut self, delta_secs: f64) -> Result<()> {
        self.phase.require_transport("seek")?;
        reach("seek", self.controller.seek_by(delta_secs))?;
        Ok(())
    }

    pub fn set_volume(&mut self, volume: f64) -> Result<()> {
        self.phase.require_open("set volume")?;
        reach("set volume", self.controller.set_volume(volume))?;
        Ok(())
    }

    pub fn toggle_mute(&mut self) -> Result<()> {
        self.phase.require_open("toggle mute")?;
        reach("toggle mute", self.controller.toggle_mute())?;
        Ok(())
    }

    pub fn request_fullscreen(&mut self) -> Result<()> {
        self.phase.require_open("enter fullscreen")?;
        self.controller.request_fullscreen(&mut self.host)
    }

    pub fn exit_fullscreen(&mut self) -> Result<()> {
        self.phase.require_open("exit fullscreen")?;
        self.controller.exit_fullscreen(&mut self.host)
    }

    pub fn toggle_fullscreen(&mut self) -> Result<()> {
        self.phase.require_open("toggle fullscreen")?;
        self.controller.toggle_fullscreen(&mut self.host)
    }

    /// Make `index` the active source.
    ///
    /// A direct to direct switch completes on a later [`pump`](Self::pump),
    /// once the new source reports metadata. Every other switch settles
    /// immediately.
    pub fn switch_to(&mut self, index: usize) -> Result<()> {
        self.phase.require_open("switch quality")?;
        let Some(plan) = self.switcher.plan(
            &self.movie.videos,
            index,
            self.controller.state(),
            self.controller.is_direct(),
            &self.config,
        )?
        else {
            return Ok(());
        };
        self.phase.begin_switch()?;
        self.controller.select(plan.index);

        match &plan.target {
            Ok(BackendKind::Direct(source)) => {
                if !self.controller.reattach(&source.url, self.host.events()) {
                    let element = self.host.create_media_element();
                    self.controller.mount_direct(element, &source.url, self.host.events());
                }
                self.switcher.begin(&plan);
            }
            Ok(BackendKind::Embedded(embed_url)) => {
                self.controller.mount_embedded(embed_url.clone());
                self.phase.finish_switch(false)?;
            }
            Err(e) => {
                self.controller.mount_broken(e.clone());
                self.phase.finish_switch(false)?;
            }
        }
        Ok(())
    }

    /// Process everything the host queued for this player. Returns the number
    /// of events handled.
    pub fn pump(&mut self) -> usize {
        if self.is_closed() {
            return 0;
        }

        let mut handled = 0;
        for event in self.controller.drain_media() {
            handled += 1;
            self.on_media_event(event);
        }

        let events = match self.listeners.as_mut() {
            Some(listeners) => listeners.drain(),
            None => Vec::new(),
        };
        for event in events {
            handled += 1;
            match event {
                HostEvent::Key(Key::Escape) => {
                    info!("Escape pressed, closing player");
                    self.close();
                    break;
                }
                HostEvent::FullscreenChange { active } => self.controller.on_fullscreen_change(active),
                HostEvent::FullscreenError => self.controller.on_fullscreen_error(),
                HostEvent::Key(_) | HostEvent::Media { .. } => {}
            }
        }
        handled
    }

    fn on_media_event(&mut self, event: MediaEvent) {
        match self.controller.apply_media_event(event) {
            MediaUpdate::MetadataLoaded => match self.phase.phase() {
                ShellPhase::Loading => {
                    let playing = self.controller.restore(None, self.config.autoplay);
                    settle(self.phase.loaded(playing));
                }
                ShellPhase::Switching => {
                    if let Some(pending) = self.switcher.complete() {
                        let playing = self.controller.restore(pending.restore_at, pending.resume);
                        settle(self.phase.finish_switch(playing));
                        info!("Now playing source {}", pending.index);
                    }
                }
                _ => {}
            },
            MediaUpdate::Ended => {
                info!("Playback ended");
                settle(self.phase.stopped());
            }
            MediaUpdate::Failed(_) => {
                if self.phase.phase() == ShellPhase::Switching {
                    self.switcher.cancel();
                    self.controller.abandon_restore();
                    settle(self.phase.finish_switch(false));
                } else {
                    settle(self.phase.stopped());
                }
            }
            MediaUpdate::Progress | MediaUpdate::Ignored => {}
        }
    }

    /// Close the player. Only the first call has any effect.
    pub fn close(&mut self) {
        if !self.phase.close() {
            debug!("Player already closed");
            return;
        }
        info!("Closing player for {}", self.movie.title);
        self.teardown();
        if let Some(on_close) = self.on_close.take() {
            on_close();
        }
    }

    /// Release every listener and the backend
    fn teardown(&mut self) {
        self.listeners = None;
        self.switcher.cancel();
        self.controller.detach();
    }

    pub fn pointer_entered(&mut self) {
        self.pointer_inside = true;
    }

    pub fn pointer_left(&mut self) {
        self.pointer_inside = false;
    }

    /// Snapshot of everything a renderer needs
    pub fn view(&self) -> ShellView {
        let phase = self.phase.phase();
        let state = self.controller.state();

        let surface = match phase {
            ShellPhase::Closed => Surface::Closed,
            ShellPhase::Unavailable => Surface::Unavailable,
            _ => match self.controller.backend() {
                Backend::Detached => Surface::Closed,
                Backend::Embedded { embed_url } => Surface::Frame {
                    embed_url: embed_url.clone(),
                },
                Backend::Direct(attachment) => Surface::Media { src: attachment.src() },
                Backend::Broken(e) => Surface::Broken {
                    reason: format!("Video unavailable: {}", e),
                },
            },
        };

        let direct = matches!(surface, Surface::Media { .. });
        let transport = direct.then(|| TransportView {
            is_playing: state.is_playing,
            clock: format!(
                "{} / {}",
                format_time(state.current_time),
                format_time(state.duration.unwrap_or(0.))
            ),
            progress_percent: state.progress_percent(),
            volume_level: state.effective_volume(),
            is_muted: state.is_muted,
            is_fullscreen: state.is_fullscreen,
        });

        let show_qualities = match surface {
            Surface::Frame { .. } => self.movie.videos.len() > 1,
            Surface::Media { .. } | Surface::Broken { .. } => true,
            Surface::Unavailable | Surface::Closed => false,
        };
        let qualities = if show_qualities {
            self.movie
                .videos
                .iter()
                .enumerate()
                .map(|(i, source)| QualityOption {
                    label: source.quality.clone(),
                    detail: source.detail(),
                    active: i == state.active_source_index,
                })
                .collect()
        } else {
            Vec::new()
        };

        ShellView {
            title: self.movie.title.clone(),
            phase,
            play_overlay: direct && phase == ShellPhase::Paused,
            surface,
            transport,
            qualities,
            controls_visible: self.pointer_inside || phase != ShellPhase::Playing,
            error: state.error.map(|kind| kind.to_string()),
        }
    }
}

impl<H: Host> Drop for PlayerShell<H> {
    fn drop(&mut self) {
        self.teardown();
    }
}
