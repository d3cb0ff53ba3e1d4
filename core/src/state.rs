use log::debug;

use crate::error::{PlayerError, Result};

/// Lifecycle phases of one open player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellPhase {
    /// Constructed, nothing mounted yet
    #[default]
    Idle,
    /// Backend mounted, waiting for metadata
    Loading,
    Playing,
    Paused,
    /// Quality change in flight
    Switching,
    /// No playable sources; only closing is possible
    Unavailable,
    Closed,
}

impl ShellPhase {
    /// Transport input (play/pause/seek) is accepted
    pub fn accepts_transport(self) -> bool {
        matches!(self, ShellPhase::Playing | ShellPhase::Paused)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ShellPhase::Unavailable | ShellPhase::Closed)
    }
}

/// Explicit transition table for [`ShellPhase`]
#[derive(Debug, Default)]
pub struct PhaseMachine {
    phase: ShellPhase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> ShellPhase {
        self.phase
    }

    fn go(&mut self, to: ShellPhase) -> ShellPhase {
        if self.phase != to {
            debug!("Shell phase {:?} -> {:?}", self.phase, to);
            self.phase = to;
        }
        to
    }

    fn reject(&self, action: &'static str) -> PlayerError {
        match self.phase {
            ShellPhase::Closed => PlayerError::Closed,
            ShellPhase::Unavailable => PlayerError::Unavailable,
            ShellPhase::Switching => PlayerError::SwitchInProgress,
            from => PlayerError::InvalidTransition { from, action },
        }
    }

    /// Ok when play, pause and seek are accepted right now
    pub fn require_transport(&self, action: &'static str) -> Result<()> {
        if self.phase.accepts_transport() {
            Ok(())
        } else {
            Err(self.reject(action))
        }
    }

    /// Ok unless the shell is closed or has nothing to play
    pub fn require_open(&self, action: &'static str) -> Result<()> {
        if self.phase.is_terminal() {
            Err(self.reject(action))
        } else {
            Ok(())
        }
    }

    /// Idle -> Loading, or Idle -> Unavailable when there is nothing to play
    pub fn mount(&mut self, has_sources: bool) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Idle if has_sources => Ok(self.go(ShellPhase::Loading)),
            ShellPhase::Idle => Ok(self.go(ShellPhase::Unavailable)),
            _ => Err(self.reject("mount")),
        }
    }

    /// Metadata arrived for the initial load
    pub fn loaded(&mut self, playing: bool) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Loading => Ok(self.go(if playing { ShellPhase::Playing } else { ShellPhase::Paused })),
            _ => Err(self.reject("finish loading")),
        }
    }

    pub fn play(&mut self) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Paused | ShellPhase::Playing => Ok(self.go(ShellPhase::Playing)),
            _ => Err(self.reject("play")),
        }
    }

    pub fn pause(&mut self) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Paused | ShellPhase::Playing => Ok(self.go(ShellPhase::Paused)),
            _ => Err(self.reject("pause")),
        }
    }

    /// Playback stopped on its own (end of media, media error)
    pub fn stopped(&mut self) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Playing | ShellPhase::Paused | ShellPhase::Loading => Ok(self.go(ShellPhase::Paused)),
            _ => Err(self.reject("stop")),
        }
    }

    pub fn begin_switch(&mut self) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Loading | ShellPhase::Playing | ShellPhase::Paused => Ok(self.go(ShellPhase::Switching)),
            _ => Err(self.reject("switch quality")),
        }
    }

    pub fn finish_switch(&mut self, playing: bool) -> Result<ShellPhase> {
        match self.phase {
            ShellPhase::Switching => Ok(self.go(if playing { ShellPhase::Playing } else { ShellPhase::Paused })),
            _ => Err(self.reject("finish switch")),
        }
    }

    /// Enter `Closed`. Returns `true` only the first time.
    pub fn close(&mut self) -> bool {
        if self.phase == ShellPhase::Closed {
            return false;
        }
        self.go(ShellPhase::Closed);
        true
    }
}
