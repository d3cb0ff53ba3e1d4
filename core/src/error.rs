use thiserror::Error;

use crate::host::FullscreenError;
use crate::media::{ClassifyError, MediaElementError};
use crate::state::ShellPhase;

/// Errors surfaced by the player control surface
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlayerError {
    /// The movie has no playable sources
    #[error("no playable sources for this movie")]
    Unavailable,

    /// The shell has already been closed
    #[error("player is closed")]
    Closed,

    #[error("source index {index} out of range ({len} sources)")]
    SourceOutOfRange { index: usize, len: usize },

    /// A quality switch is still waiting for the new source
    #[error("a quality switch is already in progress")]
    SwitchInProgress,

    /// Transport call against a backend that owns its own controls
    #[error("active backend cannot be controlled directly")]
    NotControllable,

    #[error("invalid value for {what}: {value}")]
    InvalidValue { what: &'static str, value: f64 },

    #[error("cannot {action} while {from:?}")]
    InvalidTransition {
        from: ShellPhase,
        action: &'static str,
    },

    #[error(transparent)]
    Classify(#[from] ClassifyError),

    #[error(transparent)]
    Element(#[from] MediaElementError),

    #[error(transparent)]
    Fullscreen(#[from] FullscreenError),
}

pub type Result<T> = std::result::Result<T, PlayerError>;
