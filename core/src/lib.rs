pub mod config;
pub mod error;
pub mod events;
pub mod host;
pub mod media;
pub mod movie;
pub mod playback;
pub mod quality;
pub mod shell;
pub mod state;

// Re-exports
pub use config::{EmbedConfig, PlayerConfig};
pub use error::{PlayerError, Result};
pub use events::{EventBus, HostEvent, Key, Subscription, Topic};
pub use host::{FullscreenError, FullscreenPolicy, Host, SimulatedHost};
pub use media::{BackendKind, ClassifyError, MediaElement, MediaErrorKind, MediaEvent, classify, is_embeddable};
pub use movie::{MediaSource, MovieDescriptor};
pub use playback::{PlaybackController, PlaybackState};
pub use quality::{QualitySwitcher, SwitchPlan};
pub use shell::{PlayerShell, QualityOption, ShellView, Surface, TransportView};
pub use state::{PhaseMachine, ShellPhase};

