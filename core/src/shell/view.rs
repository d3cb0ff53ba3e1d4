use crate::state::ShellPhase;

/// What occupies the player area
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Surface {
    /// No playable sources; only the close affordance is offered
    Unavailable,
    /// Third-party frame at this URL
    Frame { embed_url: String },
    /// Directly controlled media element playing `src`
    Media { src: String },
    /// The active source cannot be played
    Broken { reason: String },
    Closed,
}

/// The control row under a directly played source
#[derive(Debug, Clone, PartialEq)]
pub struct TransportView {
    pub is_playing: bool,
    /// "m:ss / m:ss"
    pub clock: String,
    pub progress_percent: f64,
    /// Slider position, 0 while muted
    pub volume_level: f64,
    pub is_muted: bool,
    pub is_fullscreen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityOption {
    pub label: String,
    /// Size and language, when known
    pub detail: Option<String>,
    pub active: bool,
}

/// Render snapshot returned by [`PlayerShell::view`](super::PlayerShell::view)
#[derive(Debug, Clone, PartialEq)]
pub struct ShellView {
    pub title: String,
    pub phase: ShellPhase,
    pub surface: Surface,
    /// Big play button over a paused direct source
    pub play_overlay: bool,
    pub transport: Option<TransportView>,
    /// Empty when the menu is hidden
    pub qualities: Vec<QualityOption>,
    pub controls_visible: bool,
    pub error: Option<String>,
}

impl ShellView {
    pub fn active_quality(&self) -> Option<&QualityOption> {
        self.qualities.iter().find(|option| option.active)
    }
}

/// Format seconds as m:ss. Minutes are not wrapped into hours.
pub fn format_time(secs: f64) -> String {
    let total = secs.max(0.).floor() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}
