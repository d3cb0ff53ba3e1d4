use log::{debug, info};

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::media::{self, BackendKind, ClassifyError};
use crate::movie::MediaSource;
use crate::playback::PlaybackState;

/// Everything needed to carry out one quality change
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchPlan {
    pub index: usize,
    pub target: std::result::Result<BackendKind, ClassifyError>,
    /// Position to seek to once the new source reports metadata
    pub restore_at: Option<f64>,
    /// Start playing after the restore
    pub resume: bool,
}

impl SwitchPlan {
    /// The new source needs a metadata round trip before it is settled
    pub fn awaits_metadata(&self) -> bool {
        matches!(self.target, Ok(BackendKind::Direct(_)))
    }
}

/// A direct-to-direct (or cold direct) switch waiting on metadata
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingSwitch {
    pub index: usize,
    pub restore_at: Option<f64>,
    pub resume: bool,
}

/// Changes the active source while keeping the viewer's place.
///
/// Between two directly played sources the position and play state are
/// carried over. Any switch involving an embedded frame starts cold, since
/// the frame's position cannot be read back.
#[derive(Debug, Default)]
pub struct QualitySwitcher {
    pending: Option<PendingSwitch>,
}

impl QualitySwitcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> bool {
        self.pending.is_some()
    }

    /// Work out a switch to `index`. `Ok(None)` means the source is already
    /// active and nothing has to happen.
    pub fn plan(
        &self,
        sources: &[MediaSource],
        index: usize,
        state: &PlaybackState,
        from_direct: bool,
        config: &PlayerConfig,
    ) -> Result<Option<SwitchPlan>> {
        if self.pending.is_some() {
            return Err(PlayerError::SwitchInProgress);
        }
        let Some(source) = sources.get(index) else {
            return Err(PlayerError::SourceOutOfRange {
                index,
                len: sources.len(),
            });
        };
        if index == state.active_source_index {
            debug!("Source {} already active", index);
            return Ok(None);
        }

        let target = media::classify(source, &config.embed);
        // Until the first metadata there is no position or play state to keep
        let settled = from_direct && state.duration.is_some();
        let (restore_at, resume) = match (&target, settled) {
            (Ok(BackendKind::Direct(_)), true) => (Some(state.current_time), state.is_playing),
            (Ok(BackendKind::Direct(_)), false) => (None, config.autoplay),
            _ => (None, false),
        };

        info!("Switching to {} ({})", source.quality, source.url);
        Ok(Some(SwitchPlan {
            index,
            target,
            restore_at,
            resume,
        }))
    }

    /// Hold the restore step until metadata for the new source arrives
    pub fn begin(&mut self, plan: &SwitchPlan) {
        if plan.awaits_metadata() {
            self.pending = Some(PendingSwitch {
                index: plan.index,
                restore_at: plan.restore_at,
                resume: plan.resume,
            });
        }
    }

    /// Metadata arrived; hand back what has to be restored
    pub fn complete(&mut self) -> Option<PendingSwitch> {
        self.pending.take()
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Switch to source {} cancelled", pending.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sources() -> Vec<MediaSource> {
        vec![
            MediaSource::new("1080p", "/movie-1080.mp4"),
            MediaSource::new("720p", "/movie-720.mp4"),
            MediaSource::new("Trailer", "https://youtu.be/abc123"),
        ]
    }

    fn playing_at(secs: f64) -> PlaybackState {
        let mut state = PlaybackState::new(1.);
        state.current_time = secs;
        state.duration = Some(100.);
        state.is_playing = true;
        state
    }

    #[test]
    fn test_direct_to_direct_keeps_position() {
        let switcher = QualitySwitcher::new();
        let plan = switcher
            .plan(&sources(), 1, &playing_at(40.), true, &PlayerConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(plan.restore_at, Some(40.));
        assert!(plan.resume);
        assert!(plan.awaits_metadata());
    }

    #[test]
    fn test_switch_to_embedded_starts_cold() {
        let switcher = QualitySwitcher::new();
        let plan = switcher
            .plan(&sources(), 2, &playing_at(40.), true, &PlayerConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(plan.restore_at, None);
        assert!(!plan.resume);
        assert!(!plan.awaits_metadata());
        assert!(matches!(plan.target, Ok(BackendKind::Embedded(_))));
    }

    #[test]
    fn test_embedded_to_direct_uses_autoplay() {
        let switcher = QualitySwitcher::new();
        let mut state = PlaybackState::new(1.);
        state.active_source_index = 2;
        let config = PlayerConfig {
            autoplay: false,
            ..PlayerConfig::default()
        };
        let plan = switcher.plan(&sources(), 0, &state, false, &config).unwrap().unwrap();
        assert_eq!(plan.restore_at, None);
        assert!(!plan.resume);
    }

    #[test]
    fn test_switch_before_metadata_uses_autoplay() {
        let switcher = QualitySwitcher::new();
        let state = PlaybackState::new(1.);
        let plan = switcher
            .plan(&sources(), 1, &state, true, &PlayerConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(plan.restore_at, None);
        assert!(plan.resume);
    }

    #[test]
    fn test_same_index_is_noop() {
        let switcher = QualitySwitcher::new();
        assert_eq!(
            switcher.plan(&sources(), 0, &playing_at(5.), true, &PlayerConfig::default()),
            Ok(None)
        );
    }

    #[test]
    fn test_out_of_range_and_in_flight() {
        let mut switcher = QualitySwitcher::new();
        assert_eq!(
            switcher.plan(&sources(), 9, &playing_at(5.), true, &PlayerConfig::default()),
            Err(PlayerError::SourceOutOfRange { index: 9, len: 3 })
        );

        let plan = switcher
            .plan(&sources(), 1, &playing_at(5.), true, &PlayerConfig::default())
            .unwrap()
            .unwrap();
        switcher.begin(&plan);
        assert!(switcher.in_flight());
        assert_eq!(
            switcher.plan(&sources(), 0, &playing_at(5.), true, &PlayerConfig::default()),
            Err(PlayerError::SwitchInProgress)
        );

        let pending = switcher.complete().unwrap();
        assert_eq!(pending.restore_at, Some(5.));
        assert!(!switcher.in_flight());
    }
}
