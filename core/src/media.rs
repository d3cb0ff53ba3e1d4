mod simulated;
mod youtube;

pub use simulated::SimulatedElement;
pub(crate) use simulated::{ElementState, LoadOutcome};
pub use youtube::{embed_url, extract_youtube_id, is_youtube_url, UrlShape};

use log::debug;
use thiserror::Error;

use crate::config::EmbedConfig;
use crate::movie::MediaSource;

/// Which backend plays a given source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendKind {
    /// Third-party frame player at this embed URL
    Embedded(String),
    /// Media element we drive ourselves
    Direct(MediaSource),
}

impl BackendKind {
    pub fn is_embedded(&self) -> bool {
        matches!(self, BackendKind::Embedded(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// Looks like an embeddable link but carries no video id
    #[error("no video id in embeddable link: {0}")]
    MissingVideoId(String),
}

/// Decide how a source is played
pub fn classify(source: &MediaSource, embed: &EmbedConfig) -> Result<BackendKind, ClassifyError> {
    let kind = match youtube::shape(&source.url) {
        UrlShape::Embed => BackendKind::Embedded(source.url.clone()),
        UrlShape::ShortLink | UrlShape::Watch => match extract_youtube_id(&source.url) {
            Some(id) => BackendKind::Embedded(embed_url(&id, embed)),
            None => return Err(ClassifyError::MissingVideoId(source.url.clone())),
        },
        UrlShape::Other => BackendKind::Direct(source.clone()),
    };
    debug!("Classified {} as {:?}", source, kind);
    Ok(kind)
}

/// Whether the URL is one of the embeddable shapes
pub fn is_embeddable(url: &str) -> bool {
    is_youtube_url(url)
}

/// Identifies one media element for event routing
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ElementId(pub u64);

/// Native media failure classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaErrorKind {
    Aborted,
    Network,
    Decode,
    SrcNotSupported,
}

impl std::fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            MediaErrorKind::Aborted => "playback aborted",
            MediaErrorKind::Network => "network error while loading media",
            MediaErrorKind::Decode => "media could not be decoded",
            MediaErrorKind::SrcNotSupported => "media format not supported",
        };
        f.write_str(text)
    }
}

/// Lifecycle events emitted by a media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    LoadedMetadata { duration: f64 },
    TimeUpdate { current_time: f64 },
    Ended,
    Error(MediaErrorKind),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaElementError {
    /// The host refused to start playback (autoplay policy, missing gesture)
    #[error("playback was not allowed by the host")]
    NotAllowed,
    #[error("no source loaded")]
    NoSource,
}

/// A natively controlled media handle, the direct backend's surface
pub trait MediaElement {
    fn id(&self) -> ElementId;

    /// Currently loaded resource
    fn src(&self) -> String;

    /// Point the element at a new resource. Returns the generation stamped on
    /// every event that belongs to this load.
    fn load(&mut self, url: &str) -> u64;

    fn play(&mut self) -> Result<(), MediaElementError>;
    fn pause(&mut self);

    fn current_time(&self) -> f64;
    fn set_current_time(&mut self, secs: f64);

    /// Effective output volume (0.0 - 1.0)
    fn set_volume(&mut self, volume: f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(url: &str) -> MediaSource {
        MediaSource::new("720p", url)
    }

    #[test]
    fn test_short_link_becomes_embed() {
        let kind = classify(&source("https://youtu.be/dQw4w9WgXcQ?si=xyz"), &EmbedConfig::default()).unwrap();
        assert_eq!(
            kind,
            BackendKind::Embedded(
                "https://www.youtube.com/embed/dQw4w9WgXcQ?autoplay=1&controls=1&modestbranding=1&rel=0"
                    .to_string()
            )
        );
    }

    #[test]
    fn test_watch_form_becomes_embed() {
        let kind = classify(
            &source("https://www.youtube.com/watch?list=PL1&v=jNQXAC9IVRw&t=10s"),
            &EmbedConfig::default(),
        )
        .unwrap();
        assert!(kind.is_embedded());
        if let BackendKind::Embedded(url) = kind {
            assert!(url.starts_with("https://www.youtube.com/embed/jNQXAC9IVRw?"));
        }
    }

    #[test]
    fn test_embed_form_is_unchanged() {
        let url = "https://www.youtube.com/embed/abc?start=5";
        assert_eq!(
            classify(&source(url), &EmbedConfig::default()).unwrap(),
            BackendKind::Embedded(url.to_string())
        );
    }

    #[test]
    fn test_everything_else_is_direct() {
        for url in [
            "/media/dune-1080.mp4",
            "https://cdn.example.com/movie.webm",
            "https://www.youtube.com/shorts/abc",
        ] {
            let src = source(url);
            assert_eq!(
                classify(&src, &EmbedConfig::default()).unwrap(),
                BackendKind::Direct(src.clone())
            );
        }
    }

    #[test]
    fn test_embeddable_shapes() {
        assert!(is_embeddable("https://youtu.be/dQw4w9WgXcQ"));
        assert!(is_embeddable("https://www.youtube.com/watch?v=jNQXAC9IVRw"));
        assert!(is_embeddable("https://www.youtube.com/embed/abc"));
        assert!(!is_embeddable("/media/dune-1080.mp4"));
        assert!(!is_embeddable("https://www.youtube.com/shorts/abc"));
    }

    #[test]
    fn test_missing_id_is_an_error() {
        for url in ["https://www.youtube.com/watch?list=PL1", "https://youtu.be/", "https://www.youtube.com/watch?v="] {
            assert_eq!(
                classify(&source(url), &EmbedConfig::default()),
                Err(ClassifyError::MissingVideoId(url.to_string()))
            );
        }
    }
}
