use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// One playable variant of a movie (a resolution, a language track, a trailer link...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaSource {
    /// Display label such as "720p" or "4k". Treated as opaque text.
    pub quality: String,
    /// Location of the playable resource
    pub url: String,
    /// Size annotation ("SD", "HD", "Full HD", "4K")
    #[serde(rename = "size", default, skip_serializing_if = "Option::is_none")]
    pub size_label: Option<String>,
    /// Language tag ("vi", "en")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl MediaSource {
    pub fn new(quality: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            quality: quality.into(),
            url: url.into(),
            size_label: None,
            language: None,
        }
    }

    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size_label = Some(size.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    /// Secondary text for the quality menu, e.g. "HD · en"
    pub fn detail(&self) -> Option<String> {
        match (&self.size_label, &self.language) {
            (Some(size), Some(lang)) => Some(format!("{} · {}", size, lang)),
            (Some(size), None) => Some(size.clone()),
            (None, Some(lang)) => Some(lang.clone()),
            (None, None) => None,
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.quality, self.url)
    }
}

/// What the catalogue hands to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieDescriptor {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backdrop: Option<String>,
    /// Ordered playable sources; the first one is played on open
    #[serde(default)]
    pub videos: Vec<MediaSource>,
}

impl MovieDescriptor {
    pub fn new(title: impl Into<String>, videos: Vec<MediaSource>) -> Self {
        Self {
            title: title.into(),
            poster: None,
            backdrop: None,
            videos,
        }
    }

    pub fn is_playable(&self) -> bool {
        !self.videos.is_empty()
    }

    /// Read a descriptor from a catalogue JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read movie file: {}", path.display()))?;
        let movie: MovieDescriptor = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse movie file: {}", path.display()))?;
        debug!("Loaded {} with {} sources", movie.title, movie.videos.len());
        Ok(movie)
    }
}
