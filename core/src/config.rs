//! Player configuration

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// Query flags appended to derived embed URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedConfig {
    #[serde(default = "default_true")]
    pub autoplay: bool,
    #[serde(default = "default_true")]
    pub controls: bool,
    #[serde(default = "default_true")]
    pub modest_branding: bool,
    /// Show related videos when the embed finishes
    #[serde(default)]
    pub related: bool,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            controls: true,
            modest_branding: true,
            related: false,
        }
    }
}

impl EmbedConfig {
    /// Render the flags as a query string (without the leading `?`)
    pub fn query(&self) -> String {
        format!(
            "autoplay={}&controls={}&modestbranding={}&rel={}",
            self.autoplay as u8, self.controls as u8, self.modest_branding as u8, self.related as u8
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Start direct sources as soon as metadata arrives
    #[serde(default = "default_true")]
    pub autoplay: bool,
    /// Volume a fresh player starts with (0.0 - 1.0)
    #[serde(default = "default_volume")]
    pub initial_volume: f64,
    /// Step used by relative seek keys
    #[serde(default = "default_seek_step")]
    pub seek_step_secs: f64,
    #[serde(default)]
    pub embed: EmbedConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay: true,
            initial_volume: default_volume(),
            seek_step_secs: default_seek_step(),
            embed: EmbedConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_volume() -> f64 {
    1.0
}

fn default_seek_step() -> f64 {
    5.0
}

impl PlayerConfig {
    /// Load from a JSON file, falling back to defaults when the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: PlayerConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config.initial_volume = config.initial_volume.clamp(0.0, 1.0);
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("Failed to write config: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_embed_query() {
        assert_eq!(
            EmbedConfig::default().query(),
            "autoplay=1&controls=1&modestbranding=1&rel=0"
        );
    }

    #[test]
    fn test_load_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PlayerConfig::load(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_partial_file_and_volume_clamp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"autoplay": false, "initial_volume": 3.0}"#).unwrap();

        let config = PlayerConfig::load(&path).unwrap();
        assert!(!config.autoplay);
        assert_eq!(config.initial_volume, 1.0);
        assert_eq!(config.seek_step_secs, 5.0);
        assert!(config.embed.controls);
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = PlayerConfig::default();
        config.seek_step_secs = 10.0;
        config.save(&path).unwrap();
        assert_eq!(PlayerConfig::load(&path).unwrap(), config);
    }
}
