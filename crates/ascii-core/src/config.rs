// ABOUTME: Application configuration handling.
// ABOUTME: Loads and saves settings from TOML config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::{ColorAsciiSettings, VertexAsciiSettings};

/// When an effect rebuilds its glyph atlas on a settings update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AtlasRebuild {
    /// Rebuild on every update, even if only the cell size or tint changed
    #[default]
    Always,
    /// Rebuild only when the characters or font size changed
    OnChange,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// TTF/OTF or BDF font used to rasterize glyph atlases
    pub font_path: Option<PathBuf>,

    /// Render on the GPU instead of the CPU reference path
    pub gpu: bool,

    /// Atlas rebuild policy for parameter updates
    pub atlas_rebuild: AtlasRebuild,

    /// Defaults for the `colorAscii` node
    pub color_ascii: ColorAsciiSettings,

    /// Defaults for the `vertexAscii` node
    pub vertex_ascii: VertexAsciiSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            font_path: None,
            gpu: false,
            atlas_rebuild: AtlasRebuild::default(),
            color_ascii: ColorAsciiSettings::default(),
            vertex_ascii: VertexAsciiSettings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

impl Config {
    /// Get the default config file path (~/.config/ascii-post/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ascii-post").join("config.toml"))
    }

    /// Load config from a path
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load config from default path, or return default config if not found
    pub fn load_or_default() -> Self {
        Self::default_path()
            .and_then(|path| Self::load(&path).ok())
            .unwrap_or_default()
    }

    /// Save config to a path
    pub fn save(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
