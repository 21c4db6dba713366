// ABOUTME: Shared types and configuration for ascii-post.
// ABOUTME: Defines colors, glyph sets, effect settings, parameter declarations and config files.

pub mod color;
pub mod config;
pub mod effects;
pub mod glyphs;
pub mod params;

pub use color::{Color, ColorParseError};
pub use config::{AtlasRebuild, Config, ConfigError};
pub use effects::{
    param, AsciiSettings, ColorAsciiSettings, SettingsError, VertexAsciiSettings,
    DEFAULT_CHARACTERS,
};
pub use glyphs::{GlyphSet, GlyphSetError, ATLAS_CAPACITY, ATLAS_GRID};
pub use params::{IntegerRange, ParamError, ParamKind, ParamSpec, ParamValue, ParamValues};
