// ABOUTME: ASCII effect settings shared by the color and vertex variants.
// ABOUTME: Converts between typed settings and host parameter values.

use serde::{Deserialize, Serialize};

use crate::params::{IntegerRange, ParamError, ParamSpec, ParamValue, ParamValues};
use crate::{Color, GlyphSet, GlyphSetError};

/// Light-to-dark glyph ramp used when nothing else is configured.
pub const DEFAULT_CHARACTERS: &str = " .:,'-^=*+?!|0#X%WM@";

pub const DEFAULT_FONT_SIZE: u32 = 54;
pub const DEFAULT_CELL_SIZE: u32 = 16;

/// Host parameter names.
pub mod param {
    pub const CHARACTERS: &str = "characters";
    pub const FONT_SIZE: &str = "fontSize";
    pub const CELL_SIZE: &str = "cellSize";
    pub const COLOR: &str = "color";
}

pub const FONT_SIZE_RANGE: IntegerRange = IntegerRange::min_locked(10, 100);
pub const CELL_SIZE_RANGE: IntegerRange = IntegerRange::min_locked(1, 100);

/// Settings common to both ASCII variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsciiSettings {
    /// Glyphs ordered from sparse/light to dense/dark
    pub characters: String,

    /// Pixel size used to rasterize glyphs into the atlas
    pub font_size: u32,

    /// Screen cell size in pixels (sampling granularity)
    pub cell_size: u32,
}

impl Default for AsciiSettings {
    fn default() -> Self {
        Self {
            characters: DEFAULT_CHARACTERS.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            cell_size: DEFAULT_CELL_SIZE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error(transparent)]
    Param(#[from] ParamError),

    #[error(transparent)]
    Glyphs(#[from] GlyphSetError),

    #[error("Parameter {name} must be positive, got {value}")]
    NotPositive { name: &'static str, value: i64 },
}

fn positive(name: &'static str, value: i64) -> Result<u32, SettingsError> {
    u32::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or(SettingsError::NotPositive { name, value })
}

impl AsciiSettings {
    pub fn glyph_set(&self) -> Result<GlyphSet, GlyphSetError> {
        GlyphSet::new(&self.characters)
    }

    /// Declarations for the three shared parameters, defaulting to `self`.
    pub fn param_specs(&self) -> Vec<ParamSpec> {
        vec![
            ParamSpec::string(param::CHARACTERS, &self.characters),
            ParamSpec::integer(param::FONT_SIZE, self.font_size as i64, FONT_SIZE_RANGE),
            ParamSpec::integer(param::CELL_SIZE, self.cell_size as i64, CELL_SIZE_RANGE),
        ]
    }

    pub fn write_params(&self, values: &mut ParamValues) {
        values.set(param::CHARACTERS, ParamValue::String(self.characters.clone()));
        values.set(param::FONT_SIZE, ParamValue::Integer(self.font_size as i64));
        values.set(param::CELL_SIZE, ParamValue::Integer(self.cell_size as i64));
    }

    pub fn from_params(values: &ParamValues) -> Result<Self, SettingsError> {
        let characters = values.string(param::CHARACTERS)?.to_string();
        // Validate early so a bad edit never reaches the atlas builder
        GlyphSet::new(&characters)?;
        Ok(Self {
            characters,
            font_size: positive(param::FONT_SIZE, values.integer(param::FONT_SIZE)?)?,
            cell_size: positive(param::CELL_SIZE, values.integer(param::CELL_SIZE)?)?,
        })
    }
}

/// Color variant: glyph masks tinted with one fixed color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorAsciiSettings {
    #[serde(flatten)]
    pub ascii: AsciiSettings,

    /// Tint applied to every glyph
    pub color: Color,
}

impl Default for ColorAsciiSettings {
    fn default() -> Self {
        Self {
            ascii: AsciiSettings::default(),
            color: Color::WHITE,
        }
    }
}

impl ColorAsciiSettings {
    pub fn param_specs(&self) -> Vec<ParamSpec> {
        let mut specs = self.ascii.param_specs();
        specs.push(ParamSpec::color(param::COLOR, self.color));
        specs
    }

    pub fn to_params(&self) -> ParamValues {
        let mut values = ParamValues::new();
        self.ascii.write_params(&mut values);
        values.set(param::COLOR, ParamValue::Color(self.color));
        values
    }

    pub fn from_params(values: &ParamValues) -> Result<Self, SettingsError> {
        Ok(Self {
            ascii: AsciiSettings::from_params(values)?,
            color: values.color(param::COLOR)?,
        })
    }
}

/// Vertex variant: glyph masks applied over the source's own colors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct VertexAsciiSettings {
    #[serde(flatten)]
    pub ascii: AsciiSettings,

    /// Flip brightness before picking a glyph (for light-on-dark sources).
    /// Not a declared host parameter.
    pub invert: bool,
}

impl VertexAsciiSettings {
    pub fn param_specs(&self) -> Vec<ParamSpec> {
        self.ascii.param_specs()
    }

    pub fn to_params(&self) -> ParamValues {
        let mut values = ParamValues::new();
        self.ascii.write_params(&mut values);
        values
    }
}
