// ABOUTME: Typed parameter declarations and current values for post nodes.
// ABOUTME: Models the host editor's parameter API: strings, bounded integers, colors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::Color;

/// Integer slider range. A locked end is a hard clamp, an unlocked end only
/// bounds the editor slider and may be exceeded by typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegerRange {
    pub min: i64,
    pub max: i64,
    pub min_locked: bool,
    pub max_locked: bool,
}

impl IntegerRange {
    /// Range with a hard minimum and a soft maximum.
    pub const fn min_locked(min: i64, max: i64) -> Self {
        Self {
            min,
            max,
            min_locked: true,
            max_locked: false,
        }
    }

    pub fn clamp(&self, value: i64) -> i64 {
        let mut value = value;
        if self.min_locked {
            value = value.max(self.min);
        }
        if self.max_locked {
            value = value.min(self.max);
        }
        value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamKind {
    String { default: String },
    Integer { default: i64, range: IntegerRange },
    Color { default: Color },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(flatten)]
    pub kind: ParamKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    String(String),
    Integer(i64),
    Color(Color),
}

impl ParamValue {
    fn type_name(&self) -> &'static str {
        match self {
            ParamValue::String(_) => "string",
            ParamValue::Integer(_) => "integer",
            ParamValue::Color(_) => "color",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("Unknown parameter: {0}")]
    Unknown(String),

    #[error("Missing parameter: {0}")]
    Missing(String),

    #[error("Parameter {name} expects a {expected} value, got {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Cannot parse {value:?} for parameter {name}")]
    Parse { name: String, value: String },
}

impl ParamSpec {
    pub fn string(name: &str, default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::String {
                default: default.to_string(),
            },
        }
    }

    pub fn integer(name: &str, default: i64, range: IntegerRange) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Integer { default, range },
        }
    }

    pub fn color(name: &str, default: Color) -> Self {
        Self {
            name: name.to_string(),
            kind: ParamKind::Color { default },
        }
    }

    pub fn default_value(&self) -> ParamValue {
        match &self.kind {
            ParamKind::String { default } => ParamValue::String(default.clone()),
            ParamKind::Integer { default, .. } => ParamValue::Integer(*default),
            ParamKind::Color { default } => ParamValue::Color(*default),
        }
    }

    /// Apply the declared range. Non-integer values pass through unchanged.
    pub fn clamp(&self, value: ParamValue) -> ParamValue {
        match (&self.kind, value) {
            (ParamKind::Integer { range, .. }, ParamValue::Integer(v)) => {
                ParamValue::Integer(range.clamp(v))
            }
            (_, value) => value,
        }
    }

    /// Parse a textual value (e.g. from the command line) into this parameter's type.
    pub fn parse_value(&self, raw: &str) -> Result<ParamValue, ParamError> {
        let err = || ParamError::Parse {
            name: self.name.clone(),
            value: raw.to_string(),
        };
        match &self.kind {
            ParamKind::String { .. } => Ok(ParamValue::String(raw.to_string())),
            ParamKind::Integer { .. } => {
                raw.trim().parse().map(ParamValue::Integer).map_err(|_| err())
            }
            ParamKind::Color { .. } => {
                Color::from_hex(raw).map(ParamValue::Color).map_err(|_| err())
            }
        }
    }
}

/// Current parameter values of one node, keyed by parameter name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParamValues {
    values: BTreeMap<String, ParamValue>,
}

impl ParamValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Values initialized from each declaration's default.
    pub fn defaults(specs: &[ParamSpec]) -> Self {
        let values = specs
            .iter()
            .map(|spec| (spec.name.clone(), spec.default_value()))
            .collect();
        Self { values }
    }

    pub fn set(&mut self, name: &str, value: ParamValue) -> Option<ParamValue> {
        self.values.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn require(&self, name: &str) -> Result<&ParamValue, ParamError> {
        self.values
            .get(name)
            .ok_or_else(|| ParamError::Missing(name.to_string()))
    }

    fn mismatch(name: &str, expected: &'static str, found: &ParamValue) -> ParamError {
        ParamError::TypeMismatch {
            name: name.to_string(),
            expected,
            found: found.type_name(),
        }
    }

    pub fn string(&self, name: &str) -> Result<&str, ParamError> {
        match self.require(name)? {
            ParamValue::String(s) => Ok(s),
            other => Err(Self::mismatch(name, "string", other)),
        }
    }

    pub fn integer(&self, name: &str) -> Result<i64, ParamError> {
        match self.require(name)? {
            ParamValue::Integer(v) => Ok(*v),
            other => Err(Self::mismatch(name, "integer", other)),
        }
    }

    pub fn color(&self, name: &str) -> Result<Color, ParamError> {
        match self.require(name)? {
            ParamValue::Color(c) => Ok(*c),
            other => Err(Self::mismatch(name, "color", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_locked_range_clamps_only_below() {
        let range = IntegerRange::min_locked(10, 100);
        assert_eq!(range.clamp(3), 10);
        assert_eq!(range.clamp(54), 54);
        // Max is only a slider hint
        assert_eq!(range.clamp(250), 250);
    }

    #[test]
    fn defaults_follow_declarations() {
        let specs = vec![
            ParamSpec::string("characters", " .#"),
            ParamSpec::integer("fontSize", 54, IntegerRange::min_locked(10, 100)),
            ParamSpec::color("color", Color::WHITE),
        ];
        let values = ParamValues::defaults(&specs);
        assert_eq!(values.string("characters").unwrap(), " .#");
        assert_eq!(values.integer("fontSize").unwrap(), 54);
        assert_eq!(values.color("color").unwrap(), Color::WHITE);
    }

    #[test]
    fn typed_access_reports_mismatch_and_missing() {
        let mut values = ParamValues::new();
        values.set("cellSize", ParamValue::String("16".into()));

        assert!(matches!(
            values.integer("cellSize"),
            Err(ParamError::TypeMismatch { expected: "integer", found: "string", .. })
        ));
        assert_eq!(
            values.integer("fontSize"),
            Err(ParamError::Missing("fontSize".into()))
        );
    }

    #[test]
    fn parse_value_uses_declared_type() {
        let size = ParamSpec::integer("cellSize", 16, IntegerRange::min_locked(1, 100));
        assert_eq!(size.parse_value("8").unwrap(), ParamValue::Integer(8));
        assert!(size.parse_value("eight").is_err());

        let tint = ParamSpec::color("color", Color::WHITE);
        assert_eq!(
            tint.parse_value("#000000").unwrap(),
            ParamValue::Color(Color::BLACK)
        );
    }

    #[test]
    fn clamp_leaves_other_kinds_alone() {
        let size = ParamSpec::integer("cellSize", 16, IntegerRange::min_locked(1, 100));
        assert_eq!(size.clamp(ParamValue::Integer(0)), ParamValue::Integer(1));

        let chars = ParamSpec::string("characters", "");
        let value = ParamValue::String("abc".into());
        assert_eq!(chars.clamp(value.clone()), value);
    }
}
