// ABOUTME: `--set name=value` parameter edits from the command line.
// ABOUTME: Parses each edit against its declaration and clamps it to the declared range.

use std::str::FromStr;

use ascii_core::{ParamError, ParamSpec, ParamValues};

#[derive(Debug, Clone, PartialEq)]
pub struct ParamOverride {
    pub name: String,
    pub raw: String,
}

impl FromStr for ParamOverride {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, raw) = s
            .split_once('=')
            .ok_or_else(|| format!("expected name=value, got {s:?}"))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("missing parameter name in {s:?}"));
        }
        Ok(Self {
            name: name.to_string(),
            raw: raw.to_string(),
        })
    }
}

/// Apply `overrides` in order, the way a host applies editor changes.
pub fn apply(
    overrides: &[ParamOverride],
    specs: &[ParamSpec],
    values: &mut ParamValues,
) -> Result<(), ParamError> {
    for edit in overrides {
        let spec = specs
            .iter()
            .find(|spec| spec.name == edit.name)
            .ok_or_else(|| ParamError::Unknown(edit.name.clone()))?;
        let parsed = spec.parse_value(&edit.raw)?;
        let value = spec.clamp(parsed.clone());
        if value != parsed {
            tracing::warn!("{} clamped from {:?} to {:?}", spec.name, parsed, value);
        }
        values.set(&spec.name, value);
    }
    Ok(())
}
