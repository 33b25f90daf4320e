//! Effect options and their documented domains.
//!
//! Options arrive as a flat map of names to numbers or booleans. Each
//! built-in effect declares a [`ParamDef`] per recognized option; resolving
//! the map against those definitions fills in defaults and enforces domains:
//!
//! - [`Domain::Clamp`] values are clamped into range (with a warning) and the
//!   stage continues.
//! - [`Domain::Strict`] values outside range fail with `InvalidOption`.
//! - [`Domain::Integer`] values must be whole numbers inside range.
//! - Unknown names, wrong types, and non-finite numbers always fail.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EffectError;

/// A single option value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
}

impl OptionValue {
    fn type_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for OptionValue {
    fn from(value: f32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for OptionValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for OptionValue {
    fn from(value: u32) -> Self {
        Self::Number(value as f64)
    }
}

/// Flat option map attached to one effect invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EffectOptions(BTreeMap<String, OptionValue>);

impl EffectOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<OptionValue> {
        self.0.get(name).copied()
    }

    /// Numeric value of `name`, if present and numeric.
    pub fn number(&self, name: &str) -> Option<f64> {
        match self.get(name)? {
            OptionValue::Number(v) => Some(v),
            OptionValue::Bool(_) => None,
        }
    }

    /// Boolean value of `name`, if present and boolean.
    pub fn flag(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            OptionValue::Bool(v) => Some(v),
            OptionValue::Number(_) => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, OptionValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a flat JSON object such as `{"kernelSize": 7}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Accepted values for one option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Domain {
    /// Number clamped into `[min, max]`.
    Clamp { min: f64, max: f64 },
    /// Number that must already lie in `[min, max]`.
    Strict { min: f64, max: f64 },
    /// Whole number that must already lie in `[min, max]`.
    Integer { min: f64, max: f64 },
    /// Any finite number.
    Finite,
    /// A boolean.
    Flag,
}

/// Definition of one recognized option.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDef {
    pub name: &'static str,
    pub default: OptionValue,
    pub domain: Domain,
}

impl ParamDef {
    pub const fn clamped(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            default: OptionValue::Number(default),
            domain: Domain::Clamp { min, max },
        }
    }

    pub const fn strict(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            default: OptionValue::Number(default),
            domain: Domain::Strict { min, max },
        }
    }

    pub const fn integer(name: &'static str, default: f64, min: f64, max: f64) -> Self {
        Self {
            name,
            default: OptionValue::Number(default),
            domain: Domain::Integer { min, max },
        }
    }

    pub const fn finite(name: &'static str, default: f64) -> Self {
        Self {
            name,
            default: OptionValue::Number(default),
            domain: Domain::Finite,
        }
    }

    pub const fn flag(name: &'static str, default: bool) -> Self {
        Self {
            name,
            default: OptionValue::Bool(default),
            domain: Domain::Flag,
        }
    }

    fn check(&self, effect: &str, value: OptionValue) -> Result<OptionValue, EffectError> {
        let mismatch = |expected: &str| {
            EffectError::invalid_option(
                effect,
                self.name,
                format!("expected a {expected}, got a {}", value.type_name()),
            )
        };

        match (self.domain, value) {
            (Domain::Flag, OptionValue::Bool(_)) => Ok(value),
            (Domain::Flag, OptionValue::Number(_)) => Err(mismatch("boolean")),
            (_, OptionValue::Bool(_)) => Err(mismatch("number")),
            (_, OptionValue::Number(v)) if !v.is_finite() => Err(EffectError::invalid_option(
                effect,
                self.name,
                format!("{v} is not a finite number"),
            )),
            (Domain::Finite, OptionValue::Number(_)) => Ok(value),
            (Domain::Clamp { min, max }, OptionValue::Number(v)) => {
                let clamped = v.clamp(min, max);
                if clamped != v {
                    warn!(effect, option = self.name, value = v, clamped, "Option clamped");
                }
                Ok(OptionValue::Number(clamped))
            }
            (Domain::Strict { min, max }, OptionValue::Number(v)) => {
                if (min..=max).contains(&v) {
                    Ok(value)
                } else {
                    Err(EffectError::invalid_option(
                        effect,
                        self.name,
                        format!("{v} is outside [{min}, {max}]"),
                    ))
                }
            }
            (Domain::Integer { min, max }, OptionValue::Number(v)) => {
                if v.fract() != 0.0 {
                    Err(EffectError::invalid_option(
                        effect,
                        self.name,
                        format!("{v} is not a whole number"),
                    ))
                } else if (min..=max).contains(&v) {
                    Ok(value)
                } else {
                    Err(EffectError::invalid_option(
                        effect,
                        self.name,
                        format!("{v} is outside [{min}, {max}]"),
                    ))
                }
            }
        }
    }
}

/// Options after defaults and domains have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    values: Vec<Resolved>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Resolved {
    name: &'static str,
    value: OptionValue,
    explicit: bool,
}

impl ResolvedOptions {
    fn lookup(&self, name: &str) -> Option<&Resolved> {
        self.values.iter().find(|r| r.name == name)
    }

    /// Numeric value of a declared option; 0.0 for undeclared names.
    pub fn number(&self, name: &str) -> f64 {
        match self.lookup(name).map(|r| r.value) {
            Some(OptionValue::Number(v)) => v,
            _ => 0.0,
        }
    }

    /// Boolean value of a declared option; `false` for undeclared names.
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.lookup(name).map(|r| r.value), Some(OptionValue::Bool(true)))
    }

    /// Whether the caller supplied `name` rather than relying on its default.
    pub fn is_explicit(&self, name: &str) -> bool {
        self.lookup(name).is_some_and(|r| r.explicit)
    }
}

/// Validate `options` for `effect` against `defs` and fill in defaults.
pub fn resolve(
    effect: &str,
    defs: &[ParamDef],
    options: &EffectOptions,
) -> Result<ResolvedOptions, EffectError> {
    if let Some((name, _)) = options
        .iter()
        .find(|(name, _)| !defs.iter().any(|d| d.name == *name))
    {
        return Err(EffectError::invalid_option(
            effect,
            name,
            "not recognized by this effect",
        ));
    }

    let values = defs
        .iter()
        .map(|def| -> Result<Resolved, EffectError> {
            Ok(match options.get(def.name) {
                Some(value) => Resolved {
                    name: def.name,
                    value: def.check(effect, value)?,
                    explicit: true,
                },
                None => Resolved {
                    name: def.name,
                    value: def.default,
                    explicit: false,
                },
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResolvedOptions { values })
}
