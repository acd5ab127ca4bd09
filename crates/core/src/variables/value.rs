//! Tagged value and domain types
//!
//! One [`VariableValue`] case per value-bearing kind, so a value of the wrong
//! shape is caught at the API boundary instead of trusted by convention.

use retrovars_sdk::{VariableKind, RESOLUTION_MAX, RESOLUTION_MIN};
use serde::{Deserialize, Serialize};

/// Current, initial or edited value of a variable
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableValue {
    /// Index into the enum's option list
    Enum(u32),
    Bool(bool),
    Int(i32),
    Float(f32),
    Resolution { width: u32, height: u32 },
}

impl VariableValue {
    /// Kind this value belongs to
    pub fn kind(&self) -> VariableKind {
        match self {
            Self::Enum(_) => VariableKind::Enum,
            Self::Bool(_) => VariableKind::Bool,
            Self::Int(_) => VariableKind::Int,
            Self::Float(_) => VariableKind::Float,
            Self::Resolution { .. } => VariableKind::Resolution,
        }
    }
}

impl std::fmt::Display for VariableValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Enum(index) => write!(f, "#{}", index),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Resolution { width, height } => write!(f, "{}x{}", width, height),
        }
    }
}

/// Legal values of a variable
///
/// Bool and Resolution have implicit domains and use [`ValueDomain::None`],
/// as do separators and terminators.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueDomain {
    #[default]
    None,
    /// Ordered option labels
    Enum(Vec<String>),
    /// Inclusive integer range
    Int { low: i32, high: i32 },
    /// Inclusive float range
    Float { low: f32, high: f32 },
}

impl ValueDomain {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Option labels of an enum domain
    pub fn options(&self) -> Option<&[String]> {
        match self {
            Self::Enum(options) => Some(options),
            _ => None,
        }
    }

    /// Suggested step size for presenting a float range
    ///
    /// One hundredth of the range, or None for non-float domains and
    /// single-point ranges.
    pub fn float_step(&self) -> Option<f32> {
        match *self {
            Self::Float { low, high } if high > low => {
                Some((high - low) / 100.0).filter(|step| step.is_finite())
            }
            _ => None,
        }
    }

    /// Byte-for-byte equality, used for re-declaration identity checks
    pub(crate) fn identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float { low: a, high: b }, Self::Float { low: c, high: d }) => {
                a.to_bits() == c.to_bits() && b.to_bits() == d.to_bits()
            }
            _ => self == other,
        }
    }
}

/// Presentable resolution range
///
/// Starts at the hard bounds. A frontend may narrow the upper corner using
/// game geometry or monitor size, but never past the hard bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolutionBounds {
    pub min_width: u32,
    pub min_height: u32,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for ResolutionBounds {
    fn default() -> Self {
        Self {
            min_width: RESOLUTION_MIN,
            min_height: RESOLUTION_MIN,
            max_width: RESOLUTION_MAX,
            max_height: RESOLUTION_MAX,
        }
    }
}

impl ResolutionBounds {
    /// Narrow the upper bounds, clamped to the hard bounds
    pub fn narrow(self, max_width: u32, max_height: u32) -> Self {
        Self {
            max_width: max_width.clamp(self.min_width, self.max_width),
            max_height: max_height.clamp(self.min_height, self.max_height),
            ..self
        }
    }

    /// Check if a resolution lies within these bounds
    pub fn contains(&self, width: u32, height: u32) -> bool {
        (self.min_width..=self.max_width).contains(&width)
            && (self.min_height..=self.max_height).contains(&height)
    }
}

/// Types that can be read out of a [`VariableValue`]
pub trait FromVariableValue: Sized {
    /// Kind expected for this type
    const KIND: VariableKind;

    /// Extract from a value, or None if the shape differs
    fn from_value(value: &VariableValue) -> Option<Self>;
}

impl FromVariableValue for bool {
    const KIND: VariableKind = VariableKind::Bool;

    fn from_value(value: &VariableValue) -> Option<Self> {
        match *value {
            VariableValue::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromVariableValue for i32 {
    const KIND: VariableKind = VariableKind::Int;

    fn from_value(value: &VariableValue) -> Option<Self> {
        match *value {
            VariableValue::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl FromVariableValue for f32 {
    const KIND: VariableKind = VariableKind::Float;

    fn from_value(value: &VariableValue) -> Option<Self> {
        match *value {
            VariableValue::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl FromVariableValue for u32 {
    const KIND: VariableKind = VariableKind::Enum;

    fn from_value(value: &VariableValue) -> Option<Self> {
        match *value {
            VariableValue::Enum(index) => Some(index),
            _ => None,
        }
    }
}

impl FromVariableValue for (u32, u32) {
    const KIND: VariableKind = VariableKind::Resolution;

    fn from_value(value: &VariableValue) -> Option<Self> {
        match *value {
            VariableValue::Resolution { width, height } => Some((width, height)),
            _ => None,
        }
    }
}
