//! Preset values
//!
//! A preset is a host-supplied value for a variable name. It is written
//! without knowing the declared kind, so it is resolved against the
//! declaration when the variable first appears.

use retrovars_sdk::VariableKind;
use serde::{Deserialize, Serialize};

use crate::variables::{ValueDomain, Variable, VariableValue};

/// Untyped preset value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PresetValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    /// Enum label, boolean word, or `WxH` resolution
    Text(String),
    /// Resolution as `[width, height]`
    Pair([u32; 2]),
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "enabled" => Some(true),
        "0" | "false" | "no" | "off" | "disabled" => Some(false),
        _ => None,
    }
}

fn parse_resolution(s: &str) -> Option<(u32, u32)> {
    let (w, h) = s.split_once(['x', 'X'])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

impl PresetValue {
    /// Convert to a value shaped for `variable`
    ///
    /// Returns None if the preset cannot express a value of the variable's
    /// kind. The result still has to be range-checked against the domain.
    pub fn resolve(&self, variable: &Variable) -> Option<VariableValue> {
        match (variable.kind, self) {
            (VariableKind::Enum, Self::Text(label)) => {
                let ValueDomain::Enum(options) = &variable.domain else {
                    return None;
                };
                options
                    .iter()
                    .position(|option| option == label)
                    .map(|index| VariableValue::Enum(index as u32))
            }
            (VariableKind::Enum, Self::Integer(index)) => {
                u32::try_from(*index).ok().map(VariableValue::Enum)
            }
            (VariableKind::Bool, Self::Bool(b)) => Some(VariableValue::Bool(*b)),
            (VariableKind::Bool, Self::Text(s)) => parse_bool(s).map(VariableValue::Bool),
            (VariableKind::Int, Self::Integer(v)) => i32::try_from(*v).ok().map(VariableValue::Int),
            (VariableKind::Float, Self::Float(v)) => Some(VariableValue::Float(*v as f32)),
            (VariableKind::Float, Self::Integer(v)) => Some(VariableValue::Float(*v as f32)),
            (VariableKind::Resolution, Self::Pair([width, height])) => Some(VariableValue::Resolution {
                width: *width,
                height: *height,
            }),
            (VariableKind::Resolution, Self::Text(s)) => {
                parse_resolution(s).map(|(width, height)| VariableValue::Resolution { width, height })
            }
            _ => None,
        }
    }
}

impl From<VariableValue> for PresetValue {
    fn from(value: VariableValue) -> Self {
        match value {
            VariableValue::Enum(index) => Self::Integer(index as i64),
            VariableValue::Bool(b) => Self::Bool(b),
            VariableValue::Int(v) => Self::Integer(v as i64),
            VariableValue::Float(v) => Self::Float(v as f64),
            VariableValue::Resolution { width, height } => Self::Pair([width, height]),
        }
    }
}

impl From<bool> for PresetValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PresetValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for PresetValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for PresetValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PresetValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<(u32, u32)> for PresetValue {
    fn from((width, height): (u32, u32)) -> Self {
        Self::Pair([width, height])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_enum_by_label_and_index() {
        let palette = Variable::enumeration("palette", "Palette", ["Gray", "Green"], 0);
        assert_eq!(
            PresetValue::Text("Green".into()).resolve(&palette),
            Some(VariableValue::Enum(1))
        );
        assert_eq!(PresetValue::Integer(0).resolve(&palette), Some(VariableValue::Enum(0)));
        assert_eq!(PresetValue::Text("Blue".into()).resolve(&palette), None);
        assert_eq!(PresetValue::Integer(-1).resolve(&palette), None);
    }

    #[test]
    fn test_resolve_bool() {
        let var = Variable::boolean("b", "B", false);
        assert_eq!(PresetValue::Bool(true).resolve(&var), Some(VariableValue::Bool(true)));
        assert_eq!(PresetValue::Text("off".into()).resolve(&var), Some(VariableValue::Bool(false)));
        assert_eq!(PresetValue::Integer(1).resolve(&var), None);
    }

    #[test]
    fn test_resolve_numbers() {
        let int = Variable::int("i", "I", 0, 10, 0);
        assert_eq!(PresetValue::Integer(7).resolve(&int), Some(VariableValue::Int(7)));
        assert_eq!(PresetValue::Integer(i64::MAX).resolve(&int), None);
        assert_eq!(PresetValue::Float(1.0).resolve(&int), None);

        let float = Variable::float("f", "F", 0.0, 2.0, 1.0);
        assert_eq!(PresetValue::Integer(2).resolve(&float), Some(VariableValue::Float(2.0)));
        assert_eq!(PresetValue::Float(0.5).resolve(&float), Some(VariableValue::Float(0.5)));
    }

    #[test]
    fn test_resolve_resolution() {
        let var = Variable::resolution("r", "R", 160, 144);
        assert_eq!(
            PresetValue::Text("320x288".into()).resolve(&var),
            Some(VariableValue::Resolution { width: 320, height: 288 })
        );
        assert_eq!(
            PresetValue::Pair([640, 576]).resolve(&var),
            Some(VariableValue::Resolution { width: 640, height: 576 })
        );
        assert_eq!(PresetValue::Text("wide".into()).resolve(&var), None);
    }

    #[test]
    fn test_from_value() {
        assert_eq!(PresetValue::from(VariableValue::Enum(2)), PresetValue::Integer(2));
        assert_eq!(
            PresetValue::from(VariableValue::Resolution { width: 1, height: 2 }),
            PresetValue::Pair([1, 2])
        );
    }
}
