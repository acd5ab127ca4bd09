//! Declaration and value validation
//!
//! Both the registry (core side) and the channel (frontend side) validate
//! with these functions, so a declaration rejected by one is rejected by the
//! other for the same reason.

use std::collections::HashSet;

use retrovars_sdk::{VariableId, VariableKind, RESOLUTION_MAX, RESOLUTION_MIN};

use super::value::{ValueDomain, VariableValue};
use super::variable::Variable;
use crate::error::{VariableError, VariableResult};

/// Why a value does not fit a domain
enum ValueFault {
    /// Wrong value case for the kind
    Shape(String),
    /// Enum index past the option list
    Index(String),
    /// Numeric value outside the inclusive bounds
    Range(String),
}

fn check_value(kind: VariableKind, domain: &ValueDomain, value: &VariableValue) -> Result<(), ValueFault> {
    if value.kind() != kind {
        return Err(ValueFault::Shape(format!(
            "expected {} value, got {}",
            kind,
            value.kind()
        )));
    }

    match (domain, *value) {
        (ValueDomain::Enum(options), VariableValue::Enum(index)) => {
            if (index as usize) < options.len() {
                Ok(())
            } else {
                Err(ValueFault::Index(format!(
                    "option index {} past {} options",
                    index,
                    options.len()
                )))
            }
        }
        (ValueDomain::None, VariableValue::Bool(_)) => Ok(()),
        (ValueDomain::Int { low, high }, VariableValue::Int(v)) => {
            if (*low..=*high).contains(&v) {
                Ok(())
            } else {
                Err(ValueFault::Range(format!("{} not in [{}, {}]", v, low, high)))
            }
        }
        (ValueDomain::Float { low, high }, VariableValue::Float(v)) => {
            if *low <= v && v <= *high {
                Ok(())
            } else {
                Err(ValueFault::Range(format!("{} not in [{}, {}]", v, low, high)))
            }
        }
        (ValueDomain::None, VariableValue::Resolution { width, height }) => {
            let bounds = RESOLUTION_MIN..=RESOLUTION_MAX;
            if bounds.contains(&width) && bounds.contains(&height) {
                Ok(())
            } else {
                Err(ValueFault::Range(format!(
                    "{}x{} not within {}x{}..{}x{}",
                    width, height, RESOLUTION_MIN, RESOLUTION_MIN, RESOLUTION_MAX, RESOLUTION_MAX
                )))
            }
        }
        _ => Err(ValueFault::Shape(format!("domain does not fit {}", kind))),
    }
}

fn check_domain(id: VariableId, kind: VariableKind, domain: &ValueDomain) -> VariableResult<()> {
    let invalid = |reason: String| VariableError::InvalidDomain { id, reason };

    match (kind, domain) {
        (VariableKind::Enum, ValueDomain::Enum(options)) => {
            if options.is_empty() {
                return Err(invalid("empty option list".to_string()));
            }
            let mut seen = HashSet::with_capacity(options.len());
            for option in options {
                if !seen.insert(option.as_str()) {
                    return Err(invalid(format!("duplicate option '{}'", option)));
                }
            }
            Ok(())
        }
        (VariableKind::Bool | VariableKind::Resolution, ValueDomain::None) => Ok(()),
        (VariableKind::Bool | VariableKind::Resolution, _) => {
            Err(invalid(format!("{} takes no value domain", kind)))
        }
        (VariableKind::Int, ValueDomain::Int { low, high }) => {
            if low <= high {
                Ok(())
            } else {
                Err(invalid(format!("low {} above high {}", low, high)))
            }
        }
        (VariableKind::Float, ValueDomain::Float { low, high }) => {
            if low.is_nan() || high.is_nan() {
                Err(invalid("NaN bound".to_string()))
            } else if low.is_infinite() || high.is_infinite() {
                Err(invalid("infinite bound".to_string()))
            } else if low <= high {
                Ok(())
            } else {
                Err(invalid(format!("low {} above high {}", low, high)))
            }
        }
        _ => Err(invalid(format!("expected {} domain", kind))),
    }
}

/// Validate one declared variable at position `id`
///
/// # Errors
/// - `UnexpectedPayload` for a separator or terminator carrying a domain,
///   initial value or callback
/// - `InvalidDomain` for a malformed domain, a missing or mis-shaped initial
///   value, or an enum index past the option list
/// - `OutOfRange` for an initial int, float or resolution outside its bounds
pub fn validate_variable(id: VariableId, variable: &Variable) -> VariableResult<()> {
    let kind = variable.kind;

    if !kind.has_value() {
        if !variable.domain.is_none() || variable.initial.is_some() || variable.on_change.is_some() {
            return Err(VariableError::UnexpectedPayload { id, kind });
        }
        return Ok(());
    }

    check_domain(id, kind, &variable.domain)?;

    let Some(initial) = variable.initial.as_ref() else {
        return Err(VariableError::InvalidDomain {
            id,
            reason: "missing initial value".to_string(),
        });
    };

    check_value(kind, &variable.domain, initial).map_err(|fault| match fault {
        ValueFault::Shape(reason) | ValueFault::Index(reason) => {
            VariableError::InvalidDomain { id, reason }
        }
        ValueFault::Range(reason) => VariableError::OutOfRange { id, reason },
    })
}

/// Validate every variable of a sequence, stopping at the first failure
pub fn validate_sequence(sequence: &[Variable]) -> VariableResult<()> {
    sequence
        .iter()
        .enumerate()
        .try_for_each(|(id, variable)| validate_variable(id as VariableId, variable))
}

/// Validate an edited value against a declared variable
///
/// # Errors
/// - `UnknownId` if the variable is a separator or terminator
/// - `InvalidValue` for a value of the wrong shape or an enum index past the
///   option list
/// - `OutOfRange` for an int, float or resolution outside its bounds
pub fn validate_value(id: VariableId, variable: &Variable, value: &VariableValue) -> VariableResult<()> {
    if !variable.has_value() {
        return Err(VariableError::UnknownId(id));
    }

    check_value(variable.kind, &variable.domain, value).map_err(|fault| match fault {
        ValueFault::Shape(reason) | ValueFault::Index(reason) => {
            VariableError::InvalidValue { id, reason }
        }
        ValueFault::Range(reason) => VariableError::OutOfRange { id, reason },
    })
}
