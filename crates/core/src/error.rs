//! Error types for variable negotiation

use retrovars_sdk::VariableId;

use crate::variables::IdentityField;

/// Error type for declaration, query and edit operations
///
/// Every failure is local to the call that produced it. A rejected
/// declaration leaves the previously active sequence untouched, and a
/// rejected edit leaves the current value unchanged.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum VariableError {
    /// The value domain or initial value does not fit the variable kind
    #[error("Invalid domain for variable {id}: {reason}")]
    InvalidDomain { id: VariableId, reason: String },

    /// A value lies outside the declared bounds
    #[error("Value out of range for variable {id}: {reason}")]
    OutOfRange { id: VariableId, reason: String },

    /// A separator or terminator carries a value domain, value or callback
    #[error("Unexpected payload on {kind} at position {id}")]
    UnexpectedPayload {
        id: VariableId,
        kind: retrovars_sdk::VariableKind,
    },

    /// A re-declaration changed an identity field of an existing position
    #[error("Identity mismatch for variable {id}: {field} changed")]
    IdentityMismatch { id: VariableId, field: IdentityField },

    /// The position is not active, or is a separator
    #[error("Unknown variable id: {0}")]
    UnknownId(VariableId),

    /// A value does not match the shape of the declared domain
    #[error("Invalid value for variable {id}: {reason}")]
    InvalidValue { id: VariableId, reason: String },

    /// No active value-bearing variable has this name
    #[error("Unknown variable name: {0}")]
    UnknownName(String),

    /// A raw sequence entry could not be decoded
    #[error("Malformed raw variable at position {id}: {reason}")]
    MalformedRaw { id: VariableId, reason: String },
}

impl VariableError {
    /// Position the error refers to, if any
    pub fn id(&self) -> Option<VariableId> {
        match self {
            Self::InvalidDomain { id, .. }
            | Self::OutOfRange { id, .. }
            | Self::UnexpectedPayload { id, .. }
            | Self::IdentityMismatch { id, .. }
            | Self::InvalidValue { id, .. }
            | Self::MalformedRaw { id, .. } => Some(*id),
            Self::UnknownId(id) => Some(*id),
            Self::UnknownName(_) => None,
        }
    }
}

/// Result type for variable operations
pub type VariableResult<T> = Result<T, VariableError>;
