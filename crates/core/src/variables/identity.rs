//! Re-declaration identity checks
//!
//! Across re-declarations in one session, a position keeps its name, display
//! name, description and value domain. Only the initial value, change timing
//! and callback may be different.

use bitflags::bitflags;
use retrovars_sdk::VariableId;

use super::variable::Variable;
use crate::error::{VariableError, VariableResult};

bitflags! {
    /// Set of identity fields that differ between two declarations
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct IdentityFields: u8 {
        const NAME = 0x01;
        const DISPLAY_NAME = 0x02;
        const DESCRIPTION = 0x04;
        /// Value domain, including the variable kind
        const VALUE_DOMAIN = 0x08;
    }
}

/// A single identity field, as reported in errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityField {
    Name,
    DisplayName,
    Description,
    ValueDomain,
}

impl std::fmt::Display for IdentityField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Name => "name",
            Self::DisplayName => "display name",
            Self::Description => "description",
            Self::ValueDomain => "value domain",
        })
    }
}

impl IdentityFields {
    /// First differing field in declaration order
    pub fn first(&self) -> Option<IdentityField> {
        [
            (Self::NAME, IdentityField::Name),
            (Self::DISPLAY_NAME, IdentityField::DisplayName),
            (Self::DESCRIPTION, IdentityField::Description),
            (Self::VALUE_DOMAIN, IdentityField::ValueDomain),
        ]
        .into_iter()
        .find(|(flag, _)| self.contains(*flag))
        .map(|(_, field)| field)
    }
}

/// Compute which identity fields differ between two declarations
pub fn identity_diff(old: &Variable, new: &Variable) -> IdentityFields {
    let mut diff = IdentityFields::empty();
    diff.set(IdentityFields::NAME, old.name != new.name);
    diff.set(IdentityFields::DISPLAY_NAME, old.display_name != new.display_name);
    diff.set(IdentityFields::DESCRIPTION, old.description != new.description);
    diff.set(
        IdentityFields::VALUE_DOMAIN,
        old.kind != new.kind || !old.domain.identical(&new.domain),
    );
    diff
}

/// Check every position common to both sequences
///
/// # Errors
/// `IdentityMismatch` naming the first offending position and field.
pub fn check_identity(previous: &[Variable], next: &[Variable]) -> VariableResult<()> {
    for (id, (old, new)) in previous.iter().zip(next).enumerate() {
        if let Some(field) = identity_diff(old, new).first() {
            return Err(VariableError::IdentityMismatch {
                id: id as VariableId,
                field,
            });
        }
    }
    Ok(())
}
