//! Variable type system
//!
//! Declarations, tagged values and domains, plus the validation functions
//! shared by the core-side registry and the frontend-side channel.
//!
//! | kind       | domain                      | value                       |
//! |------------|-----------------------------|-----------------------------|
//! | Enum       | `Enum(labels)`, non-empty   | `Enum(index < labels.len())` |
//! | Bool       | `None`                      | `Bool`                      |
//! | Int        | `Int { low <= high }`       | `Int(low..=high)`           |
//! | Float      | `Float { low <= high }`     | `Float(low..=high)`         |
//! | Resolution | `None`                      | `Resolution(1..=65535 each)` |
//! | Separator  | `None`                      | none                        |

mod identity;
mod validate;
mod value;
mod variable;

pub use identity::{check_identity, identity_diff, IdentityField, IdentityFields};
pub use validate::{validate_sequence, validate_value, validate_variable};
pub use value::{FromVariableValue, ResolutionBounds, ValueDomain, VariableValue};
pub use variable::{active_prefix, OnChange, OnChangeFn, Variable};
