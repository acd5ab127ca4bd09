//! Retrovars - Core/Frontend Variable Negotiation
//!
//! This crate contains the typed variable model and the two halves of the
//! negotiation: the core-side [`VariableRegistry`] that declares and
//! redeclares variables, and the frontend-side [`Channel`] that holds current
//! values and dispatches change notifications.
//!
//! # Re-exports
//!
//! - [`sdk`] - Raw call contract types and the shared kind/timing enums

pub use retrovars_sdk as sdk;

pub mod channel;
pub mod config;
pub mod error;
pub mod ffi;
pub mod registry;
pub mod variables;

// Re-export commonly used items
pub use channel::{Channel, ChannelEvent, VariableInfo};
pub use config::{ChannelConfig, ConfigError, ConfigResult, PresetValue};
pub use error::{VariableError, VariableResult};
pub use registry::{DeclareSummary, VariableHost, VariableRegistry};
pub use variables::{
    FromVariableValue, IdentityField, OnChange, ResolutionBounds, ValueDomain, Variable,
    VariableValue,
};

pub use sdk::{ChangeTiming, VariableId, VariableKind};
