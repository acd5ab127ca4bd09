//! Variable registry (core side)
//!
//! The registry builds and submits the core's declared sequence. It checks
//! every declaration against the one it last submitted before handing it to
//! the frontend, so a faulty re-declaration is caught at the source.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use retrovars_core::{Channel, Variable, VariableRegistry};
//!
//! let registry = VariableRegistry::new(Arc::new(Channel::new()));
//! registry.declare(&[
//!     Variable::separator("Video"),
//!     Variable::boolean("gb_colorize", "Game Boy colorization", false),
//!     Variable::terminator(),
//! ])?;
//!
//! let colorize: bool = registry.get_as(1)?;
//! ```

use std::sync::Arc;

use parking_lot::Mutex;
use retrovars_sdk::VariableId;

use crate::error::{VariableError, VariableResult};
use crate::variables::{
    active_prefix, check_identity, validate_sequence, FromVariableValue, Variable, VariableValue,
};

/// Outcome of an accepted declaration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclareSummary {
    /// Number of active positions, separators included
    pub active: usize,
    /// Positions declared for the first time
    pub added: Vec<VariableId>,
    /// Positions released because the new sequence is shorter
    pub dropped: Vec<VariableId>,
}

/// The frontend as seen by a core
///
/// Implemented by [`crate::Channel`]; a host that reaches its frontend some
/// other way implements it to reuse the registry's checks.
pub trait VariableHost {
    /// Store a declared sequence
    fn accept(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary>;

    /// Read one current value
    fn get(&self, id: VariableId) -> VariableResult<VariableValue>;
}

impl<H: VariableHost + ?Sized> VariableHost for Arc<H> {
    fn accept(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        (**self).accept(sequence)
    }

    fn get(&self, id: VariableId) -> VariableResult<VariableValue> {
        (**self).get(id)
    }
}

impl<H: VariableHost + ?Sized> VariableHost for &H {
    fn accept(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        (**self).accept(sequence)
    }

    fn get(&self, id: VariableId) -> VariableResult<VariableValue> {
        (**self).get(id)
    }
}

#[derive(Default)]
struct RegistryState {
    /// Last submitted sequence, without its terminator
    declared: Option<Vec<Variable>>,
    /// Bumped on every submission
    generation: u64,
}

/// Core-side registry of declared variables
pub struct VariableRegistry<H: VariableHost> {
    host: H,
    state: Mutex<RegistryState>,
}

impl<H: VariableHost> VariableRegistry<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: Mutex::new(RegistryState::default()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Submit the initial declaration
    ///
    /// Should happen during setup, before any value is read. Calling it
    /// again behaves like [`Self::redeclare`].
    pub fn declare(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        if self.is_declared() {
            tracing::debug!("Variables already declared, treating as re-declaration");
        }
        self.submit(sequence)
    }

    /// Submit an updated declaration
    ///
    /// Permitted at any point, including from inside a change callback.
    /// Positions shared with the previous declaration must keep their
    /// identity fields; positions past the new end are released.
    pub fn redeclare(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        self.submit(sequence)
    }

    fn submit(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        let sequence = active_prefix(sequence);
        validate_sequence(sequence)?;

        // The lock is released before handing off: the frontend may call back
        // into the core, which may re-declare.
        let (previous, generation) = {
            let mut state = self.state.lock();
            if let Some(previous) = &state.declared {
                check_identity(previous, sequence)?;
            }
            state.generation += 1;
            let previous = state.declared.replace(sequence.to_vec());
            (previous, state.generation)
        };

        match self.host.accept(sequence) {
            Ok(summary) => {
                tracing::debug!(
                    "Declared {} variables ({} new, {} released)",
                    summary.active,
                    summary.added.len(),
                    summary.dropped.len()
                );
                Ok(summary)
            }
            Err(e) => {
                let mut state = self.state.lock();
                if state.generation == generation {
                    state.declared = previous;
                }
                tracing::warn!("Frontend rejected declaration: {}", e);
                Err(e)
            }
        }
    }

    /// Forget the last submitted declaration
    ///
    /// Call after the frontend tore its channel down, so the next
    /// declaration is checked as a first one.
    pub fn reset(&self) {
        let mut state = self.state.lock();
        if state.declared.take().is_some() {
            state.generation += 1;
            tracing::debug!("Declaration record cleared");
        }
    }

    /// Check if a declaration has been submitted
    pub fn is_declared(&self) -> bool {
        self.state.lock().declared.is_some()
    }

    /// Copy of the last submitted sequence
    pub fn declared(&self) -> Option<Vec<Variable>> {
        self.state.lock().declared.clone()
    }

    /// Read a current value from the frontend
    pub fn get(&self, id: VariableId) -> VariableResult<VariableValue> {
        self.host.get(id)
    }

    /// Read a current value as a concrete type
    ///
    /// # Errors
    /// `InvalidValue` if the position holds a different kind.
    pub fn get_as<T: FromVariableValue>(&self, id: VariableId) -> VariableResult<T> {
        let value = self.host.get(id)?;
        T::from_value(&value).ok_or_else(|| VariableError::InvalidValue {
            id,
            reason: format!("expected {} value, got {}", T::KIND, value.kind()),
        })
    }
}

impl<H: VariableHost> std::fmt::Debug for VariableRegistry<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("VariableRegistry")
            .field("declared", &state.declared.as_ref().map(Vec::len))
            .field("generation", &state.generation)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variables::IdentityField;
    use crate::Channel;

    fn sequence() -> Vec<Variable> {
        vec![
            Variable::separator("Video"),
            Variable::boolean("gb_colorize", "Game Boy colorization", false),
            Variable::int("frameskip", "Frame skip", 0, 10, 5),
            Variable::terminator(),
        ]
    }

    #[test]
    fn test_declare_then_get() {
        let registry = VariableRegistry::new(Channel::new());
        let summary = registry.declare(&sequence()).unwrap();

        assert_eq!(summary.active, 3);
        assert_eq!(summary.added, vec![0, 1, 2]);
        assert!(registry.is_declared());
        assert_eq!(registry.get(1), Ok(VariableValue::Bool(false)));
        assert_eq!(registry.get_as::<i32>(2), Ok(5));
        assert_eq!(registry.get(0), Err(VariableError::UnknownId(0)));
        assert_eq!(registry.get(3), Err(VariableError::UnknownId(3)));
    }

    #[test]
    fn test_get_as_wrong_type() {
        let registry = VariableRegistry::new(Channel::new());
        registry.declare(&sequence()).unwrap();
        assert!(matches!(
            registry.get_as::<bool>(2),
            Err(VariableError::InvalidValue { id: 2, .. })
        ));
    }

    #[test]
    fn test_identity_mismatch_is_caught_before_host() {
        let channel = Arc::new(Channel::new());
        let registry = VariableRegistry::new(Arc::clone(&channel));
        registry.declare(&sequence()).unwrap();

        let mut changed = sequence();
        changed[2] = Variable::int("frameskip", "Frame skipping", 0, 10, 5);
        assert_eq!(
            registry.redeclare(&changed),
            Err(VariableError::IdentityMismatch {
                id: 2,
                field: IdentityField::DisplayName
            })
        );

        assert_eq!(registry.declared().unwrap()[2].display_name, "Frame skip");
        assert_eq!(channel.descriptors()[2].display_name, "Frame skip");
    }

    #[test]
    fn test_invalid_declaration_leaves_previous_active() {
        let channel = Arc::new(Channel::new());
        let registry = VariableRegistry::new(Arc::clone(&channel));
        registry.declare(&sequence()).unwrap();

        let mut broken = sequence();
        broken[2] = Variable::int("frameskip", "Frame skip", 0, 10, 50);
        assert!(matches!(
            registry.redeclare(&broken),
            Err(VariableError::OutOfRange { id: 2, .. })
        ));
        assert_eq!(registry.declared().unwrap().len(), 3);
        assert_eq!(channel.get(2), Ok(VariableValue::Int(5)));
    }

    #[test]
    fn test_redeclare_shorter_releases_positions() {
        let registry = VariableRegistry::new(Channel::new());
        registry.declare(&sequence()).unwrap();

        let shorter = vec![sequence()[0].clone(), sequence()[1].clone(), Variable::terminator()];
        let summary = registry.redeclare(&shorter).unwrap();

        assert_eq!(summary.active, 2);
        assert!(summary.added.is_empty());
        assert_eq!(summary.dropped, vec![2]);
        assert_eq!(registry.get(2), Err(VariableError::UnknownId(2)));
        assert_eq!(registry.declared().unwrap().len(), 2);
    }

    #[test]
    fn test_reset_after_teardown_allows_new_declaration() {
        let channel = Arc::new(Channel::new());
        let registry = VariableRegistry::new(Arc::clone(&channel));
        registry.declare(&sequence()).unwrap();

        channel.teardown();
        registry.reset();
        assert!(!registry.is_declared());

        let other = vec![
            Variable::enumeration("region", "Region", ["NTSC", "PAL"], 0),
            Variable::terminator(),
        ];
        let summary = registry.declare(&other).unwrap();
        assert_eq!(summary.added, vec![0]);
        assert_eq!(registry.get(0), Ok(VariableValue::Enum(0)));
        assert_eq!(registry.declared().unwrap()[0].name, "region");
    }

    /// Host that accepts nothing, to exercise rollback
    struct RejectingHost;

    impl VariableHost for RejectingHost {
        fn accept(&self, _sequence: &[Variable]) -> VariableResult<DeclareSummary> {
            Err(VariableError::UnknownId(0))
        }

        fn get(&self, id: VariableId) -> VariableResult<VariableValue> {
            Err(VariableError::UnknownId(id))
        }
    }

    #[test]
    fn test_host_rejection_restores_previous_declaration() {
        let registry = VariableRegistry::new(RejectingHost);
        assert!(registry.declare(&sequence()).is_err());
        assert!(!registry.is_declared());
    }
}
