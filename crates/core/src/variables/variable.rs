//! Variable declarations

use std::sync::Arc;

use retrovars_sdk::{ChangeTiming, VariableId, VariableKind};
use serde::{Deserialize, Serialize};

use super::value::{ValueDomain, VariableValue};

/// Change callback function type
///
/// Receives the variable's position and its new value.
pub type OnChangeFn = dyn Fn(VariableId, &VariableValue) + Send + Sync;

/// Shared handle to a change callback
pub type OnChange = Arc<OnChangeFn>;

/// One entry in a declared sequence
///
/// Built with the kind-specific constructors and the `with_*` builders:
///
/// ```ignore
/// use retrovars_core::Variable;
///
/// let colorize = Variable::boolean("gb_colorize", "Game Boy colorization", false)
///     .with_description("Emulate fake colors on black&white games.")
///     .with_on_change(|id, value| tracing::info!("{} -> {}", id, value));
/// ```
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Variable {
    pub kind: VariableKind,
    pub timing: ChangeTiming,
    /// Internal name, stable across sessions (configuration key)
    pub name: String,
    /// Name shown to the user
    pub display_name: String,
    /// Second line of help text
    pub description: String,
    pub domain: ValueDomain,
    pub initial: Option<VariableValue>,
    #[serde(skip)]
    pub on_change: Option<OnChange>,
}

impl Variable {
    fn value(
        kind: VariableKind,
        name: impl Into<String>,
        display_name: impl Into<String>,
        domain: ValueDomain,
        initial: VariableValue,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            display_name: display_name.into(),
            domain,
            initial: Some(initial),
            ..Self::default()
        }
    }

    /// Create an enum variable with an initial option index
    pub fn enumeration<I, S>(
        name: impl Into<String>,
        display_name: impl Into<String>,
        options: I,
        initial: u32,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options = options.into_iter().map(Into::into).collect();
        Self::value(
            VariableKind::Enum,
            name,
            display_name,
            ValueDomain::Enum(options),
            VariableValue::Enum(initial),
        )
    }

    /// Create a boolean variable
    pub fn boolean(name: impl Into<String>, display_name: impl Into<String>, initial: bool) -> Self {
        Self::value(
            VariableKind::Bool,
            name,
            display_name,
            ValueDomain::None,
            VariableValue::Bool(initial),
        )
    }

    /// Create an integer variable with an inclusive range
    pub fn int(
        name: impl Into<String>,
        display_name: impl Into<String>,
        low: i32,
        high: i32,
        initial: i32,
    ) -> Self {
        Self::value(
            VariableKind::Int,
            name,
            display_name,
            ValueDomain::Int { low, high },
            VariableValue::Int(initial),
        )
    }

    /// Create a float variable with an inclusive range
    pub fn float(
        name: impl Into<String>,
        display_name: impl Into<String>,
        low: f32,
        high: f32,
        initial: f32,
    ) -> Self {
        Self::value(
            VariableKind::Float,
            name,
            display_name,
            ValueDomain::Float { low, high },
            VariableValue::Float(initial),
        )
    }

    /// Create a resolution variable
    pub fn resolution(
        name: impl Into<String>,
        display_name: impl Into<String>,
        width: u32,
        height: u32,
    ) -> Self {
        Self::value(
            VariableKind::Resolution,
            name,
            display_name,
            ValueDomain::None,
            VariableValue::Resolution { width, height },
        )
    }

    /// Create a separator with display text
    pub fn separator(display_name: impl Into<String>) -> Self {
        Self {
            kind: VariableKind::Separator,
            display_name: display_name.into(),
            ..Self::default()
        }
    }

    /// Create the end-of-sequence marker
    pub fn terminator() -> Self {
        Self::default()
    }

    /// Set description (builder pattern)
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set change timing class (builder pattern)
    pub fn with_timing(mut self, timing: ChangeTiming) -> Self {
        self.timing = timing;
        self
    }

    /// Set change callback (builder pattern)
    pub fn with_on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(VariableId, &VariableValue) + Send + Sync + 'static,
    {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn is_terminator(&self) -> bool {
        self.kind == VariableKind::Terminator
    }

    /// Check if this position holds a queryable value
    pub fn has_value(&self) -> bool {
        self.kind.has_value()
    }
}

impl std::fmt::Debug for Variable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Variable")
            .field("kind", &self.kind)
            .field("timing", &self.timing)
            .field("name", &self.name)
            .field("display_name", &self.display_name)
            .field("description", &self.description)
            .field("domain", &self.domain)
            .field("initial", &self.initial)
            .field("on_change", &self.on_change.is_some())
            .finish()
    }
}

/// Active prefix of a sequence
///
/// Sequences end at the first terminator. A slice without one ends at its
/// last element.
pub fn active_prefix(sequence: &[Variable]) -> &[Variable] {
    let end = sequence
        .iter()
        .position(Variable::is_terminator)
        .unwrap_or(sequence.len());
    &sequence[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let var = Variable::int("frameskip", "Frame skip", 0, 10, 5)
            .with_description("Frames to skip")
            .with_timing(ChangeTiming::Delayed)
            .with_on_change(|_, _| {});

        assert_eq!(var.kind, VariableKind::Int);
        assert_eq!(var.domain, ValueDomain::Int { low: 0, high: 10 });
        assert_eq!(var.initial, Some(VariableValue::Int(5)));
        assert_eq!(var.timing, ChangeTiming::Delayed);
        assert!(var.on_change.is_some());
    }

    #[test]
    fn test_separator_and_terminator_have_no_payload() {
        let sep = Variable::separator("Video");
        assert!(!sep.has_value());
        assert!(sep.domain.is_none());
        assert!(sep.initial.is_none());
        assert!(Variable::terminator().is_terminator());
    }

    #[test]
    fn test_active_prefix_stops_at_first_terminator() {
        let seq = vec![
            Variable::boolean("a", "A", true),
            Variable::terminator(),
            Variable::boolean("b", "B", true),
        ];
        assert_eq!(active_prefix(&seq).len(), 1);
        assert_eq!(active_prefix(&seq[..1]).len(), 1);
        assert!(active_prefix(&[]).is_empty());
    }

    #[test]
    fn test_declaration_serializes_without_callback() {
        let var = Variable::enumeration("palette", "Palette", ["Gray", "Green"], 1)
            .with_on_change(|_, _| {});
        let json = serde_json::to_string(&var).unwrap();
        let parsed: Variable = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.name, "palette");
        assert_eq!(parsed.domain, var.domain);
        assert_eq!(parsed.initial, Some(VariableValue::Enum(1)));
        assert!(parsed.on_change.is_none());
    }
}
