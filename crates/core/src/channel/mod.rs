//! Negotiation channel (frontend side)
//!
//! The channel is the single source of truth for current values once a
//! sequence is declared. It accepts declarations, answers point queries,
//! and routes edits made through the frontend back to the core.
//!
//! # Example
//!
//! ```ignore
//! use retrovars_core::{Channel, Variable, VariableValue};
//!
//! let channel = Channel::new();
//! channel.accept(&[
//!     Variable::boolean("colorize", "Colorize", false)
//!         .with_on_change(|id, value| tracing::info!("{} -> {}", id, value)),
//!     Variable::terminator(),
//! ])?;
//!
//! assert_eq!(channel.get(0)?, VariableValue::Bool(false));
//! channel.set_value(0, VariableValue::Bool(true))?; // fires on_change
//! ```
//!
//! # Threading
//!
//! All state sits behind one mutex over the whole active sequence. The lock
//! is never held while a change callback runs.

mod dispatch;
mod events;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use retrovars_sdk::{ChangeTiming, VariableId, VariableKind};

use crate::config::{ChannelConfig, PresetValue};
use crate::error::{VariableError, VariableResult};
use crate::registry::{DeclareSummary, VariableHost};
use crate::variables::{
    active_prefix, identity_diff, validate_sequence, validate_value, ValueDomain, Variable,
    VariableValue,
};

use dispatch::Slot;
pub use events::ChannelEvent;
use events::EventBus;

/// Description of one active position, for rendering by a settings UI
#[derive(Debug, Clone, PartialEq)]
pub struct VariableInfo {
    pub id: VariableId,
    pub kind: VariableKind,
    pub timing: ChangeTiming,
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub domain: ValueDomain,
    /// None for separators
    pub current: Option<VariableValue>,
}

struct ChannelState {
    slots: Vec<Slot>,
    presets: BTreeMap<String, PresetValue>,
}

impl ChannelState {
    fn slot_mut(&mut self, id: VariableId) -> Option<&mut Slot> {
        self.slots.get_mut(id as usize)
    }

    /// Position of the value-bearing variable called `name`
    fn find(&self, name: &str) -> Option<VariableId> {
        self.slots
            .iter()
            .position(|slot| slot.variable.has_value() && slot.variable.name == name)
            .map(|index| index as VariableId)
    }
}

/// Frontend-side negotiation channel
///
/// One instance per session. Independent channels share nothing.
pub struct Channel {
    config: ChannelConfig,
    state: Mutex<ChannelState>,
    events: EventBus,
    next_epoch: AtomicU64,
}

impl Default for Channel {
    fn default() -> Self {
        Self::new()
    }
}

impl Channel {
    /// Create a channel with the default configuration
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    /// Create a channel from a configuration
    ///
    /// The configuration's presets become the channel's initial presets.
    pub fn with_config(mut config: ChannelConfig) -> Self {
        let presets = std::mem::take(&mut config.presets);
        let events = EventBus::new(config.event_capacity);
        Self {
            config,
            state: Mutex::new(ChannelState {
                slots: Vec::new(),
                presets,
            }),
            events,
            next_epoch: AtomicU64::new(1),
        }
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Store a host-supplied value for the variable called `name`
    ///
    /// Applied the next time a position with that name is newly declared.
    pub fn preset(&self, name: impl Into<String>, value: impl Into<PresetValue>) {
        self.state.lock().presets.insert(name.into(), value.into());
    }

    /// Subscribe to channel events
    pub fn subscribe(&self) -> Receiver<ChannelEvent> {
        self.events.subscribe()
    }

    /// Accept a declared sequence
    ///
    /// The sequence ends at its first terminator. Positions shared with the
    /// active sequence keep their current value; new positions are seeded
    /// from a matching preset or their initial value; positions beyond the
    /// new end are released.
    ///
    /// # Errors
    /// Any validation or identity failure. The active sequence is left
    /// untouched on error.
    pub fn accept(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        let sequence = active_prefix(sequence);
        validate_sequence(sequence)?;

        let mut seeded = Vec::new();
        let summary = {
            let mut state = self.state.lock();

            for (id, (slot, new)) in state.slots.iter().zip(sequence).enumerate() {
                if let Some(field) = identity_diff(&slot.variable, new).first() {
                    return Err(VariableError::IdentityMismatch {
                        id: id as VariableId,
                        field,
                    });
                }
            }

            let retained = state.slots.len().min(sequence.len());
            let dropped: Vec<VariableId> = (sequence.len()..state.slots.len())
                .map(|index| index as VariableId)
                .collect();
            state.slots.truncate(sequence.len());

            for (slot, new) in state.slots.iter_mut().zip(sequence) {
                slot.variable = new.clone();
            }

            let mut added = Vec::new();
            for (index, new) in sequence.iter().enumerate().skip(retained) {
                let id = index as VariableId;
                let mut current = new.initial;

                if let Some(value) = self.resolve_preset(&state.presets, id, new) {
                    current = Some(value);
                    if self.config.notify_on_accept && new.on_change.is_some() {
                        seeded.push((id, value));
                    }
                }

                let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
                state.slots.push(Slot::new(new.clone(), current, epoch));
                added.push(id);
            }

            for &id in &dropped {
                tracing::debug!("Released variable {}", id);
                self.events.emit(ChannelEvent::Dropped { id });
            }
            self.events.emit(ChannelEvent::Declared {
                active: sequence.len(),
            });

            DeclareSummary {
                active: sequence.len(),
                added,
                dropped,
            }
        };

        tracing::info!(
            "Accepted {} variables ({} new, {} released)",
            summary.active,
            summary.added.len(),
            summary.dropped.len()
        );

        for (id, value) in seeded {
            self.notify(id, value);
        }

        Ok(summary)
    }

    fn resolve_preset(
        &self,
        presets: &BTreeMap<String, PresetValue>,
        id: VariableId,
        variable: &Variable,
    ) -> Option<VariableValue> {
        if !variable.has_value() {
            return None;
        }
        let preset = presets.get(&variable.name)?;

        match preset.resolve(variable) {
            Some(value) => match validate_value(id, variable, &value) {
                Ok(()) => Some(value),
                Err(e) => {
                    tracing::warn!("Ignoring preset for '{}': {}", variable.name, e);
                    None
                }
            },
            None => {
                tracing::warn!(
                    "Ignoring preset for '{}': {:?} does not fit a {} variable",
                    variable.name,
                    preset,
                    variable.kind
                );
                None
            }
        }
    }

    /// Read the current value of a position
    ///
    /// Never triggers a change callback.
    ///
    /// # Errors
    /// `UnknownId` if `id` is not an active, value-bearing position.
    pub fn get(&self, id: VariableId) -> VariableResult<VariableValue> {
        let state = self.state.lock();
        let value = state
            .slots
            .get(id as usize)
            .and_then(|slot| slot.current)
            .ok_or(VariableError::UnknownId(id))?;

        if self.config.debug {
            tracing::trace!("Query variable {} = {}", id, value);
        }
        Ok(value)
    }

    /// Apply an edit made through the frontend
    ///
    /// On success the current value is updated first, then the position's
    /// change callback (if any) runs once with the new value. Equal values
    /// are not de-duplicated.
    ///
    /// # Errors
    /// - `UnknownId` for an inactive position or a separator
    /// - `InvalidValue` / `OutOfRange` if the value does not fit the domain;
    ///   the current value is unchanged and no callback runs
    pub fn set_value(&self, id: VariableId, value: VariableValue) -> VariableResult<()> {
        let start = {
            let mut state = self.state.lock();
            let slot = state.slot_mut(id).ok_or(VariableError::UnknownId(id))?;
            validate_value(id, &slot.variable, &value)?;

            slot.current = Some(value);
            tracing::debug!("Variable {} ({}) set to {}", id, slot.variable.name, value);
            let start = slot.schedule(value);
            self.events.emit(ChannelEvent::ValueChanged { id, value });
            start
        };

        if let Some((callback, epoch)) = start {
            dispatch::deliver(self, id, epoch, callback, value);
        }
        Ok(())
    }

    /// Apply an edit addressed by variable name
    pub fn set_value_by_name(&self, name: &str, value: VariableValue) -> VariableResult<VariableId> {
        let id = self
            .find(name)
            .ok_or_else(|| VariableError::UnknownName(name.to_string()))?;
        self.set_value(id, value)?;
        Ok(id)
    }

    /// Notify a position's callback without changing its value
    fn notify(&self, id: VariableId, value: VariableValue) {
        let start = {
            let mut state = self.state.lock();
            let Some(slot) = state.slot_mut(id) else {
                return;
            };
            let start = slot.schedule(value);
            self.events.emit(ChannelEvent::ValueChanged { id, value });
            start
        };

        if let Some((callback, epoch)) = start {
            dispatch::deliver(self, id, epoch, callback, value);
        }
    }

    /// Position of the value-bearing variable called `name`
    pub fn find(&self, name: &str) -> Option<VariableId> {
        self.state.lock().find(name)
    }

    /// Describe every active position
    pub fn descriptors(&self) -> Vec<VariableInfo> {
        let state = self.state.lock();
        state
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| VariableInfo {
                id: index as VariableId,
                kind: slot.variable.kind,
                timing: slot.variable.timing,
                name: slot.variable.name.clone(),
                display_name: slot.variable.display_name.clone(),
                description: slot.variable.description.clone(),
                domain: slot.variable.domain.clone(),
                current: slot.current,
            })
            .collect()
    }

    /// Number of active positions, separators included
    pub fn len(&self) -> usize {
        self.state.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Release every position
    ///
    /// Presets are kept. Callbacks still in flight finish but nothing queued
    /// behind them is delivered.
    pub fn teardown(&self) {
        let released = {
            let mut state = self.state.lock();
            let released = state.slots.len();
            state.slots.clear();
            self.events.emit(ChannelEvent::TornDown);
            released
        };
        tracing::info!("Channel torn down ({} variables released)", released);
    }
}

impl VariableHost for Channel {
    fn accept(&self, sequence: &[Variable]) -> VariableResult<DeclareSummary> {
        Channel::accept(self, sequence)
    }

    fn get(&self, id: VariableId) -> VariableResult<VariableValue> {
        Channel::get(self, id)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("config", &self.config)
            .field("active", &self.len())
            .field("subscribers", &self.events.subscriber_count())
            .finish()
    }
}
