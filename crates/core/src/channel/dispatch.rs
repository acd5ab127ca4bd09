//! Change notification dispatch
//!
//! Callbacks always run with the channel lock released, so a core may query,
//! edit or re-declare from inside its own notification. Per position, at
//! most one callback runs at a time: edits that arrive while one is in
//! flight are queued on the slot and delivered in order by the dispatcher
//! that is already running.

use std::collections::VecDeque;

use retrovars_sdk::VariableId;

use super::Channel;
use crate::variables::{OnChange, Variable, VariableValue};

/// Per-position state held by the channel
pub(super) struct Slot {
    pub variable: Variable,
    /// None for separators
    pub current: Option<VariableValue>,
    /// Unique per slot creation; a re-created position gets a new epoch
    pub epoch: u64,
    /// A callback for this position is running
    pub dispatching: bool,
    /// Values waiting for the running callback to return
    pub pending: VecDeque<VariableValue>,
}

impl Slot {
    pub fn new(variable: Variable, current: Option<VariableValue>, epoch: u64) -> Self {
        Self {
            variable,
            current,
            epoch,
            dispatching: false,
            pending: VecDeque::new(),
        }
    }

    /// Queue a notification for `value`
    ///
    /// Returns the callback to invoke now if no dispatch is in flight.
    /// Must be called with the channel lock held.
    pub fn schedule(&mut self, value: VariableValue) -> Option<(OnChange, u64)> {
        let callback = self.variable.on_change.clone()?;
        if self.dispatching {
            self.pending.push_back(value);
            return None;
        }
        self.dispatching = true;
        Some((callback, self.epoch))
    }
}

/// Clears the in-flight flag if a callback unwinds
struct InFlight<'a> {
    channel: &'a Channel,
    id: VariableId,
    epoch: u64,
    armed: bool,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.channel.state.lock();
        if let Some(slot) = state.slot_mut(self.id).filter(|slot| slot.epoch == self.epoch) {
            slot.dispatching = false;
            slot.pending.clear();
        }
        tracing::warn!("Change callback for variable {} unwound", self.id);
    }
}

/// Invoke `callback`, then drain anything queued behind it
///
/// Stops when the queue is empty, or when the position was dropped or
/// re-created by a re-declaration made from inside a callback.
pub(super) fn deliver(
    channel: &Channel,
    id: VariableId,
    epoch: u64,
    mut callback: OnChange,
    mut value: VariableValue,
) {
    let mut guard = InFlight {
        channel,
        id,
        epoch,
        armed: true,
    };

    loop {
        callback(id, &value);

        let mut state = channel.state.lock();
        let Some(slot) = state.slot_mut(id).filter(|slot| slot.epoch == epoch) else {
            guard.armed = false;
            return;
        };

        match (slot.pending.pop_front(), slot.variable.on_change.clone()) {
            (Some(next), Some(next_callback)) => {
                value = next;
                callback = next_callback;
            }
            _ => {
                slot.pending.clear();
                slot.dispatching = false;
                guard.armed = false;
                return;
            }
        }
    }
}
