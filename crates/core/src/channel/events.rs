//! Channel event stream
//!
//! Lets an external collaborator (typically a settings UI) follow what the
//! channel does without polling. Each subscriber gets its own bounded queue;
//! sending never blocks the channel.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use retrovars_sdk::VariableId;

use crate::variables::VariableValue;

/// Something that happened on a channel
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A sequence was accepted; `active` positions are now declared
    Declared { active: usize },
    /// A re-declaration released this position
    Dropped { id: VariableId },
    /// A position took a new current value
    ValueChanged { id: VariableId, value: VariableValue },
    /// All positions were released
    TornDown,
}

/// Fan-out of events to every live subscriber
pub(super) struct EventBus {
    capacity: usize,
    subscribers: Mutex<Vec<Sender<ChannelEvent>>>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            // A zero-capacity channel would only deliver to a receiver already waiting
            capacity: capacity.max(1),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self) -> Receiver<ChannelEvent> {
        let (sender, receiver) = bounded(self.capacity);
        self.subscribers.lock().push(sender);
        receiver
    }

    pub fn emit(&self, event: ChannelEvent) {
        let mut subscribers = self.subscribers.lock();
        if subscribers.is_empty() {
            return;
        }

        subscribers.retain(|sender| match sender.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!("Event subscriber queue full, dropping {:?}", event);
                true
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
