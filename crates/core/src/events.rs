//! Event System
//!
//! Provides a pub/sub event bus so observers can follow lifecycle
//! forwarding and permission bookkeeping without touching bridge state.

use parking_lot::RwLock;
use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::trace;

use crate::lifecycle::LifecycleEvent;

/// Events emitted by the activity shim and the permission bridge
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A lifecycle callback was forwarded to the lifecycle bridge
    Lifecycle(LifecycleEvent),
    /// A permission was already granted; the handle was invoked synchronously
    PermissionGrantedImmediately { permission: String, handle: u64 },
    /// A prompt was issued and the handle is now pending
    PermissionRequested { permission: String, handle: u64 },
    /// A pending handle was replaced by a newer request and dropped
    RequestSuperseded { permission: String, dropped: u64, replacement: u64 },
    /// A pending handle was consumed by a host result
    PermissionResolved { permission: String, handle: u64, granted: bool },
    /// A host result arrived with no pending request for it
    StaleResult { permission: String, granted: bool },
    /// The activity was destroyed
    Shutdown,
}

/// Subscriber handle for receiving events
#[derive(Clone)]
pub struct EventSubscription {
    receiver: Receiver<Event>,
}

impl EventSubscription {
    /// Receive the next event (blocking)
    pub fn recv(&self) -> Result<Event, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv(&self) -> Result<Event, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain every event currently queued
    pub fn drain(&self) -> Vec<Event> {
        self.receiver.try_iter().collect()
    }
}

/// Event bus for publish/subscribe pattern
pub struct EventBus {
    subscribers: RwLock<Vec<Sender<Event>>>,
}

impl EventBus {
    /// Create a new event bus
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> EventSubscription {
        let (sender, receiver) = unbounded();
        self.subscribers.write().push(sender);
        EventSubscription { receiver }
    }

    /// Emit an event to all subscribers
    pub fn emit(&self, event: Event) -> usize {
        let subscribers = self.subscribers.read();
        let mut delivered = 0;

        for sender in subscribers.iter() {
            if sender.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }

        trace!("Event {:?} delivered to {} subscribers", event, delivered);
        delivered
    }

    /// Get the number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
