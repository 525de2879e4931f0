//! Wallet notifications and observers
//!
//! Every successful state change produces one or more [`WalletEvent`]s which
//! the wallet hands to its [`EventSink`]. Failed operations emit nothing.

use crate::crypto::Address;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default number of events buffered per broadcast subscriber
pub const BROADCAST_CAPACITY: usize = 100;

/// Notifications emitted by the wallet
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum WalletEvent {
    /// A proposal was appended to the ledger
    Submission {
        submitter: Address,
        index: u64,
        destination: Address,
        value: u128,
        #[serde(with = "crate::multisig::proposal::hex_bytes")]
        data: Vec<u8>,
    },
    /// An owner confirmed a proposal
    Confirmation { owner: Address, index: u64 },
    /// An owner withdrew a confirmation
    Revocation { owner: Address, index: u64 },
    /// A proposal was executed
    Execution { executor: Address, index: u64 },
    /// An owner joined the registry
    OwnerAdded { owner: Address },
    /// An owner left the registry
    OwnerRemoved { owner: Address },
    /// The quorum threshold changed
    QuorumChanged { quorum: u32 },
    /// Value was received without a call
    Deposit {
        sender: Address,
        amount: u128,
        balance: u128,
    },
}

impl WalletEvent {
    /// Short event name, used for logging
    pub fn name(&self) -> &'static str {
        match self {
            WalletEvent::Submission { .. } => "submission",
            WalletEvent::Confirmation { .. } => "confirmation",
            WalletEvent::Revocation { .. } => "revocation",
            WalletEvent::Execution { .. } => "execution",
            WalletEvent::OwnerAdded { .. } => "owner_added",
            WalletEvent::OwnerRemoved { .. } => "owner_removed",
            WalletEvent::QuorumChanged { .. } => "quorum_changed",
            WalletEvent::Deposit { .. } => "deposit",
        }
    }

    /// Proposal index this event refers to, if any
    pub fn index(&self) -> Option<u64> {
        match self {
            WalletEvent::Submission { index, .. }
            | WalletEvent::Confirmation { index, .. }
            | WalletEvent::Revocation { index, .. }
            | WalletEvent::Execution { index, .. } => Some(*index),
            _ => None,
        }
    }
}

/// Observer of wallet notifications
pub trait EventSink {
    fn emit(&self, event: &WalletEvent);
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn emit(&self, event: &WalletEvent) {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn emit(&self, event: &WalletEvent) {
        (**self).emit(event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn emit(&self, event: &WalletEvent) {
        (**self).emit(event)
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &WalletEvent) {}
}

/// Writes events to the `log` facade at info level
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &WalletEvent) {
        log::info!("wallet event {}: {:?}", event.name(), event);
    }
}

/// In-memory, append-only event history
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<WalletEvent>>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from previously recorded events
    pub fn with_events(events: Vec<WalletEvent>) -> Self {
        Self {
            events: Mutex::new(events),
        }
    }

    /// Copy of all recorded events, oldest first
    pub fn events(&self) -> Vec<WalletEvent> {
        self.events.lock().clone()
    }

    /// Events that refer to a given proposal
    pub fn for_transaction(&self, index: u64) -> Vec<WalletEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.index() == Some(index))
            .cloned()
            .collect()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Drain all recorded events
    pub fn take(&self) -> Vec<WalletEvent> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: &WalletEvent) {
        self.events.lock().push(event.clone());
    }
}

/// Fans events out to any number of subscribers
#[derive(Debug)]
pub struct BroadcastSink {
    sender: broadcast::Sender<WalletEvent>,
}

impl BroadcastSink {
    /// Create a new broadcaster
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CAPACITY)
    }

    /// Create a broadcaster with a custom per-subscriber buffer
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.sender.subscribe()
    }

    /// Get the number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for BroadcastSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for BroadcastSink {
    fn emit(&self, event: &WalletEvent) {
        // Ignore send errors (no subscribers)
        let _ = self.sender.send(event.clone());
    }
}

/// Forwards each event to two sinks
#[derive(Debug, Default)]
pub struct Tee<A, B>(pub A, pub B);

impl<A: EventSink, B: EventSink> EventSink for Tee<A, B> {
    fn emit(&self, event: &WalletEvent) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_seed(b"owner")
    }

    #[test]
    fn test_event_log_records_in_order() {
        let log = EventLog::new();
        log.emit(&WalletEvent::Confirmation {
            owner: owner(),
            index: 0,
        });
        log.emit(&WalletEvent::QuorumChanged { quorum: 2 });
        log.emit(&WalletEvent::Revocation {
            owner: owner(),
            index: 0,
        });

        assert_eq!(log.len(), 3);
        assert_eq!(log.for_transaction(0).len(), 2);
        assert_eq!(log.events()[1], WalletEvent::QuorumChanged { quorum: 2 });

        let drained = log.take();
        assert_eq!(drained.len(), 3);
        assert!(log.is_empty());
    }

    #[test]
    fn test_broadcast_sink_delivers_to_subscribers() {
        let sink = BroadcastSink::new();
        let mut rx = sink.subscribe();
        assert_eq!(sink.subscriber_count(), 1);

        let event = WalletEvent::Execution {
            executor: owner(),
            index: 7,
        };
        sink.emit(&event);

        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_broadcast_without_subscribers_is_ignored() {
        let sink = BroadcastSink::new();
        sink.emit(&WalletEvent::QuorumChanged { quorum: 1 });
        assert_eq!(sink.subscriber_count(), 0);
    }

    #[test]
    fn test_tee_forwards_to_both() {
        let tee = Tee(EventLog::new(), EventLog::new());
        tee.emit(&WalletEvent::OwnerAdded { owner: owner() });
        assert_eq!(tee.0.len(), 1);
        assert_eq!(tee.1.len(), 1);
    }

    #[test]
    fn test_event_json_shape() {
        let event = WalletEvent::Submission {
            submitter: owner(),
            index: 0,
            destination: Address::from_seed(b"dest"),
            value: 10,
            data: vec![0xde, 0xad],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Submission");
        assert_eq!(json["data"]["data"], "dead");

        let back: WalletEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
