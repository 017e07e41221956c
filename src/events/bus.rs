//! # Diagnostics bus.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]: the
//! out-of-band channel every primitive reports on (subscriptions, races,
//! gate transitions, teardown failures).
//!
//! ## Architecture
//! ```text
//! Publishers (many):                    Consumers:
//!   await_sequence ──┐
//!   race           ──┼──► Bus ──┬──► Gate listener ──► SubscriberSet
//!   Gate           ──┘ (broadcast)└──► bus.subscribe() (tests, callers)
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails; with no receivers the event is dropped.
//! - Capacity is shared by all receivers; a lagging receiver sees `RecvError::Lagged(n)`.
//! - Publishing is the only thing primitives do on teardown failure.

use tokio::sync::broadcast;

use super::event::Event;

/// Broadcast channel for diagnostic events.
///
/// Cheap to clone (`Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus; capacity is clamped to a minimum of 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all current receivers.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver for events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Number of live receivers.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Bus {
    fn default() -> Self {
        Self::new(crate::Config::default().bus_capacity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn test_publish_reaches_receiver() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        bus.publish(Event::new(EventKind::GateArmed).with_state("Started"));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, EventKind::GateArmed);
        assert_eq!(ev.state.as_deref(), Some("Started"));
    }

    #[test]
    fn test_publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        assert_eq!(bus.receiver_count(), 0);
        bus.publish(Event::new(EventKind::RaceStarted));
    }
}
