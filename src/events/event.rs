//! # Diagnostic events emitted by the gate primitives.
//!
//! The [`EventKind`] enum classifies events across four groups:
//! - **Subscription events**: observer registration against the host and its teardown
//! - **Race events**: racer start, winner, cancelled losers
//! - **Gate events**: per-invocation state machine transitions
//! - **Subscriber events**: fan-out overflow and panics
//!
//! The [`Event`] struct carries optional metadata (threshold, subscription id,
//! racer name, round, reason) set depending on the kind.
//!
//! ## Ordering guarantees
//! Each event has a process-wide sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use stategate::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::RacerWon)
//!     .with_racer("action")
//!     .with_index(1);
//!
//! assert_eq!(ev.kind, EventKind::RacerWon);
//! assert_eq!(ev.racer.as_deref(), Some("action"));
//! assert_eq!(ev.index, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::lifecycle::SubscriptionId;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of diagnostic events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Subscription events ===
    /// Observer registered against the host.
    ///
    /// Sets:
    /// - `subscription`: id returned by the host
    /// - `reason`: expected sequence, e.g. `[up(Started), down(Started)]`
    SubscriptionOpened,

    /// Observer unregistered (sequence completed, failed, or cancelled).
    ///
    /// Sets:
    /// - `subscription`
    SubscriptionClosed,

    /// Host refused to unregister; teardown continued anyway.
    ///
    /// Sets:
    /// - `subscription`
    /// - `reason`: host error message
    UnsubscribeFailed,

    /// Every expected crossing was observed in order.
    ///
    /// Sets:
    /// - `subscription`
    SequenceCompleted,

    // === Race events ===
    /// A race polled its racers for the first time.
    ///
    /// Sets:
    /// - `reason`: `racers=N`
    RaceStarted,

    /// First racer to complete.
    ///
    /// Sets:
    /// - `racer`, `index`
    RacerWon,

    /// Losing racer acknowledged cancellation (its body was dropped).
    ///
    /// Sets:
    /// - `racer`, `index`
    RacerCancelled,

    /// The race itself was cancelled by its parent context.
    RaceCancelled,

    // === Gate events ===
    /// A gated invocation subscribed and waits for the threshold.
    ///
    /// Sets:
    /// - `state`: threshold
    GateArmed,

    /// Threshold reached; the action is running.
    ///
    /// Sets:
    /// - `state`: threshold
    ActionStarted,

    /// Action ran to completion while the threshold held.
    ///
    /// Sets:
    /// - `state`: threshold
    ActionCompleted,

    /// State fell below the threshold; the action (if started) was cancelled.
    ///
    /// Sets:
    /// - `state`: threshold
    ActionCancelled,

    /// A new round of `repeat_while_at_least` was armed.
    ///
    /// Sets:
    /// - `state`: threshold
    /// - `round`: 1-based round number
    RoundStarted,

    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `racer`: subscriber name
    /// - `reason`: panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `racer`: subscriber name
    /// - `reason`: `full` or `closed`
    SubscriberOverflow,
}

/// Diagnostic event with optional metadata.
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Threshold state, rendered with `Debug`.
    pub state: Option<Arc<str>>,
    /// Host subscription id.
    pub subscription: Option<u64>,
    /// Racer (or subscriber) name.
    pub racer: Option<Arc<str>>,
    /// Racer index within its race.
    pub index: Option<u32>,
    /// Round number for repeated gating.
    pub round: Option<u64>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            state: None,
            subscription: None,
            racer: None,
            index: None,
            round: None,
            reason: None,
        }
    }

    /// Attaches a threshold state label.
    #[inline]
    pub fn with_state(mut self, state: impl Into<Arc<str>>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Attaches a host subscription id.
    #[inline]
    pub fn with_subscription(mut self, id: SubscriptionId) -> Self {
        self.subscription = Some(id.get());
        self
    }

    /// Attaches a racer or subscriber name.
    #[inline]
    pub fn with_racer(mut self, name: impl Into<Arc<str>>) -> Self {
        self.racer = Some(name.into());
        self
    }

    /// Attaches a racer index (saturates at `u32::MAX`).
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(u32::try_from(index).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a round number.
    #[inline]
    pub fn with_round(mut self, round: u64) -> Self {
        self.round = Some(round);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_racer(subscriber)
            .with_reason(reason)
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_racer(subscriber)
            .with_reason(info)
    }
}
