//! Error types used by the gate primitives and lifecycle hosts.
//!
//! This module defines two enums:
//!
//! - [`GateError`]: errors surfaced by `await_sequence`, `race` and [`Gate`](crate::Gate).
//! - [`HostError`]: teardown/mutation failures reported by a [`LifecycleHost`](crate::LifecycleHost).
//!
//! Both types provide `as_label` (stable snake_case label for logs/metrics) and `as_message`.
//!
//! A state regression that cancels the gated action is **not** an error; it is
//! reported as [`GateOutcome::Cancelled`](crate::GateOutcome::Cancelled).

use thiserror::Error;

use crate::lifecycle::SubscriptionId;

/// # Errors produced by the gate primitives.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    /// `race` was called without racers (programming error).
    #[error("race requires at least one racer")]
    NoRacers,

    /// `await_sequence` was called with an empty expectation (programming error).
    #[error("expected event sequence is empty")]
    EmptySequence,

    /// The enclosing context was cancelled.
    #[error("context cancelled")]
    Cancelled,

    /// The host dropped the observer while an await was pending.
    #[error("host notification stream closed")]
    HostClosed,
}

impl GateError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use stategate::GateError;
    ///
    /// assert_eq!(GateError::NoRacers.as_label(), "gate_no_racers");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            GateError::NoRacers => "gate_no_racers",
            GateError::EmptySequence => "gate_empty_sequence",
            GateError::Cancelled => "gate_cancelled",
            GateError::HostClosed => "gate_host_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            GateError::NoRacers => "no racers supplied".to_string(),
            GateError::EmptySequence => "no expected events supplied".to_string(),
            GateError::Cancelled => "context cancelled".to_string(),
            GateError::HostClosed => "host stopped delivering notifications".to_string(),
        }
    }

    /// Indicates whether the error is a cancellation rather than a failure.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, GateError::Cancelled)
    }

    /// Indicates a misuse of the API (bad arguments), as opposed to a runtime condition.
    pub fn is_programming_error(&self) -> bool {
        matches!(self, GateError::NoRacers | GateError::EmptySequence)
    }
}

/// # Errors produced by a lifecycle host.
///
/// Teardown failures are never returned from an await; they are published as
/// [`EventKind::UnsubscribeFailed`](crate::EventKind::UnsubscribeFailed).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The subscription is not (or no longer) registered.
    #[error("unknown subscription {id}")]
    UnknownSubscription {
        /// The offending subscription.
        id: SubscriptionId,
    },

    /// The host reached a terminal state or was closed.
    #[error("host closed")]
    Closed,
}

impl HostError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HostError::UnknownSubscription { .. } => "host_unknown_subscription",
            HostError::Closed => "host_closed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HostError::UnknownSubscription { id } => format!("subscription {id} not registered"),
            HostError::Closed => "host closed".to_string(),
        }
    }
}
