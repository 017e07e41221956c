//! # Host collaborator contract.
//!
//! The gate never owns lifecycle state; it observes a [`LifecycleHost`].
//!
//! ## Rules
//! - `subscribe` must **replay**: before returning, the observer receives
//!   `Up(s)` for every state the host currently satisfies (ascending).
//! - Later transitions are delivered in emission order.
//! - `unsubscribe` must be callable from inside an observer callback.
//! - Dropping an observer without an `unsubscribe` call means the host will
//!   never deliver to it again (the gate treats this as "host closed").

use std::fmt;

use crate::error::HostError;

use super::crossing::Crossing;
use super::state::Stage;

/// Callback registered against a host.
pub type Observer<S> = Box<dyn Fn(Crossing<S>) + Send + Sync + 'static>;

/// Opaque handle of one registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub(crate) u64);

impl SubscriptionId {
    /// Raw numeric value (used in diagnostics).
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source of lifecycle crossings.
pub trait LifecycleHost: Send + Sync + 'static {
    /// Ordered state type of this host.
    type State: Stage;

    /// Current state snapshot.
    fn current_state(&self) -> Self::State;

    /// Registers `observer`, replaying up-crossings for the current state.
    fn subscribe(&self, observer: Observer<Self::State>) -> SubscriptionId;

    /// Unregisters a previously returned subscription.
    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), HostError>;
}
