//! # Ordered lifecycle states.
//!
//! [`Stage`] is the contract a host's state type must satisfy: a finite,
//! totally ordered set whose members can be enumerated in ascending order.
//! [`LifecycleState`] is the ready-made five-step lifecycle most hosts use.
//!
//! ```text
//! Destroyed < Initialized < Created < Started < Resumed
//! ```

use std::fmt;

/// Finite, totally ordered state enumeration observed by the gate.
///
/// `ALL` must list every state exactly once in ascending order; the first
/// element is the floor. Every state is at or above it, so replay always
/// starts with `Up(floor)`.
pub trait Stage: Copy + Ord + fmt::Debug + Send + Sync + 'static {
    /// Every state, ascending.
    const ALL: &'static [Self];

    /// Returns `true` for a state after which the host stops emitting.
    fn is_terminal(self) -> bool {
        false
    }

    /// The lowest state (`ALL[0]`).
    fn floor() -> Self {
        Self::ALL[0]
    }
}

/// Five-step lifecycle of a screen-like host component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
    /// Terminal state; no further transitions are delivered.
    Destroyed,
    /// Constructed but not yet created.
    #[default]
    Initialized,
    /// Created, not visible.
    Created,
    /// Visible.
    Started,
    /// Visible and focused.
    Resumed,
}

impl Stage for LifecycleState {
    const ALL: &'static [Self] = &[
        LifecycleState::Destroyed,
        LifecycleState::Initialized,
        LifecycleState::Created,
        LifecycleState::Started,
        LifecycleState::Resumed,
    ];

    fn is_terminal(self) -> bool {
        matches!(self, LifecycleState::Destroyed)
    }
}

impl LifecycleState {
    /// Returns `true` when `self >= threshold`.
    #[inline]
    pub fn is_at_least(self, threshold: LifecycleState) -> bool {
        self >= threshold
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Destroyed => "DESTROYED",
            LifecycleState::Initialized => "INITIALIZED",
            LifecycleState::Created => "CREATED",
            LifecycleState::Started => "STARTED",
            LifecycleState::Resumed => "RESUMED",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_is_ascending() {
        let all = LifecycleState::ALL;
        assert!(all.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(LifecycleState::floor(), LifecycleState::Destroyed);
    }

    #[test]
    fn test_only_destroyed_is_terminal() {
        for s in LifecycleState::ALL {
            assert_eq!(s.is_terminal(), *s == LifecycleState::Destroyed, "{s}");
        }
    }

    #[test]
    fn test_is_at_least() {
        assert!(LifecycleState::Resumed.is_at_least(LifecycleState::Started));
        assert!(LifecycleState::Started.is_at_least(LifecycleState::Started));
        assert!(!LifecycleState::Created.is_at_least(LifecycleState::Started));
    }
}
