//! # Gate configuration.
//!
//! Provides [`Config`], the settings shared by every invocation of a [`Gate`](crate::Gate).
//!
//! ## Sentinel values
//! - `max_rounds = 0` → unlimited rounds for `repeat_while_at_least`
//! - `bus_capacity = 0` → clamped to 1 by the bus

/// Configuration for a [`Gate`](crate::Gate).
///
/// ## Field semantics
/// - `bus_capacity`: diagnostics ring buffer size (min 1; clamped by Bus)
/// - `max_rounds`: round cap for repeated gating (`0` = unlimited)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Capacity of the diagnostics broadcast channel.
    ///
    /// Receivers lagging more than `bus_capacity` events get `Lagged` and
    /// skip older items.
    pub bus_capacity: usize,

    /// Maximum number of rounds run by `repeat_while_at_least`.
    ///
    /// - `0` = unlimited (runs until cancelled or the host closes)
    /// - `n > 0` = stop after `n` rounds
    pub max_rounds: u64,
}

impl Config {
    /// Returns the round cap as an `Option`.
    #[inline]
    pub fn round_limit(&self) -> Option<u64> {
        if self.max_rounds == 0 {
            None
        } else {
            Some(self.max_rounds)
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// - `bus_capacity = 1024`
    /// - `max_rounds = 0` (unlimited)
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            max_rounds: 0,
        }
    }
}
