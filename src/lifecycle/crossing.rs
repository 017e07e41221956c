//! # Threshold crossings emitted by a lifecycle host.
//!
//! A [`Crossing`] says that the host state rose to a state (`Up`) or fell
//! below it (`Down`). A single transition may cross several states; the
//! host emits one crossing per state passed, in the order they were passed:
//!
//! ```text
//! Created ──► Resumed   : Up(Started), Up(Resumed)
//! Resumed ──► Created   : Down(Resumed), Down(Started)
//! Started ──► Started   : (nothing)
//! subscribe at Created  : Up(Destroyed), Up(Initialized), Up(Created)
//! ```

use std::fmt;

use super::state::Stage;

/// Direction of a crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The state rose to (or was already at) the crossed state.
    Up,
    /// The state fell below the crossed state.
    Down,
}

/// A single threshold crossing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crossing<S> {
    /// Up or down.
    pub direction: Direction,
    /// The state that was crossed.
    pub state: S,
}

impl<S> Crossing<S> {
    /// State rose to `state`.
    #[inline]
    pub const fn up(state: S) -> Self {
        Self {
            direction: Direction::Up,
            state,
        }
    }

    /// State fell below `state`.
    #[inline]
    pub const fn down(state: S) -> Self {
        Self {
            direction: Direction::Down,
            state,
        }
    }
}

impl<S: fmt::Debug> fmt::Display for Crossing<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Direction::Up => write!(f, "up({:?})", self.state),
            Direction::Down => write!(f, "down({:?})", self.state),
        }
    }
}

/// Returns the crossings produced by moving from `from` to `to`.
///
/// Rising yields `Up(s)` for every `from < s <= to`, ascending.
/// Falling yields `Down(s)` for every `to < s <= from`, descending.
pub fn between<S: Stage>(from: S, to: S) -> Vec<Crossing<S>> {
    if to > from {
        S::ALL
            .iter()
            .copied()
            .filter(|s| *s > from && *s <= to)
            .map(Crossing::up)
            .collect()
    } else {
        S::ALL
            .iter()
            .rev()
            .copied()
            .filter(|s| *s > to && *s <= from)
            .map(Crossing::down)
            .collect()
    }
}

/// Returns the up-crossings replayed to a new observer of a host at `state`.
///
/// Yields `Up(s)` for every `s <= state`, ascending, floor included: a host
/// at any state already satisfies the lowest threshold.
pub fn held<S: Stage>(state: S) -> Vec<Crossing<S>> {
    S::ALL
        .iter()
        .copied()
        .filter(|s| *s <= state)
        .map(Crossing::up)
        .collect()
}
