//! Gating core: sequence awaiting, racing, and the state-gated runner.
//!
//! Internal modules:
//! - [`awaiter`]: waits for an ordered sequence of host crossings;
//! - [`race`]: runs racers concurrently, first completion wins, losers are drained;
//! - [`gate`]: composes both into `run_while_at_least`;
//! - [`builder`]: assembles a gate with subscribers and a parent token;
//! - [`config`]: gate-wide settings.

mod awaiter;
mod builder;
mod config;
mod gate;
mod race;

pub use awaiter::await_sequence;
pub use builder::GateBuilder;
pub use config::Config;
pub use gate::{Gate, GateOutcome};
pub use race::{Won, race};
