//! Lifecycle model: ordered states, crossings, and the host contract.
//!
//! ## Contents
//! - [`Stage`], [`LifecycleState`] ordered state enumeration
//! - [`Crossing`], [`Direction`] threshold-crossing notifications
//! - [`LifecycleHost`] what the gate consumes (subscribe / unsubscribe with replay)
//! - [`LifecycleRegistry`] in-process host implementation

mod crossing;
mod host;
mod registry;
mod state;

pub use crossing::{Crossing, Direction, between, held};
pub use host::{LifecycleHost, Observer, SubscriptionId};
pub use registry::LifecycleRegistry;
pub use state::{LifecycleState, Stage};
