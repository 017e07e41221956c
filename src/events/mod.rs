//! Diagnostic events: types and broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `await_sequence`, `race`, `Gate`, `SubscriberSet` workers (overflow/panic).
//! - **Consumers**: the `Gate` listener (fans out to `SubscriberSet`) and any
//!   caller holding `Bus::subscribe()`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
