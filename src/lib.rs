//! # stategate
//!
//! **stategate** runs async work only while a lifecycle-bearing host sits at or
//! above a threshold state, and cancels that work the instant the state drops.
//!
//! It is built from three primitives:
//! - [`await_sequence`]: wait for an ordered sequence of state crossings;
//! - [`race`]: run racers concurrently, first completion wins, losers are cancelled and drained;
//! - [`Gate::run_while_at_least`]: the two composed into a race-free gated action.
//!
//! ## Architecture
//! ```text
//!   ┌────────────────────────┐   subscribe / unsubscribe   ┌───────────────────────┐
//!   │  LifecycleHost         │◄────────────────────────────│  await_sequence       │
//!   │  (LifecycleRegistry)   │──── Crossing (Up / Down) ──►│  (one per racer)      │
//!   └────────────────────────┘   replays Up on subscribe   └──────────┬────────────┘
//!                                                                     ▼
//!   ┌─────────────────────────────────────────────────────────────────────────────┐
//!   │  Gate::run_while_at_least(t, action)                                        │
//!   │    race(token, [ regress: Up(t),Down(t) → Cancelled                         │
//!   │                  action:  Up(t) ; action(ctx) → Completed ])                │
//!   └──────────────────────────────────┬──────────────────────────────────────────┘
//!                                      │ publish(Event)
//!                                      ▼
//!                        Bus (broadcast) ──► SubscriberSet ──► LogWriter / custom
//! ```
//!
//! ## Crossings
//! Moving from `from` to `to` emits `Up(s)` for every `from < s <= to` in ascending
//! order, or `Down(s)` for every `to < s <= from` in descending order. A newly
//! subscribed observer first receives `Up(s)` for every state already held,
//! the lowest state included.
//!
//! ## Optional features
//! - `logging` _(default)_: exports [`LogWriter`], a subscriber emitting `tracing` records.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use stategate::{Config, Gate, GateOutcome, LifecycleRegistry, LifecycleState};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let screen = Arc::new(LifecycleRegistry::new(LifecycleState::Created));
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn stategate::Subscribe>> = vec![Arc::new(stategate::LogWriter)];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn stategate::Subscribe>> = Vec::new();
//!
//!     let gate = Gate::builder(Arc::clone(&screen), Config::default())
//!         .with_subscribers(subs)
//!         .build();
//!
//!     let driver = Arc::clone(&screen);
//!     tokio::spawn(async move {
//!         let _ = driver.set_state(LifecycleState::Started);
//!     });
//!
//!     let outcome = gate
//!         .run_while_at_least(LifecycleState::Started, |_ctx| async {
//!             println!("visible");
//!         })
//!         .await?;
//!
//!     assert_eq!(outcome, GateOutcome::Completed);
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod lifecycle;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use core::{Config, Gate, GateBuilder, GateOutcome, Won, await_sequence, race};
pub use error::{GateError, HostError};
pub use events::{Bus, Event, EventKind};
pub use lifecycle::{
    Crossing, Direction, LifecycleHost, LifecycleRegistry, LifecycleState, Observer, Stage,
    SubscriptionId, between, held,
};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::Racer;

// Optional: built-in subscriber emitting `tracing` records.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
