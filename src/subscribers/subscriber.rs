//! # Diagnostics subscriber trait.
//!
//! [`Subscribe`] is how applications observe a [`Gate`](crate::Gate): every
//! subscription, race, and gated action is published as an [`Event`] and
//! delivered to each subscriber on its own worker.
//!
//! ```text
//! Bus ──► SubscriberSet::emit ──► [bounded queue] ──► worker ──► on_event()
//!                                                        └─► panic → SubscriberPanicked
//! ```
//!
//! A full queue drops the event for that subscriber only and publishes
//! `SubscriberOverflow`. Delivery is FIFO per subscriber.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use stategate::{Event, EventKind, Subscribe};
//!
//! struct Recorder;
//!
//! #[async_trait]
//! impl Subscribe for Recorder {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::ActionCancelled {
//!             // flush partial output, etc.
//!         }
//!     }
//!
//!     fn name(&self) -> &'static str { "recorder" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receives gate diagnostics.
///
/// Handlers run on a dedicated worker, never in the publisher's context, so
/// a slow handler only backs up its own queue. Handle errors internally.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Processes one event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow and panic events.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred queue capacity (clamped to at least 1). Default: 256.
    fn queue_capacity(&self) -> usize {
        256
    }
}
