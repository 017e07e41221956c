//! # Event subscribers.
//!
//! [`Subscribe`] implementors receive every [`Event`](crate::Event) published on a
//! gate's [`Bus`](crate::events::Bus) through a [`SubscriberSet`].
//!
//! ```text
//! await_sequence / race / Gate ── publish ──► Bus ──► listener ──► SubscriberSet
//!                                                                   ├──► LogWriter (tracing)
//!                                                                   └──► custom ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod subscriber;
mod subscriber_set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use subscriber::Subscribe;
pub use subscriber_set::SubscriberSet;
