//! # LogWriter: gate events as `tracing` records.
//!
//! Install any `tracing` subscriber (e.g. `tracing-subscriber` with `EnvFilter`)
//! and attach [`LogWriter`] to a gate. Records use the `stategate` target.
//!
//! ## Levels
//! - `warn`: unsubscribe failures, subscriber overflow and panics
//! - `info`: gate and action transitions, race winners
//! - `debug`: subscriptions, race bookkeeping, cancelled racers

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Emits every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let state = e.state.as_deref().unwrap_or("-");
        let racer = e.racer.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");

        match e.kind {
            EventKind::UnsubscribeFailed => {
                tracing::warn!(target: "stategate", seq = e.seq, subscription = e.subscription, reason, "unsubscribe failed");
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "stategate", seq = e.seq, subscriber = racer, reason, "subscriber queue overflow");
            }
            EventKind::SubscriberPanicked => {
                tracing::warn!(target: "stategate", seq = e.seq, subscriber = racer, reason, "subscriber panicked");
            }
            EventKind::GateArmed => {
                tracing::info!(target: "stategate", seq = e.seq, state, "gate armed");
            }
            EventKind::ActionStarted => {
                tracing::info!(target: "stategate", seq = e.seq, state, "action started");
            }
            EventKind::ActionCompleted => {
                tracing::info!(target: "stategate", seq = e.seq, state, "action completed");
            }
            EventKind::ActionCancelled => {
                tracing::info!(target: "stategate", seq = e.seq, state, "action cancelled");
            }
            EventKind::RoundStarted => {
                tracing::info!(target: "stategate", seq = e.seq, state, round = e.round, "round started");
            }
            EventKind::RacerWon => {
                tracing::info!(target: "stategate", seq = e.seq, racer, index = e.index, "racer won");
            }
            EventKind::RaceStarted => {
                tracing::debug!(target: "stategate", seq = e.seq, reason, "race started");
            }
            EventKind::RacerCancelled => {
                tracing::debug!(target: "stategate", seq = e.seq, racer, index = e.index, reason, "racer cancelled");
            }
            EventKind::RaceCancelled => {
                tracing::debug!(target: "stategate", seq = e.seq, "race cancelled");
            }
            EventKind::SubscriptionOpened => {
                tracing::debug!(target: "stategate", seq = e.seq, subscription = e.subscription, expected = reason, "subscription opened");
            }
            EventKind::SubscriptionClosed => {
                tracing::debug!(target: "stategate", seq = e.seq, subscription = e.subscription, "subscription closed");
            }
            EventKind::SequenceCompleted => {
                tracing::debug!(target: "stategate", seq = e.seq, subscription = e.subscription, "sequence completed");
            }
        }
    }

    fn name(&self) -> &'static str {
        "log"
    }
}
