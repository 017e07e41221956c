//! # SubscriberSet: non-blocking fan-out of gate events.
//!
//! [`SubscriberSet::emit`] clones an event into every subscriber queue with
//! `try_send` and returns immediately.
//!
//! ```text
//! emit(&Event) ─┬─► [queue S1] ─► worker S1 ─► on_event()
//!               └─► [queue SN] ─► worker SN ─► on_event()
//! ```
//!
//! No ordering across subscribers. No retry on overflow.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::Subscribe;
use crate::events::{Bus, Event, EventKind};

struct Lane {
    name: &'static str,
    tx: mpsc::Sender<Arc<Event>>,
}

/// Fan-out over subscribers, one bounded queue and worker each.
///
/// Dropping the set closes every queue; workers finish what is queued and exit.
pub struct SubscriberSet {
    lanes: Vec<Lane>,
    bus: Bus,
}

impl SubscriberSet {
    /// Creates the set and spawns one worker per subscriber.
    ///
    /// Must be called inside a Tokio runtime.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>, bus: Bus) -> Self {
        let lanes = subs
            .into_iter()
            .map(|sub| Self::spawn_worker(sub, bus.clone()))
            .collect();
        Self { lanes, bus }
    }

    fn spawn_worker(sub: Arc<dyn Subscribe>, bus: Bus) -> Lane {
        let name = sub.name();
        let (tx, mut rx) = mpsc::channel::<Arc<Event>>(sub.queue_capacity().max(1));

        tokio::spawn(async move {
            while let Some(ev) = rx.recv().await {
                let handled = AssertUnwindSafe(sub.on_event(&ev)).catch_unwind().await;
                if let Err(payload) = handled {
                    bus.publish(Event::subscriber_panicked(name, panic_message(payload.as_ref())));
                }
            }
        });
        Lane { name, tx }
    }

    /// Queues `event` for every subscriber without waiting.
    ///
    /// A full or closed queue drops the event for that subscriber and publishes
    /// `SubscriberOverflow`, except for overflow events themselves.
    pub fn emit(&self, event: &Event) {
        let loops_back = event.kind == EventKind::SubscriberOverflow;
        let shared = Arc::new(event.clone());

        for lane in &self.lanes {
            let reason = match lane.tx.try_send(Arc::clone(&shared)) {
                Ok(()) => continue,
                Err(TrySendError::Full(_)) => "full",
                Err(TrySendError::Closed(_)) => "closed",
            };
            if !loops_back {
                self.bus.publish(Event::subscriber_overflow(lane.name, reason));
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;

    struct Collect {
        seen: Arc<Mutex<Vec<EventKind>>>,
    }

    #[async_trait]
    impl Subscribe for Collect {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "collect"
        }
    }

    struct Explode;

    #[async_trait]
    impl Subscribe for Explode {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
        fn name(&self) -> &'static str {
            "explode"
        }
    }

    struct Stuck;

    #[async_trait]
    impl Subscribe for Stuck {
        async fn on_event(&self, _ev: &Event) {
            std::future::pending::<()>().await;
        }
        fn name(&self) -> &'static str {
            "stuck"
        }
        fn queue_capacity(&self) -> usize {
            1
        }
    }

    #[tokio::test]
    async fn test_delivers_in_order() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(
            vec![Arc::new(Collect { seen: Arc::clone(&seen) })],
            Bus::new(16),
        );
        assert_eq!(set.len(), 1);

        set.emit(&Event::new(EventKind::GateArmed));
        set.emit(&Event::new(EventKind::ActionStarted));
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![EventKind::GateArmed, EventKind::ActionStarted]
        );
    }

    #[tokio::test]
    async fn test_panic_is_isolated_and_reported() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let set = SubscriberSet::new(
            vec![
                Arc::new(Explode),
                Arc::new(Collect { seen: Arc::clone(&seen) }),
            ],
            bus.clone(),
        );

        set.emit(&Event::new(EventKind::RaceStarted));
        let ev = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();

        assert_eq!(ev.kind, EventKind::SubscriberPanicked);
        assert_eq!(ev.racer.as_deref(), Some("explode"));
        assert_eq!(ev.reason.as_deref(), Some("boom"));
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(*seen.lock().unwrap(), vec![EventKind::RaceStarted]);
    }

    #[tokio::test]
    async fn test_full_queue_reports_overflow() {
        let bus = Bus::new(16);
        let mut rx = bus.subscribe();
        let set = SubscriberSet::new(vec![Arc::new(Stuck)], bus.clone());

        set.emit(&Event::new(EventKind::GateArmed));
        tokio::time::sleep(Duration::from_millis(20)).await;
        set.emit(&Event::new(EventKind::GateArmed));
        set.emit(&Event::new(EventKind::GateArmed));

        let ev = rx.try_recv().unwrap();
        assert_eq!(ev.kind, EventKind::SubscriberOverflow);
        assert_eq!(ev.reason.as_deref(), Some("full"));
    }
}
