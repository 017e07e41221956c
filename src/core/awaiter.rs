//! # Await an ordered sequence of host crossings.
//!
//! [`await_sequence`] subscribes one observer to a [`LifecycleHost`] and
//! resolves once the expected crossings have been seen in order.
//!
//! ## Flow
//! ```text
//! subscribe(observer) ──► host replays Up(..) for satisfied states
//!        │                   └─► observer pushes into unbounded channel
//!        ▼
//! loop rx.recv():
//!   ├─ crossing == expected[cursor] → cursor += 1
//!   │     └─ cursor == len → unsubscribe, Ok(())
//!   ├─ anything else        → ignored
//!   └─ channel closed       → unsubscribe, Err(HostClosed)
//!
//! future dropped (cancelled) → guard drop → unsubscribe
//! ```
//!
//! ## Rules
//! - Exactly one `subscribe` and one `unsubscribe` per call, on every exit path.
//! - A failing `unsubscribe` is published as `UnsubscribeFailed` and never returned.
//! - Notifications are consumed in host emission order.

use tokio::sync::mpsc;

use crate::{
    error::GateError,
    events::{Bus, Event, EventKind},
    lifecycle::{Crossing, LifecycleHost, Observer, SubscriptionId},
};

/// Waits until `host` has emitted every crossing of `expected`, in order.
///
/// Crossings that do not match the next expected element are ignored.
/// Because hosts replay satisfied states on subscribe, an `Up` that already
/// holds is observed immediately.
///
/// ### Errors
/// - [`GateError::EmptySequence`] if `expected` is empty.
/// - [`GateError::HostClosed`] if the host drops the observer first.
pub async fn await_sequence<H>(
    host: &H,
    expected: &[Crossing<H::State>],
    bus: &Bus,
) -> Result<(), GateError>
where
    H: LifecycleHost + ?Sized,
{
    if expected.is_empty() {
        return Err(GateError::EmptySequence);
    }

    let (tx, mut rx) = mpsc::unbounded_channel();
    let observer: Observer<H::State> = Box::new(move |c| {
        let _ = tx.send(c);
    });
    let mut guard = SubscriptionGuard::open(host, bus, observer, expected);

    let mut cursor = 0;
    while let Some(crossing) = rx.recv().await {
        if crossing != expected[cursor] {
            continue;
        }
        cursor += 1;
        if cursor == expected.len() {
            bus.publish(Event::new(EventKind::SequenceCompleted).with_subscription(guard.id));
            guard.release();
            return Ok(());
        }
    }
    Err(GateError::HostClosed)
}

/// Owns one host subscription; unregisters it exactly once.
struct SubscriptionGuard<'a, H: LifecycleHost + ?Sized> {
    host: &'a H,
    bus: &'a Bus,
    id: SubscriptionId,
    released: bool,
}

impl<'a, H: LifecycleHost + ?Sized> SubscriptionGuard<'a, H> {
    fn open(
        host: &'a H,
        bus: &'a Bus,
        observer: Observer<H::State>,
        expected: &[Crossing<H::State>],
    ) -> Self {
        let id = host.subscribe(observer);
        bus.publish(
            Event::new(EventKind::SubscriptionOpened)
                .with_subscription(id)
                .with_reason(describe(expected)),
        );
        Self {
            host,
            bus,
            id,
            released: false,
        }
    }

    fn release(&mut self) {
        if std::mem::replace(&mut self.released, true) {
            return;
        }
        match self.host.unsubscribe(self.id) {
            Ok(()) => self
                .bus
                .publish(Event::new(EventKind::SubscriptionClosed).with_subscription(self.id)),
            Err(e) => self.bus.publish(
                Event::new(EventKind::UnsubscribeFailed)
                    .with_subscription(self.id)
                    .with_reason(e.as_message()),
            ),
        }
    }
}

impl<H: LifecycleHost + ?Sized> Drop for SubscriptionGuard<'_, H> {
    fn drop(&mut self) {
        self.release();
    }
}

fn describe<S: std::fmt::Debug>(expected: &[Crossing<S>]) -> String {
    let parts: Vec<String> = expected.iter().map(ToString::to_string).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use futures::FutureExt;

    use super::*;
    use crate::error::HostError;
    use crate::lifecycle::{LifecycleRegistry, LifecycleState, LifecycleState::*};

    fn kinds(rx: &mut tokio::sync::broadcast::Receiver<Event>) -> Vec<EventKind> {
        let mut out = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            out.push(ev.kind);
        }
        out
    }

    /// Host whose `unsubscribe` always fails after delegating.
    struct FaultyHost {
        inner: LifecycleRegistry<LifecycleState>,
        unsubscribes: AtomicUsize,
    }

    impl LifecycleHost for FaultyHost {
        type State = LifecycleState;

        fn current_state(&self) -> LifecycleState {
            self.inner.state()
        }

        fn subscribe(&self, observer: Observer<LifecycleState>) -> SubscriptionId {
            self.inner.subscribe(observer)
        }

        fn unsubscribe(&self, id: SubscriptionId) -> Result<(), HostError> {
            self.unsubscribes.fetch_add(1, Ordering::SeqCst);
            let _ = self.inner.unsubscribe(id);
            Err(HostError::UnknownSubscription { id })
        }
    }

    #[tokio::test]
    async fn test_ignores_interleaved_crossings() {
        let reg = LifecycleRegistry::new(Created);
        let bus = Bus::new(64);
        let expected = [Crossing::up(Started), Crossing::down(Started)];

        let fut = await_sequence(&reg, &expected, &bus);
        tokio::pin!(fut);
        assert!(futures::poll!(&mut fut).is_pending());

        reg.set_state(Resumed).unwrap(); // up(Started), up(Resumed)
        assert!(futures::poll!(&mut fut).is_pending());
        reg.set_state(Started).unwrap(); // down(Resumed): ignored
        assert!(futures::poll!(&mut fut).is_pending());
        reg.set_state(Created).unwrap(); // down(Started)

        assert_eq!(fut.await, Ok(()));
        assert_eq!(reg.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_replayed_state_resolves_immediately() {
        let reg = LifecycleRegistry::new(Resumed);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let res = await_sequence(&reg, &[Crossing::up(Started)], &bus).now_or_never();
        assert_eq!(res, Some(Ok(())));
        assert_eq!(reg.observer_count(), 0);
        assert_eq!(
            kinds(&mut rx),
            vec![
                EventKind::SubscriptionOpened,
                EventKind::SequenceCompleted,
                EventKind::SubscriptionClosed
            ]
        );
    }

    #[tokio::test]
    async fn test_drop_unsubscribes() {
        let reg = LifecycleRegistry::new(Created);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let expected = [Crossing::up(Started)];
        {
            let fut = await_sequence(&reg, &expected, &bus);
            tokio::pin!(fut);
            assert!(futures::poll!(&mut fut).is_pending());
            assert_eq!(reg.observer_count(), 1);
        }

        assert_eq!(reg.observer_count(), 0);
        assert_eq!(
            kinds(&mut rx),
            vec![EventKind::SubscriptionOpened, EventKind::SubscriptionClosed]
        );
    }

    #[tokio::test]
    async fn test_empty_sequence_is_rejected() {
        let reg = LifecycleRegistry::new(Created);
        let bus = Bus::new(8);
        let res = await_sequence(&reg, &[], &bus).await;
        assert_eq!(res, Err(GateError::EmptySequence));
        assert_eq!(reg.observer_count(), 0);
    }

    #[tokio::test]
    async fn test_closed_host_fails_with_clean_teardown() {
        let reg = LifecycleRegistry::new(Created);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let expected = [Crossing::up(Started)];
        let fut = await_sequence(&reg, &expected, &bus);
        tokio::pin!(fut);
        assert!(futures::poll!(&mut fut).is_pending());

        reg.close();
        assert_eq!(fut.await, Err(GateError::HostClosed));
        assert_eq!(
            kinds(&mut rx),
            vec![EventKind::SubscriptionOpened, EventKind::SubscriptionClosed]
        );
    }

    #[tokio::test]
    async fn test_terminal_transition_completes_without_unsubscribe_failure() {
        let reg = LifecycleRegistry::new(Resumed);
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let expected = [Crossing::down(Started)];
        let fut = await_sequence(&reg, &expected, &bus);
        tokio::pin!(fut);
        assert!(futures::poll!(&mut fut).is_pending());

        reg.set_state(Destroyed).unwrap();
        assert!(reg.is_closed());
        assert_eq!(fut.await, Ok(()));
        assert_eq!(
            kinds(&mut rx),
            vec![
                EventKind::SubscriptionOpened,
                EventKind::SequenceCompleted,
                EventKind::SubscriptionClosed
            ]
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_failure_is_reported_not_returned() {
        let host = FaultyHost {
            inner: LifecycleRegistry::new(Started),
            unsubscribes: AtomicUsize::new(0),
        };
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();

        let res = await_sequence(&host, &[Crossing::up(Started)], &bus).await;
        assert_eq!(res, Ok(()));
        assert_eq!(host.unsubscribes.load(Ordering::SeqCst), 1);

        let failed: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok())
            .filter(|e| e.kind == EventKind::UnsubscribeFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert!(failed[0].reason.as_deref().unwrap().contains("not registered"));
    }
}
