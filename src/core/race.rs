//! # Race: first racer to complete wins, the rest are cancelled and drained.
//!
//! [`race`] polls every [`Racer`] in place on the caller's task; it spawns
//! nothing and owns every racer future, so no racer can outlive the call.
//!
//! ## Flow
//! ```text
//! race(parent, racers):
//!   scope ← parent.child_token()
//!   start every racer with scope.child_token()
//!   first pass: poll ALL racers          (no lazy start)
//!   later passes: poll in index order, stop at the first Ready
//!   select {
//!     parent.cancelled() → winner = none
//!     first Ready        → winner = (index, value)
//!   }
//!   scope.cancel()                       → every loser's token fires
//!   drain losers                         → each body dropped, RacerCancelled
//!   winner ? Ok(Won) : Err(Cancelled)
//! ```
//!
//! ## Rules
//! - Exactly one value is surfaced per race; ties in one pass go to the lower index.
//! - A racer whose value is an error still wins: failure counts as completion.
//! - The call does not return before every loser acknowledged cancellation.
//! - Dropping the race future drops every racer synchronously.

use std::borrow::Cow;
use std::future::poll_fn;
use std::task::{Context, Poll};

use futures::FutureExt;
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::{
    error::GateError,
    events::{Bus, Event, EventKind},
    tasks::Racer,
};

/// Result of a race: the winning racer and its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Won<T> {
    /// Position of the winner in the racer list.
    pub index: usize,
    /// Name of the winner.
    pub name: Cow<'static, str>,
    /// The winner's value.
    pub value: T,
}

/// One started racer: body wrapped so that its token short-circuits it.
struct Lane<'a, T> {
    name: Cow<'static, str>,
    fut: Option<BoxFuture<'a, Option<T>>>,
}

/// Runs `racers` concurrently and returns the first to complete.
///
/// ### Errors
/// - [`GateError::NoRacers`] if `racers` is empty (nothing is polled).
/// - [`GateError::Cancelled`] if `parent` is cancelled before a winner exists;
///   every racer is cancelled and drained first.
pub async fn race<'a, T>(
    parent: &CancellationToken,
    racers: Vec<Racer<'a, T>>,
    bus: &Bus,
) -> Result<Won<T>, GateError>
where
    T: Send + 'a,
{
    if racers.is_empty() {
        return Err(GateError::NoRacers);
    }

    let scope = parent.child_token();
    let _scope_guard = scope.clone().drop_guard();

    let mut lanes: Vec<Lane<'a, T>> = racers
        .into_iter()
        .map(|racer| {
            let token = scope.child_token();
            let (name, body) = racer.start(token.clone());
            let fut = async move {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => None,
                    value = body => Some(value),
                }
            }
            .boxed();
            Lane {
                name,
                fut: Some(fut),
            }
        })
        .collect();

    bus.publish(Event::new(EventKind::RaceStarted).with_reason(format!("racers={}", lanes.len())));

    let winner = {
        let mut first_pass = true;
        let first = poll_fn(|cx| poll_first(&mut lanes, &mut first_pass, cx));
        tokio::select! {
            biased;
            _ = parent.cancelled() => None,
            won = first => Some(won),
        }
    };

    scope.cancel();
    drain(&mut lanes, winner.as_ref().map(|(i, _)| *i), bus).await;

    match winner {
        Some((index, value)) => {
            let name = lanes[index].name.clone();
            bus.publish(
                Event::new(EventKind::RacerWon)
                    .with_racer(name.as_ref())
                    .with_index(index),
            );
            Ok(Won { index, name, value })
        }
        None => {
            bus.publish(Event::new(EventKind::RaceCancelled));
            Err(GateError::Cancelled)
        }
    }
}

/// Polls lanes; returns the lowest-index racer that produced a value.
///
/// The first pass polls every lane so each racer runs up to its first
/// suspension point before any winner is chosen.
fn poll_first<T>(
    lanes: &mut [Lane<'_, T>],
    first_pass: &mut bool,
    cx: &mut Context<'_>,
) -> Poll<(usize, T)> {
    let poll_all = std::mem::replace(first_pass, false);
    let mut winner = None;

    for (index, lane) in lanes.iter_mut().enumerate() {
        let Some(fut) = lane.fut.as_mut() else {
            continue;
        };
        if let Poll::Ready(out) = fut.as_mut().poll(cx) {
            lane.fut = None;
            if let (None, Some(value)) = (&winner, out) {
                winner = Some((index, value));
            }
            if !poll_all && winner.is_some() {
                break;
            }
        }
    }

    match winner {
        Some(w) => Poll::Ready(w),
        None => Poll::Pending,
    }
}

/// Awaits every remaining lane after the scope token was cancelled.
///
/// Lanes that already finished in the same pass as the winner had their
/// value discarded; they are reported as cancelled too.
async fn drain<T>(lanes: &mut [Lane<'_, T>], winner: Option<usize>, bus: &Bus) {
    for (index, lane) in lanes.iter().enumerate() {
        if lane.fut.is_none() && Some(index) != winner {
            publish_cancelled(bus, lane, index, Some("result_discarded"));
        }
    }

    let mut pending: FuturesUnordered<_> = lanes
        .iter_mut()
        .enumerate()
        .filter_map(|(index, lane)| lane.fut.take().map(|f| f.map(move |_| index)))
        .collect();

    while let Some(index) = pending.next().await {
        publish_cancelled(bus, &lanes[index], index, None);
    }
}

fn publish_cancelled<T>(bus: &Bus, lane: &Lane<'_, T>, index: usize, reason: Option<&str>) {
    let mut ev = Event::new(EventKind::RacerCancelled)
        .with_racer(lane.name.as_ref())
        .with_index(index);
    if let Some(r) = reason {
        ev = ev.with_reason(r);
    }
    bus.publish(ev);
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    /// Sets the flag when dropped (i.e. when the racer body is torn down).
    struct OnDrop(Arc<AtomicBool>);

    impl Drop for OnDrop {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    fn sleeper(
        name: &'static str,
        ms: u64,
        dropped: Arc<AtomicBool>,
        finished: Arc<AtomicBool>,
    ) -> Racer<'static, &'static str> {
        Racer::new(name, move |_ctx| async move {
            let _guard = OnDrop(dropped);
            tokio::time::sleep(Duration::from_millis(ms)).await;
            finished.store(true, Ordering::SeqCst);
            name
        })
    }

    fn flags(n: usize) -> Vec<Arc<AtomicBool>> {
        (0..n).map(|_| Arc::new(AtomicBool::new(false))).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_of_three_wins_and_others_are_cancelled() {
        let bus = Bus::new(64);
        let mut rx = bus.subscribe();
        let dropped = flags(3);
        let finished = flags(3);

        let racers = vec![
            sleeper("one", 300, dropped[0].clone(), finished[0].clone()),
            sleeper("two", 10, dropped[1].clone(), finished[1].clone()),
            sleeper("three", 200, dropped[2].clone(), finished[2].clone()),
        ];
        let won = race(&CancellationToken::new(), racers, &bus).await.unwrap();

        assert_eq!(won.index, 1);
        assert_eq!(won.name, "two");
        assert_eq!(won.value, "two");
        assert!(dropped.iter().all(|d| d.load(Ordering::SeqCst)));
        assert!(!finished[0].load(Ordering::SeqCst));
        assert!(finished[1].load(Ordering::SeqCst));
        assert!(!finished[2].load(Ordering::SeqCst));

        let events: Vec<Event> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        let cancelled: Vec<u32> = events
            .iter()
            .filter(|e| e.kind == EventKind::RacerCancelled)
            .filter_map(|e| e.index)
            .collect();
        assert_eq!(cancelled.len(), 2);
        assert!(cancelled.contains(&0) && cancelled.contains(&2));
        assert_eq!(events.last().map(|e| e.kind), Some(EventKind::RacerWon));
    }

    #[tokio::test]
    async fn test_no_racers_is_rejected() {
        let bus = Bus::new(8);
        let racers: Vec<Racer<'_, ()>> = Vec::new();
        let res = race(&CancellationToken::new(), racers, &bus).await;
        assert_eq!(res, Err(GateError::NoRacers));
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_cancels_every_racer() {
        let bus = Bus::new(64);
        let parent = CancellationToken::new();
        let dropped = flags(2);
        let finished = flags(2);

        let racers = vec![
            sleeper("a", 3_600_000, dropped[0].clone(), finished[0].clone()),
            sleeper("b", 3_600_000, dropped[1].clone(), finished[1].clone()),
        ];

        let canceller = parent.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        let res = race(&parent, racers, &bus).await;
        assert_eq!(res, Err(GateError::Cancelled));
        assert!(dropped.iter().all(|d| d.load(Ordering::SeqCst)));
        assert!(finished.iter().all(|f| !f.load(Ordering::SeqCst)));
    }

    #[tokio::test]
    async fn test_every_racer_starts_even_if_first_finishes_immediately() {
        let bus = Bus::new(8);
        let started = Arc::new(AtomicBool::new(false));
        let cancelled_seen = Arc::new(AtomicBool::new(false));

        let s = started.clone();
        let c = cancelled_seen.clone();
        let racers = vec![
            Racer::new("instant", |_ctx| async { 1 }),
            Racer::new("slow", move |ctx: CancellationToken| async move {
                s.store(true, Ordering::SeqCst);
                ctx.cancelled().await;
                c.store(true, Ordering::SeqCst);
                2
            }),
        ];

        let won = race(&CancellationToken::new(), racers, &bus).await.unwrap();
        assert_eq!(won.value, 1);
        assert!(started.load(Ordering::SeqCst));
        // Body is dropped at its suspension point, not resumed.
        assert!(!cancelled_seen.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_racer_still_wins() {
        let bus = Bus::new(8);
        let racers: Vec<Racer<'_, Result<u32, String>>> = vec![
            Racer::new("pending", |_ctx| std::future::pending()),
            Racer::new("fails", |_ctx| async { Err("boom".to_string()) }),
        ];
        let won = race(&CancellationToken::new(), racers, &bus).await.unwrap();
        assert_eq!(won.index, 1);
        assert_eq!(won.value, Err("boom".to_string()));
    }

    #[tokio::test]
    async fn test_same_pass_tie_goes_to_lower_index() {
        let bus = Bus::new(8);
        let mut rx = bus.subscribe();
        let racers = vec![
            Racer::new("first", |_ctx| async { "first" }),
            Racer::new("second", |_ctx| async { "second" }),
        ];
        let won = race(&CancellationToken::new(), racers, &bus).await.unwrap();
        assert_eq!(won.value, "first");

        let discarded = std::iter::from_fn(|| rx.try_recv().ok())
            .find(|e| e.kind == EventKind::RacerCancelled)
            .unwrap();
        assert_eq!(discarded.index, Some(1));
        assert_eq!(discarded.reason.as_deref(), Some("result_discarded"));
    }

    #[tokio::test]
    async fn test_dropping_race_drops_racers() {
        let bus = Bus::new(8);
        let dropped = Arc::new(AtomicBool::new(false));
        let polls = Arc::new(AtomicUsize::new(0));

        {
            let d = dropped.clone();
            let p = polls.clone();
            let racers = vec![Racer::new("held", move |_ctx| async move {
                let _guard = OnDrop(d);
                p.fetch_add(1, Ordering::SeqCst);
                std::future::pending::<()>().await;
            })];
            let token = CancellationToken::new();
            let fut = race(&token, racers, &bus);
            tokio::pin!(fut);
            assert!(futures::poll!(&mut fut).is_pending());
        }

        assert_eq!(polls.load(Ordering::SeqCst), 1);
        assert!(dropped.load(Ordering::SeqCst));
    }
}
