//! # Gate: run an action only while the host state is at or above a threshold.
//!
//! The [`Gate`] owns the diagnostics bus, the optional [`SubscriberSet`], and the
//! parent [`CancellationToken`] every invocation runs under. It composes
//! [`await_sequence`] and [`race`] into [`Gate::run_while_at_least`].
//!
//! ## Race-free arming
//! ```text
//! run_while_at_least(t, action):
//!   race(token, [
//!     regress: await [Up(t), Down(t)]            → Cancelled
//!     action:  await [Up(t)] ; action(ctx).await  → Completed
//!   ])
//! ```
//! Both racers subscribe on the race's first poll, and the host replays `Up(t)`
//! when `t` already holds, so there is no gap between "already satisfied" and
//! "changed before we looked".
//!
//! ## Per-invocation state machine
//! ```text
//! Idle ──► Armed ──┬──► WaitingForDown (regress saw Up) ──► Resolved(Cancelled)
//!                  └──► Running        (action saw Up)  ──► Resolved(Completed)
//!
//! Running + Down(t) ──► regress wins ──► action dropped ──► Resolved(Cancelled)
//! ```
//! Published as `GateArmed`, `ActionStarted`, then `ActionCompleted` or `ActionCancelled`.
//!
//! ## Rules
//! - The action starts at most once per invocation.
//! - The action never keeps running after `Down(t)` was observed.
//! - The call never returns while the action runs and the threshold holds.
//! - Repeated gating uses a fresh invocation (fresh subscriptions) per round.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use stategate::{Gate, GateOutcome, LifecycleRegistry, LifecycleState};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let host = Arc::new(LifecycleRegistry::new(LifecycleState::Resumed));
//!     let gate = Gate::new(host);
//!
//!     let outcome = gate
//!         .run_while_at_least(LifecycleState::Started, |_ctx| async {
//!             println!("recording...");
//!         })
//!         .await?;
//!
//!     assert_eq!(outcome, GateOutcome::Completed);
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::core::{
    awaiter::await_sequence,
    builder::GateBuilder,
    config::Config,
    race::race,
};
use crate::{
    error::GateError,
    events::{Bus, Event, EventKind},
    lifecycle::{Crossing, LifecycleHost},
    subscribers::SubscriberSet,
    tasks::Racer,
};

/// How a gated invocation resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOutcome {
    /// The action ran to completion while the threshold held.
    Completed,
    /// The state fell below the threshold; the action (if started) was cancelled.
    Cancelled,
}

impl GateOutcome {
    /// Returns `true` if the action ran to completion.
    #[inline]
    pub fn is_completed(self) -> bool {
        matches!(self, GateOutcome::Completed)
    }
}

/// Runs actions gated on the state of a [`LifecycleHost`].
pub struct Gate<H: LifecycleHost + ?Sized> {
    cfg: Config,
    host: Arc<H>,
    bus: Bus,
    token: CancellationToken,
    subs: Option<Arc<SubscriberSet>>,
    _listener: Option<DropGuard>,
}

impl<H: LifecycleHost + ?Sized> Gate<H> {
    /// Creates a gate with default [`Config`] and no subscribers.
    pub fn new(host: Arc<H>) -> Self {
        Self::builder(host, Config::default()).build()
    }

    /// Starts building a gate.
    pub fn builder(host: Arc<H>, cfg: Config) -> GateBuilder<H> {
        GateBuilder::new(host, cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        host: Arc<H>,
        bus: Bus,
        token: CancellationToken,
        subs: Option<Arc<SubscriberSet>>,
    ) -> Self {
        let listener = subs
            .as_ref()
            .map(|set| Self::subscriber_listener(&bus, Arc::clone(set)));
        Self {
            cfg,
            host,
            bus,
            token,
            subs,
            _listener: listener,
        }
    }

    /// Forwards bus events to the subscriber set until the gate is dropped.
    fn subscriber_listener(bus: &Bus, set: Arc<SubscriberSet>) -> DropGuard {
        let stop = CancellationToken::new();
        let mut rx = bus.subscribe();
        let done = stop.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    msg = rx.recv() => match msg {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(_)) => continue,
                        Err(RecvError::Closed) => break,
                    },
                    _ = done.cancelled() => break,
                }
            }
        });
        stop.drop_guard()
    }

    /// The observed host.
    pub fn host(&self) -> &Arc<H> {
        &self.host
    }

    /// Diagnostics bus; subscribe to observe every primitive.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Gate configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Parent context of every invocation.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subs.as_ref().map_or(0, |s| s.len())
    }

    /// Cancels every in-flight and future invocation of this gate.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Returns `true` if the host currently sits at or above `threshold`.
    pub fn is_at_least(&self, threshold: H::State) -> bool {
        self.host.current_state() >= threshold
    }

    /// Waits for `expected` crossings under this gate's context.
    ///
    /// ### Errors
    /// - [`GateError::Cancelled`] when the gate is cancelled first.
    /// - Any error of [`await_sequence`].
    pub async fn wait_for(&self, expected: &[Crossing<H::State>]) -> Result<(), GateError> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(GateError::Cancelled),
            res = await_sequence(self.host.as_ref(), expected, &self.bus) => res,
        }
    }

    /// Runs `action` if and only if the host state is, or becomes, `>= threshold`,
    /// cancelling it the instant the state drops below `threshold`.
    ///
    /// Returns once the action completed ([`GateOutcome::Completed`]) or the state
    /// regressed ([`GateOutcome::Cancelled`]).
    ///
    /// ### Cancellation semantics
    /// The action receives a token that fires when it loses the race. The action
    /// future is dropped at its next suspension point regardless, so scoped
    /// resources it holds are released before this call returns.
    ///
    /// ### Errors
    /// - [`GateError::Cancelled`] if the gate's token is cancelled.
    /// - [`GateError::HostClosed`] if the host stops delivering while armed.
    pub async fn run_while_at_least<F, Fut>(
        &self,
        threshold: H::State,
        action: F,
    ) -> Result<GateOutcome, GateError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let host = self.host.as_ref();
        let bus = &self.bus;
        let label: Arc<str> = format!("{threshold:?}").into();

        bus.publish(Event::new(EventKind::GateArmed).with_state(label.clone()));

        let regress = Racer::new("regress", move |_ctx| async move {
            let window = [Crossing::up(threshold), Crossing::down(threshold)];
            await_sequence(host, &window, bus).await?;
            Ok(GateOutcome::Cancelled)
        });

        let started = label.clone();
        let run = Racer::new("action", move |ctx| async move {
            await_sequence(host, &[Crossing::up(threshold)], bus).await?;
            bus.publish(Event::new(EventKind::ActionStarted).with_state(started));
            action(ctx).await;
            Ok(GateOutcome::Completed)
        });

        let won = race(&self.token, vec![regress, run], bus).await?;
        let outcome = won.value?;

        let kind = match outcome {
            GateOutcome::Completed => EventKind::ActionCompleted,
            GateOutcome::Cancelled => EventKind::ActionCancelled,
        };
        bus.publish(Event::new(kind).with_state(label));
        Ok(outcome)
    }

    /// Re-runs a gated action every time the state rises to `threshold`.
    ///
    /// Each round is a fresh [`run_while_at_least`](Self::run_while_at_least).
    /// After a round completes, the next one is armed only once the state has
    /// dropped below `threshold` again, so one visit runs the action once.
    ///
    /// Returns the number of resolved rounds when the gate is cancelled, the host
    /// closes, or [`Config::max_rounds`] is reached.
    pub async fn repeat_while_at_least<F, Fut>(
        &self,
        threshold: H::State,
        mut make_action: F,
    ) -> Result<u64, GateError>
    where
        F: FnMut(CancellationToken) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let label: Arc<str> = format!("{threshold:?}").into();
        let limit = self.cfg.round_limit();
        let mut resolved: u64 = 0;

        loop {
            if self.token.is_cancelled() {
                return Ok(resolved);
            }
            self.bus.publish(
                Event::new(EventKind::RoundStarted)
                    .with_state(label.clone())
                    .with_round(resolved + 1),
            );

            let outcome = match self
                .run_while_at_least(threshold, |ctx| make_action(ctx))
                .await
            {
                Ok(outcome) => outcome,
                Err(GateError::Cancelled | GateError::HostClosed) => return Ok(resolved),
                Err(e) => return Err(e),
            };

            resolved += 1;
            if limit.is_some_and(|l| resolved >= l) {
                return Ok(resolved);
            }

            if outcome.is_completed() {
                match self.wait_until_below(threshold).await {
                    Ok(()) => {}
                    Err(GateError::Cancelled | GateError::HostClosed) => return Ok(resolved),
                    Err(e) => return Err(e),
                }
            }
        }
    }

    /// Resolves once the state is below `threshold`.
    ///
    /// Races a `Down(t)` subscription against a state check made after that
    /// subscription exists, so a drop right before subscribing is not missed.
    async fn wait_until_below(&self, threshold: H::State) -> Result<(), GateError> {
        let host = self.host.as_ref();
        let bus = &self.bus;

        let racers = vec![
            Racer::new("down", move |_ctx| async move {
                await_sequence(host, &[Crossing::down(threshold)], bus).await
            }),
            Racer::new("already_below", move |_ctx| async move {
                if host.current_state() < threshold {
                    Ok(())
                } else {
                    std::future::pending().await
                }
            }),
        ];
        race(&self.token, racers, bus).await?.value
    }
}
