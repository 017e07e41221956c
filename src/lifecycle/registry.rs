//! # LifecycleRegistry: in-process lifecycle host.
//!
//! Holds the current state and the set of registered observers, and turns
//! each [`set_state`](LifecycleRegistry::set_state) into the ordered list of
//! [`Crossing`]s described in [`crossing`](super::crossing).
//!
//! ## Architecture
//! ```text
//! set_state(next) ──► dispatch lock (reentrant, serializes emitters)
//!                       ├─► inner lock: swap state, compute crossings
//!                       └─► for each crossing:
//!                             snapshot observers (inner lock, released)
//!                             └─► observer(crossing)  (no lock held)
//!
//! subscribe(obs)  ──► dispatch lock
//!                       ├─► inner lock: insert, compute replay
//!                       └─► obs(Up(..)) for every satisfied state
//! ```
//!
//! ## Rules
//! - Replay and live crossings for one observer never interleave out of order.
//! - Observers may call `unsubscribe` (or `set_state`) from inside a callback.
//! - An observer removed mid-dispatch receives nothing further.
//! - Replay covers every held state, the lowest included.
//! - Reaching a terminal state delivers its down-crossings, then closes the
//!   registry: every observer is dropped and `set_state` fails with
//!   [`HostError::Closed`]. Ids dropped by the close still unsubscribe cleanly,
//!   once.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, ReentrantMutex};

use crate::error::HostError;

use super::crossing::{self, Crossing};
use super::host::{LifecycleHost, Observer, SubscriptionId};
use super::state::Stage;

type SharedObserver<S> = Arc<dyn Fn(Crossing<S>) + Send + Sync + 'static>;

struct Inner<S> {
    state: S,
    closed: bool,
    observers: BTreeMap<SubscriptionId, SharedObserver<S>>,
    // Ids whose observer was dropped by `close`, not yet unsubscribed.
    retired: BTreeSet<SubscriptionId>,
}

/// Thread-safe lifecycle host with replay-on-subscribe.
pub struct LifecycleRegistry<S: Stage> {
    inner: Mutex<Inner<S>>,
    dispatch: ReentrantMutex<()>,
    next_id: AtomicU64,
}

impl<S: Stage> LifecycleRegistry<S> {
    /// Creates a registry sitting at `initial`.
    pub fn new(initial: S) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: initial,
                closed: false,
                observers: BTreeMap::new(),
                retired: BTreeSet::new(),
            }),
            dispatch: ReentrantMutex::new(()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current state.
    pub fn state(&self) -> S {
        self.inner.lock().state
    }

    /// Returns `true` once a terminal state was reached or [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Moves the host to `next`, delivering every crossing on the way.
    ///
    /// Setting the current state again is a no-op.
    pub fn set_state(&self, next: S) -> Result<(), HostError> {
        let _order = self.dispatch.lock();

        let crossings = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return Err(HostError::Closed);
            }
            let prev = std::mem::replace(&mut inner.state, next);
            crossing::between(prev, next)
        };

        for c in crossings {
            self.deliver(c);
        }

        if next.is_terminal() {
            self.close();
        }
        Ok(())
    }

    /// Stops delivery and drops every observer.
    pub fn close(&self) {
        let dropped = {
            let mut inner = self.inner.lock();
            inner.closed = true;
            let dropped = std::mem::take(&mut inner.observers);
            inner.retired.extend(dropped.keys().copied());
            dropped
        };
        drop(dropped);
    }

    fn deliver(&self, c: Crossing<S>) {
        let targets: Vec<(SubscriptionId, SharedObserver<S>)> = {
            let inner = self.inner.lock();
            inner
                .observers
                .iter()
                .map(|(id, obs)| (*id, Arc::clone(obs)))
                .collect()
        };

        for (id, obs) in targets {
            if self.is_registered(id) {
                obs(c);
            }
        }
    }

    fn is_registered(&self, id: SubscriptionId) -> bool {
        self.inner.lock().observers.contains_key(&id)
    }
}

impl<S: Stage + Default> Default for LifecycleRegistry<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S: Stage> LifecycleHost for LifecycleRegistry<S> {
    type State = S;

    fn current_state(&self) -> S {
        self.state()
    }

    fn subscribe(&self, observer: Observer<S>) -> SubscriptionId {
        let _order = self.dispatch.lock();
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: SharedObserver<S> = Arc::from(observer);

        let replay = {
            let mut inner = self.inner.lock();
            if inner.closed {
                // Observer is dropped here; its owner sees a closed stream.
                inner.retired.insert(id);
                return id;
            }
            inner.observers.insert(id, Arc::clone(&observer));
            crossing::held(inner.state)
        };

        for c in replay {
            if !self.is_registered(id) {
                break;
            }
            observer(c);
        }
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> Result<(), HostError> {
        let removed = {
            let mut inner = self.inner.lock();
            if inner.closed {
                return if inner.retired.remove(&id) {
                    Ok(())
                } else {
                    Err(HostError::Closed)
                };
            }
            inner.observers.remove(&id)
        };
        match removed {
            Some(_) => Ok(()),
            None => Err(HostError::UnknownSubscription { id }),
        }
    }
}
