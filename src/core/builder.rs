use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::{
    core::Config,
    events::Bus,
    lifecycle::LifecycleHost,
    subscribers::{Subscribe, SubscriberSet},
};
use super::gate::Gate;

/// Builder for constructing a [`Gate`] with optional features.
pub struct GateBuilder<H: LifecycleHost + ?Sized> {
    cfg: Config,
    host: Arc<H>,
    subscribers: Vec<Arc<dyn Subscribe>>,
    token: Option<CancellationToken>,
}

impl<H: LifecycleHost + ?Sized> GateBuilder<H> {
    /// Creates a new builder for `host` with the given configuration.
    pub fn new(host: Arc<H>, cfg: Config) -> Self {
        Self {
            cfg,
            host,
            subscribers: Vec::new(),
            token: None,
        }
    }

    /// Replaces the configuration.
    pub fn with_config(mut self, cfg: Config) -> Self {
        self.cfg = cfg;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive gate events (subscriptions, races, actions)
    /// through dedicated workers with bounded queues. Building with
    /// subscribers spawns workers and therefore needs a Tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Runs every invocation under a child of `parent`.
    ///
    /// Cancelling `parent` cancels the gate; cancelling the gate leaves `parent` untouched.
    pub fn with_token(mut self, parent: &CancellationToken) -> Self {
        self.token = Some(parent.child_token());
        self
    }

    /// Builds and returns the Gate instance.
    pub fn build(self) -> Gate<H> {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let token = self.token.unwrap_or_default();

        let subs = if self.subscribers.is_empty() {
            None
        } else {
            Some(Arc::new(SubscriberSet::new(self.subscribers, bus.clone())))
        };

        Gate::new_internal(self.cfg, self.host, bus, token, subs)
    }
}
