//! # Function-backed racer (`Racer`)
//!
//! [`Racer`] wraps a closure `F: FnOnce(CancellationToken) -> Fut` together with a
//! name used in diagnostics. The closure runs once, when the race starts.
//!
//! The token handed to the closure is cancelled when the racer loses (or when the
//! race is cancelled). A body that never checks it is still stopped: the race
//! drops the body at its next suspension point, so `Drop`-based cleanup runs.
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use stategate::Racer;
//!
//! let r: Racer<'_, u32> = Racer::new("answer", |_ctx: CancellationToken| async { 42 });
//! assert_eq!(r.name(), "answer");
//! ```

use std::borrow::Cow;
use std::fmt;
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;

type Body<'a, T> = Box<dyn FnOnce(CancellationToken) -> BoxFuture<'a, T> + Send + 'a>;

/// Named, cancellable unit of work taking part in a [`race`](crate::race).
pub struct Racer<'a, T> {
    name: Cow<'static, str>,
    body: Body<'a, T>,
}

impl<'a, T> Racer<'a, T> {
    /// Creates a racer from a closure producing its future.
    pub fn new<F, Fut>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'a,
        Fut: Future<Output = T> + Send + 'a,
    {
        Self {
            name: name.into(),
            body: Box::new(move |ctx| f(ctx).boxed()),
        }
    }

    /// Returns the racer name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Consumes the racer, returning its name and started body.
    pub(crate) fn start(self, ctx: CancellationToken) -> (Cow<'static, str>, BoxFuture<'a, T>) {
        let fut = (self.body)(ctx);
        (self.name, fut)
    }
}

impl<T> fmt::Debug for Racer<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Racer").field("name", &self.name).finish()
    }
}
