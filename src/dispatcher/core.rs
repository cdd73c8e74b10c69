//! Dispatcher core: callback contract, signal state, and the chain-execution
//! loop.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use anyhow::Error;
use tracing::{debug, error};

use crate::config::AppMode;
use crate::request::Request;
use crate::response::{Response, ResponseSink};

/// Per-invocation intent signal handed to every callback.
///
/// Every callback invocation receives a fresh signal; flags do not carry
/// over between callbacks. `next` and `route` are independent flags
/// evaluated under a fixed precedence: once the callback returns, `route`
/// (explicit or escalated) terminates the current chain regardless of the
/// remaining callbacks, while `next` only continues within the current
/// chain and is ignored on its final callback.
#[derive(Debug, Default)]
pub struct Next {
    /// Continue with the next callback of the current chain
    pub next: bool,
    /// Abandon the rest of this chain and advance to the next chain
    /// registered for the route
    pub route: bool,
    /// Attach an error to the request
    pub err: Option<Error>,
}

impl Next {
    /// A cleared signal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that execution should continue with the following callback.
    pub fn proceed(&mut self) {
        self.next = true;
    }

    /// Signal that the rest of this chain should be skipped in favor of the
    /// next chain registered for the route.
    pub fn reroute(&mut self) {
        self.route = true;
    }

    /// Attach an error to the request.
    pub fn throw(&mut self, err: impl Into<Error>) {
        self.err = Some(err.into());
    }
}

type CallbackFn = dyn Fn(&mut Request, &mut Response, &mut Next) + Send + Sync;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CallbackKind {
    Plain,
    ErrorHandler,
}

/// A unit of handler logic.
///
/// Callbacks communicate only through mutations to the response and their
/// [`Next`] signal; they return nothing. Cloning a callback is cheap (the
/// function is behind an `Arc`), which is what lets one registered chain be
/// shared by several chain sets.
#[derive(Clone)]
pub struct Callback {
    func: Arc<CallbackFn>,
    kind: CallbackKind,
}

impl Callback {
    /// Wrap a plain callback.
    ///
    /// Plain callbacks run while no error is attached to the request and are
    /// skipped without side effects while one is.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&mut Request, &mut Response, &mut Next) + Send + Sync + 'static,
    {
        Callback {
            func: Arc::new(func),
            kind: CallbackKind::Plain,
        }
    }

    /// Wrap an error-handling callback.
    ///
    /// The wrapper only fires while an error is attached to the request; it
    /// takes the error out (returning the request to the normal state) and
    /// hands it to `func`, which may re-attach a new error through its
    /// signal.
    pub fn error_handler<F>(func: F) -> Self
    where
        F: Fn(&Error, &mut Request, &mut Response, &mut Next) + Send + Sync + 'static,
    {
        let wrapped = move |req: &mut Request, res: &mut Response, next: &mut Next| {
            if let Some(err) = req.take_error() {
                func(&err, req, res, next);
            }
        };
        Callback {
            func: Arc::new(wrapped),
            kind: CallbackKind::ErrorHandler,
        }
    }

    pub(crate) fn is_error_handler(&self) -> bool {
        self.kind == CallbackKind::ErrorHandler
    }

    fn invoke(&self, req: &mut Request, res: &mut Response, next: &mut Next) {
        (self.func)(req, res, next);
    }
}

impl std::fmt::Debug for Callback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Callback").field("kind", &self.kind).finish()
    }
}

/// An ordered sequence of callbacks registered together in one call.
pub type Chain = Vec<Callback>;

/// What the executor does with a panicking callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Catch the panic and convert it into an attached request error
    Convert,
    /// Let the panic propagate to the hosting transport (development mode)
    Propagate,
}

impl From<AppMode> for FaultPolicy {
    fn from(mode: AppMode) -> Self {
        match mode {
            AppMode::Production => FaultPolicy::Convert,
            AppMode::Development => FaultPolicy::Propagate,
        }
    }
}

/// How a dispatched request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A callback ended the response, or the chain set stopped with neither
    /// signal in effect
    Completed,
    /// The route signal advanced past the last chain of the route; the
    /// request saw no further response activity
    Unresolved,
    /// No installed route matched the request (returned by the application
    /// entry point, never by the executor)
    NotFound,
}

/// Drives a route's chain set to completion for one request.
///
/// The executor owns no per-request state; the same executor serves every
/// request of an application. The fault policy is fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct ChainExecutor {
    policy: FaultPolicy,
}

impl ChainExecutor {
    /// Create an executor with the given fault policy.
    #[must_use]
    pub fn new(policy: FaultPolicy) -> Self {
        ChainExecutor { policy }
    }

    /// Run the chain set against one request.
    ///
    /// Chains execute strictly in registration order, and within a chain the
    /// callbacks do too. After every callback the staged response writes are
    /// flushed to `sink`. The loop over the chain set is iterative: a
    /// `route` signal advances the chain-set index rather than recursing.
    ///
    /// # Returns
    ///
    /// [`DispatchOutcome::Completed`] when the response ended or a callback
    /// stopped the chain, [`DispatchOutcome::Unresolved`] when the route
    /// signal ran past the last chain. An unresolved request produces no
    /// response activity; reporting it is left to the caller.
    pub fn execute(
        &self,
        chain_set: &[Chain],
        req: &mut Request,
        res: &mut Response,
        sink: &mut dyn ResponseSink,
    ) -> DispatchOutcome {
        let mut index = 0;
        while let Some(chain) = chain_set.get(index) {
            let mut advanced = false;

            for (pos, callback) in chain.iter().enumerate() {
                let last = pos + 1 == chain.len();
                let mut next = Next::new();

                // Plain callbacks are no-ops while an error is attached;
                // error handlers are no-ops while none is. A skipped
                // callback is transparent: it advances exactly like the
                // escalation rule, so a chain of skipped callbacks falls
                // through to the next chain instead of stalling.
                let skip = if callback.is_error_handler() {
                    req.error().is_none()
                } else {
                    req.error().is_some()
                };
                if skip {
                    debug!(
                        chain = index,
                        position = pos,
                        error_attached = req.error().is_some(),
                        "callback skipped in current state"
                    );
                    if last {
                        next.route = true;
                    } else {
                        next.next = true;
                    }
                } else {
                    self.run_contained(callback, req, res, &mut next);
                }

                res.flush(sink);

                // Transfer the error from the signal to the request.
                if let Some(err) = next.err.take() {
                    req.attach_error(err);
                }

                // An unconsumed error escalates: behave as if `next` were
                // set mid-chain, or `route` on the final callback, so the
                // error keeps moving toward an error handler.
                if req.error().is_some() && !next.next && !next.route {
                    if last {
                        next.route = true;
                    } else {
                        next.next = true;
                    }
                }

                if res.is_ended() {
                    return DispatchOutcome::Completed;
                }

                if next.route {
                    debug!(chain = index, position = pos, "advancing to next chain");
                    index += 1;
                    advanced = true;
                    break;
                }

                if next.next && !last {
                    continue;
                }

                return DispatchOutcome::Completed;
            }

            if !advanced {
                // Only an empty chain falls out of the loop without a verdict.
                return DispatchOutcome::Completed;
            }
        }

        debug!("route signal ran past the last chain; request unresolved");
        DispatchOutcome::Unresolved
    }

    /// Invoke one callback under the configured fault policy.
    fn run_contained(
        &self,
        callback: &Callback,
        req: &mut Request,
        res: &mut Response,
        next: &mut Next,
    ) {
        match self.policy {
            FaultPolicy::Propagate => callback.invoke(req, res, next),
            FaultPolicy::Convert => {
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| callback.invoke(req, res, next)));
                if let Err(payload) = outcome {
                    let message = panic_message(payload.as_ref());
                    error!(panic_message = %message, "callback panicked; converted to request error");
                    next.err = Some(anyhow::anyhow!("{message}"));
                }
            }
        }
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
