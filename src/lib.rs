//! # Expressway
//!
//! **Expressway** is an Express-style routing and middleware dispatch engine.
//! It sits between an inbound HTTP transport and user-supplied handler logic:
//! given a registered set of (method, path-pattern, handler-chain) tuples, it
//! resolves each inbound request to a matching route, binds path parameters,
//! and executes the associated handler chain under a three-signal control
//! protocol with panic containment and deterministic ordering.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - **[`path`]** - Route-pattern compilation and request-time parameter
//!   binding, including compound segments (`/:name.:ext`)
//! - **[`router`]** - The route table (chain sets, parameter zones, global
//!   middleware merging) and the [`PathMatcher`] collaborator contract with
//!   its bundled regex implementation
//! - **[`dispatcher`]** - The chain executor: Next/Route/Err signals, error
//!   escalation, and fault containment
//! - **[`app`]** - The registration facade (verb methods, any-verb and
//!   global middleware, error chains) and the per-request entry point
//! - **[`request`]** / **[`response`]** - The per-request context objects and
//!   the [`ResponseSink`] transport contract
//! - **[`config`]** - Pattern-compilation options and the operating mode
//!
//! ## Request Handling Flow
//!
//! ```text
//! transport ──▶ App::handle
//!                 │  case-fold path, split query
//!                 ▼
//!              PathMatcher::lookup ──▶ route key + raw zone captures
//!                 │
//!                 ▼
//!              path::bind ──▶ named params (ParamVec)
//!                 │
//!                 ▼
//!              ChainExecutor::execute
//!                 │  chains in registration order, callbacks in chain order
//!                 │  Err  → escalate toward error handlers
//!                 │  Route → fall through to the next chain
//!                 ▼
//!              ResponseSink (status once, body appended)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use expressway::{App, Callback, MemorySink};
//! use http::Method;
//!
//! let mut app = App::new();
//! app.get(
//!     "/pets/:species-:name",
//!     [Callback::new(|req, res, _next| {
//!         let species = req.param("species").unwrap_or_default();
//!         let name = req.param("name").unwrap_or_default();
//!         res.send(format!("{name} the {species}"));
//!     })],
//! )?;
//!
//! let mut sink = MemorySink::new();
//! app.handle(Method::GET, "/pets/cat-mia", Default::default(), None, &mut sink);
//! assert_eq!(sink.body, "mia the cat");
//! # Ok::<(), expressway::CompileError>(())
//! ```
//!
//! ## Key Behavioral Contracts
//!
//! 1. **Deterministic ordering**: within a request, callbacks run strictly in
//!    registration order; chain sets fall through in registration order on a
//!    `route` signal.
//! 2. **Error escalation**: an unconsumed error auto-advances (`next` inside
//!    a chain, `route` at its end) until an error-handling callback consumes
//!    it; plain callbacks are skipped while an error is attached.
//! 3. **Monotonic writes**: the status line goes out once; mutations after
//!    the response ends are no-ops.
//! 4. **Global middleware position**: appended to routes registered before
//!    the `use_global` call, prepended to routes registered after it.
//! 5. **Fault containment**: callback panics become request errors in
//!    production mode and propagate uncaught in development mode.
//!
//! ## Concurrency Model
//!
//! The engine introduces no suspension points of its own: run each request on
//! its own task and any blocking inside callbacks blocks only that request.
//! Registration (`&mut App`) and serving (`&App`) are separate phases; share
//! the app (e.g. behind an `Arc`) only after setup is complete.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod path;
pub mod request;
pub mod response;
pub mod router;

pub use app::App;
pub use config::{AppConfig, AppMode};
pub use dispatcher::{Callback, Chain, ChainExecutor, DispatchOutcome, FaultPolicy, Next};
pub use path::{CompileError, CompiledPath, ParamVec, ParamZone};
pub use request::Request;
pub use response::{MemorySink, Response, ResponseSink};
pub use router::{PathMatcher, RegexMatcher, RouteHit, RouteTable};
