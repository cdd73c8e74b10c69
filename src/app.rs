//! Application facade: the registration API and the per-request entry
//! point.

use std::collections::HashMap;

use http::Method;
use tracing::debug;

use crate::config::AppConfig;
use crate::dispatcher::{Callback, Chain, ChainExecutor, DispatchOutcome};
use crate::path::{self, CompileError};
use crate::request::{parse_query, Request};
use crate::response::{Response, ResponseSink};
use crate::router::{PathMatcher, RegexMatcher, RouteTable};

/// The routing and middleware-dispatch engine.
///
/// An `App` is built in two phases. During setup, routes and middleware are
/// registered through the `&mut self` API; during serving, requests enter
/// through [`App::handle`] on `&self`. The borrow checker enforces that the
/// two phases do not overlap: once the app is shared (for example behind an
/// `Arc`), no further registration is possible.
///
/// # Example
///
/// ```rust
/// use expressway::{App, Callback, MemorySink};
/// use http::Method;
///
/// let mut app = App::new();
/// app.get(
///     "/greet/:name",
///     [Callback::new(|req, res, _next| {
///         res.send(format!("hello {}", req.param("name").unwrap_or("stranger")));
///     })],
/// )?;
///
/// let mut sink = MemorySink::new();
/// app.handle(Method::GET, "/greet/ada", Default::default(), None, &mut sink);
/// assert_eq!(sink.body, "hello ada");
/// # Ok::<(), expressway::CompileError>(())
/// ```
pub struct App {
    config: AppConfig,
    table: RouteTable,
    matcher: Box<dyn PathMatcher>,
    executor: ChainExecutor,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    /// Create an app with the default configuration and the bundled
    /// [`RegexMatcher`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create an app with the given configuration and the bundled
    /// [`RegexMatcher`].
    #[must_use]
    pub fn with_config(config: AppConfig) -> Self {
        Self::with_matcher(config, Box::new(RegexMatcher::new()))
    }

    /// Create an app with an external path-matching implementation.
    #[must_use]
    pub fn with_matcher(config: AppConfig, matcher: Box<dyn PathMatcher>) -> Self {
        App {
            config,
            table: RouteTable::new(),
            matcher,
            executor: ChainExecutor::new(config.mode.into()),
        }
    }

    /// The configuration the app was built with.
    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The registration state, for inspection.
    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Register a chain for GET requests to `pattern`.
    pub fn get<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(Some(Method::GET), pattern, callbacks.into_iter().collect())
    }

    /// Register a chain for HEAD requests to `pattern`.
    pub fn head<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(Some(Method::HEAD), pattern, callbacks.into_iter().collect())
    }

    /// Register a chain for POST requests to `pattern`.
    pub fn post<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(Some(Method::POST), pattern, callbacks.into_iter().collect())
    }

    /// Register a chain for PUT requests to `pattern`.
    pub fn put<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(Some(Method::PUT), pattern, callbacks.into_iter().collect())
    }

    /// Register a chain for PATCH requests to `pattern`.
    pub fn patch<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(Some(Method::PATCH), pattern, callbacks.into_iter().collect())
    }

    /// Register a chain for DELETE requests to `pattern`.
    pub fn delete<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(
            Some(Method::DELETE),
            pattern,
            callbacks.into_iter().collect(),
        )
    }

    /// Register a chain for CONNECT requests to `pattern`.
    pub fn connect<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(
            Some(Method::CONNECT),
            pattern,
            callbacks.into_iter().collect(),
        )
    }

    /// Register a chain for OPTIONS requests to `pattern`.
    pub fn options<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(
            Some(Method::OPTIONS),
            pattern,
            callbacks.into_iter().collect(),
        )
    }

    /// Register a chain for TRACE requests to `pattern`.
    pub fn trace<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(
            Some(Method::TRACE),
            pattern,
            callbacks.into_iter().collect(),
        )
    }

    /// Register middleware at `pattern` under every verb.
    ///
    /// Declaration order matters: the chain joins the route's chain set in
    /// registration order, exactly like verb registrations.
    pub fn use_path<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(None, pattern, callbacks.into_iter().collect())
    }

    /// Register a verb-catching handler chain at `pattern`.
    ///
    /// Semantically identical to [`App::use_path`]; intended for handlers
    /// that answer every verb rather than for pass-through middleware.
    pub fn all<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(None, pattern, callbacks.into_iter().collect())
    }

    /// Attach middleware to every route.
    ///
    /// The chain is appended after the chains of every route registered so
    /// far and prepended before the chains of every route registered later;
    /// see [`RouteTable::append_global`] for the full contract.
    pub fn use_global<I>(&mut self, callbacks: I)
    where
        I: IntoIterator<Item = Callback>,
    {
        self.table.append_global(callbacks.into_iter().collect());
    }

    /// Register an error-handling chain at `pattern` under every verb.
    ///
    /// The callbacks are expected to be built with
    /// [`Callback::error_handler`]: they fire only while an error is
    /// attached to the request and clear it when they run.
    pub fn use_error<I>(&mut self, pattern: &str, callbacks: I) -> Result<(), CompileError>
    where
        I: IntoIterator<Item = Callback>,
    {
        self.register(None, pattern, callbacks.into_iter().collect())
    }

    /// Attach an error-handling chain to every route, with
    /// [`App::use_global`] positioning semantics.
    pub fn use_global_error<I>(&mut self, callbacks: I)
    where
        I: IntoIterator<Item = Callback>,
    {
        self.table.append_global(callbacks.into_iter().collect());
    }

    /// Compile `pattern` and record `chain` under the resulting route key.
    ///
    /// The key combines the verb and the normalized path (`"GET /x/{$}"`),
    /// or is the path alone for the any-verb forms. A compile error fails
    /// the registration atomically; nothing is added to the table or the
    /// matcher.
    fn register(
        &mut self,
        method: Option<Method>,
        pattern: &str,
        chain: Chain,
    ) -> Result<(), CompileError> {
        let compiled = path::compile(pattern, &self.config)?;
        let key = match &method {
            Some(m) => format!("{m} {}", compiled.pattern),
            None => compiled.pattern.clone(),
        };

        let newly_installed = self.table.insert(&key, compiled.zones, chain);
        if newly_installed {
            self.matcher.install(method.as_ref(), &key, &compiled.pattern);
        }
        Ok(())
    }

    /// Dispatch one inbound request.
    ///
    /// `target` is the request target as supplied by the transport, with the
    /// query string still attached. The path part is case-folded unless the
    /// app is case-sensitive, matched, its zone captures bound to named
    /// parameters, and the matched route's chain set executed against
    /// `sink`.
    ///
    /// # Returns
    ///
    /// * [`DispatchOutcome::NotFound`] - no installed route matched; no
    ///   response activity happened and the transport decides what to write
    /// * [`DispatchOutcome::Completed`] - the chain set ran to a stop
    /// * [`DispatchOutcome::Unresolved`] - the route signal ran past the
    ///   last chain; no response activity happened
    pub fn handle(
        &self,
        method: Method,
        target: &str,
        headers: HashMap<String, String>,
        raw_body: Option<Vec<u8>>,
        sink: &mut dyn ResponseSink,
    ) -> DispatchOutcome {
        let (path_part, query) = match target.split_once('?') {
            Some((p, q)) => (p, q),
            None => (target, ""),
        };
        let path = if self.config.case_sensitive {
            path_part.to_string()
        } else {
            path_part.to_lowercase()
        };

        let Some(hit) = self.matcher.lookup(&method, &path) else {
            debug!(method = %method, path = %path, "no route matched");
            return DispatchOutcome::NotFound;
        };
        let Some(chain_set) = self.table.chain_set(&hit.key) else {
            debug!(key = %hit.key, "matcher returned a key unknown to the table");
            return DispatchOutcome::NotFound;
        };

        debug!(
            method = %method,
            path = %path,
            key = %hit.key,
            chains = chain_set.len(),
            "route matched"
        );

        let mut req = Request::new(method, path);
        req.headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        req.raw_body = raw_body;
        req.query = parse_query(query);

        let zones = self.table.zones(&hit.key).unwrap_or_default();
        for (zone, raw) in zones.iter().zip(hit.captures.iter()) {
            req.params.extend(path::bind(zone, raw));
        }

        let mut res = Response::new();
        self.executor.execute(chain_set, &mut req, &mut res, sink)
    }
}
