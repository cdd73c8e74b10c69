//! Per-request value object handed to callbacks.

use std::collections::HashMap;

use anyhow::Error;
use http::Method;
use serde_json::Value;

use crate::path::ParamVec;

/// The inbound side of a request context.
///
/// Created at request arrival, exclusively owned by the task serving the
/// request, and discarded at response completion. Besides the transport-
/// supplied data it carries the bound path parameters, the parsed query
/// string, and the request's single attached-error slot.
#[derive(Debug, Default)]
pub struct Request {
    /// HTTP method
    pub method: Method,
    /// Request path, query string removed (case-folded unless the
    /// application is case-sensitive)
    pub path: String,
    /// Transport-supplied headers, lowercase keys
    pub headers: HashMap<String, String>,
    /// Raw request body as supplied by the transport, if any
    pub raw_body: Option<Vec<u8>>,
    /// Decoded body, attached by body-parsing middleware; the engine never
    /// fills this itself
    pub body: Option<Value>,
    /// Path parameters bound from the matched route's zones
    pub params: ParamVec,
    /// Query parameters; the first value of a repeated key wins
    pub query: HashMap<String, String>,
    error: Option<Error>,
}

impl Request {
    /// Create a request context for a matched route.
    #[must_use]
    pub fn new(method: Method, path: String) -> Self {
        Request {
            method,
            path,
            ..Request::default()
        }
    }

    /// Get a path parameter by name.
    ///
    /// Uses "last write wins" semantics: if duplicate parameter names exist
    /// at different path depths, the last occurrence is returned.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Get a query parameter by name.
    #[inline]
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// Get a header by name (case-insensitive; keys are stored lowercase).
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Convert the bound params to a map.
    /// Note: this allocates - use `param()` in hot paths instead.
    #[must_use]
    pub fn params_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// The currently attached error, if the request is in the error state.
    #[must_use]
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub(crate) fn attach_error(&mut self, err: Error) {
        self.error = Some(err);
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }
}

/// Parse a query string into a map, percent-decoded.
///
/// Only the first value of a repeated key is kept.
#[must_use]
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    params
}
