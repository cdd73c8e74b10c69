//! Per-request response object and the outbound transport contract.

/// The writable sink a transport supplies for one response.
///
/// The engine's demands are small: write a status line once, append body
/// chunks, and accept headers before the status line goes out. Ordering is
/// the engine's responsibility; a sink may assume `add_header` calls arrive
/// before `write_status`, and `write_body` only after it.
pub trait ResponseSink {
    /// Write the status line. Called at most once per response.
    fn write_status(&mut self, status: u16);
    /// Add a response header.
    fn add_header(&mut self, name: &str, value: &str);
    /// Append a chunk to the response body.
    fn write_body(&mut self, chunk: &str);
}

/// Headers whose values must not be joined when read back.
///
/// Based on Mozilla's nsHttpHeaderArray special-case list: for these,
/// reading returns the first value only.
const SPECIAL_HEADERS: [&str; 3] = ["Set-Cookie", "WWW-Authenticate", "Proxy-Authenticate"];

/// The outbound side of a request context.
///
/// Callbacks stage status and body writes here; the executor flushes the
/// staged writes to the transport sink after every callback invocation.
/// Once `end` is asserted (directly or through a `send` helper) every
/// further mutation is a no-op, and flushed writes are monotonic: a status
/// line already on the wire is never written again.
#[derive(Debug, Default)]
pub struct Response {
    headers: Vec<(String, String)>,
    status: Option<u16>,
    body: String,
    end: bool,
    wire_started: bool,
}

impl Response {
    /// Create an empty response.
    #[must_use]
    pub fn new() -> Self {
        Response::default()
    }

    /// Stop further writes to the response.
    pub fn end(&mut self) {
        self.end = true;
    }

    /// Whether the response has ended.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.end
    }

    /// Set the HTTP status code of the response; chainable.
    pub fn status(&mut self, code: u16) -> &mut Self {
        if !self.end {
            self.status = Some(code);
        }
        self
    }

    /// Send the response body and end the response.
    pub fn send(&mut self, body: impl Into<String>) {
        if self.end {
            return;
        }
        self.body = body.into();
        self.end = true;
    }

    /// Send the response with only a status code and end it.
    pub fn send_status(&mut self, code: u16) {
        if self.end {
            return;
        }
        self.status = Some(code);
        self.end = true;
    }

    /// Set a response header, replacing any existing values of the field.
    /// The field is case-insensitive.
    pub fn set(&mut self, field: &str, value: &str) {
        if self.end {
            return;
        }
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(field));
        self.headers.push((field.to_string(), value.to_string()));
    }

    /// Add a value to a response header. The field is case-insensitive.
    pub fn append(&mut self, field: &str, value: &str) {
        if self.end {
            return;
        }
        self.headers.push((field.to_string(), value.to_string()));
    }

    /// Get a response header by field, case-insensitive.
    ///
    /// Multiple values are joined with `,`, except for the special headers
    /// (`Set-Cookie`, `WWW-Authenticate`, `Proxy-Authenticate`) where only
    /// the first value is returned.
    #[must_use]
    pub fn get(&self, field: &str) -> String {
        let mut values = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case(field))
            .map(|(_, v)| v.as_str());

        if SPECIAL_HEADERS.iter().any(|h| h.eq_ignore_ascii_case(field)) {
            return values.next().unwrap_or_default().to_string();
        }
        values.collect::<Vec<_>>().join(",")
    }

    /// Flush staged writes to the transport sink.
    ///
    /// Headers go out together with the status line; a body write with no
    /// staged status implies 200. After the status line is on the wire,
    /// late header mutations stay readable through [`Response::get`] but
    /// never reach the sink, and a late staged status is dropped.
    pub(crate) fn flush(&mut self, sink: &mut dyn ResponseSink) {
        if self.wire_started {
            self.status = None;
        } else if self.status.is_some() || !self.body.is_empty() {
            for (name, value) in &self.headers {
                sink.add_header(name, value);
            }
            sink.write_status(self.status.take().unwrap_or(200));
            self.wire_started = true;
        }

        if !self.body.is_empty() {
            let body = std::mem::take(&mut self.body);
            sink.write_body(&body);
        }
    }
}

/// In-memory [`ResponseSink`].
///
/// Used by the test suite and usable as a reference implementation for
/// transport adapters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemorySink {
    /// Status line, if one was written
    pub status: Option<u16>,
    /// Headers in write order
    pub headers: Vec<(String, String)>,
    /// Accumulated body
    pub body: String,
}

impl MemorySink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        MemorySink::default()
    }

    /// First value of a header, case-insensitive.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl ResponseSink for MemorySink {
    fn write_status(&mut self, status: u16) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    fn add_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }

    fn write_body(&mut self, chunk: &str) {
        self.body.push_str(chunk);
    }
}
