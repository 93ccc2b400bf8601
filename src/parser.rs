//! Access-log line parser.
//!
//! Extracts per-request routing and outcome metadata from a single
//! reverse-proxy log line. Each field has its own extractor pattern and is
//! matched independently: a missing or malformed field is simply absent
//! from the result, never an error. Parsing is total — no input line can
//! make it fail.
//!
//! Example line:
//!
//! ```text
//! 192.168.1.1 - "GET /version HTTP/1.1" 200 pool=blue release=blue-v1.0.0
//! upstream_status=200 upstream=172.18.0.2:3000 request_time=0.045 upstream_time=0.032
//! ```

use regex::Regex;

/// Structured metadata for one proxied request.
///
/// All fields are independently optional; presence of one implies nothing
/// about another.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestEvent {
    /// Backend pool that served the request (e.g. "blue"/"green").
    pub pool: Option<String>,
    /// Free-form release/version label.
    pub release: Option<String>,
    /// HTTP status returned by the selected upstream instance.
    pub upstream_status: Option<u16>,
    /// Address of the concrete upstream instance (`ip:port`).
    pub upstream: Option<String>,
    /// HTTP status returned to the client.
    pub status: Option<u16>,
    /// Total request time in seconds.
    pub request_time: Option<f64>,
    /// Upstream response time in seconds.
    pub upstream_time: Option<f64>,
}

/// Compiled field extractors for access-log lines.
///
/// Construct once and reuse; compilation of the per-field patterns happens
/// here rather than on every line.
#[derive(Debug)]
pub struct LineParser {
    pool: Regex,
    release: Regex,
    upstream_status: Regex,
    upstream: Regex,
    request_time: Regex,
    upstream_time: Regex,
    status: Regex,
}

impl LineParser {
    /// Build the extractor table.
    pub fn new() -> Self {
        // Hardcoded patterns; compilation cannot fail at runtime.
        let compile = |pattern: &str| Regex::new(pattern).expect("hardcoded pattern compiles");
        Self {
            pool: compile(r"pool=(\w+)"),
            release: compile(r"release=([\w\-\.]+)"),
            upstream_status: compile(r"upstream_status=(\d+)"),
            upstream: compile(r"upstream=([\d\.:]+)"),
            request_time: compile(r"request_time=([\d\.]+)"),
            upstream_time: compile(r"upstream_time=([\d\.]+)"),
            // First standalone 3-digit code after the quoted request field.
            status: compile(r#""\s+(\d{3})\s"#),
        }
    }

    /// Parse one log line into a [`RequestEvent`].
    ///
    /// Total: unmatched fields come back as `None`, and a value that
    /// matches syntactically but fails numeric conversion (e.g. an
    /// out-of-range status) is treated as absent rather than an error.
    pub fn parse(&self, line: &str) -> RequestEvent {
        RequestEvent {
            pool: capture(&self.pool, line),
            release: capture(&self.release, line),
            upstream_status: capture_parsed(&self.upstream_status, line),
            upstream: capture(&self.upstream, line),
            status: capture_parsed(&self.status, line),
            request_time: capture_parsed(&self.request_time, line),
            upstream_time: capture_parsed(&self.upstream_time, line),
        }
    }
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new()
    }
}

/// First capture group of `re` in `line`, as an owned string.
fn capture(re: &Regex, line: &str) -> Option<String> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_owned())
}

/// First capture group of `re` in `line`, parsed to `T`.
///
/// Conversion failure yields `None` so a pathological value can never
/// crash the monitoring loop.
fn capture_parsed<T: std::str::FromStr>(re: &Regex, line: &str) -> Option<T> {
    re.captures(line)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}
