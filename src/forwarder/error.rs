//! Forwarding errors and transport failure classification.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

/// Substrings resolvers put in name lookup failures (hyper, glibc, macOS).
const DNS_MARKERS: &[&str] = &[
    "dns error",
    "failed to lookup address",
    "name or service not known",
    "nodename nor servname",
    "no such host",
    "temporary failure in name resolution",
];

/// Machine-readable error kind, serialized into error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MissingParameter,
    MethodNotAllowed,
    Timeout,
    DnsFailure,
    ConnectionRefused,
    HttpError,
    LogicalError,
    Unknown,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::MissingParameter => "missing_parameter",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::Timeout => "timeout",
            ErrorKind::DnsFailure => "dns_failure",
            ErrorKind::ConnectionRefused => "connection_refused",
            ErrorKind::HttpError => "http_error",
            ErrorKind::LogicalError => "logical_error",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an encrypt call failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    /// `usr` or `p29` was absent or empty.
    #[error("missing required parameter '{0}' (both usr and p29 are required)")]
    MissingParameter(&'static str),

    /// Inbound method other than GET or OPTIONS.
    #[error("method {0} not allowed; only GET is supported")]
    MethodNotAllowed(String),

    /// No response within the deadline; the connection was dropped.
    #[error("upstream did not respond within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("could not resolve upstream host: {0}")]
    DnsFailure(String),

    #[error("upstream refused the connection: {0}")]
    ConnectionRefused(String),

    /// Upstream answered with a non-2xx status.
    #[error("upstream responded with HTTP {status} {status_text}")]
    UpstreamHttp { status: u16, status_text: String },

    /// Upstream answered 2xx but its envelope reported failure.
    #[error("encryption failed: {0}")]
    UpstreamLogical(String),

    #[error("upstream request failed: {0}")]
    UnknownTransport(String),
}

impl ForwardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForwardError::MissingParameter(_) => ErrorKind::MissingParameter,
            ForwardError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            ForwardError::Timeout(_) => ErrorKind::Timeout,
            ForwardError::DnsFailure(_) => ErrorKind::DnsFailure,
            ForwardError::ConnectionRefused(_) => ErrorKind::ConnectionRefused,
            ForwardError::UpstreamHttp { .. } => ErrorKind::HttpError,
            ForwardError::UpstreamLogical(_) => ErrorKind::LogicalError,
            ForwardError::UnknownTransport(_) => ErrorKind::Unknown,
        }
    }

    /// HTTP status the relay answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            ForwardError::MissingParameter(_) => 400,
            ForwardError::MethodNotAllowed(_) => 405,
            ForwardError::Timeout(_) => 504,
            ForwardError::DnsFailure(_)
            | ForwardError::ConnectionRefused(_)
            | ForwardError::UpstreamHttp { .. }
            | ForwardError::UpstreamLogical(_) => 502,
            ForwardError::UnknownTransport(_) => 500,
        }
    }

    /// Upstream status for `UpstreamHttp`, `None` otherwise.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            ForwardError::UpstreamHttp { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors building a [`Forwarder`](crate::forwarder::Forwarder).
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("invalid upstream URL '{url}': {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("upstream URL '{0}' must not carry a query or fragment")]
    BaseUrlHasQuery(String),

    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Classify a failed reqwest call.
pub fn classify_transport(err: &reqwest::Error, timeout: Duration) -> ForwardError {
    if err.is_timeout() {
        return ForwardError::Timeout(timeout);
    }
    classify_error_chain(err, timeout)
}

/// Walk an error's source chain looking for a recognizable cause.
pub fn classify_error_chain(err: &(dyn StdError + 'static), timeout: Duration) -> ForwardError {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => {
                    return ForwardError::ConnectionRefused(io_err.to_string());
                }
                io::ErrorKind::TimedOut => return ForwardError::Timeout(timeout),
                _ => {}
            }
        }

        let text = e.to_string().to_ascii_lowercase();
        if DNS_MARKERS.iter().any(|marker| text.contains(marker)) {
            return ForwardError::DnsFailure(root_cause(e));
        }

        current = e.source();
    }

    ForwardError::UnknownTransport(chain_message(err))
}

fn root_cause(err: &(dyn StdError + 'static)) -> String {
    let mut current = err;
    while let Some(next) = current.source() {
        current = next;
    }
    current.to_string()
}

fn chain_message(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if !parts.iter().any(|p| p.contains(&text)) {
            parts.push(text);
        }
        current = e.source();
    }
    parts.join(": ")
}
