//! The result of one RPC call, as recorded in the ledger.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::{fmt, time::Duration};

/// Outcome of a single dispatched (or deliberately skipped) request.
///
/// Immutable once appended to the [`ResultLedger`](crate::ResultLedger).
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    /// The method this outcome belongs to.
    pub method: String,
    /// The returned value or the classified error.
    pub result: Result<Value, OutcomeError>,
    /// Wall-clock time from send to parsed response. `None` for skips that never hit the wire.
    pub duration: Option<Duration>,
    /// When the outcome was produced.
    pub timestamp: DateTime<Utc>,
}

impl Outcome {
    /// A successful call.
    pub fn success(method: impl Into<String>, value: Value, duration: Duration) -> Self {
        Self {
            method: method.into(),
            result: Ok(value),
            duration: Some(duration),
            timestamp: Utc::now(),
        }
    }

    /// A failed or skipped call.
    pub fn failure(
        method: impl Into<String>,
        error: OutcomeError,
        duration: Option<Duration>,
    ) -> Self {
        Self { method: method.into(), result: Err(error), duration, timestamp: Utc::now() }
    }

    /// A deliberate skip of a method that was never sent.
    pub fn skipped(method: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::failure(
            method,
            OutcomeError { kind: ErrorKind::Skipped, message: reason.into(), details: None },
            None,
        )
    }

    /// Returns `true` if the call succeeded.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Returns `true` if the call was skipped, either by the node returning no data or by the
    /// harness not attempting it.
    pub fn is_skipped(&self) -> bool {
        matches!(&self.result, Err(err) if err.kind == ErrorKind::Skipped)
    }

    /// Returns `true` for transport and protocol errors. Skips are not failures.
    pub fn is_failure(&self) -> bool {
        !self.is_success() && !self.is_skipped()
    }

    /// The successful value, if any.
    pub fn value(&self) -> Option<&Value> {
        self.result.as_ref().ok()
    }

    /// The error, if any.
    pub fn error(&self) -> Option<&OutcomeError> {
        self.result.as_ref().err()
    }

    /// Duration in whole milliseconds, if measured.
    pub fn duration_ms(&self) -> Option<u128> {
        self.duration.map(|d| d.as_millis())
    }

    /// RFC 3339 timestamp with millisecond precision.
    pub fn timestamp_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Error half of an [`Outcome`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeError {
    /// Classification.
    pub kind: ErrorKind,
    /// Human readable message, or the skip reason.
    pub message: String,
    /// Extra detail: the JSON-RPC `data` member or a raw response body.
    pub details: Option<Value>,
}

impl fmt::Display for OutcomeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

/// Classification of a non-successful outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a JSON-RPC response.
    Transport(TransportCode),
    /// The node answered with a JSON-RPC error object carrying this code.
    Protocol(i64),
    /// The node had no data (`result: null`) or the method was not attempted.
    Skipped,
}

impl ErrorKind {
    /// The code written to the log streams.
    pub fn code(&self) -> String {
        match self {
            Self::Transport(code) => code.to_string(),
            Self::Protocol(code) => code.to_string(),
            Self::Skipped => "SKIPPED".to_string(),
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(code) => write!(f, "transport {code}"),
            Self::Protocol(code) => write!(f, "protocol {code}"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// The code attached to a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCode {
    /// Non-2xx HTTP status without a JSON-RPC error body.
    Status(u16),
    /// Non-2xx HTTP status whose body carried a JSON-RPC error code.
    Embedded(i64),
    /// The request timed out.
    Timeout,
    /// The connection could not be established.
    Connect,
    /// Anything else, including malformed response bodies.
    Http,
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "HTTP_{status}"),
            Self::Embedded(code) => write!(f, "{code}"),
            Self::Timeout => f.write_str("TIMEOUT"),
            Self::Connect => f.write_str("CONNECT"),
            Self::Http => f.write_str("HTTP_ERROR"),
        }
    }
}
