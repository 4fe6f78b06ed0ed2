//! Issues single JSON-RPC calls and classifies what comes back.

use crate::{
    outcome::{ErrorKind, Outcome, OutcomeError, TransportCode},
    request::Request,
    transport::{RpcTransport, TransportError},
};
use serde_json::Value;
use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Instant,
};
use tracing::trace;

/// Sends requests through a transport and turns every possible result into an [`Outcome`].
///
/// [`dispatch`](Self::dispatch) never fails: transport failures, JSON-RPC errors and `null`
/// results all become outcome values.
#[derive(Debug)]
pub struct RequestDispatcher<T> {
    transport: T,
    /// Keeps track of unique request ids
    id: AtomicU64,
}

impl<T: RpcTransport> RequestDispatcher<T> {
    /// Creates a new dispatcher over the given transport.
    pub const fn new(transport: T) -> Self {
        Self { transport, id: AtomicU64::new(1) }
    }

    /// Returns the underlying transport.
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the next id for the request
    fn next_request_id(&self) -> u64 {
        self.id.fetch_add(1, Ordering::Relaxed)
    }

    /// Sends the request and classifies the response.
    ///
    /// Classification order: transport failure, JSON-RPC error object, `null` result (skipped),
    /// success.
    pub async fn dispatch(&self, request: Request) -> Outcome {
        let id = self.next_request_id();
        trace!(target: "zkprobe::dispatch", id, method = %request.method, "sending request");

        let start = Instant::now();
        let response = self.transport.send(&request.envelope(id)).await;
        let duration = start.elapsed();

        let Request { method, .. } = request;
        match response {
            Err(err) => {
                trace!(target: "zkprobe::dispatch", id, %method, %err, "transport failure");
                Outcome::failure(method, err.into(), Some(duration))
            }
            Ok(body) => classify(method, body, duration),
        }
    }

    /// Convenience wrapper around [`dispatch`](Self::dispatch).
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Outcome {
        self.dispatch(Request::new(method, params)).await
    }
}

fn classify(method: String, mut body: Value, duration: std::time::Duration) -> Outcome {
    if let Some(error) = body.get_mut("error").filter(|error| !error.is_null()) {
        let code = error.get("code").and_then(Value::as_i64);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown JSON-RPC error")
            .to_string();
        let error = error.take();
        let kind = match code {
            Some(code) => ErrorKind::Protocol(code),
            // an error object without a numeric code is not a valid response
            None => ErrorKind::Transport(TransportCode::Http),
        };
        return Outcome::failure(
            method,
            OutcomeError { kind, message, details: Some(error) },
            Some(duration),
        )
    }

    match body.get_mut("result") {
        Some(Value::Null) => Outcome::failure(
            method,
            OutcomeError {
                kind: ErrorKind::Skipped,
                message: "node returned null: no data available".to_string(),
                details: None,
            },
            Some(duration),
        ),
        Some(result) => Outcome::success(method, result.take(), duration),
        None => Outcome::failure(
            method,
            OutcomeError {
                kind: ErrorKind::Transport(TransportCode::Http),
                message: "response carries neither result nor error".to_string(),
                details: Some(body),
            },
            Some(duration),
        ),
    }
}

impl From<TransportError> for OutcomeError {
    fn from(err: TransportError) -> Self {
        Self { kind: ErrorKind::Transport(err.code), message: err.message, details: err.details }
    }
}
