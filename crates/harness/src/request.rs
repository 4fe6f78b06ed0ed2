//! Requests and the queue they wait in.

use serde::Serialize;
use serde_json::Value;
use std::collections::VecDeque;

/// A JSON-RPC call that has not been sent yet.
///
/// The wire id is assigned by the dispatcher when the request is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The method name, e.g. `eth_chainId`.
    pub method: String,
    /// Positional parameters.
    pub params: Vec<Value>,
}

impl Request {
    /// Creates a new request.
    pub fn new(method: impl Into<String>, params: Vec<Value>) -> Self {
        Self { method: method.into(), params }
    }

    /// Creates a request without parameters.
    pub fn no_params(method: impl Into<String>) -> Self {
        Self::new(method, Vec::new())
    }

    /// Returns the JSON-RPC 2.0 envelope for this request with the given id.
    pub fn envelope(&self, id: u64) -> JsonRpcEnvelope<'_> {
        JsonRpcEnvelope { jsonrpc: "2.0", id, method: &self.method, params: &self.params }
    }
}

/// The JSON-RPC 2.0 request object as it goes on the wire.
#[derive(Debug, Serialize)]
pub struct JsonRpcEnvelope<'a> {
    /// Always `"2.0"`.
    pub jsonrpc: &'static str,
    /// Correlation id, unique per dispatcher.
    pub id: u64,
    /// Method name.
    pub method: &'a str,
    /// Positional parameters.
    pub params: &'a [Value],
}

/// FIFO of requests waiting to be dispatched.
///
/// The queue only grows by [`enqueue`](Self::enqueue) and only shrinks by
/// [`drain_batch`](Self::drain_batch).
#[derive(Debug, Default)]
pub struct RequestQueue {
    inner: VecDeque<Request>,
}

impl RequestQueue {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a request.
    pub fn enqueue(&mut self, request: Request) {
        self.inner.push_back(request);
    }

    /// Removes and returns up to `size` requests from the front of the queue.
    pub fn drain_batch(&mut self, size: usize) -> Vec<Request> {
        let take = size.min(self.inner.len());
        self.inner.drain(..take).collect()
    }

    /// Number of queued requests.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Extend<Request> for RequestQueue {
    fn extend<I: IntoIterator<Item = Request>>(&mut self, iter: I) {
        self.inner.extend(iter);
    }
}

impl FromIterator<Request> for RequestQueue {
    fn from_iter<I: IntoIterator<Item = Request>>(iter: I) -> Self {
        Self { inner: iter.into_iter().collect() }
    }
}
