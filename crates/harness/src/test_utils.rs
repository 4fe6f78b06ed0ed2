//! In-memory transport for tests.

use crate::{
    request::{JsonRpcEnvelope, Request},
    transport::{RpcTransport, TransportError},
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

type Handler = Arc<dyn Fn(&[Value]) -> MockReply + Send + Sync>;

/// What the [`MockTransport`] answers for a method.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// `{"result": value}`
    Result(Value),
    /// `{"error": {code, message, data?}}`
    Error {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional `data` member.
        data: Option<Value>,
    },
    /// `{"result": null}`
    Null,
    /// A failure below the JSON-RPC layer.
    Transport(TransportError),
}

impl MockReply {
    /// A JSON-RPC error reply.
    pub fn error(code: i64, message: impl Into<String>) -> Self {
        Self::Error { code, message: message.into(), data: None }
    }

    /// Attaches a `data` member to an error reply.
    pub fn with_data(self, value: Value) -> Self {
        match self {
            Self::Error { code, message, .. } => Self::Error { code, message, data: Some(value) },
            other => other,
        }
    }

    fn into_body(self, id: u64) -> Result<Value, TransportError> {
        match self {
            Self::Result(result) => Ok(json!({"jsonrpc": "2.0", "id": id, "result": result})),
            Self::Null => Ok(json!({"jsonrpc": "2.0", "id": id, "result": null})),
            Self::Error { code, message, data } => {
                let mut error = json!({"code": code, "message": message});
                if let Some(data) = data {
                    error["data"] = data;
                }
                Ok(json!({"jsonrpc": "2.0", "id": id, "error": error}))
            }
            Self::Transport(err) => Err(err),
        }
    }
}

/// A scripted [`RpcTransport`].
///
/// Methods without a scripted reply answer with `-32601 method not found`. Every sent request
/// is kept for later inspection.
#[derive(Default)]
pub struct MockTransport {
    handlers: HashMap<String, Handler>,
    latency: Option<Duration>,
    sent: Mutex<Vec<(u64, Request)>>,
}

impl MockTransport {
    /// Answers `method` with a fixed result.
    pub fn with_result(self, method: &str, result: Value) -> Self {
        self.with_reply(method, MockReply::Result(result))
    }

    /// Answers `method` with a fixed reply.
    pub fn with_reply(self, method: &str, reply: MockReply) -> Self {
        self.with_handler(method, move |_| reply.clone())
    }

    /// Answers `method` with a reply computed from the request parameters.
    pub fn with_handler<F>(mut self, method: &str, handler: F) -> Self
    where
        F: Fn(&[Value]) -> MockReply + Send + Sync + 'static,
    {
        self.handlers.insert(method.to_string(), Arc::new(handler));
        self
    }

    /// Delays every reply by `latency`.
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All requests sent so far, in send order.
    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().iter().map(|(_, request)| request.clone()).collect()
    }

    /// Methods sent so far, in send order.
    pub fn sent_methods(&self) -> Vec<String> {
        self.sent.lock().iter().map(|(_, request)| request.method.clone()).collect()
    }

    /// Wire ids used so far, in send order.
    pub fn sent_ids(&self) -> Vec<u64> {
        self.sent.lock().iter().map(|(id, _)| *id).collect()
    }

    /// Parameters of the last request for `method`.
    pub fn last_params(&self, method: &str) -> Option<Vec<Value>> {
        self.sent
            .lock()
            .iter()
            .rev()
            .find(|(_, request)| request.method == method)
            .map(|(_, request)| request.params.clone())
    }

    /// Number of requests sent for `method`.
    pub fn count(&self, method: &str) -> usize {
        self.sent.lock().iter().filter(|(_, request)| request.method == method).count()
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport")
            .field("methods", &self.handlers.keys().collect::<Vec<_>>())
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

#[async_trait::async_trait]
impl RpcTransport for MockTransport {
    async fn send(&self, envelope: &JsonRpcEnvelope<'_>) -> Result<Value, TransportError> {
        let request = Request::new(envelope.method, envelope.params.to_vec());
        self.sent.lock().push((envelope.id, request));

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let reply = match self.handlers.get(envelope.method) {
            Some(handler) => handler(envelope.params),
            None => {
                MockReply::error(-32601, format!("the method {} does not exist", envelope.method))
            }
        };
        reply.into_body(envelope.id)
    }
}
