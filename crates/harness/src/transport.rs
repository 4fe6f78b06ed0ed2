//! Transports that carry JSON-RPC envelopes to the node.

use crate::{outcome::TransportCode, request::JsonRpcEnvelope};
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::{error::Error as _, fmt, time::Duration};

/// Longest raw body kept as detail on a transport error.
const MAX_BODY_DETAIL: usize = 512;

/// Sends one JSON-RPC envelope and returns the decoded response body.
///
/// Implementations only report failures below the JSON-RPC layer. Interpreting `result` and
/// `error` members is left to the [`RequestDispatcher`](crate::RequestDispatcher).
#[async_trait::async_trait]
pub trait RpcTransport: Send + Sync + fmt::Debug {
    /// Sends the envelope and returns the JSON body of a successful response.
    async fn send(&self, envelope: &JsonRpcEnvelope<'_>) -> Result<Value, TransportError>;
}

/// A failure below the JSON-RPC layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    /// Classification code.
    pub code: TransportCode,
    /// Description of the failure.
    pub message: String,
    /// Response body, when one was received.
    pub details: Option<Value>,
}

impl TransportError {
    /// Creates a new error without details.
    pub fn new(code: TransportCode, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), details: None }
    }

    /// Classifies a non-2xx response.
    ///
    /// If the body is a JSON-RPC error object its code and message are carried over, otherwise
    /// the HTTP status is used.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let parsed = serde_json::from_slice::<Value>(body).ok();
        let embedded = parsed.as_ref().and_then(|body| body.get("error")).and_then(|error| {
            let code = error.get("code")?.as_i64()?;
            let message = error.get("message").and_then(Value::as_str).unwrap_or_default();
            Some((code, message.to_string()))
        });

        match embedded {
            Some((code, message)) => {
                Self { code: TransportCode::Embedded(code), message, details: parsed }
            }
            None => Self {
                code: TransportCode::Status(status.as_u16()),
                message: format!("HTTP status {status}"),
                details: parsed.or_else(|| body_detail(body)),
            },
        }
    }

    /// A 2xx response whose body is not JSON.
    pub fn malformed(err: serde_json::Error, body: &[u8]) -> Self {
        Self {
            code: TransportCode::Http,
            message: format!("malformed response body: {err}"),
            details: body_detail(body),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            TransportCode::Timeout
        } else if err.is_connect() {
            TransportCode::Connect
        } else if let Some(status) = err.status() {
            TransportCode::Status(status.as_u16())
        } else {
            TransportCode::Http
        };

        // reqwest hides the interesting part (refused, dns, tls) in the source chain
        let mut message = err.to_string();
        let mut source = err.source();
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }

        Self::new(code, message)
    }
}

fn body_detail(body: &[u8]) -> Option<Value> {
    if body.is_empty() {
        return None
    }
    let text = String::from_utf8_lossy(body);
    let text: String = text.chars().take(MAX_BODY_DETAIL).collect();
    Some(Value::String(text))
}

/// JSON-RPC over HTTP POST to a single endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    endpoint: Url,
    client: Client,
}

impl HttpTransport {
    /// Creates a transport with a client-wide request timeout.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, TransportError> {
        let client = Client::builder().use_rustls_tls().timeout(timeout).build()?;
        Ok(Self { endpoint, client })
    }
}

#[async_trait::async_trait]
impl RpcTransport for HttpTransport {
    async fn send(&self, envelope: &JsonRpcEnvelope<'_>) -> Result<Value, TransportError> {
        let response = self.client.post(self.endpoint.clone()).json(envelope).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(TransportError::from_status(status, &body))
        }

        serde_json::from_slice(&body).map_err(|err| TransportError::malformed(err, &body))
    }
}
