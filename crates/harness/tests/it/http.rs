//! Response classification over the real HTTP transport.

use crate::utils::{dispatcher, mount, mount_error, mount_result};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{MockServer, ResponseTemplate};
use zkprobe_harness::{ErrorKind, HttpTransport, RequestDispatcher, TransportCode};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn success_and_wire_envelope() {
    let server = MockServer::start().await;
    mount_result(&server, "eth_getBalance", json!("0xde0b6b3a7640000")).await;
    let dispatcher = dispatcher(&server, TIMEOUT);

    let params = vec![json!("0x36615cf349d7f6344891b1e7ca7c72883f5dc049"), json!("latest")];
    let outcome = dispatcher.call("eth_getBalance", params.clone()).await;
    assert_eq!(outcome.value(), Some(&json!("0xde0b6b3a7640000")));
    assert!(outcome.duration.is_some());

    let requests = server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["jsonrpc"], json!("2.0"));
    assert_eq!(body["method"], json!("eth_getBalance"));
    assert_eq!(body["params"], Value::Array(params));
    assert!(body["id"].is_u64());
}

#[tokio::test]
async fn null_result_is_skipped() {
    let server = MockServer::start().await;
    mount_result(&server, "zks_getL1BatchDetails", Value::Null).await;

    let outcome = dispatcher(&server, TIMEOUT).call("zks_getL1BatchDetails", vec![json!(1)]).await;
    assert!(outcome.is_skipped());
    assert!(!outcome.is_failure());
}

#[tokio::test]
async fn rpc_error_is_protocol() {
    let server = MockServer::start().await;
    mount_error(&server, "eth_call", -32000, "execution reverted").await;

    let outcome = dispatcher(&server, TIMEOUT).call("eth_call", vec![]).await;
    let err = outcome.error().unwrap();
    assert_eq!(err.kind, ErrorKind::Protocol(-32000));
    assert_eq!(err.message, "execution reverted");
}

#[tokio::test]
async fn non_2xx_is_transport() {
    let server = MockServer::start().await;
    mount(&server, "eth_chainId", ResponseTemplate::new(500).set_body_string("boom")).await;
    mount(
        &server,
        "eth_gasPrice",
        ResponseTemplate::new(429).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32005, "message": "rate limited"}
        })),
    )
    .await;
    let dispatcher = dispatcher(&server, TIMEOUT);

    let outcome = dispatcher.call("eth_chainId", vec![]).await;
    let err = outcome.error().unwrap();
    assert_eq!(err.kind, ErrorKind::Transport(TransportCode::Status(500)));
    assert_eq!(err.kind.code(), "HTTP_500");

    let outcome = dispatcher.call("eth_gasPrice", vec![]).await;
    let err = outcome.error().unwrap();
    assert_eq!(err.kind, ErrorKind::Transport(TransportCode::Embedded(-32005)));
    assert_eq!(err.message, "rate limited");
}

#[tokio::test]
async fn unparsable_body_is_transport() {
    let server = MockServer::start().await;
    mount(&server, "eth_syncing", ResponseTemplate::new(200).set_body_string("<html>")).await;

    let outcome = dispatcher(&server, TIMEOUT).call("eth_syncing", vec![]).await;
    assert_eq!(outcome.error().unwrap().kind, ErrorKind::Transport(TransportCode::Http));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    mount(
        &server,
        "debug_traceBlockByNumber",
        ResponseTemplate::new(200)
            .set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": []}))
            .set_delay(Duration::from_secs(2)),
    )
    .await;

    let outcome = dispatcher(&server, Duration::from_millis(100))
        .call("debug_traceBlockByNumber", vec![json!("0x1")])
        .await;
    assert_eq!(outcome.error().unwrap().kind, ErrorKind::Transport(TransportCode::Timeout));
}

#[tokio::test]
async fn refused_connection_is_connect() {
    // bind and release a port so nothing listens on it
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let transport =
        HttpTransport::new(format!("http://{addr}").parse().unwrap(), TIMEOUT).unwrap();

    let outcome = RequestDispatcher::new(transport).call("eth_chainId", vec![]).await;
    let err = outcome.error().unwrap();
    assert_eq!(err.kind, ErrorKind::Transport(TransportCode::Connect));
    assert_eq!(err.kind.code(), "CONNECT");
}
