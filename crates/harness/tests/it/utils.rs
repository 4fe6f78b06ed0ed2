use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{body_partial_json, method},
    Mock, MockServer, ResponseTemplate,
};
use zkprobe_harness::{HttpTransport, RawSettings, RequestDispatcher};

pub const ADDRESS: &str = "0x36615cf349d7f6344891b1e7ca7c72883f5dc049";
pub const SENDER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
pub const BLOCK_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

/// Answers `rpc_method` with `{"result": result}`.
pub async fn mount_result(server: &MockServer, rpc_method: &str, result: Value) {
    let body = envelope(json!({"result": result}));
    mount(server, rpc_method, ResponseTemplate::new(200).set_body_json(body)).await;
}

/// Answers `rpc_method` with a JSON-RPC error object.
pub async fn mount_error(server: &MockServer, rpc_method: &str, code: i64, message: &str) {
    let body = envelope(json!({"error": {"code": code, "message": message}}));
    mount(server, rpc_method, ResponseTemplate::new(200).set_body_json(body)).await;
}

/// Answers `rpc_method` with an arbitrary response.
pub async fn mount(server: &MockServer, rpc_method: &str, response: ResponseTemplate) {
    Mock::given(method("POST"))
        .and(body_partial_json(json!({"jsonrpc": "2.0", "method": rpc_method})))
        .respond_with(response)
        .mount(server)
        .await;
}

fn envelope(mut member: Value) -> Value {
    member["jsonrpc"] = json!("2.0");
    member["id"] = json!(1);
    member
}

pub fn dispatcher(server: &MockServer, timeout: Duration) -> RequestDispatcher<HttpTransport> {
    let transport = HttpTransport::new(server.uri().parse().unwrap(), timeout).unwrap();
    RequestDispatcher::new(transport)
}

pub fn settings(rpc_url: String) -> RawSettings {
    RawSettings {
        rpc_url: Some(rpc_url),
        tx_hash: Some(format!("0x{}", "ab".repeat(32))),
        address: Some(ADDRESS.to_string()),
        l1_batch_number: Some(9),
        batch_size: Some(8),
        batch_delay: Some(Duration::from_millis(5)),
        request_timeout: Some(Duration::from_secs(5)),
        ..Default::default()
    }
}
