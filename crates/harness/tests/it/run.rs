//! Full runs against a mock node.

use crate::utils::{mount, mount_result, settings, BLOCK_HASH, SENDER};
use serde_json::json;
use wiremock::{MockServer, ResponseTemplate};
use zkprobe_harness::{HarnessConfig, HarnessError, Orchestrator, ERRORS_FILE_NAME, RESULTS_FILE_NAME};

#[tokio::test]
async fn run_writes_result_files() {
    zkprobe_tracing::init_test_tracing();
    let server = MockServer::start().await;
    mount_result(&server, "eth_blockNumber", json!("0x1b4")).await;
    mount_result(&server, "eth_getBlockByNumber", json!({"number": "0x1b4", "hash": BLOCK_HASH}))
        .await;
    mount_result(&server, "eth_chainId", json!("0x144")).await;
    mount_result(&server, "eth_getTransactionReceipt", json!(null)).await;
    mount_result(&server, "zks_L1BatchNumber", json!(9)).await;
    mount_result(&server, "zks_getL1BatchDetails", json!({"l2ToL1Messages": [{"sender": SENDER}]}))
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut raw = settings(server.uri());
    raw.log_dir = Some(dir.path().join("logs"));
    let config = HarnessConfig::from_raw(raw).unwrap();

    let mut orchestrator = Orchestrator::from_config(config).unwrap();
    let summary = orchestrator.run().await.unwrap();

    assert_eq!(summary.total, 56);
    assert_eq!(summary.total, summary.succeeded + summary.failed + summary.skipped);
    // receipt-derived calls, filter follow-ups and signing/streaming methods
    assert!(summary.skipped >= 3 + 6 + 6);

    let results = std::fs::read_to_string(dir.path().join("logs").join(RESULTS_FILE_NAME)).unwrap();
    assert!(results.contains("eth_chainId - Success"));
    assert!(results.contains("eth_getTransactionReceipt - Skipped"));
    assert!(results.contains("zks_getL2ToL1MsgProof - Failed"));

    let errors = std::fs::read_to_string(dir.path().join("logs").join(ERRORS_FILE_NAME)).unwrap();
    assert!(errors.contains("eth_sendRawTransaction - Error Code: SKIPPED"));
    assert!(errors.contains("eth_getLogs - Error Code: SKIPPED"));
    assert!(!errors.contains("Fatal error"));

    // the message proof used the discovered sender and its latest batch
    let proof = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|request| serde_json::from_slice::<serde_json::Value>(&request.body).unwrap())
        .find(|body| body["method"] == "zks_getL2ToL1MsgProof")
        .unwrap();
    assert_eq!(proof["params"], json!([SENDER, 9]));
}

#[tokio::test]
async fn unreachable_head_is_fatal() {
    let server = MockServer::start().await;
    mount(&server, "eth_blockNumber", ResponseTemplate::new(503)).await;

    let dir = tempfile::tempdir().unwrap();
    let mut raw = settings(server.uri());
    raw.log_dir = Some(dir.path().to_path_buf());
    let mut orchestrator = Orchestrator::from_config(HarnessConfig::from_raw(raw).unwrap()).unwrap();

    let err = orchestrator.run().await.unwrap_err();
    assert!(matches!(err, HarnessError::BaseBlock(_)));

    let errors = std::fs::read_to_string(dir.path().join(ERRORS_FILE_NAME)).unwrap();
    assert!(errors.contains("eth_blockNumber - Error Code: HTTP_503"));
    assert!(errors.contains("Fatal error: failed to resolve base block"));
}
