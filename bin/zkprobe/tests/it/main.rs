#![allow(missing_docs)]

use std::process::{Command, Output};

const ZKPROBE: &str = env!("CARGO_BIN_EXE_zkprobe");

const ENV_VARS: &[&str] = &[
    "ZKPROBE_CONFIG",
    "RPC_URL",
    "TEST_TX_HASH",
    "TEST_ADDRESS",
    "TEST_L1_BATCH_NUMBER",
    "TEST_BLOCK_NUMBER",
    "TEST_BLOCK_HASH",
    "TEST_MESSAGE_INDEX",
    "TEST_MESSAGE_PROOF_ADDRESS",
    "DEBUG_TRACER_TYPE",
    "BATCH_SIZE",
    "BATCH_DELAY_MS",
    "MAX_REQUESTS_PER_SECOND",
    "LOG_DIR",
];

/// Runs `zkprobe <args>` with a clean settings environment.
fn zkprobe(args: &[&str]) -> Output {
    let mut command = Command::new(ZKPROBE);
    for var in ENV_VARS {
        command.env_remove(var);
    }
    command.env("RUST_LOG", "off").args(args).output().unwrap()
}

#[test]
fn help() {
    let output = zkprobe(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("Usage"), "stdout: {stdout}");
    assert!(stdout.contains("--rpc-url"), "stdout: {stdout}");
    assert!(stdout.contains("TEST_MESSAGE_PROOF_ADDRESS"), "stdout: {stdout}");
}

#[test]
fn version() {
    let output = zkprobe(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("zkprobe"));
}

#[test]
fn missing_settings_fail_before_logs() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    let output = zkprobe(&["--log-dir", log_dir.to_str().unwrap(), "--tx-hash", "0x1234"]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2), "stderr: {stderr}");
    assert!(stderr.contains("RPC_URL is required"), "stderr: {stderr}");
    assert!(!log_dir.exists());
}

#[test]
fn malformed_fixture_fails_before_logs() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");

    let output = zkprobe(&[
        "--rpc-url",
        "http://127.0.0.1:1",
        "--tx-hash",
        "0x1234",
        "--address",
        "0x36615cf349d7f6344891b1e7ca7c72883f5dc049",
        "--l1-batch-number",
        "1",
        "--log-dir",
        log_dir.to_str().unwrap(),
    ]);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(output.status.code(), Some(2), "stderr: {stderr}");
    assert!(stderr.contains("transaction hash"), "stderr: {stderr}");
    assert!(!log_dir.exists());
}

#[test]
fn unreachable_node_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let log_dir = dir.path().join("logs");
    // bind and release a port so nothing listens on it
    let addr = std::net::TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let tx_hash = format!("0x{}", "ab".repeat(32));

    let output = zkprobe(&[
        "--rpc-url",
        &format!("http://{addr}"),
        "--tx-hash",
        &tx_hash,
        "--address",
        "0x36615cf349d7f6344891b1e7ca7c72883f5dc049",
        "--l1-batch-number",
        "1",
        "--log-dir",
        log_dir.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let errors = std::fs::read_to_string(log_dir.join("errors.log")).unwrap();
    assert!(errors.contains("eth_blockNumber - Error Code: CONNECT"), "errors: {errors}");
    assert!(errors.contains("Fatal error:"), "errors: {errors}");
    assert!(log_dir.join("test_results.log").exists());
}

const fn main() {}
