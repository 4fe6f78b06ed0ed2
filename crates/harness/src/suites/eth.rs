//! The `eth_*` suite.

use super::{Skip, SuiteContext};
use crate::request::Request;
use serde_json::{json, Value};

/// Methods that need a signing account.
pub const SIGNING_SKIPS: &[Skip] = &[
    Skip { method: "eth_sendTransaction", reason: "requires an unlocked signing account" },
    Skip {
        method: "eth_sendRawTransaction",
        reason: "requires a signed transaction from a funded account",
    },
    Skip { method: "eth_sign", reason: "requires an unlocked signing account" },
    Skip { method: "eth_signTransaction", reason: "requires an unlocked signing account" },
];

/// Methods that need a subscription transport.
pub const STREAMING_SKIPS: &[Skip] = &[
    Skip { method: "eth_subscribe", reason: "requires a streaming (websocket) transport" },
    Skip { method: "eth_unsubscribe", reason: "requires a streaming (websocket) transport" },
];

/// Methods parameterized from the latest successful transaction receipt.
pub const RECEIPT_DEPENDENT_METHODS: [&str; 3] = [
    "eth_getTransactionByBlockHashAndIndex",
    "eth_getTransactionByBlockNumberAndIndex",
    "eth_getLogs",
];

/// Method that removes an installed filter.
pub const UNINSTALL_FILTER: &str = "eth_uninstallFilter";

/// Requests that only need the configured fixtures and the base block.
pub fn base_requests(ctx: &SuiteContext<'_>) -> Vec<Request> {
    let number = ctx.block.number_hex();
    let hash = ctx.block.hash.as_str();
    vec![
        Request::no_params("eth_chainId"),
        Request::no_params("eth_blockNumber"),
        Request::no_params("eth_gasPrice"),
        Request::no_params("eth_syncing"),
        Request::new("eth_getBalance", vec![json!(ctx.address), json!("latest")]),
        Request::new("eth_getCode", vec![json!(ctx.address), json!("latest")]),
        Request::new("eth_getStorageAt", vec![json!(ctx.address), json!("0x0"), json!("latest")]),
        Request::new("eth_getTransactionCount", vec![json!(ctx.address), json!("latest")]),
        Request::new("eth_call", vec![json!({"to": ctx.address, "data": "0x"}), json!("latest")]),
        Request::new(
            "eth_estimateGas",
            vec![json!({"from": ctx.address, "to": ctx.address, "data": "0x"})],
        ),
        Request::new("eth_getBlockByNumber", vec![json!(number), json!(false)]),
        Request::new("eth_getBlockByHash", vec![json!(hash), json!(false)]),
        Request::new("eth_getBlockTransactionCountByNumber", vec![json!(number)]),
        Request::new("eth_getBlockTransactionCountByHash", vec![json!(hash)]),
        Request::new("eth_getTransactionByHash", vec![json!(ctx.tx_hash)]),
        Request::new("eth_getTransactionReceipt", vec![json!(ctx.tx_hash)]),
    ]
}

/// The parts of a transaction receipt later requests depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptRef {
    /// Hash of the containing block.
    pub block_hash: String,
    /// Number of the containing block, as returned by the node.
    pub block_number: String,
    /// Index of the transaction in its block, as returned by the node.
    pub transaction_index: String,
    /// First log emitter, else the recipient, else the sender.
    pub touched_address: Option<String>,
}

impl ReceiptRef {
    /// Extracts the reference from a receipt object. Returns `None` if a block coordinate is
    /// missing.
    pub fn from_value(receipt: &Value) -> Option<Self> {
        let field = |name: &str| receipt.get(name).and_then(Value::as_str).map(str::to_string);
        let touched_address = receipt
            .get("logs")
            .and_then(Value::as_array)
            .and_then(|logs| logs.first())
            .and_then(|log| log.get("address"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| field("to"))
            .or_else(|| field("from"));

        Some(Self {
            block_hash: field("blockHash")?,
            block_number: field("blockNumber")?,
            transaction_index: field("transactionIndex")?,
            touched_address,
        })
    }
}

/// Requests parameterized from a transaction receipt.
pub fn receipt_requests(receipt: &ReceiptRef) -> Vec<Request> {
    let mut filter = json!({
        "fromBlock": receipt.block_number,
        "toBlock": receipt.block_number,
    });
    if let Some(address) = &receipt.touched_address {
        filter["address"] = json!(address);
    }
    vec![
        Request::new(
            "eth_getTransactionByBlockHashAndIndex",
            vec![json!(receipt.block_hash), json!(receipt.transaction_index)],
        ),
        Request::new(
            "eth_getTransactionByBlockNumberAndIndex",
            vec![json!(receipt.block_number), json!(receipt.transaction_index)],
        ),
        Request::new("eth_getLogs", vec![filter]),
    ]
}

/// A create, poll and uninstall sequence for one filter kind.
#[derive(Debug, Clone)]
pub struct FilterLifecycle {
    /// The request installing the filter.
    pub create: Request,
    /// Methods polled with the returned filter id.
    pub polls: &'static [&'static str],
}

impl FilterLifecycle {
    /// A log filter on the base block and the configured address.
    pub fn logs(ctx: &SuiteContext<'_>) -> Self {
        let number = ctx.block.number_hex();
        Self {
            create: Request::new(
                "eth_newFilter",
                vec![json!({"fromBlock": number, "toBlock": number, "address": ctx.address})],
            ),
            polls: &["eth_getFilterChanges", "eth_getFilterLogs"],
        }
    }

    /// A new-block filter.
    pub fn blocks() -> Self {
        Self { create: Request::no_params("eth_newBlockFilter"), polls: &["eth_getFilterChanges"] }
    }

    /// Poll requests for an installed filter.
    pub fn poll_requests(&self, filter_id: &Value) -> Vec<Request> {
        self.polls.iter().map(|method| Request::new(*method, vec![filter_id.clone()])).collect()
    }

    /// The request removing an installed filter.
    pub fn uninstall_request(filter_id: &Value) -> Request {
        Request::new(UNINSTALL_FILTER, vec![filter_id.clone()])
    }
}
