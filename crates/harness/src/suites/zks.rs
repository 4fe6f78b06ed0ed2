//! The `zks_*` suite.

use super::SuiteContext;
use crate::request::Request;
use serde_json::json;

/// Storage slot queried by `zks_getProof`.
const PROOF_STORAGE_KEY: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Method fetching an L2 to L1 message proof.
pub const MESSAGE_PROOF_METHOD: &str = "zks_getL2ToL1MsgProof";

/// Address and batch used by the message proof call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageProofTarget {
    /// An address that sent an L2 to L1 message.
    pub address: String,
    /// An L1 batch the message was sent in.
    pub batch: u64,
}

/// All rollup requests except the message proof, which needs a [`MessageProofTarget`].
pub fn requests(ctx: &SuiteContext<'_>) -> Vec<Request> {
    let batch = json!(ctx.l1_batch_number);
    let block = json!(ctx.block.number);
    vec![
        Request::no_params("zks_L1BatchNumber"),
        Request::new("zks_getL1BatchDetails", vec![batch.clone()]),
        Request::new("zks_getL1BatchBlockRange", vec![batch.clone()]),
        Request::new("zks_getBlockDetails", vec![block.clone()]),
        Request::new("zks_getRawBlockTransactions", vec![block]),
        Request::new("zks_getTransactionDetails", vec![json!(ctx.tx_hash)]),
        Request::new("zks_getAllAccountBalances", vec![json!(ctx.address)]),
        Request::no_params("zks_getBridgeContracts"),
        Request::no_params("zks_getTestnetPaymaster"),
        Request::no_params("zks_getMainContract"),
        Request::no_params("zks_L1ChainId"),
        Request::new("zks_getConfirmedTokens", vec![json!(0), json!(100)]),
        Request::new(
            "zks_estimateFee",
            vec![json!({"from": ctx.address, "to": ctx.address, "data": "0x"})],
        ),
        Request::no_params("zks_getFeeParams"),
        Request::no_params("zks_getProtocolVersion"),
        Request::new(
            "zks_getProof",
            vec![json!(ctx.address), json!([PROOF_STORAGE_KEY]), batch],
        ),
        Request::new(
            "zks_getL2ToL1LogProof",
            vec![json!(ctx.tx_hash), json!(ctx.message_index)],
        ),
    ]
}

/// The message proof request for a discovered or configured target.
pub fn message_proof_request(target: &MessageProofTarget) -> Request {
    Request::new(MESSAGE_PROOF_METHOD, vec![json!(target.address), json!(target.batch)])
}
