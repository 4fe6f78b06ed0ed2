//! The `debug_*` suite.

use super::SuiteContext;
use crate::request::Request;
use serde_json::json;

/// Trace requests for the base block, a call and the configured transaction.
pub fn requests(ctx: &SuiteContext<'_>) -> Vec<Request> {
    let tracer = json!({"tracer": ctx.tracer});
    vec![
        Request::new("debug_traceBlockByNumber", vec![json!(ctx.block.number_hex()), tracer.clone()]),
        Request::new("debug_traceBlockByHash", vec![json!(ctx.block.hash), tracer.clone()]),
        Request::new(
            "debug_traceCall",
            vec![json!({"to": ctx.address, "data": "0x"}), json!("latest"), tracer.clone()],
        ),
        Request::new("debug_traceTransaction", vec![json!(ctx.tx_hash), tracer]),
    ]
}
