//! Request builders for the three method suites.
//!
//! Builders are pure: they turn the fixtures of a run into [`Request`](crate::Request)s and never
//! touch the network. Sequencing and late binding of parameters live in the
//! [`Orchestrator`](crate::Orchestrator).

pub mod debug;
pub mod eth;
pub mod zks;

/// The block every block-scoped request targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseBlock {
    /// Block number.
    pub number: u64,
    /// `0x`-prefixed block hash.
    pub hash: String,
}

impl BaseBlock {
    /// The block number as `0x`-prefixed lowercase hex.
    pub fn number_hex(&self) -> String {
        format!("{:#x}", self.number)
    }
}

/// Fixtures shared by all suite builders.
#[derive(Debug, Clone, Copy)]
pub struct SuiteContext<'a> {
    /// Account used by balance, code, call and fee requests.
    pub address: &'a str,
    /// Transaction used by receipt, trace and proof requests.
    pub tx_hash: &'a str,
    /// Block used by block-scoped requests.
    pub block: &'a BaseBlock,
    /// L1 batch used by batch-scoped rollup requests.
    pub l1_batch_number: u64,
    /// Log index for the L2 to L1 log proof.
    pub message_index: u64,
    /// Tracer name passed to the debug namespace.
    pub tracer: &'a str,
}

/// A method that is recorded as skipped instead of being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Skip {
    /// The skipped method.
    pub method: &'static str,
    /// Why it is not attempted.
    pub reason: &'static str,
}
