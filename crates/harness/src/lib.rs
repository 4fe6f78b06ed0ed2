//! JSON-RPC conformance and smoke-test harness for zkSync-style rollup nodes.
//!
//! A run exercises the `eth`, `debug` and `zks` namespaces of one endpoint:
//!
//! - [`Orchestrator`] resolves the base block and a message proof target, then builds and drains
//!   one suite after the other, parameterizing later requests from earlier outcomes.
//! - [`BatchQueueProcessor`] drains a [`RequestQueue`] in paced, concurrently dispatched
//!   batches.
//! - [`RequestDispatcher`] sends a single [`Request`] through an [`RpcTransport`] and classifies
//!   the response into an [`Outcome`].
//! - [`ResultLedger`] keeps every outcome in order; a [`ResultSink`] mirrors them into the
//!   result files.
//! - [`AddressDiscoveryEngine`] mines recent L1 batches for addresses that sent L2 to L1
//!   messages.
//!
//! Per-request failures never abort a run. Only configuration errors ([`ConfigError`]) and
//! orchestration faults ([`HarnessError`]) propagate.
//!
//! ## Feature Flags
//!
//! - `test-utils`: Export the scripted [`test_utils::MockTransport`].

#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod config;
pub mod discovery;
pub mod dispatcher;
pub mod error;
pub mod ledger;
pub mod orchestrator;
pub mod outcome;
pub mod processor;
pub mod request;
pub mod sink;
pub mod suites;
pub mod summary;
pub mod transport;
pub mod validate;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, HarnessConfig, RawSettings};
pub use discovery::{AddressDiscoveryEngine, DiscoveryError, MessageSenderIndex, SenderStats};
pub use dispatcher::RequestDispatcher;
pub use error::HarnessError;
pub use ledger::ResultLedger;
pub use orchestrator::Orchestrator;
pub use outcome::{ErrorKind, Outcome, OutcomeError, TransportCode};
pub use processor::{BatchQueueProcessor, BatchReport, DrainReport};
pub use request::{JsonRpcEnvelope, Request, RequestQueue};
pub use sink::{FileSink, MemorySink, ResultSink, ERRORS_FILE_NAME, RESULTS_FILE_NAME};
pub use summary::RunSummary;
pub use transport::{HttpTransport, RpcTransport, TransportError};
pub use validate::FixtureError;
