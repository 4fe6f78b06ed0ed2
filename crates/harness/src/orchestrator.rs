//! Sequencing of a full run.

use crate::{
    config::HarnessConfig,
    discovery::AddressDiscoveryEngine,
    dispatcher::RequestDispatcher,
    error::HarnessError,
    ledger::ResultLedger,
    outcome::Outcome,
    processor::BatchQueueProcessor,
    request::{Request, RequestQueue},
    sink::{FileSink, ResultSink},
    suites::{
        debug,
        eth::{self, FilterLifecycle, ReceiptRef},
        zks::{self, MessageProofTarget},
        BaseBlock, SuiteContext,
    },
    summary::RunSummary,
    transport::{HttpTransport, RpcTransport},
    validate::parse_block_number,
};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Drives one run: base block, message proof target, then the `eth`, `debug` and `zks` suites
/// in strict sequence.
///
/// The orchestrator owns the queue, the ledger and the sink. Each suite is built, enqueued and
/// fully drained before the next one is built, so later requests can be parameterized from
/// earlier outcomes in the ledger.
#[derive(Debug)]
pub struct Orchestrator<T, S> {
    config: HarnessConfig,
    dispatcher: RequestDispatcher<T>,
    processor: BatchQueueProcessor,
    queue: RequestQueue,
    ledger: ResultLedger,
    sink: S,
}

impl Orchestrator<HttpTransport, FileSink> {
    /// Builds an orchestrator that talks HTTP to the configured endpoint and writes the result
    /// files into the configured log directory, truncating them.
    pub fn from_config(config: HarnessConfig) -> Result<Self, HarnessError> {
        let transport = HttpTransport::new(config.rpc_url.clone(), config.request_timeout)?;
        let sink = FileSink::create(&config.log_dir)?;
        Ok(Self::new(config, transport, sink))
    }
}

impl<T: RpcTransport, S: ResultSink> Orchestrator<T, S> {
    /// Creates a new orchestrator.
    pub fn new(config: HarnessConfig, transport: T, sink: S) -> Self {
        let processor = BatchQueueProcessor::new(config.batch_size, config.batch_delay);
        Self {
            config,
            dispatcher: RequestDispatcher::new(transport),
            processor,
            queue: RequestQueue::new(),
            ledger: ResultLedger::new(),
            sink,
        }
    }

    /// Every outcome recorded so far.
    pub const fn ledger(&self) -> &ResultLedger {
        &self.ledger
    }

    /// The result sink.
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// The result sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The dispatcher, for inspection of the transport.
    pub const fn dispatcher(&self) -> &RequestDispatcher<T> {
        &self.dispatcher
    }

    /// Runs all suites and summarizes the ledger.
    ///
    /// Only orchestration faults are returned as errors; a fault is also written to the error
    /// stream of the sink. Individual request failures are part of the summary.
    pub async fn run(&mut self) -> Result<RunSummary, HarnessError> {
        match self.run_suites().await {
            Ok(()) => Ok(RunSummary::from_ledger(&self.ledger)),
            Err(err) => {
                if let Err(sink_err) = self.sink.fatal(&err.to_string()) {
                    warn!(target: "zkprobe::orchestrator", %sink_err, "Failed to write fatal entry");
                }
                Err(err)
            }
        }
    }

    async fn run_suites(&mut self) -> Result<(), HarnessError> {
        info!(
            target: "zkprobe::orchestrator",
            batch_size = self.processor.batch_size().get(),
            batch_delay = ?self.processor.batch_delay(),
            max_requests_per_second = self.config.max_requests_per_second,
            "Starting run"
        );

        let block = self.resolve_base_block().await?;
        info!(
            target: "zkprobe::orchestrator",
            number = %block.number_hex(),
            hash = %block.hash,
            "Using base block"
        );

        let message_proof = self.resolve_message_proof_target().await;

        info!(target: "zkprobe::orchestrator", "Running eth suite");
        self.run_eth_suite(&block).await;

        info!(target: "zkprobe::orchestrator", "Running debug suite");
        let requests = debug::requests(&self.context(&block));
        self.enqueue_and_drain(requests).await;

        info!(target: "zkprobe::orchestrator", "Running zks suite");
        self.run_zks_suite(&block, message_proof).await;

        Ok(())
    }

    fn context<'a>(&'a self, block: &'a BaseBlock) -> SuiteContext<'a> {
        SuiteContext {
            address: &self.config.address,
            tx_hash: &self.config.tx_hash,
            block,
            l1_batch_number: self.config.l1_batch_number,
            message_index: self.config.message_index,
            tracer: &self.config.tracer,
        }
    }

    /// Determines the base block from configuration, falling back to the chain head.
    ///
    /// Probes are recorded directly in the ledger. A configured half is completed from the block
    /// it names, so both halves always describe the same block.
    async fn resolve_base_block(&mut self) -> Result<BaseBlock, HarnessError> {
        match (self.config.block_number, self.config.block_hash.clone()) {
            (Some(number), Some(hash)) => Ok(BaseBlock { number, hash }),
            (None, Some(hash)) => {
                let block = self.fetch_block("eth_getBlockByHash", json!(hash)).await?;
                let number = block
                    .get("number")
                    .and_then(Value::as_str)
                    .and_then(|raw| parse_block_number(raw).ok())
                    .ok_or_else(|| {
                        HarnessError::BaseBlock(format!("block {hash} has no block number"))
                    })?;
                Ok(BaseBlock { number, hash })
            }
            (number, None) => {
                let number = match number {
                    Some(number) => number,
                    None => self.fetch_head_number().await?,
                };
                let block =
                    self.fetch_block("eth_getBlockByNumber", json!(format!("{number:#x}"))).await?;
                let hash = block
                    .get("hash")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        HarnessError::BaseBlock(format!("block {number:#x} has no block hash"))
                    })?;
                Ok(BaseBlock { number, hash })
            }
        }
    }

    async fn fetch_head_number(&mut self) -> Result<u64, HarnessError> {
        info!(target: "zkprobe::orchestrator", "Fetching latest block information");
        let outcome = self.dispatcher.call("eth_blockNumber", vec![]).await;
        let number =
            outcome.value().and_then(Value::as_str).and_then(|raw| parse_block_number(raw).ok());
        let reason = describe(&outcome);
        self.record(outcome);
        number.ok_or_else(|| {
            HarnessError::BaseBlock(format!("eth_blockNumber returned no block number: {reason}"))
        })
    }

    /// Fetches a block header with `method`, recording the probe.
    async fn fetch_block(&mut self, method: &str, block: Value) -> Result<Value, HarnessError> {
        let outcome = self.dispatcher.call(method, vec![block, json!(false)]).await;
        let value = outcome.value().filter(|value| value.is_object()).cloned();
        let reason = describe(&outcome);
        self.record(outcome);
        value.ok_or_else(|| HarnessError::BaseBlock(format!("{method} returned no block: {reason}")))
    }

    /// Picks the address and batch for the message proof call.
    ///
    /// A configured address must have sent a message in a recently scanned batch. Without one,
    /// the top-ranked discovered sender is adopted. On `Err` the message proof call is skipped
    /// with the returned reason.
    async fn resolve_message_proof_target(&self) -> Result<MessageProofTarget, String> {
        let engine = AddressDiscoveryEngine::new(&self.dispatcher);

        let Some(configured) = &self.config.message_proof_address else {
            info!(
                target: "zkprobe::orchestrator",
                "No message proof address configured, discovering one"
            );
            let target = engine.suggest().await.into_iter().find_map(|sender| {
                Some(MessageProofTarget { batch: sender.latest_batch()?, address: sender.address })
            });
            return match target {
                Some(target) => {
                    info!(
                        target: "zkprobe::orchestrator",
                        address = %target.address,
                        batch = target.batch,
                        "Adopting top message sender for message proof"
                    );
                    Ok(target)
                }
                None => Err("no L2 to L1 message senders found in recent batches".to_string()),
            }
        };

        match engine.validate_message_proof_address(configured).await {
            Ok(sender) => {
                let batch = if sender.batches.contains(&self.config.l1_batch_number) {
                    self.config.l1_batch_number
                } else {
                    sender.latest_batch().unwrap_or(self.config.l1_batch_number)
                };
                info!(
                    target: "zkprobe::orchestrator",
                    address = %sender.address,
                    batch,
                    "Using validated message proof address"
                );
                Ok(MessageProofTarget { address: sender.address, batch })
            }
            Err(err) => {
                warn!(target: "zkprobe::orchestrator", %err, "Skipping message proof");
                Err(format!("message proof address rejected: {err}"))
            }
        }
    }

    async fn run_eth_suite(&mut self, block: &BaseBlock) {
        let requests = eth::base_requests(&self.context(block));
        self.enqueue_and_drain(requests).await;

        let receipt = self
            .ledger
            .latest_success("eth_getTransactionReceipt")
            .and_then(Outcome::value)
            .and_then(ReceiptRef::from_value);
        match receipt {
            Some(receipt) => {
                debug!(target: "zkprobe::orchestrator", ?receipt, "Deriving requests from receipt");
                self.enqueue_and_drain(eth::receipt_requests(&receipt)).await;
            }
            None => {
                let reason = "no successful eth_getTransactionReceipt to derive parameters from";
                for method in eth::RECEIPT_DEPENDENT_METHODS {
                    self.skip(method, reason);
                }
            }
        }

        let lifecycles = [FilterLifecycle::logs(&self.context(block)), FilterLifecycle::blocks()];
        for lifecycle in lifecycles {
            self.run_filter_lifecycle(lifecycle).await;
        }

        for skip in eth::SIGNING_SKIPS.iter().chain(eth::STREAMING_SKIPS) {
            self.skip(skip.method, skip.reason);
        }
    }

    /// Create, poll and uninstall one filter. Every outcome obtained along the way is recorded.
    async fn run_filter_lifecycle(&mut self, lifecycle: FilterLifecycle) {
        let create_method = lifecycle.create.method.clone();
        let outcome = self.dispatcher.dispatch(lifecycle.create.clone()).await;
        let filter_id = outcome
            .value()
            .filter(|id| id.as_str().is_some_and(|id| !id.is_empty()))
            .cloned();
        self.record(outcome);

        let Some(filter_id) = filter_id else {
            let reason = format!("{create_method} returned no filter id");
            debug!(target: "zkprobe::orchestrator", %reason, "Skipping filter polling");
            for method in lifecycle.polls {
                self.skip(method, &reason);
            }
            self.skip(eth::UNINSTALL_FILTER, &reason);
            return
        };

        self.enqueue_and_drain(lifecycle.poll_requests(&filter_id)).await;
        let outcome = self.dispatcher.dispatch(FilterLifecycle::uninstall_request(&filter_id)).await;
        self.record(outcome);
    }

    async fn run_zks_suite(
        &mut self,
        block: &BaseBlock,
        message_proof: Result<MessageProofTarget, String>,
    ) {
        let mut requests = zks::requests(&self.context(block));
        match message_proof {
            Ok(target) => requests.push(zks::message_proof_request(&target)),
            Err(reason) => self.skip(zks::MESSAGE_PROOF_METHOD, &reason),
        }
        self.enqueue_and_drain(requests).await;
    }

    async fn enqueue_and_drain(&mut self, requests: Vec<Request>) {
        self.queue.extend(requests);
        self.processor
            .drain(&mut self.queue, &self.dispatcher, &mut self.ledger, &mut self.sink)
            .await;
    }

    fn record(&mut self, outcome: Outcome) {
        self.processor.record(outcome, &mut self.ledger, &mut self.sink);
    }

    fn skip(&mut self, method: &str, reason: &str) {
        self.processor.record_skip(method, reason, &mut self.ledger, &mut self.sink);
    }
}

/// Short description of an outcome for fault messages.
fn describe(outcome: &Outcome) -> String {
    match outcome.error() {
        Some(err) => err.to_string(),
        None => "unexpected result".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::RawSettings,
        sink::MemorySink,
        test_utils::{MockReply, MockTransport},
    };

    const ADDRESS: &str = "0x36615cf349d7f6344891b1e7ca7c72883f5dc049";
    const SENDER: &str = "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    const HEAD_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";
    const RECEIPT_BLOCK_HASH: &str =
        "0x2222222222222222222222222222222222222222222222222222222222222222";

    fn tx_hash() -> String {
        format!("0x{}", "ab".repeat(32))
    }

    fn settings() -> RawSettings {
        RawSettings {
            rpc_url: Some("http://127.0.0.1:3050".to_string()),
            tx_hash: Some(tx_hash()),
            address: Some(ADDRESS.to_string()),
            l1_batch_number: Some(9),
            batch_size: Some(4),
            batch_delay: Some(std::time::Duration::ZERO),
            ..Default::default()
        }
    }

    /// A node that answers everything the run needs.
    fn node() -> MockTransport {
        MockTransport::default()
            .with_result("eth_blockNumber", json!("0x1b4"))
            .with_handler("eth_getBlockByNumber", |params| {
                MockReply::Result(json!({"number": params[0], "hash": HEAD_HASH}))
            })
            .with_result(
                "eth_getTransactionReceipt",
                json!({
                    "blockHash": RECEIPT_BLOCK_HASH,
                    "blockNumber": "0x1b0",
                    "transactionIndex": "0x3",
                    "from": ADDRESS,
                    "to": SENDER,
                    "logs": [],
                }),
            )
            .with_result("eth_newFilter", json!("0x1"))
            .with_result("eth_newBlockFilter", json!("0x2"))
            .with_result("eth_getFilterChanges", json!([]))
            .with_result("eth_getFilterLogs", json!([]))
            .with_result("eth_uninstallFilter", json!(true))
            .with_result("zks_L1BatchNumber", json!("0x9"))
            .with_handler("zks_getL1BatchDetails", |params| match params[0].as_u64() {
                Some(9) => MockReply::Result(json!({"l2ToL1Messages": [{"sender": SENDER}]})),
                Some(8) => MockReply::Result(json!({"l2ToL1Messages": [{"sender": SENDER}]})),
                _ => MockReply::Result(json!({"l2ToL1Messages": []})),
            })
    }

    fn orchestrator(
        settings: RawSettings,
        transport: MockTransport,
    ) -> Orchestrator<MockTransport, MemorySink> {
        let config = HarnessConfig::from_raw(settings).unwrap();
        Orchestrator::new(config, transport, MemorySink::default())
    }

    #[tokio::test]
    async fn full_run_records_every_method() {
        let mut orchestrator = orchestrator(settings(), node());
        let summary = orchestrator.run().await.unwrap();

        // 2 base block probes, 16 eth, 3 receipt-derived, 7 filter calls, 6 eth skips,
        // 4 debug, 17 zks and the message proof
        assert_eq!(summary.total, 56);
        assert_eq!(orchestrator.ledger().len(), 56);
        assert_eq!(orchestrator.sink().results.len(), 56);
        assert_eq!(summary.skipped, 6);

        let transport = orchestrator.dispatcher().transport();
        assert_eq!(
            transport.last_params("eth_getTransactionByBlockHashAndIndex").unwrap(),
            vec![json!(RECEIPT_BLOCK_HASH), json!("0x3")]
        );
        assert_eq!(
            transport.last_params("eth_getTransactionByBlockNumberAndIndex").unwrap(),
            vec![json!("0x1b0"), json!("0x3")]
        );
        // no logs, so the recipient is the touched address
        assert_eq!(transport.last_params("eth_getLogs").unwrap()[0]["address"], json!(SENDER));
        assert_eq!(
            transport.last_params(zks::MESSAGE_PROOF_METHOD).unwrap(),
            vec![json!(SENDER), json!(9)]
        );
        assert_eq!(transport.last_params("eth_getBlockByHash").unwrap()[0], json!(HEAD_HASH));
        assert_eq!(transport.count("eth_getFilterChanges"), 2);
        assert_eq!(transport.last_params("eth_getFilterLogs").unwrap(), vec![json!("0x1")]);
        assert_eq!(transport.count("eth_uninstallFilter"), 2);
        assert_eq!(transport.count("eth_sendTransaction"), 0);
        assert_eq!(transport.count("eth_subscribe"), 0);

        for skip in eth::SIGNING_SKIPS.iter().chain(eth::STREAMING_SKIPS) {
            assert!(orchestrator.ledger().for_method(skip.method).all(Outcome::is_skipped));
        }
        // discovery probes are not recorded
        assert_eq!(orchestrator.ledger().for_method("zks_getL1BatchDetails").count(), 1);
        assert_eq!(orchestrator.ledger().for_method("eth_blockNumber").count(), 2);
    }

    #[tokio::test]
    async fn suites_run_in_sequence() {
        let mut orchestrator = orchestrator(settings(), node());
        orchestrator.run().await.unwrap();

        let methods = orchestrator.dispatcher().transport().sent_methods();
        let start = methods.iter().position(|m| m == "eth_chainId").unwrap();
        let methods = &methods[start..];
        let last_eth = methods.iter().rposition(|m| m.starts_with("eth_")).unwrap();
        let first_debug = methods.iter().position(|m| m.starts_with("debug_")).unwrap();
        let last_debug = methods.iter().rposition(|m| m.starts_with("debug_")).unwrap();
        let first_zks = methods.iter().position(|m| m.starts_with("zks_")).unwrap();
        assert!(last_eth < first_debug);
        assert!(last_debug < first_zks);
    }

    #[tokio::test]
    async fn configured_block_skips_probes() {
        let settings = RawSettings {
            block_number: Some("436".to_string()),
            block_hash: Some(HEAD_HASH.to_string()),
            ..settings()
        };
        let mut orchestrator = orchestrator(settings, node());
        orchestrator.run().await.unwrap();

        // only the suite's own calls
        let transport = orchestrator.dispatcher().transport();
        assert_eq!(transport.count("eth_blockNumber"), 1);
        assert_eq!(transport.count("eth_getBlockByNumber"), 1);
        assert_eq!(transport.sent_methods()[0], "zks_L1BatchNumber");
    }

    #[tokio::test]
    async fn configured_number_fetches_matching_hash() {
        let settings = RawSettings { block_number: Some("0x10".to_string()), ..settings() };
        let mut orchestrator = orchestrator(settings, node());
        orchestrator.run().await.unwrap();

        let transport = orchestrator.dispatcher().transport();
        assert_eq!(transport.sent_methods()[0], "eth_getBlockByNumber");
        assert_eq!(transport.sent()[0].params[0], json!("0x10"));
        assert_eq!(transport.count("eth_blockNumber"), 1);
    }

    #[tokio::test]
    async fn configured_hash_fetches_matching_number() {
        let settings = RawSettings { block_hash: Some(HEAD_HASH.to_string()), ..settings() };
        let transport = node()
            .with_result("eth_getBlockByHash", json!({"number": "0x10", "hash": HEAD_HASH}));
        let mut orchestrator = orchestrator(settings, transport);
        orchestrator.run().await.unwrap();

        let transport = orchestrator.dispatcher().transport();
        assert_eq!(transport.sent_methods()[0], "eth_getBlockByHash");
        assert_eq!(transport.sent()[0].params[0], json!(HEAD_HASH));
        // the head number is never paired with the configured hash
        assert_eq!(transport.count("eth_blockNumber"), 1);
        assert_eq!(transport.last_params("eth_getBlockByNumber").unwrap()[0], json!("0x10"));
    }

    #[tokio::test]
    async fn missing_receipt_skips_dependents() {
        let transport = node().with_reply("eth_getTransactionReceipt", MockReply::Null);
        let mut orchestrator = orchestrator(settings(), transport);
        orchestrator.run().await.unwrap();

        for method in eth::RECEIPT_DEPENDENT_METHODS {
            assert_eq!(orchestrator.dispatcher().transport().count(method), 0);
            let outcome = orchestrator.ledger().for_method(method).next().unwrap();
            assert!(outcome.is_skipped());
        }
    }

    #[tokio::test]
    async fn filters_polled_only_when_created() {
        let transport = node()
            .with_reply("eth_newFilter", MockReply::error(-32601, "method not found"))
            .with_reply("eth_newBlockFilter", MockReply::Null);
        let mut orchestrator = orchestrator(settings(), transport);
        let summary = orchestrator.run().await.unwrap();

        let transport = orchestrator.dispatcher().transport();
        assert_eq!(transport.count("eth_getFilterChanges"), 0);
        assert_eq!(transport.count("eth_getFilterLogs"), 0);
        assert_eq!(transport.count("eth_uninstallFilter"), 0);

        let ledger = orchestrator.ledger();
        assert!(ledger.for_method("eth_newFilter").next().unwrap().is_failure());
        assert_eq!(ledger.for_method("eth_getFilterChanges").filter(|o| o.is_skipped()).count(), 2);
        assert_eq!(ledger.for_method("eth_uninstallFilter").count(), 2);
        // total is unchanged, only the classification moves
        assert_eq!(summary.total, 56);
    }

    #[tokio::test]
    async fn no_senders_skips_message_proof() {
        let transport = node().with_result("zks_getL1BatchDetails", json!({"l2ToL1Messages": []}));
        let mut orchestrator = orchestrator(settings(), transport);
        orchestrator.run().await.unwrap();

        assert_eq!(orchestrator.dispatcher().transport().count(zks::MESSAGE_PROOF_METHOD), 0);
        let outcome = orchestrator.ledger().for_method(zks::MESSAGE_PROOF_METHOD).next().unwrap();
        assert!(outcome.is_skipped());
        assert!(orchestrator
            .sink()
            .errors
            .iter()
            .any(|entry| entry.contains("zks_getL2ToL1MsgProof - Error Code: SKIPPED")));
    }

    #[tokio::test]
    async fn rejected_address_skips_message_proof() {
        let settings = RawSettings {
            message_proof_address: Some(format!("0x{}", "cc".repeat(20))),
            ..settings()
        };
        let mut orchestrator = orchestrator(settings, node());
        orchestrator.run().await.unwrap();

        let outcome = orchestrator.ledger().for_method(zks::MESSAGE_PROOF_METHOD).next().unwrap();
        assert!(outcome.is_skipped());
        assert!(outcome.error().unwrap().message.contains("rejected"));
    }

    #[tokio::test]
    async fn validated_address_keeps_configured_batch() {
        let settings = RawSettings {
            message_proof_address: Some(SENDER.to_uppercase().replacen("0X", "0x", 1)),
            l1_batch_number: Some(8),
            ..settings()
        };
        let mut orchestrator = orchestrator(settings, node());
        orchestrator.run().await.unwrap();

        assert_eq!(
            orchestrator.dispatcher().transport().last_params(zks::MESSAGE_PROOF_METHOD).unwrap(),
            vec![json!(SENDER), json!(8)]
        );
    }

    #[tokio::test]
    async fn base_block_fault_aborts_run() {
        let transport =
            node().with_reply("eth_blockNumber", MockReply::error(-32603, "internal error"));
        let mut orchestrator = orchestrator(settings(), transport);

        let err = orchestrator.run().await.unwrap_err();
        assert!(matches!(err, HarnessError::BaseBlock(_)));
        assert_eq!(orchestrator.dispatcher().transport().count("eth_chainId"), 0);
        assert_eq!(orchestrator.ledger().len(), 1);
        let fatal = orchestrator.sink().errors.last().unwrap();
        assert!(fatal.contains("Fatal error: failed to resolve base block"));
    }
}
