//! Command line arguments.

use clap::{ArgAction, Args as ClapArgs, Parser};
use eyre::WrapErr;
use std::{path::PathBuf, time::Duration};
use tracing::level_filters::LevelFilter;
use zkprobe_harness::{HarnessConfig, RawSettings};
use zkprobe_tracing::{FileInfo, LayerInfo, LogFormat, ProbeTracer, Tracer, TracerHandle};

/// Run the zkSync JSON-RPC conformance suites against one endpoint.
///
/// Every setting can also be given through the environment variable shown next to it, or in a
/// TOML file passed with `--config`. Flags and environment variables override the file.
#[derive(Debug, Parser)]
#[command(name = "zkprobe", version, about)]
pub(crate) struct Args {
    /// TOML file with settings.
    #[arg(long, value_name = "FILE", env = "ZKPROBE_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// JSON-RPC endpoint of the node under test.
    #[arg(long, value_name = "URL", env = "RPC_URL")]
    pub(crate) rpc_url: Option<String>,

    /// Transaction hash used by receipt, trace and proof calls.
    #[arg(long, value_name = "HASH", env = "TEST_TX_HASH")]
    pub(crate) tx_hash: Option<String>,

    /// Account used by balance, code, call and fee calls.
    #[arg(long, value_name = "ADDRESS", env = "TEST_ADDRESS")]
    pub(crate) address: Option<String>,

    /// L1 batch used by batch-scoped rollup calls.
    #[arg(long, value_name = "NUMBER", env = "TEST_L1_BATCH_NUMBER")]
    pub(crate) l1_batch_number: Option<u64>,

    /// Base block number, decimal or 0x hex. Defaults to the chain head.
    #[arg(long, value_name = "NUMBER", env = "TEST_BLOCK_NUMBER")]
    pub(crate) block_number: Option<String>,

    /// Base block hash. Defaults to the hash of the base block number.
    #[arg(long, value_name = "HASH", env = "TEST_BLOCK_HASH")]
    pub(crate) block_hash: Option<String>,

    /// Log index for `zks_getL2ToL1LogProof`.
    #[arg(long, value_name = "INDEX", env = "TEST_MESSAGE_INDEX")]
    pub(crate) message_index: Option<u64>,

    /// Address for `zks_getL2ToL1MsgProof`. Discovered from recent batches when unset.
    #[arg(long, value_name = "ADDRESS", env = "TEST_MESSAGE_PROOF_ADDRESS")]
    pub(crate) message_proof_address: Option<String>,

    /// Tracer passed to the `debug_*` calls.
    #[arg(long, value_name = "TRACER", env = "DEBUG_TRACER_TYPE")]
    pub(crate) tracer: Option<String>,

    /// Number of requests dispatched concurrently per batch.
    #[arg(long, value_name = "N", env = "BATCH_SIZE")]
    pub(crate) batch_size: Option<usize>,

    /// Pause between batches, in milliseconds.
    #[arg(long, value_name = "MS", env = "BATCH_DELAY_MS")]
    pub(crate) batch_delay_ms: Option<u64>,

    /// Advisory request rate. Only reported, pacing comes from batch size and delay.
    #[arg(long, value_name = "N", env = "MAX_REQUESTS_PER_SECOND")]
    pub(crate) max_requests_per_second: Option<u32>,

    /// Per-request timeout, in seconds.
    #[arg(long, value_name = "SECONDS")]
    pub(crate) request_timeout: Option<u64>,

    /// Directory for `test_results.log` and `errors.log`.
    #[arg(long, value_name = "DIR", env = "LOG_DIR")]
    pub(crate) log_dir: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) logs: LogArgs,
}

impl Args {
    /// The settings given on the command line and in the environment.
    pub(crate) fn raw_settings(&self) -> RawSettings {
        RawSettings {
            rpc_url: self.rpc_url.clone(),
            tx_hash: self.tx_hash.clone(),
            address: self.address.clone(),
            l1_batch_number: self.l1_batch_number,
            block_number: self.block_number.clone(),
            block_hash: self.block_hash.clone(),
            message_index: self.message_index,
            message_proof_address: self.message_proof_address.clone(),
            tracer: self.tracer.clone(),
            batch_size: self.batch_size,
            batch_delay: self.batch_delay_ms.map(Duration::from_millis),
            max_requests_per_second: self.max_requests_per_second,
            request_timeout: self.request_timeout.map(Duration::from_secs),
            log_dir: self.log_dir.clone(),
        }
    }

    /// Layers the config file, environment and flags, and validates the result.
    pub(crate) fn load_config(&self) -> eyre::Result<HarnessConfig> {
        let file = match &self.config {
            Some(path) => RawSettings::from_toml_file(path)?,
            None => RawSettings::default(),
        };
        HarnessConfig::from_raw(file.merge(self.raw_settings()))
            .wrap_err("invalid configuration")
    }
}

/// Logging options.
#[derive(Debug, Clone, ClapArgs)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LogArgs {
    /// The format to use for logs written to stdout.
    #[arg(long = "log.stdout.format", value_name = "FORMAT", default_value_t = LogFormat::Terminal)]
    pub(crate) log_stdout_format: LogFormat,

    /// Extra filter directives for stdout, e.g. `zkprobe::dispatch=trace`.
    #[arg(long = "log.stdout.filter", value_name = "FILTER", default_value = "")]
    pub(crate) log_stdout_filter: String,

    /// Write diagnostic logs to this file as well.
    #[arg(long = "log.file", value_name = "PATH")]
    pub(crate) log_file: Option<PathBuf>,

    /// The format to use for the diagnostic log file.
    #[arg(long = "log.file.format", value_name = "FORMAT", default_value_t = LogFormat::Json)]
    pub(crate) log_file_format: LogFormat,

    /// Filter directives for the diagnostic log file.
    #[arg(long = "log.file.filter", value_name = "FILTER", default_value = "debug")]
    pub(crate) log_file_filter: String,

    /// Sets whether the stdout formatter emits ANSI color codes: always, auto or never.
    #[arg(long, value_name = "COLOR", default_value = "always")]
    pub(crate) color: String,

    /// Set the minimum log level for stdout.
    ///
    /// -v      Errors
    /// -vv     Warnings
    /// -vvv    Info
    /// -vvvv   Debug
    /// -vvvvv  Traces
    #[arg(short, long, action = ArgAction::Count, default_value_t = 3, verbatim_doc_comment)]
    pub(crate) verbosity: u8,

    /// Silence all log output.
    #[arg(long, short, conflicts_with = "verbosity")]
    pub(crate) quiet: bool,
}

impl LogArgs {
    fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::OFF
        }
        match self.verbosity {
            0 => LevelFilter::OFF,
            1 => LevelFilter::ERROR,
            2 => LevelFilter::WARN,
            3 => LevelFilter::INFO,
            4 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Installs the global subscriber. The returned handle must outlive the run.
    pub(crate) fn init_tracing(&self) -> eyre::Result<TracerHandle> {
        let color = (self.color != "never").then(|| self.color.clone());
        let mut tracer = ProbeTracer::new().with_stdout(LayerInfo::new(
            self.log_stdout_format,
            self.level().to_string(),
            self.log_stdout_filter.clone(),
            color,
        ));

        if let Some(path) = &self.log_file {
            tracer = tracer.with_file(
                LayerInfo::new(
                    self.log_file_format,
                    LevelFilter::DEBUG.to_string(),
                    self.log_file_filter.clone(),
                    None,
                ),
                FileInfo::from_path(path),
            );
        }

        tracer.init()
    }
}
