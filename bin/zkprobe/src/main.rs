//! zkprobe: conformance and smoke tests for zkSync-style JSON-RPC nodes.
//!
//! Usage:
//! ```bash
//! RPC_URL=http://localhost:3050 TEST_TX_HASH=0x.. TEST_ADDRESS=0x.. TEST_L1_BATCH_NUMBER=1 zkprobe
//! ```

use clap::Parser;
use eyre::WrapErr;
use std::{future::Future, pin::pin, process::ExitCode};
use tracing::{trace, warn};
use zkprobe_harness::{FileSink, HarnessConfig, Orchestrator, ResultSink, RunSummary};

mod cli;

/// Exit code of a run that was aborted by an orchestration fault or a signal.
const EXIT_ABORTED: u8 = 1;

/// Exit code of an invalid configuration.
const EXIT_CONFIG: u8 = 2;

fn main() -> ExitCode {
    let args = cli::Args::parse();

    let _tracer = match args.logs.init_tracing() {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("Error: {err:?}");
            return ExitCode::from(EXIT_CONFIG)
        }
    };

    let config = match args.load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err:?}");
            return ExitCode::from(EXIT_CONFIG)
        }
    };

    match run(config) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(EXIT_ABORTED)
        }
    }
}

fn run(config: HarnessConfig) -> eyre::Result<ExitCode> {
    print_banner(&config);

    let mut orchestrator =
        Orchestrator::from_config(config).wrap_err("failed to initialize the run")?;
    println!(
        "Log files initialized at:\n- {}\n- {}\n",
        orchestrator.sink().results_path().display(),
        orchestrator.sink().errors_path().display()
    );

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
    let finished = runtime.block_on(run_until_ctrl_c(orchestrator.run()))?;

    match finished {
        Some(Ok(summary)) => {
            print_summary(&summary, orchestrator.sink());
            Ok(ExitCode::SUCCESS)
        }
        Some(Err(err)) => Err(err).wrap_err("run aborted"),
        None => {
            warn!(target: "zkprobe::cli", "Run interrupted");
            if let Err(err) = orchestrator.sink_mut().fatal("run interrupted by signal") {
                warn!(target: "zkprobe::cli", %err, "Failed to write fatal entry");
            }
            print_summary(&RunSummary::from_ledger(orchestrator.ledger()), orchestrator.sink());
            Ok(ExitCode::from(EXIT_ABORTED))
        }
    }
}

fn print_banner(config: &HarnessConfig) {
    println!("Starting ZKsync RPC tests...");
    println!("RPC URL: {}", config.rpc_url);
    println!("Test Transaction Hash: {}", config.tx_hash);
    println!("Test Address: {}", config.address);
    println!("Test L1 Batch Number: {}", config.l1_batch_number);
    if let Some(address) = &config.message_proof_address {
        println!("Message Proof Address: {address}");
    }
    println!("Rate limit: {} requests/second (advisory)", config.max_requests_per_second);
    println!("Batch size: {}", config.batch_size);
    println!("Batch delay: {}ms\n", config.batch_delay.as_millis());
}

fn print_summary(summary: &RunSummary, sink: &FileSink) {
    println!("\n{summary}");
    println!("\nDetailed results have been logged to {}", sink.results_path().display());
    println!("Errors have been logged to {}", sink.errors_path().display());
}

/// Drives `fut` until it resolves or the process receives `SIGINT` or `SIGTERM`.
///
/// Returns `None` if a signal arrived first; `fut` is dropped in that case.
async fn run_until_ctrl_c<F: Future>(fut: F) -> std::io::Result<Option<F::Output>> {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut stream = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
        let sigterm = pin!(stream.recv());
        let ctrl_c = pin!(ctrl_c);
        let fut = pin!(fut);

        tokio::select! {
            _ = ctrl_c => {
                trace!(target: "zkprobe::cli", "Received ctrl-c");
                Ok(None)
            },
            _ = sigterm => {
                trace!(target: "zkprobe::cli", "Received SIGTERM");
                Ok(None)
            },
            res = fut => Ok(Some(res)),
        }
    }

    #[cfg(not(unix))]
    {
        let ctrl_c = pin!(ctrl_c);
        let fut = pin!(fut);

        tokio::select! {
            _ = ctrl_c => {
                trace!(target: "zkprobe::cli", "Received ctrl-c");
                Ok(None)
            },
            res = fut => Ok(Some(res)),
        }
    }
}
