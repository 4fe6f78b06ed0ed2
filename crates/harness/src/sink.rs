//! Text sinks for recorded outcomes.
//!
//! A sink has two ordered streams: one with every outcome and one with failures and skips in
//! full detail. Fatal orchestration errors go to the error stream.

use crate::outcome::Outcome;
use std::{
    fs::{File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

/// File name of the stream with every outcome.
pub const RESULTS_FILE_NAME: &str = "test_results.log";

/// File name of the stream with failures, skips and fatal errors.
pub const ERRORS_FILE_NAME: &str = "errors.log";

/// Append-only destination for recorded outcomes.
pub trait ResultSink {
    /// Writes an outcome to the results stream.
    fn record(&mut self, outcome: &Outcome) -> io::Result<()>;

    /// Writes a failed or skipped outcome to the error stream.
    fn record_error(&mut self, outcome: &Outcome) -> io::Result<()>;

    /// Writes a fatal orchestration error to the error stream.
    fn fatal(&mut self, message: &str) -> io::Result<()>;
}

impl<S: ResultSink + ?Sized> ResultSink for &mut S {
    fn record(&mut self, outcome: &Outcome) -> io::Result<()> {
        (**self).record(outcome)
    }

    fn record_error(&mut self, outcome: &Outcome) -> io::Result<()> {
        (**self).record_error(outcome)
    }

    fn fatal(&mut self, message: &str) -> io::Result<()> {
        (**self).fatal(message)
    }
}

/// Formats the results stream entry of an outcome.
///
/// ```text
/// [2024-01-01T00:00:00.000Z] eth_call - Failed (12ms)
/// Error Code: -32000
/// Error: execution reverted
/// ```
pub fn format_result_entry(outcome: &Outcome) -> String {
    let ts = outcome.timestamp_rfc3339();
    let duration = outcome.duration_ms().map(|ms| format!(" ({ms}ms)")).unwrap_or_default();
    match &outcome.result {
        Ok(_) => format!("[{ts}] {} - Success{duration}\n", outcome.method),
        Err(err) if outcome.is_skipped() => {
            format!("[{ts}] {} - Skipped{duration}\nReason: {}\n", outcome.method, err.message)
        }
        Err(err) => format!(
            "[{ts}] {} - Failed{duration}\nError Code: {}\nError: {}\n",
            outcome.method,
            err.kind.code(),
            err.message
        ),
    }
}

/// Formats the error stream entry of an outcome. Successful outcomes produce `None`.
pub fn format_error_entry(outcome: &Outcome) -> Option<String> {
    let err = outcome.error()?;
    let details = err
        .details
        .as_ref()
        .map(|details| details.to_string())
        .unwrap_or_else(|| "No additional error details".to_string());
    Some(format!(
        "[{}] {} - Error Code: {}\nError: {}\nDetails: {details}\n",
        outcome.timestamp_rfc3339(),
        outcome.method,
        err.kind.code(),
        err.message,
    ))
}

fn format_fatal_entry(message: &str) -> String {
    let ts = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    format!("[{ts}] Fatal error: {message}\n")
}

/// Sink writing both streams to files in a log directory.
#[derive(Debug)]
pub struct FileSink {
    results_path: PathBuf,
    errors_path: PathBuf,
    results: File,
    errors: File,
}

impl FileSink {
    /// Creates the log directory and truncates both files.
    pub fn create(dir: &Path) -> io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let results_path = dir.join(RESULTS_FILE_NAME);
        let errors_path = dir.join(ERRORS_FILE_NAME);
        File::create(&results_path)?;
        File::create(&errors_path)?;
        Self::open(results_path, errors_path)
    }

    fn open(results_path: PathBuf, errors_path: PathBuf) -> io::Result<Self> {
        let results = OpenOptions::new().create(true).append(true).open(&results_path)?;
        let errors = OpenOptions::new().create(true).append(true).open(&errors_path)?;
        Ok(Self { results_path, errors_path, results, errors })
    }

    /// Path of the results stream.
    pub fn results_path(&self) -> &Path {
        &self.results_path
    }

    /// Path of the error stream.
    pub fn errors_path(&self) -> &Path {
        &self.errors_path
    }
}

impl ResultSink for FileSink {
    fn record(&mut self, outcome: &Outcome) -> io::Result<()> {
        self.results.write_all(format_result_entry(outcome).as_bytes())
    }

    fn record_error(&mut self, outcome: &Outcome) -> io::Result<()> {
        match format_error_entry(outcome) {
            Some(entry) => self.errors.write_all(entry.as_bytes()),
            None => Ok(()),
        }
    }

    fn fatal(&mut self, message: &str) -> io::Result<()> {
        self.errors.write_all(format_fatal_entry(message).as_bytes())?;
        self.errors.flush()
    }
}

/// Sink keeping both streams in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    /// Entries of the results stream.
    pub results: Vec<String>,
    /// Entries of the error stream.
    pub errors: Vec<String>,
}

impl ResultSink for MemorySink {
    fn record(&mut self, outcome: &Outcome) -> io::Result<()> {
        self.results.push(format_result_entry(outcome));
        Ok(())
    }

    fn record_error(&mut self, outcome: &Outcome) -> io::Result<()> {
        self.errors.extend(format_error_entry(outcome));
        Ok(())
    }

    fn fatal(&mut self, message: &str) -> io::Result<()> {
        self.errors.push(format_fatal_entry(message));
        Ok(())
    }
}
