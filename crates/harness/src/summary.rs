//! End-of-run summary.

use crate::{ledger::ResultLedger, outcome::Outcome};
use std::fmt;

/// Counts over a finished ledger plus the outcomes that did not succeed.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    /// Number of recorded outcomes, skips included.
    pub total: usize,
    /// Successful outcomes.
    pub succeeded: usize,
    /// Transport and protocol failures.
    pub failed: usize,
    /// Null results and deliberate skips.
    pub skipped: usize,
    /// Every non-successful outcome, in ledger order.
    pub non_successes: Vec<Outcome>,
}

impl RunSummary {
    /// Tallies a ledger.
    pub fn from_ledger(ledger: &ResultLedger) -> Self {
        let mut summary = Self { total: ledger.len(), ..Default::default() };
        for outcome in ledger.iter() {
            if outcome.is_success() {
                summary.succeeded += 1;
                continue
            }
            if outcome.is_skipped() {
                summary.skipped += 1;
            } else {
                summary.failed += 1;
            }
            summary.non_successes.push(outcome.clone());
        }
        summary
    }

    /// Percentage of successful outcomes over all outcomes, `0.0` for an empty run.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0
        }
        self.succeeded as f64 / self.total as f64 * 100.0
    }

    /// Failed outcomes, in ledger order.
    pub fn failures(&self) -> impl Iterator<Item = &Outcome> {
        self.non_successes.iter().filter(|outcome| outcome.is_failure())
    }

    /// Skipped outcomes, in ledger order.
    pub fn skips(&self) -> impl Iterator<Item = &Outcome> {
        self.non_successes.iter().filter(|outcome| outcome.is_skipped())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Test Summary:")?;
        writeln!(f, "=============")?;
        writeln!(f, "Total tests: {}", self.total)?;
        writeln!(f, "Successful: {}", self.succeeded)?;
        writeln!(f, "Failed: {}", self.failed)?;
        writeln!(f, "Skipped: {}", self.skipped)?;
        write!(f, "Success rate: {:.2}%", self.success_rate())?;

        if self.failed > 0 {
            write!(f, "\n\nFailed Tests:\n=============")?;
            for outcome in self.failures() {
                let Some(err) = outcome.error() else { continue };
                write!(
                    f,
                    "\n\nMethod: {}\nError Code: {}\nError: {}",
                    outcome.method,
                    err.kind.code(),
                    err.message
                )?;
                if let Some(details) = &err.details {
                    let pretty =
                        serde_json::to_string_pretty(details).unwrap_or_else(|_| details.to_string());
                    write!(f, "\nDetails: {pretty}")?;
                }
            }
        }

        if self.skipped > 0 {
            write!(f, "\n\nSkipped Tests:\n==============")?;
            for outcome in self.skips() {
                if let Some(err) = outcome.error() {
                    write!(f, "\n{} - {}", outcome.method, err.message)?;
                }
            }
        }
        Ok(())
    }
}
