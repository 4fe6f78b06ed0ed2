//! Append-only record of every outcome in a run.

use crate::outcome::Outcome;

/// Ordered, append-only list of outcomes.
///
/// Within a request batch the order is completion order; across batches it follows dispatch
/// order.
#[derive(Debug, Default)]
pub struct ResultLedger {
    outcomes: Vec<Outcome>,
}

impl ResultLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an outcome.
    pub fn append(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    /// Returns the most recently appended successful outcome for `method`.
    pub fn latest_success(&self, method: &str) -> Option<&Outcome> {
        self.outcomes.iter().rev().find(|outcome| outcome.method == method && outcome.is_success())
    }

    /// Iterates all outcomes in append order.
    pub fn iter(&self) -> impl Iterator<Item = &Outcome> {
        self.outcomes.iter()
    }

    /// All outcomes recorded for `method`, in append order.
    pub fn for_method<'a>(&'a self, method: &'a str) -> impl Iterator<Item = &'a Outcome> + 'a {
        self.outcomes.iter().filter(move |outcome| outcome.method == method)
    }

    /// Number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Returns `true` if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
