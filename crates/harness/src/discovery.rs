//! Discovery of addresses that have sent L2 to L1 messages.
//!
//! The message proof call needs an address that actually sent a message in a known batch, and
//! there is no safe default for it. The engine mines the most recent L1 batches for message
//! senders and ranks them by how many messages they sent.

use crate::{
    dispatcher::RequestDispatcher,
    transport::RpcTransport,
    validate::{parse_block_number, validate_address, FixtureError},
};
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::{debug, info, warn};

/// Number of recent batches scanned by default.
pub const DEFAULT_SCAN_DEPTH: u64 = 5;

/// Number of suggestions returned by default.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Errors raised when validating a configured message proof address.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// The address is not well formed.
    #[error("invalid message proof address: {0}")]
    InvalidAddress(#[from] FixtureError),
    /// The address has not sent a message in any scanned batch.
    #[error("address {address} has not sent any L2 to L1 messages in recent batches")]
    NotASender {
        /// The canonical form of the rejected address.
        address: String,
        /// Senders that were found instead, best first.
        suggestions: Vec<SenderStats>,
    },
}

/// What is known about one message sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderStats {
    /// Lowercased sender address.
    pub address: String,
    /// Batches the sender was observed in, in scan order, without duplicates.
    pub batches: Vec<u64>,
    /// Number of messages sent across all observed batches.
    pub message_count: usize,
}

impl SenderStats {
    /// The most recent batch the sender was observed in.
    pub fn latest_batch(&self) -> Option<u64> {
        self.batches.iter().copied().max()
    }
}

/// Sender statistics keyed by address, in first-encountered order.
#[derive(Debug, Default, Clone)]
pub struct MessageSenderIndex {
    senders: Vec<SenderStats>,
    positions: HashMap<String, usize>,
}

impl MessageSenderIndex {
    /// Records one message sent by `sender` in `batch`.
    pub fn observe(&mut self, sender: &str, batch: u64) {
        let address = sender.to_lowercase();
        let position = match self.positions.get(&address) {
            Some(position) => *position,
            None => {
                self.positions.insert(address.clone(), self.senders.len());
                self.senders.push(SenderStats { address, batches: Vec::new(), message_count: 0 });
                self.senders.len() - 1
            }
        };
        let stats = &mut self.senders[position];
        stats.message_count += 1;
        if !stats.batches.contains(&batch) {
            stats.batches.push(batch);
        }
    }

    /// Looks up a sender. The address is matched case-insensitively.
    pub fn get(&self, address: &str) -> Option<&SenderStats> {
        self.positions.get(&address.to_lowercase()).map(|position| &self.senders[*position])
    }

    /// Returns the `limit` senders with the most messages.
    ///
    /// Senders with equal counts keep the order in which they were first encountered.
    pub fn ranked(&self, limit: usize) -> Vec<SenderStats> {
        let mut ranked = self.senders.clone();
        // stable sort keeps first-encountered order among ties
        ranked.sort_by(|a, b| b.message_count.cmp(&a.message_count));
        ranked.truncate(limit);
        ranked
    }

    /// Number of distinct senders.
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    /// Returns `true` if no sender was observed.
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

/// Scans recent L1 batches for L2 to L1 message senders.
///
/// Discovery calls go straight through the dispatcher and are not recorded in the ledger. A
/// failed call never aborts discovery: it is logged and the batch is skipped.
#[derive(Debug)]
pub struct AddressDiscoveryEngine<'a, T> {
    dispatcher: &'a RequestDispatcher<T>,
    scan_depth: u64,
    max_suggestions: usize,
}

impl<'a, T: RpcTransport> AddressDiscoveryEngine<'a, T> {
    /// Creates an engine with the default scan depth and suggestion count.
    pub const fn new(dispatcher: &'a RequestDispatcher<T>) -> Self {
        Self {
            dispatcher,
            scan_depth: DEFAULT_SCAN_DEPTH,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
        }
    }

    /// Sets the number of batches to scan. A depth of zero scans nothing.
    pub const fn with_scan_depth(mut self, scan_depth: u64) -> Self {
        self.scan_depth = scan_depth;
        self
    }

    /// Fetches the latest L1 batch number.
    pub async fn latest_batch_number(&self) -> Option<u64> {
        let outcome = self.dispatcher.call("zks_L1BatchNumber", vec![]).await;
        let Some(value) = outcome.value() else {
            warn!(
                target: "zkprobe::discovery",
                error = ?outcome.error().map(|err| &err.message),
                "Failed to fetch latest L1 batch number"
            );
            return None
        };
        let parsed = match value {
            Value::Number(number) => number.as_u64(),
            Value::String(raw) => parse_block_number(raw).ok(),
            _ => None,
        };
        if parsed.is_none() {
            warn!(target: "zkprobe::discovery", %value, "Unexpected L1 batch number");
        }
        parsed
    }

    /// Builds a fresh sender index from the most recent batches.
    pub async fn scan(&self) -> MessageSenderIndex {
        let mut index = MessageSenderIndex::default();
        if self.scan_depth == 0 {
            return index
        }
        let Some(latest) = self.latest_batch_number().await else { return index };
        info!(target: "zkprobe::discovery", latest, "Latest L1 batch number");

        let oldest = latest.saturating_sub(self.scan_depth - 1);
        for batch in (oldest..=latest).rev() {
            let outcome = self.dispatcher.call("zks_getL1BatchDetails", vec![json!(batch)]).await;
            let Some(details) = outcome.value() else {
                warn!(
                    target: "zkprobe::discovery",
                    batch,
                    error = ?outcome.error().map(|err| &err.message),
                    "Failed to fetch L1 batch details"
                );
                continue
            };
            let senders = details
                .get("l2ToL1Messages")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(|message| message.get("sender").and_then(Value::as_str));
            for sender in senders {
                index.observe(sender, batch);
            }
        }

        if index.is_empty() {
            warn!(target: "zkprobe::discovery", "No L2 to L1 message senders found in recent batches");
        } else {
            info!(target: "zkprobe::discovery", senders = index.len(), "Found L2 to L1 message senders");
        }
        index
    }

    /// Scans recent batches and returns the best-ranked senders, logging them as hints.
    pub async fn suggest(&self) -> Vec<SenderStats> {
        let suggestions = self.scan().await.ranked(self.max_suggestions);
        log_suggestions(&suggestions);
        suggestions
    }

    /// Checks that `raw` is a well-formed address that sent a message in a scanned batch.
    pub async fn validate_message_proof_address(
        &self,
        raw: &str,
    ) -> Result<SenderStats, DiscoveryError> {
        let address = validate_address(raw)?.to_lowercase();
        let index = self.scan().await;
        match index.get(&address) {
            Some(stats) => {
                info!(
                    target: "zkprobe::discovery",
                    %address,
                    messages = stats.message_count,
                    batches = ?stats.batches,
                    "Message proof address has sent L2 to L1 messages"
                );
                Ok(stats.clone())
            }
            None => {
                let suggestions = index.ranked(self.max_suggestions);
                log_suggestions(&suggestions);
                Err(DiscoveryError::NotASender { address, suggestions })
            }
        }
    }
}

fn log_suggestions(suggestions: &[SenderStats]) {
    if suggestions.is_empty() {
        info!(
            target: "zkprobe::discovery",
            "No message proof address suggestions; try another endpoint or wait for new L2 to L1 messages"
        );
        return
    }
    for (rank, suggestion) in suggestions.iter().enumerate() {
        info!(
            target: "zkprobe::discovery",
            rank = rank + 1,
            address = %suggestion.address,
            messages = suggestion.message_count,
            batches = ?suggestion.batches,
            "Suggested message proof address"
        );
    }
    debug!(
        target: "zkprobe::discovery",
        "Set TEST_MESSAGE_PROOF_ADDRESS=<address> and TEST_L1_BATCH_NUMBER=<batch_number> to pin one"
    );
}
