//! Run-level errors.

use crate::transport::TransportError;

/// Faults that abort a run.
///
/// Per-request failures never show up here; they are recorded as outcomes.
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    /// The block every block-scoped request targets could not be determined.
    #[error("failed to resolve base block: {0}")]
    BaseBlock(String),
    /// The result files could not be created.
    #[error("failed to initialize result files: {0}")]
    Sink(#[from] std::io::Error),
    /// The HTTP transport could not be built.
    #[error("failed to build transport: {0}")]
    Transport(#[from] TransportError),
}
