//! Run configuration.
//!
//! Settings are layered: a TOML file, then environment variables and command line flags. Each
//! layer is a [`RawSettings`]; the merged result is validated once into a [`HarnessConfig`]
//! before any network call is made.

use crate::validate::{
    parse_block_number, validate_address, validate_block_hash, validate_tx_hash, FixtureError,
};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    time::Duration,
};

/// Default tracer for the debug namespace.
pub const DEFAULT_TRACER: &str = "callTracer";

/// Default number of requests per batch.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default pause between batches.
pub const DEFAULT_BATCH_DELAY: Duration = Duration::from_secs(1);

/// Default advisory request rate.
pub const DEFAULT_MAX_REQUESTS_PER_SECOND: u32 = 1000;

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default directory for the result files.
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Configuration errors. All of them are raised before the first network call.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting has no value.
    #[error("{0} is required")]
    Missing(&'static str),
    /// The endpoint is not a valid URL.
    #[error("invalid RPC URL {url:?}: {reason}")]
    InvalidUrl {
        /// The configured value.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// A fixture is malformed.
    #[error(transparent)]
    Fixture(#[from] FixtureError),
    /// Batches must hold at least one request.
    #[error("batch size must be at least 1")]
    ZeroBatchSize,
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The config file is not valid TOML for [`RawSettings`].
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: toml::de::Error,
    },
}

/// One unvalidated layer of settings.
///
/// Every field is optional so layers can be merged; see [`RawSettings::merge`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawSettings {
    /// JSON-RPC endpoint.
    pub rpc_url: Option<String>,
    /// Transaction hash fixture.
    pub tx_hash: Option<String>,
    /// Address fixture.
    pub address: Option<String>,
    /// L1 batch fixture.
    pub l1_batch_number: Option<u64>,
    /// Base block number, decimal or `0x` hex.
    pub block_number: Option<String>,
    /// Base block hash.
    pub block_hash: Option<String>,
    /// Log index for the L2 to L1 log proof.
    pub message_index: Option<u64>,
    /// Address for the L2 to L1 message proof.
    pub message_proof_address: Option<String>,
    /// Tracer for the debug namespace.
    pub tracer: Option<String>,
    /// Requests per batch.
    pub batch_size: Option<usize>,
    /// Pause between batches, e.g. `"500ms"`.
    #[serde(with = "humantime_serde")]
    pub batch_delay: Option<Duration>,
    /// Advisory request rate.
    pub max_requests_per_second: Option<u32>,
    /// Per-request timeout, e.g. `"30s"`.
    #[serde(with = "humantime_serde")]
    pub request_timeout: Option<Duration>,
    /// Directory for the result files.
    pub log_dir: Option<PathBuf>,
}

impl RawSettings {
    /// Reads a settings layer from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Layers `overrides` on top of `self`. Values set in `overrides` win.
    pub fn merge(self, overrides: Self) -> Self {
        Self {
            rpc_url: overrides.rpc_url.or(self.rpc_url),
            tx_hash: overrides.tx_hash.or(self.tx_hash),
            address: overrides.address.or(self.address),
            l1_batch_number: overrides.l1_batch_number.or(self.l1_batch_number),
            block_number: overrides.block_number.or(self.block_number),
            block_hash: overrides.block_hash.or(self.block_hash),
            message_index: overrides.message_index.or(self.message_index),
            message_proof_address: overrides.message_proof_address.or(self.message_proof_address),
            tracer: overrides.tracer.or(self.tracer),
            batch_size: overrides.batch_size.or(self.batch_size),
            batch_delay: overrides.batch_delay.or(self.batch_delay),
            max_requests_per_second: overrides
                .max_requests_per_second
                .or(self.max_requests_per_second),
            request_timeout: overrides.request_timeout.or(self.request_timeout),
            log_dir: overrides.log_dir.or(self.log_dir),
        }
    }
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Url,
    /// Transaction hash fixture.
    pub tx_hash: String,
    /// Address fixture.
    pub address: String,
    /// L1 batch fixture.
    pub l1_batch_number: u64,
    /// Base block number override.
    pub block_number: Option<u64>,
    /// Base block hash override.
    pub block_hash: Option<String>,
    /// Log index for the L2 to L1 log proof.
    pub message_index: u64,
    /// Address for the L2 to L1 message proof, checked against recent batches at run time.
    pub message_proof_address: Option<String>,
    /// Tracer for the debug namespace.
    pub tracer: String,
    /// Requests per batch.
    pub batch_size: NonZeroUsize,
    /// Pause between batches.
    pub batch_delay: Duration,
    /// Advisory request rate, only reported.
    pub max_requests_per_second: u32,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Directory for the result files.
    pub log_dir: PathBuf,
}

impl HarnessConfig {
    /// Validates merged settings and applies defaults.
    pub fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let url = non_empty(raw.rpc_url).ok_or(ConfigError::Missing("RPC_URL"))?;
        let rpc_url = Url::parse(&url)
            .map_err(|err| ConfigError::InvalidUrl { url: url.clone(), reason: err.to_string() })?;
        if !matches!(rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url,
                reason: "scheme must be http or https".to_string(),
            })
        }

        let tx_hash = non_empty(raw.tx_hash).ok_or(ConfigError::Missing("TEST_TX_HASH"))?;
        let address = non_empty(raw.address).ok_or(ConfigError::Missing("TEST_ADDRESS"))?;
        let l1_batch_number =
            raw.l1_batch_number.ok_or(ConfigError::Missing("TEST_L1_BATCH_NUMBER"))?;
        let batch_size = NonZeroUsize::new(raw.batch_size.unwrap_or(DEFAULT_BATCH_SIZE))
            .ok_or(ConfigError::ZeroBatchSize)?;

        Ok(Self {
            rpc_url,
            tx_hash: validate_tx_hash(&tx_hash)?,
            address: validate_address(&address)?,
            l1_batch_number,
            block_number: non_empty(raw.block_number)
                .map(|number| parse_block_number(&number))
                .transpose()?,
            block_hash: non_empty(raw.block_hash)
                .map(|hash| validate_block_hash(&hash))
                .transpose()?,
            message_index: raw.message_index.unwrap_or_default(),
            message_proof_address: non_empty(raw.message_proof_address),
            tracer: non_empty(raw.tracer).unwrap_or_else(|| DEFAULT_TRACER.to_string()),
            batch_size,
            batch_delay: raw.batch_delay.unwrap_or(DEFAULT_BATCH_DELAY),
            max_requests_per_second: raw
                .max_requests_per_second
                .unwrap_or(DEFAULT_MAX_REQUESTS_PER_SECOND),
            request_timeout: raw.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            log_dir: raw.log_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        })
    }
}

/// Treats empty and whitespace-only values as unset.
fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|value| value.trim().to_string()).filter(|value| !value.is_empty())
}
