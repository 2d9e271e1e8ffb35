//! Configuration for packed sequence views

use crate::store::FileStore;
use crate::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default batch granularity for the batched strategy
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Random access strategy selected at open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Unpack exactly what is asked for, cache the last range
    Direct,
    /// Unpack the whole sequence at open
    Preloaded,
    /// Unpack aligned batches, cache the last batch
    #[default]
    Batched,
    /// Extract each symbol from its byte, no cache
    Scalar,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Direct => "direct",
            Self::Preloaded => "preloaded",
            Self::Batched => "batched",
            Self::Scalar => "scalar",
        };
        f.write_str(name)
    }
}

/// How the batched strategy serves a contiguous range that does not fit in
/// the batch holding its start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OversizedRange {
    /// Refill only the batch holding `start` and cut the result at its end
    Truncate,
    /// Refill one window spanning every batch the range touches
    #[default]
    Expand,
}

/// Configuration for opening a [`PackedView`](crate::PackedView)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Access strategy
    pub strategy: Strategy,

    /// Batch granularity for [`Strategy::Batched`]
    pub batch_size: usize,

    /// Oversized range policy for [`Strategy::Batched`]
    pub oversized_range: OversizedRange,

    /// Memory-map files when reading through [`FileStore`]
    pub use_mmap: bool,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            oversized_range: OversizedRange::default(),
            use_mmap: true,
        }
    }
}

impl ViewConfig {
    /// Create a configuration for the given strategy
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Set the strategy
    #[must_use]
    pub const fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the batch granularity
    #[must_use]
    pub const fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Set the oversized range policy
    #[must_use]
    pub const fn with_oversized_range(mut self, policy: OversizedRange) -> Self {
        self.oversized_range = policy;
        self
    }

    /// Enable or disable memory mapping
    #[must_use]
    pub const fn with_mmap(mut self, enable: bool) -> Self {
        self.use_mmap = enable;
        self
    }

    /// Check the configuration for values no strategy can work with
    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(StorageError::Config("batch_size must be at least 1".into()));
        }
        Ok(())
    }

    /// Filesystem store matching this configuration
    pub fn file_store(&self) -> FileStore {
        FileStore::new().with_mmap(self.use_mmap)
    }

    /// Parse a configuration from JSON; missing fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StorageError::Config(format!("Failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    /// Serialize to pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StorageError::Config(format!("Failed to serialize config: {e}")))
    }
}
