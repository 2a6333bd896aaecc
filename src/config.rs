use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{status, system};
use crate::error::{ItemProcessorError, Result};

/// Root configuration for the item processor
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProcessorConfig {
    pub worker_pool: WorkerPoolConfig,
    pub batch: BatchConfig,
}

/// Worker pool sizing and lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerPoolConfig {
    /// Maximum units running at the same time
    pub capacity: usize,
    /// How long `shutdown` drains queued and running units before cancelling the rest
    pub shutdown_timeout_ms: u64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            capacity: system::DEFAULT_POOL_CAPACITY,
            shutdown_timeout_ms: system::DEFAULT_SHUTDOWN_TIMEOUT_MS,
        }
    }
}

impl WorkerPoolConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

/// Per-batch processing settings
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Status written to every processed item
    pub target_status: String,
    /// Simulated work per item before it is fetched; 0 disables it
    pub work_delay_ms: u64,
    /// Upper bound applied by `ItemService::process_items` before cancelling a batch
    pub completion_timeout_ms: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            target_status: status::PROCESSED.to_string(),
            work_delay_ms: 0,
            completion_timeout_ms: None,
        }
    }
}

impl BatchConfig {
    pub fn work_delay(&self) -> Duration {
        Duration::from_millis(self.work_delay_ms)
    }

    pub fn completion_timeout(&self) -> Option<Duration> {
        self.completion_timeout_ms.map(Duration::from_millis)
    }
}

impl ProcessorConfig {
    /// Load configuration from defaults and `ITEM_PROCESSOR__*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load configuration, layering an optional file and then the environment over defaults
    ///
    /// The file format is picked from the extension (toml, yaml, json).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            debug!(path = %path.display(), "Loading processor configuration file");
            builder = builder.add_source(config::File::from(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix(system::ENV_PREFIX)
                .prefix_separator(system::ENV_SEPARATOR)
                .separator(system::ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: ProcessorConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        debug!(
            capacity = config.worker_pool.capacity,
            target_status = %config.batch.target_status,
            work_delay_ms = config.batch.work_delay_ms,
            "Processor configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.worker_pool.capacity == 0 {
            return Err(ItemProcessorError::Configuration(
                "worker_pool.capacity must be greater than zero".to_string(),
            ));
        }

        if self.batch.target_status.trim().is_empty() {
            return Err(ItemProcessorError::Configuration(
                "batch.target_status must not be blank".to_string(),
            ));
        }

        Ok(())
    }
}
