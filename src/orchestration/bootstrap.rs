//! # Processor Bootstrap
//!
//! Builds the process-wide pieces in one place and owns them for the life of
//! the process:
//!
//! - the [`WorkerPool`], created once and shared by every batch
//! - the [`TaskRunner`] bound to the store and batch settings
//! - the [`BatchCoordinator`] and the [`ItemService`] in front of it
//!
//! Call [`ProcessorSystem::shutdown`] once at process exit to drain the pool.

use std::sync::Arc;

use serde::Serialize;
use tokio::runtime::Handle;
use tracing::info;

use crate::config::ProcessorConfig;
use crate::error::{ItemProcessorError, Result};
use crate::execution::{PoolStats, ShutdownReport, TaskRunner, WorkerPool};
use crate::orchestration::BatchCoordinator;
use crate::services::ItemService;
use crate::store::ItemStore;

/// Owner of the worker pool and everything built on it
#[derive(Debug)]
pub struct ProcessorSystem {
    config: ProcessorConfig,
    pool: WorkerPool,
    service: ItemService,
}

/// System status information
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub running: bool,
    pub pool: PoolStats,
    pub target_status: String,
    pub last_processed_count: usize,
}

impl ProcessorSystem {
    /// Bootstrap on the tokio runtime the caller is running in
    pub fn bootstrap(config: ProcessorConfig, store: Arc<dyn ItemStore>) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ItemProcessorError::RuntimeUnavailable(e.to_string()))?;
        Self::bootstrap_with_handle(config, store, runtime)
    }

    /// Bootstrap onto an explicit runtime, for owners outside async code
    pub fn bootstrap_with_handle(
        config: ProcessorConfig,
        store: Arc<dyn ItemStore>,
        runtime: Handle,
    ) -> Result<Self> {
        config.validate()?;

        let pool = WorkerPool::with_handle(config.worker_pool.clone(), runtime)?;
        let runner = Arc::new(TaskRunner::new(Arc::clone(&store), &config.batch));
        let coordinator = BatchCoordinator::new(pool.clone(), runner);
        let service = ItemService::new(store, coordinator, config.batch.clone());

        info!(
            capacity = config.worker_pool.capacity,
            target_status = %config.batch.target_status,
            "Item processor bootstrapped"
        );

        Ok(Self {
            config,
            pool,
            service,
        })
    }

    pub fn service(&self) -> &ItemService {
        &self.service
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn is_running(&self) -> bool {
        self.pool.is_accepting()
    }

    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            running: self.is_running(),
            pool: self.pool.stats(),
            target_status: self.config.batch.target_status.clone(),
            last_processed_count: self.service.processed_count(),
        }
    }

    /// Drain the pool using the configured shutdown timeout
    pub async fn shutdown(&self) -> ShutdownReport {
        info!("Item processor shutting down");
        self.pool
            .shutdown(self.config.worker_pool.shutdown_timeout())
            .await
    }
}
