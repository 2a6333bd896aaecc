//! # Worker Pool
//!
//! Bounded-concurrency execution of blocking units of work.
//!
//! Submissions are never refused while the pool is open: every unit is spawned
//! immediately as a lightweight task that waits for a semaphore permit, so the
//! queue is unbounded while execution is capped at `capacity`. Once a permit is
//! held the unit runs on the runtime's blocking thread pool.
//!
//! ```text
//! submit(unit) → [TaskTracker] → [Semaphore] → spawn_blocking(unit) → PoolTask<R>
//!                      │               │
//!                      │               └─→ at most `capacity` units running
//!                      └─→ drained by shutdown()
//! ```
//!
//! The pool is meant to be created once at startup, cloned into whatever needs
//! it, and shut down once at process exit. Cloning shares the same pool.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use serde::Serialize;
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use crate::config::WorkerPoolConfig;
use crate::error::{ItemProcessorError, PoolError, Result};

/// Fixed-capacity pool shared by every batch in the process
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    config: WorkerPoolConfig,
    /// Bounds the number of running units
    permits: Arc<Semaphore>,
    /// Tracks every submitted unit, queued or running
    tracker: TaskTracker,
    /// Hard stop for queued units; parent of every batch cancellation token
    shutdown: CancellationToken,
    runtime: Handle,
    in_flight: AtomicUsize,
    submitted: AtomicU64,
    completed: AtomicU64,
}

/// Point-in-time pool counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub capacity: usize,
    pub in_flight: usize,
    pub available_permits: usize,
    pub submitted: u64,
    pub completed: u64,
    pub accepting: bool,
}

/// Result of shutting the pool down
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShutdownReport {
    /// True when every queued and running unit finished within the timeout
    pub drained: bool,
    pub submitted: u64,
    pub completed: u64,
}

impl WorkerPool {
    /// Create a pool on the tokio runtime the caller is running in
    pub fn new(config: WorkerPoolConfig) -> Result<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| ItemProcessorError::RuntimeUnavailable(e.to_string()))?;
        Self::with_handle(config, runtime)
    }

    /// Create a pool that spawns onto an explicit runtime
    ///
    /// Use this when the owner of the pool is not itself running inside the runtime.
    pub fn with_handle(config: WorkerPoolConfig, runtime: Handle) -> Result<Self> {
        if config.capacity == 0 {
            return Err(ItemProcessorError::Configuration(
                "worker pool capacity must be greater than zero".to_string(),
            ));
        }

        info!(capacity = config.capacity, "Worker pool created");

        Ok(Self {
            inner: Arc::new(PoolInner {
                permits: Arc::new(Semaphore::new(config.capacity)),
                tracker: TaskTracker::new(),
                shutdown: CancellationToken::new(),
                runtime,
                in_flight: AtomicUsize::new(0),
                submitted: AtomicU64::new(0),
                completed: AtomicU64::new(0),
                config,
            }),
        })
    }

    /// Queue a blocking unit of work
    ///
    /// Returns immediately. The unit starts once a permit is free; there is no
    /// ordering guarantee among queued units. Fails only after `shutdown` began.
    pub fn submit<F, R>(&self, unit: F) -> std::result::Result<PoolTask<R>, PoolError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        if !self.is_accepting() {
            return Err(PoolError::ShutDown);
        }

        self.inner.submitted.fetch_add(1, Ordering::Relaxed);
        let inner = Arc::clone(&self.inner);
        let handle = self
            .inner
            .tracker
            .spawn_on(run_unit(inner, unit), &self.inner.runtime);

        Ok(PoolTask { handle })
    }

    /// Runtime the pool spawns onto
    pub fn runtime(&self) -> &Handle {
        &self.inner.runtime
    }

    /// Token cancelled when the pool is forced down; batches derive their own from it
    pub fn child_token(&self) -> CancellationToken {
        self.inner.shutdown.child_token()
    }

    pub fn capacity(&self) -> usize {
        self.inner.config.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    pub fn available_permits(&self) -> usize {
        self.inner.permits.available_permits()
    }

    pub fn is_accepting(&self) -> bool {
        !self.inner.tracker.is_closed() && !self.inner.shutdown.is_cancelled()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.capacity(),
            in_flight: self.in_flight(),
            available_permits: self.available_permits(),
            submitted: self.inner.submitted.load(Ordering::Relaxed),
            completed: self.inner.completed.load(Ordering::Relaxed),
            accepting: self.is_accepting(),
        }
    }

    /// Stop accepting work and drain the pool
    ///
    /// Queued and running units get `timeout` to finish. After that, units still
    /// waiting for a permit resolve to [`PoolError::ShutDown`] and every batch
    /// token is cancelled; running units are never aborted and are awaited.
    pub async fn shutdown(&self, timeout: Duration) -> ShutdownReport {
        self.inner.tracker.close();
        info!(
            pending = self.inner.tracker.len(),
            timeout_ms = timeout.as_millis() as u64,
            "Worker pool shutting down"
        );

        let drained = tokio::time::timeout(timeout, self.inner.tracker.wait())
            .await
            .is_ok();

        if !drained {
            warn!(
                pending = self.inner.tracker.len(),
                in_flight = self.in_flight(),
                "Worker pool did not drain in time - cancelling queued units"
            );
        }

        self.inner.shutdown.cancel();
        self.inner.permits.close();
        self.inner.tracker.wait().await;

        let report = ShutdownReport {
            drained,
            submitted: self.inner.submitted.load(Ordering::Relaxed),
            completed: self.inner.completed.load(Ordering::Relaxed),
        };
        info!(
            drained = report.drained,
            submitted = report.submitted,
            completed = report.completed,
            "Worker pool stopped"
        );
        report
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("capacity", &self.capacity())
            .field("in_flight", &self.in_flight())
            .field("accepting", &self.is_accepting())
            .finish()
    }
}

async fn run_unit<F, R>(inner: Arc<PoolInner>, unit: F) -> std::result::Result<R, PoolError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let permit = tokio::select! {
        biased;
        _ = inner.shutdown.cancelled() => return Err(PoolError::ShutDown),
        permit = Arc::clone(&inner.permits).acquire_owned() => {
            permit.map_err(|_| PoolError::ShutDown)?
        }
    };

    let _running = InFlightGuard::enter(&inner);
    let result = tokio::task::spawn_blocking(unit).await;
    drop(permit);

    result.map_err(|e| {
        let error = pool_error_from_join(e);
        debug!(error = %error, "Unit of work did not complete");
        error
    })
}

/// Keeps `in_flight`/`completed` accurate even when the unit's task is dropped
struct InFlightGuard<'a> {
    inner: &'a PoolInner,
}

impl<'a> InFlightGuard<'a> {
    fn enter(inner: &'a PoolInner) -> Self {
        inner.in_flight.fetch_add(1, Ordering::SeqCst);
        Self { inner }
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.inner.completed.fetch_add(1, Ordering::Relaxed);
    }
}

fn pool_error_from_join(error: JoinError) -> PoolError {
    if !error.is_panic() {
        return PoolError::Cancelled;
    }

    let panic = error.into_panic();
    let message = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    };
    PoolError::Panicked { message }
}

/// Future for the result of one submitted unit
#[derive(Debug)]
pub struct PoolTask<R> {
    handle: JoinHandle<std::result::Result<R, PoolError>>,
}

impl<R> Future for PoolTask<R> {
    type Output = std::result::Result<R, PoolError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.handle).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(e)) => Poll::Ready(Err(pool_error_from_join(e))),
            Poll::Pending => Poll::Pending,
        }
    }
}
