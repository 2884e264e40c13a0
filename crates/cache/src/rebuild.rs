//! Background rebuild of stale logical-expiry entries.
//!
//! A [`RebuildPool`] owns a fixed set of workers fed by a bounded queue.
//! Dispatch is fire-and-forget from the triggering read's point of view and
//! detached from its lifetime: a rebuild keeps running even if the request
//! that noticed staleness is aborted. When the queue is full the rebuild is
//! dropped and its lock released; the next stale read will try again.

use crate::entry::{self, CacheEntry};
use crate::keys::shop_entry_key;
use crate::lock::LockGuard;
use crate::traits::{SharedCache, Store};
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use storefront_core::{Error, Result, ShopId};

/// One unit of work: reload a record from the store and re-populate its
/// cache entry with a fresh logical expiry, then release the held lock.
pub struct RebuildTask {
    id: ShopId,
    guard: LockGuard,
    cache: Arc<dyn SharedCache>,
    store: Arc<dyn Store>,
    refresh_window: Duration,
}

impl RebuildTask {
    pub fn new(
        id: ShopId,
        guard: LockGuard,
        cache: Arc<dyn SharedCache>,
        store: Arc<dyn Store>,
        refresh_window: Duration,
    ) -> Self {
        Self {
            id,
            guard,
            cache,
            store,
            refresh_window,
        }
    }

    pub fn id(&self) -> ShopId {
        self.id
    }

    /// Give the held lock back without rebuilding. Used when dispatch fails.
    pub async fn abandon(self) {
        self.guard.release().await;
    }

    async fn run(self) {
        if let Err(e) = Self::rebuild(self.id, &*self.cache, &*self.store, self.refresh_window).await
        {
            tracing::error!(shop_id = self.id, error = %e, "rebuild failed, entry left stale");
        }
        self.guard.release().await;
    }

    async fn rebuild(
        id: ShopId,
        cache: &dyn SharedCache,
        store: &dyn Store,
        refresh_window: Duration,
    ) -> Result<()> {
        let key = shop_entry_key(id);
        match store.get_by_id(id).await? {
            Some(shop) => {
                let window =
                    chrono::Duration::from_std(refresh_window).map_err(|e| Error::Configuration {
                        message: format!("refresh_window out of range: {e}"),
                    })?;
                let raw = entry::encode(&key, &CacheEntry::timed(shop, Utc::now() + window))?;
                // No physical TTL: hot entries persist until overwritten.
                cache.set(&key, raw, None).await?;
                tracing::debug!(shop_id = id, "rebuilt logical-expiry entry");
            }
            None => {
                // The record vanished from the store; drop the hot entry so
                // future reads report not-found.
                cache.delete(&key).await?;
                tracing::warn!(shop_id = id, "record gone from store, dropped hot entry");
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for RebuildTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildTask").field("id", &self.id).finish()
    }
}

/// Bounded worker pool executing [`RebuildTask`]s.
pub struct RebuildPool {
    tx: mpsc::Sender<RebuildTask>,
    workers: Vec<JoinHandle<()>>,
}

impl RebuildPool {
    /// Spawn `workers` workers sharing a queue of `capacity` pending tasks.
    /// Must be called within a tokio runtime.
    pub fn new(workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity);
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let workers = (0..workers)
            .map(|worker| tokio::spawn(worker_loop(worker, Arc::clone(&rx))))
            .collect();
        Self { tx, workers }
    }

    /// Enqueue a rebuild without waiting. On a full (or shut down) queue the
    /// task is handed back so the caller can release its lock.
    pub fn try_dispatch(&self, task: RebuildTask) -> std::result::Result<(), RebuildTask> {
        self.tx.try_send(task).map_err(|e| match e {
            TrySendError::Full(task) | TrySendError::Closed(task) => task,
        })
    }

    /// Number of rebuilds queued but not yet picked up by a worker.
    pub fn queue_depth(&self) -> usize {
        self.tx.max_capacity() - self.tx.capacity()
    }

    /// Stop accepting work and wait for in-flight rebuilds to finish.
    pub async fn shutdown(self) {
        drop(self.tx);
        for handle in self.workers {
            let _ = handle.await;
        }
    }
}

impl std::fmt::Debug for RebuildPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RebuildPool")
            .field("workers", &self.workers.len())
            .field("queue_depth", &self.queue_depth())
            .finish()
    }
}

async fn worker_loop(
    worker: usize,
    rx: Arc<tokio::sync::Mutex<mpsc::Receiver<RebuildTask>>>,
) {
    loop {
        let task = rx.lock().await.recv().await;
        let Some(task) = task else { break };
        let id = task.id();
        if let Err(panic) = AssertUnwindSafe(task.run()).catch_unwind().await {
            let message = panic
                .downcast_ref::<&str>()
                .map(|s| (*s).to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            // The guard is lost with the task; the lock TTL frees it.
            tracing::error!(worker, shop_id = id, panic = %message, "rebuild task panicked");
        }
    }
    tracing::debug!(worker, "rebuild worker stopped");
}
