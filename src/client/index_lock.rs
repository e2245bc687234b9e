//! Single-slot rebuild lock
//!
//! Two layers:
//! 1. An optional filesystem lock (cross-process) for on-disk stores
//! 2. An in-memory slot (in-process) so a second caller waits for and
//!    receives the running rebuild's result over a broadcast channel

use super::fs_lock::FsLockGuard;
use crate::types::RebuildResponse;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::{RwLock, broadcast};

/// A rebuild running longer than this is assumed to have died without cleanup
const MAX_LOCK_DURATION: Duration = Duration::from_secs(30 * 60);

/// What waiters receive; errors are flattened to strings so the value is `Clone`
pub(crate) type RebuildOutcome = std::result::Result<RebuildResponse, String>;

pub(crate) struct RebuildOperation {
    result_tx: broadcast::Sender<RebuildOutcome>,
    active: Arc<AtomicBool>,
    started_at: Instant,
}

impl RebuildOperation {
    fn is_stale(&self) -> bool {
        self.active.load(Ordering::Acquire) && self.started_at.elapsed() > MAX_LOCK_DURATION
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

/// Where the cross-process lock lives, when one is used
#[derive(Debug, Clone)]
pub(crate) struct ProcessLock {
    pub(crate) lock_dir: PathBuf,
    pub(crate) key: String,
}

pub(crate) enum RebuildLockResult {
    /// We hold the slot and should run the rebuild
    Acquired(RebuildLockGuard),
    /// Another task in this process is rebuilding; wait for its result
    WaitForResult(broadcast::Receiver<RebuildOutcome>),
    /// Another process holds the file lock for this key
    WaitForFilesystemLock(ProcessLock),
}

/// The in-process slot shared by all clones of a client
#[derive(Clone, Default)]
pub(crate) struct RebuildSlot {
    inner: Arc<RwLock<Option<RebuildOperation>>>,
}

impl RebuildSlot {
    /// Whether a rebuild is currently running in this process
    pub(crate) async fn is_busy(&self) -> bool {
        self.inner
            .read()
            .await
            .as_ref()
            .is_some_and(RebuildOperation::is_active)
    }

    pub(crate) async fn try_acquire(
        &self,
        process_lock: Option<&ProcessLock>,
    ) -> Result<RebuildLockResult> {
        let mut slot = self.inner.write().await;

        if let Some(existing) = slot.as_ref() {
            if existing.is_stale() {
                tracing::warn!("Discarding rebuild lock held for over {:?}", MAX_LOCK_DURATION);
            } else if existing.is_active() {
                tracing::info!("Rebuild already in progress, waiting for its result");
                return Ok(RebuildLockResult::WaitForResult(
                    existing.result_tx.subscribe(),
                ));
            }
            *slot = None;
        }

        let fs_lock = match process_lock {
            Some(lock) => {
                let dir = lock.lock_dir.clone();
                let key = lock.key.clone();
                let guard = tokio::task::spawn_blocking(move || FsLockGuard::try_acquire(&dir, &key))
                    .await
                    .context("Filesystem lock task panicked")??;
                match guard {
                    Some(guard) => Some(guard),
                    None => return Ok(RebuildLockResult::WaitForFilesystemLock(lock.clone())),
                }
            }
            None => None,
        };

        // Capacity 1: exactly one result is ever sent
        let (result_tx, _) = broadcast::channel(1);
        let active = Arc::new(AtomicBool::new(true));
        *slot = Some(RebuildOperation {
            result_tx: result_tx.clone(),
            active: active.clone(),
            started_at: Instant::now(),
        });

        Ok(RebuildLockResult::Acquired(RebuildLockGuard {
            slot: self.inner.clone(),
            result_tx,
            active,
            released: false,
            _fs_lock: fs_lock,
        }))
    }
}

/// Held by the task running the rebuild; frees the slot on finish or drop
pub(crate) struct RebuildLockGuard {
    slot: Arc<RwLock<Option<RebuildOperation>>>,
    result_tx: broadcast::Sender<RebuildOutcome>,
    active: Arc<AtomicBool>,
    released: bool,
    _fs_lock: Option<FsLockGuard>,
}

impl RebuildLockGuard {
    /// Publish the outcome to waiters and free the slot
    ///
    /// Runs under the slot's write lock, the same lock `try_acquire` holds
    /// while subscribing, so a caller either subscribes before the send or
    /// finds the slot empty.
    pub(crate) async fn finish(mut self, outcome: RebuildOutcome) {
        let mut slot = self.slot.write().await;
        self.active.store(false, Ordering::Release);
        // No receivers is fine
        let _ = self.result_tx.send(outcome);
        *slot = None;
        drop(slot);
        self.released = true;
    }
}

impl Drop for RebuildLockGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        // Waiters must not hang if the rebuild task panicked or returned early
        tracing::warn!("Rebuild lock dropped without release, cleaning up");
        let interrupted = Err("Rebuild was interrupted before completing".to_string());
        match self.slot.try_write() {
            Ok(mut slot) => {
                self.active.store(false, Ordering::Release);
                let _ = self.result_tx.send(interrupted);
                *slot = None;
            }
            Err(_) => {
                let slot = self.slot.clone();
                let active = self.active.clone();
                let result_tx = self.result_tx.clone();
                match tokio::runtime::Handle::try_current() {
                    Ok(handle) => {
                        handle.spawn(async move {
                            let mut slot = slot.write().await;
                            active.store(false, Ordering::Release);
                            let _ = result_tx.send(interrupted);
                            *slot = None;
                        });
                    }
                    Err(_) => {
                        active.store(false, Ordering::Release);
                        let _ = result_tx.send(interrupted);
                    }
                }
            }
        }
    }
}
