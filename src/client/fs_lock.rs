//! Advisory file locks that keep two processes from rebuilding the same
//! collection at once
//!
//! The in-process side lives in `index_lock.rs`; this module only covers
//! other processes sharing the same store.

use anyhow::{Context, Result};
use fs2::FileExt;
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Key identifying one collection in one store
pub fn lock_key(db_path: &Path, collection_name: &str) -> String {
    format!("{}::{}", db_path.display(), collection_name)
}

fn lock_file_path(lock_dir: &Path, key: &str) -> PathBuf {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    lock_dir.join(format!("{}.lock", &hash[..16]))
}

/// Exclusive advisory lock, released on drop (or by the OS if the process dies)
pub struct FsLockGuard {
    _file: File,
    path: PathBuf,
}

impl FsLockGuard {
    /// Try to take the lock without blocking
    ///
    /// `Ok(None)` means another holder has it.
    pub fn try_acquire(lock_dir: &Path, key: &str) -> Result<Option<Self>> {
        let lock_path = lock_file_path(lock_dir, key);
        fs::create_dir_all(lock_dir).context("Failed to create lock directory")?;

        let file = File::create(&lock_path).context("Failed to create lock file")?;

        match file.try_lock_exclusive() {
            Ok(()) => {
                tracing::debug!("Acquired rebuild lock for {} ({:?})", key, lock_path);
                Ok(Some(Self {
                    _file: file,
                    path: lock_path,
                }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                tracing::debug!("Rebuild lock for {} is held elsewhere", key);
                Ok(None)
            }
            Err(e) => Err(e).context("Failed to acquire filesystem lock"),
        }
    }

    /// Poll until the lock is free or `timeout` passes (`Ok(None)`)
    pub fn acquire_blocking(lock_dir: &Path, key: &str, timeout: Duration) -> Result<Option<Self>> {
        let start = Instant::now();
        let sleep_interval = Duration::from_millis(500).min(timeout);

        tracing::info!("Waiting for rebuild lock on {} (timeout: {:?})", key, timeout);

        loop {
            if let Some(guard) = Self::try_acquire(lock_dir, key)? {
                tracing::info!("Acquired rebuild lock after {:?}", start.elapsed());
                return Ok(Some(guard));
            }
            if start.elapsed() >= timeout {
                tracing::warn!("Timed out waiting for rebuild lock on {}", key);
                return Ok(None);
            }
            std::thread::sleep(sleep_interval);
        }
    }
}

impl Drop for FsLockGuard {
    fn drop(&mut self) {
        // The lock file is kept for reuse
        tracing::debug!("Releasing rebuild lock {:?}", self.path);
    }
}
