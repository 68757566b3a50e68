//! Advisory file lock serializing publishes into the store

use std::fs::{self, File, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;
use tracing::info;

const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(10);
const MAX_RETRY_DELAY: Duration = Duration::from_millis(500);
const PROGRESS_MESSAGE_THRESHOLD: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum LockError {
    #[error("timeout waiting for lock on {}", path.display())]
    Timeout { path: PathBuf },

    #[error("I/O error during {operation} on {}: {source}", path.display())]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
        operation: &'static str,
    },
}

/// Held exclusive lock; released when dropped (closing the file releases it)
#[derive(Debug)]
pub struct LockGuard {
    _file: File,
}

/// Acquire an exclusive lock on `lock_path`, retrying with exponential
/// back-off until `timeout` elapses.
pub async fn acquire(lock_path: &Path, timeout: Duration) -> Result<LockGuard, LockError> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent).map_err(|source| LockError::Io {
            source,
            path: lock_path.to_path_buf(),
            operation: "create parent directories",
        })?;
    }

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|source| LockError::Io {
            source,
            path: lock_path.to_path_buf(),
            operation: "open lock file",
        })?;

    let start = Instant::now();
    let mut retry_delay = INITIAL_RETRY_DELAY;
    let mut progress_shown = false;

    loop {
        match file.try_lock_exclusive() {
            Ok(()) => {
                return Ok(LockGuard { _file: file });
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || is_contended(&e) => {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    return Err(LockError::Timeout {
                        path: lock_path.to_path_buf(),
                    });
                }

                if !progress_shown && elapsed >= PROGRESS_MESSAGE_THRESHOLD {
                    info!("Waiting for lock on {}", lock_path.display());
                    progress_shown = true;
                }

                tokio::time::sleep(retry_delay).await;
                retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
            }
            Err(source) => {
                return Err(LockError::Io {
                    source,
                    path: lock_path.to_path_buf(),
                    operation: "acquire lock",
                });
            }
        }
    }
}

/// fs2 reports contention with the platform's lock error, which does not
/// always map to `WouldBlock`.
fn is_contended(e: &std::io::Error) -> bool {
    e.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
