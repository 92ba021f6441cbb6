//! Advisory store lock using the `flock(2)` syscall directly.
//! Independent crate with no internal mnemo dependencies.
//!
//! The lock lives on a dedicated lock file next to the data file, never on the
//! data file itself: the data file is replaced by rename on every write, which
//! would orphan a lock held on its old inode.
//!
//! `flock` locks belong to the open file description, so two handles opened
//! separately conflict even inside one process. That gives the same exclusion
//! between threads as between processes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

const INITIAL_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(50);

#[derive(thiserror::Error, Debug)]
pub enum LockError {
    #[error("lock acquisition cancelled")]
    Cancelled,

    #[error("timed out after {waited:?} waiting for lock")]
    TimedOut {
        waited: Duration,
        /// Holder description read from the lock file, if any.
        holder: Option<String>,
    },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },
}

impl LockError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Diagnostic information written to the lock file by the current holder.
#[derive(Debug, Serialize, Deserialize)]
struct LockDiagnostic {
    pid: u32,
    acquired_at: DateTime<Utc>,
    reason: String,
}

/// Cooperative cancellation flag shared between a waiter and whoever may
/// abort it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Exclusive store lock guard backed by `flock(2)`.
///
/// Released explicitly through [`StoreLock::release`], or on `Drop` as a
/// fallback.
pub struct StoreLock {
    file: File,
    lock_path: PathBuf,
    released: bool,
}

impl std::fmt::Debug for StoreLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreLock")
            .field("lock_path", &self.lock_path)
            .field("released", &self.released)
            .finish()
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is a valid file descriptor owned by `self.file`.
        // `LOCK_UN` releases the advisory lock. If this fails the lock is
        // released when the fd is closed moments later.
        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
        self.released = true;
    }
}

impl StoreLock {
    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    /// Release the lock, reporting an unlock failure instead of swallowing it.
    pub fn release(mut self) -> io::Result<()> {
        let fd = self.file.as_raw_fd();
        // SAFETY: `fd` is a valid file descriptor owned by `self.file`.
        let ret = unsafe { libc::flock(fd, libc::LOCK_UN) };
        // Either way the fd is closed when `self` drops, which also unlocks.
        self.released = true;
        if ret != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

/// Try once to take the lock without blocking.
///
/// Returns `Ok(None)` when another handle holds it.
pub fn try_acquire(lock_path: &Path, reason: &str) -> Result<Option<StoreLock>, LockError> {
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            LockError::io(
                format!("failed to create lock directory {}", parent.display()),
                e,
            )
        })?;
    }

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| {
            LockError::io(format!("failed to open lock file {}", lock_path.display()), e)
        })?;

    loop {
        let fd = file.as_raw_fd();
        // SAFETY: `fd` is a valid file descriptor from the `File` we just opened.
        // `LOCK_EX | LOCK_NB` requests an exclusive non-blocking lock.
        let ret = unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) };
        if ret == 0 {
            break;
        }
        let err = io::Error::last_os_error();
        match err.kind() {
            io::ErrorKind::WouldBlock => return Ok(None),
            io::ErrorKind::Interrupted => continue,
            _ => {
                return Err(LockError::io(
                    format!("flock failed on {}", lock_path.display()),
                    err,
                ));
            }
        }
    }

    let mut lock = StoreLock {
        file,
        lock_path: lock_path.to_path_buf(),
        released: false,
    };
    write_diagnostic(&mut lock, reason);
    Ok(Some(lock))
}

/// Block until the lock is free, the token is cancelled, or `timeout` passes.
///
/// Polls with exponential backoff capped at 50ms, so a cancellation is seen
/// within one backoff interval. A token that is already cancelled aborts
/// before any lock state is taken.
pub fn acquire(
    lock_path: &Path,
    reason: &str,
    cancel: &CancelToken,
    timeout: Option<Duration>,
) -> Result<StoreLock, LockError> {
    let start = Instant::now();
    let mut backoff = INITIAL_BACKOFF;

    loop {
        if cancel.is_cancelled() {
            return Err(LockError::Cancelled);
        }

        if let Some(lock) = try_acquire(lock_path, reason)? {
            if cancel.is_cancelled() {
                // Cancelled while the final attempt was in flight.
                drop(lock);
                return Err(LockError::Cancelled);
            }
            return Ok(lock);
        }

        let waited = start.elapsed();
        let mut sleep_for = backoff;
        if let Some(limit) = timeout {
            if waited >= limit {
                return Err(LockError::TimedOut {
                    waited,
                    holder: read_holder(lock_path),
                });
            }
            sleep_for = sleep_for.min(limit - waited);
        }

        debug!(path = %lock_path.display(), ?waited, "store lock busy, waiting");
        std::thread::sleep(sleep_for);
        backoff = (backoff * 2).min(MAX_BACKOFF);
    }
}

/// Describe the current holder from the diagnostic it wrote, if readable.
pub fn read_holder(lock_path: &Path) -> Option<String> {
    let contents = fs::read_to_string(lock_path).ok()?;
    let diagnostic: LockDiagnostic = serde_json::from_str(&contents).ok()?;
    Some(format!(
        "PID {} (reason: {}, acquired: {})",
        diagnostic.pid, diagnostic.reason, diagnostic.acquired_at
    ))
}

fn write_diagnostic(lock: &mut StoreLock, reason: &str) {
    let diagnostic = LockDiagnostic {
        pid: std::process::id(),
        acquired_at: Utc::now(),
        reason: reason.to_string(),
    };

    // Lock file content is informational only.
    if let Ok(json) = serde_json::to_string(&diagnostic) {
        let written = lock
            .file
            .set_len(0)
            .and_then(|_| lock.file.write_all(json.as_bytes()))
            .and_then(|_| lock.file.flush());
        if let Err(error) = written {
            debug!(path = %lock.lock_path.display(), %error, "failed to write lock diagnostic");
        }
    }
}
