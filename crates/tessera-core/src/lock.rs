//! Advisory file locks guarding graph snapshot files.
//!
//! Writers take an exclusive lock on `<snapshot>.lock` while replacing the
//! snapshot; readers take a shared lock while decoding it. Locks are
//! advisory (`fs2`) and only coordinate tessera processes.

use crate::error::{Error, ErrorCode};
use fs2::FileExt;
use std::{
    fs::{self, File, OpenOptions},
    io,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// Default wait before giving up on a contended snapshot lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock errors for snapshot files.
#[derive(Debug)]
pub enum LockError {
    Timeout { path: PathBuf, waited: Duration },
    IoError(io::Error),
}

impl From<io::Error> for LockError {
    fn from(err: io::Error) -> Self {
        Self::IoError(err)
    }
}

impl LockError {
    /// Machine-readable code associated with this lock error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::IoError(_) => ErrorCode::IoFailure,
        }
    }

    /// Optional remediation hint for operators and agents.
    #[must_use]
    pub const fn hint(&self) -> Option<&'static str> {
        self.code().hint()
    }
}

impl std::fmt::Display for LockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Timeout { path, waited } => {
                write!(
                    f,
                    "{}: lock timed out after {:?} at {}",
                    self.code().code(),
                    waited,
                    path.display()
                )
            }
            Self::IoError(err) => write!(f, "{}: {}", self.code().code(), err),
        }
    }
}

impl std::error::Error for LockError {}

impl From<LockError> for Error {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Timeout { path, waited } => Self::io_with_path(
                io::Error::new(
                    io::ErrorKind::WouldBlock,
                    format!("lock timed out after {waited:?}"),
                ),
                path,
            ),
            LockError::IoError(source) => Self::io(source),
        }
    }
}

#[derive(Clone, Copy)]
enum LockKind {
    Shared,
    Exclusive,
}

#[derive(Debug)]
struct FileGuard {
    file: File,
    path: PathBuf,
}

impl FileGuard {
    fn acquire(path: &Path, timeout: Duration, kind: LockKind) -> Result<Self, LockError> {
        let parent = path.parent().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent")
        })?;
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            let contended = match kind {
                LockKind::Shared => file.try_lock_shared().is_err(),
                LockKind::Exclusive => file.try_lock_exclusive().is_err(),
            };

            if !contended {
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// Lock file path used for a given snapshot path (`graph.json` → `graph.json.lock`).
#[must_use]
pub fn lock_path_for(snapshot: &Path) -> PathBuf {
    let mut name = snapshot
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".lock");
    snapshot.with_file_name(name)
}

/// RAII guard for exclusive snapshot writes.
#[derive(Debug)]
pub struct SnapshotWriteLock {
    guard: FileGuard,
}

impl SnapshotWriteLock {
    /// Acquire an exclusive advisory lock on the lock path.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] if another holder keeps the lock past
    /// `timeout`, or [`LockError::IoError`] if the lock file cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Exclusive)?,
        })
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.guard.path()
    }
}

/// RAII guard for shared snapshot reads.
#[derive(Debug)]
pub struct SnapshotReadLock {
    guard: FileGuard,
}

impl SnapshotReadLock {
    /// Acquire a shared advisory lock on the lock path.
    ///
    /// # Errors
    ///
    /// Returns [`LockError::Timeout`] while a writer holds the lock past
    /// `timeout`, or [`LockError::IoError`] if the lock file cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        Ok(Self {
            guard: FileGuard::acquire(path, timeout, LockKind::Shared)?,
        })
    }

    /// Return the lock file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.guard.path()
    }
}
