//! Locked, crash-safe single-file writes.
//!
//! A write stages the incoming stream into a `.txn` sibling of the target,
//! flushes it to stable storage, and renames it over the target. The rename
//! is the commit point: it either has not happened or has fully happened, so
//! a concurrent reader never observes a partial file.
//!
//! The whole sequence runs under an exclusive advisory lock on a `.lock`
//! sibling, taken blocking, so writers to the same path fully serialize:
//! lock acquisition happens-before the copy, the flush happens-before the
//! rename, and the rename happens-before lock release.
//!
//! Cleanup holds on every exit path: the staging handle is closed, the
//! `.txn` file is unlinked unless the rename consumed it, and the `.lock`
//! sentinel is closed and unlinked. Both cleanups are scoped guards, not
//! flags.

use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use fs4::FileExt;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

/// Suffix of the per-path lock sentinel.
pub(crate) const LOCK_SUFFIX: &str = ".lock";

/// Suffix of the staging (transaction) file.
pub(crate) const TXN_SUFFIX: &str = ".txn";

/// Copy `reader` into `target` atomically.
///
/// `target` is the already-resolved absolute path; `relative` is kept only
/// for error reporting. Missing ancestor directories are created first
/// (idempotent). On failure the target is left exactly as it was.
pub(crate) fn write_file<R: Read>(target: &Path, relative: &str, mut reader: R) -> Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }

    let _lock = WriteLock::acquire(sibling(target, LOCK_SUFFIX))
        .map_err(|source| write_error(relative, source))?;

    let txn_path = sibling(target, TXN_SUFFIX);
    let mut guard = TxnGuard::new(txn_path.clone());

    match stage_and_commit(&txn_path, target, &mut reader) {
        Ok(bytes) => {
            guard.disarm();
            debug!(path = relative, bytes, "write committed");
            Ok(())
        }
        Err(source) => Err(write_error(relative, source)),
    }
}

/// Stage the stream into the transaction file, sync it, and rename it over
/// the target. The staging handle is closed before the rename.
fn stage_and_commit<R: Read>(txn_path: &Path, target: &Path, reader: &mut R) -> io::Result<u64> {
    let mut txn = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(txn_path)?;

    let bytes = io::copy(reader, &mut txn)?;
    txn.flush()?;
    txn.sync_all()?;
    drop(txn);

    fs::rename(txn_path, target)?;
    Ok(bytes)
}

fn write_error(relative: &str, source: io::Error) -> StoreError {
    StoreError::Write {
        path: relative.to_string(),
        source,
    }
}

/// `path` with `suffix` appended to its final segment (`a/b` → `a/b.lock`).
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut joined = OsString::from(path.as_os_str());
    joined.push(suffix);
    PathBuf::from(joined)
}

/// Exclusive advisory lock on a per-path sentinel file.
///
/// Acquisition blocks until any competing writer has committed and released.
/// Dropping the guard closes the handle (releasing the lock) and unlinks the
/// sentinel.
struct WriteLock {
    // Held only for the lock; the handle's lifetime is the lock's lifetime.
    _file: File,
    path: PathBuf,
}

impl WriteLock {
    fn acquire(path: PathBuf) -> io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(Self { _file: file, path })
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove lock sentinel"
                );
            }
        }
    }
}

/// Removes the transaction file on drop unless the commit rename consumed
/// it. Cleanup failures are logged, never allowed to mask the write error.
struct TxnGuard {
    path: PathBuf,
    armed: bool,
}

impl TxnGuard {
    fn new(path: PathBuf) -> Self {
        Self { path, armed: true }
    }

    fn disarm(&mut self) {
        self.armed = false;
    }
}

impl Drop for TxnGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(err) = fs::remove_file(&self.path) {
            if err.kind() != io::ErrorKind::NotFound {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "failed to remove transaction file"
                );
            }
        }
    }
}
