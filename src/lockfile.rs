//! Per-target lock marker and undo record.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::storage;

/// Suffix appended to a target path to derive its lock path.
const LOCK_SUFFIX: &str = ".lock";

/// Advisory marker and undo record for one tracked file.
///
/// While the marker is present, the target counts as open within its
/// transaction. For a target that existed beforehand the marker holds a
/// byte-for-byte backup of the original content; for a fresh target it is a
/// zero-byte file.
#[derive(Debug)]
pub(crate) struct LockFile {
    target: PathBuf,
    path: PathBuf,
}

impl LockFile {
    pub(crate) fn new(target: &Path) -> Self {
        let mut lock = target.as_os_str().to_os_string();
        lock.push(LOCK_SUFFIX);
        Self {
            target: target.to_path_buf(),
            path: PathBuf::from(lock),
        }
    }

    pub(crate) fn exists(&self) -> bool {
        storage::exists(&self.path)
    }

    /// Writes the undo record. The caller has verified the lock is absent.
    pub(crate) fn create(&self) -> Result<()> {
        if storage::exists(&self.target) {
            storage::copy(&self.target, &self.path)?;
        } else {
            storage::create_empty(&self.path)?;
        }
        log::debug!("locked {}", self.target.display());
        Ok(())
    }

    /// Discards the undo record. No-op when the lock is gone already.
    pub(crate) fn delete(&self) -> Result<()> {
        storage::remove_file(&self.path)?;
        Ok(())
    }

    /// Moves the backup over the target, consuming the lock.
    ///
    /// No-op when the lock is gone, which keeps a repeated rollback
    /// idempotent.
    pub(crate) fn restore(&self) -> Result<()> {
        if !self.exists() {
            return Ok(());
        }
        storage::rename(&self.path, &self.target)?;
        Ok(())
    }
}
