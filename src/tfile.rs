//! Single-file tracking node.

use std::path::{Path, PathBuf};

use crate::error::{Result, TxError};
use crate::lockfile::LockFile;
use crate::storage;

/// Whether the target existed at the instant the node was loaded.
///
/// Chosen once and carried for the node's lifetime; later mutation of the
/// target does not change the undo strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FileKind {
    /// Target was absent before the transaction touched it.
    New,
    /// Target was present before the transaction touched it.
    Existing,
}

/// Transactional wrapper for one file path.
#[derive(Debug)]
pub(crate) struct TFile {
    path: PathBuf,
    kind: FileKind,
    lock: LockFile,
}

impl TFile {
    /// Resolves the target under `dir` and fixes the undo strategy by
    /// probing existence.
    pub(crate) fn load(dir: &Path, rpath: &Path) -> Self {
        let path = dir.join(rpath);
        let kind = if storage::exists(&path) {
            FileKind::Existing
        } else {
            FileKind::New
        };
        let lock = LockFile::new(&path);
        Self { path, kind, lock }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> FileKind {
        self.kind
    }

    /// Claims the target for this transaction by creating its lock.
    ///
    /// The lock persists until commit or rollback; it is not released when
    /// the open body returns.
    pub(crate) fn acquire(&self) -> Result<()> {
        if self.lock.exists() {
            return Err(TxError::AlreadyOpen(self.path.clone()));
        }
        self.lock.create()
    }

    /// Keeps the written bytes and discards the undo record.
    pub(crate) fn commit(&self) -> Result<()> {
        self.lock.delete()?;
        log::debug!("committed {}", self.path.display());
        Ok(())
    }

    /// Restores the pre-transaction state of the target.
    pub(crate) fn rollback(&self) -> Result<()> {
        match self.kind {
            FileKind::New => {
                storage::remove_file(&self.path)?;
                self.lock.delete()
            }
            FileKind::Existing => self.lock.restore(),
        }
    }
}
