//! Transaction-scoped root directory node.

use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::error::{Result, TxError};
use crate::storage::OpenMode;
use crate::tdir::{self, Dir, TDir};
use crate::transaction::{self, TxInner, TxState};

/// What happened to a [`FileSystem::open`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The body ran and its effects are tracked for commit.
    Applied,
    /// The transaction rolled back; nothing from this call survives.
    ///
    /// Reported when the call itself failed and triggered the rollback,
    /// when the body rolled the transaction back before returning, and when
    /// the transaction had already rolled back earlier. In the last case
    /// the operation is skipped entirely.
    RolledBack,
}

/// Root of a tracked directory tree under one transaction.
///
/// Obtained from
/// [`Transaction::create_file_system`](crate::Transaction::create_file_system).
/// Any failure escaping an open body rolls back the whole owning
/// transaction, every registered filesystem included, and is then absorbed:
/// the caller keeps running and reads the outcome from [`OpenOutcome`].
#[derive(Debug, Clone)]
pub struct FileSystem {
    root: Rc<RefCell<TDir>>,
    tx: Weak<RefCell<TxInner>>,
}

impl FileSystem {
    pub(crate) fn new(root: Rc<RefCell<TDir>>, tx: Weak<RefCell<TxInner>>) -> Self {
        Self { root, tx }
    }

    /// Root path this filesystem is anchored at.
    pub fn root_path(&self) -> PathBuf {
        self.root.borrow().path().to_path_buf()
    }

    /// Opens `rpath` relative to the root for writing. See
    /// [`FileSystem::open_with`].
    pub fn open<P, F>(&self, rpath: P, body: F) -> Result<OpenOutcome>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut File) -> Result<()>,
    {
        self.open_with(rpath, OpenMode::Write, body)
    }

    /// Opens `rpath` relative to the root in `mode` and passes the storage
    /// handle to `body`.
    ///
    /// Failure policy: [`TxError::AlreadyOpen`] propagates untouched, since
    /// it fires before anything is tracked and signals caller misuse. Every
    /// other failure out of the claim, the handle, or the body rolls back
    /// the owning transaction and is absorbed into
    /// [`OpenOutcome::RolledBack`].
    pub fn open_with<P, F>(&self, rpath: P, mode: OpenMode, body: F) -> Result<OpenOutcome>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut File) -> Result<()>,
    {
        let inner = self.tx.upgrade().ok_or(TxError::TransactionFinished)?;
        match transaction::state(&inner) {
            TxState::RolledBack => return Ok(OpenOutcome::RolledBack),
            TxState::Committed => return Err(TxError::TransactionFinished),
            TxState::Active => {}
        }

        match tdir::open_in(&self.root, rpath.as_ref(), mode, body) {
            Err(err @ TxError::AlreadyOpen(_)) => Err(err),
            Err(err) => {
                log::warn!(
                    "operation under {} failed, rolling back: {err}",
                    self.root_path().display()
                );
                if let Err(rollback_err) = transaction::rollback(&inner) {
                    log::error!("{rollback_err}");
                }
                Ok(OpenOutcome::RolledBack)
            }
            // The body may have rolled the transaction back itself.
            Ok(()) => match transaction::state(&inner) {
                TxState::RolledBack => Ok(OpenOutcome::RolledBack),
                _ => Ok(OpenOutcome::Applied),
            },
        }
    }

    /// Creates a tracked directory under the root and returns a handle for
    /// nested operations.
    ///
    /// Failures propagate to the caller; only open bodies are subject to
    /// rollback-on-error.
    pub fn create_directory<P: AsRef<Path>>(&self, rpath: P) -> Result<Dir> {
        transaction::guard_active(&self.tx)?;
        let node = self.root.borrow_mut().add_directory(rpath.as_ref())?;
        Ok(Dir::new(node, Weak::clone(&self.tx)))
    }
}
