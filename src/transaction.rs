//! Transactional grouping of file system mutations with rollback support.
//!
//! Coordinates any number of tracked filesystem roots that must succeed or
//! fail as a unit.
//!
//! ## Execution Guarantees
//!
//! - **Atomicity**: on commit every tracked change stands; on rollback every
//!   touched path returns to its pre-transaction state
//! - **Ordering**: commit and rollback walk filesystems in creation order and
//!   children in registration order; each node owns a disjoint path, so
//!   order does not affect the final state
//! - **Idempotency**: commit and rollback are terminal and safely repeatable
//! - **No residue**: no `.lock` marker survives either outcome
//!
//! ## Lifecycle
//!
//! 1. **Register**: obtain roots via `create_file_system()`
//! 2. **Mutate**: `open()` files and `create_directory()` trees against them
//! 3. **Commit**: discard undo records, written bytes stand
//! 4. **Rollback** (explicit, or triggered by a failing open body): restore
//!    every touched path
//!
//! ## Example
//!
//! ```no_run
//! # use std::io::Write;
//! # fn example() -> txfs::Result<()> {
//! use txfs::Transaction;
//!
//! let transaction = Transaction::new();
//! let fs = transaction.create_file_system("/srv/app")?;
//!
//! let _ = fs.open("manifest", |f| {
//!     writeln!(f, "version = 2")?;
//!     Ok(())
//! })?;
//!
//! transaction.commit()?;
//! # Ok(())
//! # }
//! ```

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::{Rc, Weak};

use crate::error::{Result, TxError};
use crate::filesystem::FileSystem;
use crate::tdir::TDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TxState {
    /// Accepting operations.
    Active,
    /// Tracked changes kept, undo records discarded.
    Committed,
    /// Tracked changes undone.
    RolledBack,
}

/// Shared core behind a [`Transaction`] and the capability handles held by
/// its filesystems.
#[derive(Debug)]
pub(crate) struct TxInner {
    state: TxState,
    filesystems: Vec<Rc<RefCell<TDir>>>,
}

/// Unit of atomic commit or rollback spanning one or more filesystem roots.
///
/// The transaction is a pure registry and dispatcher: it holds no storage
/// state of its own. Filesystems receive a non-owning capability handle back
/// to it, used solely to trigger transaction-wide rollback when one of their
/// open bodies fails.
#[must_use = "a transaction must be committed or rolled back"]
#[derive(Debug)]
pub struct Transaction {
    inner: Rc<RefCell<TxInner>>,
}

impl Transaction {
    /// Creates an empty, active transaction.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(TxInner {
                state: TxState::Active,
                filesystems: Vec::new(),
            })),
        }
    }

    /// Runs `body` inside a fresh transaction and commits afterwards.
    ///
    /// An error returned by `body` propagates without committing. A failure
    /// absorbed by a [`FileSystem::open`] inside the body has already rolled
    /// the transaction back; the final commit is then a no-op.
    pub fn run<F>(body: F) -> Result<()>
    where
        F: FnOnce(&Transaction) -> Result<()>,
    {
        let transaction = Transaction::new();
        body(&transaction)?;
        transaction.commit()
    }

    /// Registers a filesystem rooted at `root` with this transaction.
    ///
    /// A transaction may own any number of independently rooted filesystems;
    /// they commit and roll back together.
    pub fn create_file_system(&self, root: impl Into<PathBuf>) -> Result<FileSystem> {
        let mut inner = self.inner.borrow_mut();
        if inner.state != TxState::Active {
            return Err(TxError::TransactionFinished);
        }
        let node = Rc::new(RefCell::new(TDir::anchored(root.into())));
        inner.filesystems.push(Rc::clone(&node));
        Ok(FileSystem::new(node, Rc::downgrade(&self.inner)))
    }

    /// Commits every filesystem in creation order and finishes the
    /// transaction.
    ///
    /// Repeated calls, and calls after a rollback, are no-ops. On failure
    /// the transaction stays active so it can still be rolled back.
    pub fn commit(&self) -> Result<()> {
        {
            let inner = self.inner.borrow();
            if inner.state != TxState::Active {
                return Ok(());
            }
            for filesystem in &inner.filesystems {
                filesystem.borrow().commit()?;
            }
        }
        self.inner.borrow_mut().state = TxState::Committed;
        log::debug!("transaction committed");
        Ok(())
    }

    /// Rolls back every filesystem in creation order and finishes the
    /// transaction.
    ///
    /// Repeated calls, and calls after a commit, are no-ops.
    pub fn rollback(&self) -> Result<()> {
        rollback(&self.inner)
    }

    /// True once [`Transaction::commit`] has completed.
    pub fn is_committed(&self) -> bool {
        self.inner.borrow().state == TxState::Committed
    }

    /// True once the transaction has rolled back, explicitly or through a
    /// failed open body.
    pub fn is_rolled_back(&self) -> bool {
        self.inner.borrow().state == TxState::RolledBack
    }
}

impl Default for Transaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if let Ok(inner) = self.inner.try_borrow()
            && inner.state == TxState::Active
            && !inner.filesystems.is_empty()
        {
            log::warn!("transaction dropped without commit or rollback");
        }
    }
}

pub(crate) fn state(inner: &Rc<RefCell<TxInner>>) -> TxState {
    inner.borrow().state
}

/// Upgrades a node's capability handle, failing once the owning transaction
/// has finished or gone away.
pub(crate) fn guard_active(tx: &Weak<RefCell<TxInner>>) -> Result<Rc<RefCell<TxInner>>> {
    let inner = tx.upgrade().ok_or(TxError::TransactionFinished)?;
    if inner.borrow().state != TxState::Active {
        return Err(TxError::TransactionFinished);
    }
    Ok(inner)
}

/// Transaction-wide rollback, shared by [`Transaction::rollback`] and the
/// rollback-on-error path in [`FileSystem::open_with`].
///
/// The terminal state is recorded before the walk so that reentrant calls,
/// such as a body rolling back its own transaction, observe it immediately.
/// Undo failures are collected and reported together rather than cutting
/// the walk short.
pub(crate) fn rollback(inner: &Rc<RefCell<TxInner>>) -> Result<()> {
    {
        let mut inner_mut = inner.borrow_mut();
        if inner_mut.state != TxState::Active {
            return Ok(());
        }
        inner_mut.state = TxState::RolledBack;
    }

    let mut errors = Vec::new();
    {
        let inner_ref = inner.borrow();
        for filesystem in &inner_ref.filesystems {
            filesystem.borrow().rollback(&mut errors);
        }
    }

    if errors.is_empty() {
        log::info!("rollback completed");
        Ok(())
    } else {
        Err(TxError::RollbackFailed(errors.join("; ")))
    }
}
