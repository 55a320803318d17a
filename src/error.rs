//! Error types for txfs.
//!
//! All operations return `Result<T>` which aliases `Result<T, TxError>`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from transactional file store operations.
#[derive(Debug, Error)]
pub enum TxError {
    /// Target path is already open within the same transaction.
    ///
    /// A usage error rather than a storage fault; it fires before anything
    /// is tracked and is never absorbed by the rollback-on-error policy.
    #[error("{} is already open", .0.display())]
    AlreadyOpen(PathBuf),

    /// Operation on a transaction that has already committed or rolled back.
    #[error("transaction has already finished")]
    TransactionFinished,

    /// One or more undo steps failed during rollback.
    #[error("rollback failed: {0}")]
    RollbackFailed(String),

    /// File system operation failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Unexpected error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for txfs operations.
pub type Result<T> = std::result::Result<T, TxError>;
