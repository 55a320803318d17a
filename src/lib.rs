#![doc = include_str!("../README.md")]

mod error;
mod filesystem;
mod lockfile;
mod storage;
mod tdir;
mod tfile;
mod transaction;

pub use error::{Result, TxError};
pub use filesystem::{FileSystem, OpenOutcome};
pub use storage::OpenMode;
pub use tdir::Dir;
pub use transaction::Transaction;
