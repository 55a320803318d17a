//! Thin adapter over the platform file store.
//!
//! Every mutation the tracking nodes perform funnels through here, so
//! failures carry the operation and path that produced them.

use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::Path;

/// How a tracked file is opened for the duration of an open body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Create the file if needed and truncate any existing content.
    Write,
    /// Create the file if needed and append after existing content.
    Append,
    /// Read-only access to existing content.
    Read,
}

pub(crate) fn exists(path: &Path) -> bool {
    path.exists()
}

pub(crate) fn is_directory(path: &Path) -> bool {
    path.is_dir()
}

pub(crate) fn open(path: &Path, mode: OpenMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    match mode {
        OpenMode::Write => options.write(true).create(true).truncate(true),
        OpenMode::Append => options.append(true).create(true),
        OpenMode::Read => options.read(true),
    };
    options.open(path).map_err(|e| annotate("open", path, e))
}

pub(crate) fn create_empty(path: &Path) -> io::Result<()> {
    File::create(path)
        .map(|_| ())
        .map_err(|e| annotate("create", path, e))
}

/// Removes a file, treating an already absent path as done.
pub(crate) fn remove_file(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        result => result.map_err(|e| annotate("remove", path, e)),
    }
}

/// Removes one directory level, treating an already absent path as done.
/// The directory must be empty.
pub(crate) fn remove_dir(path: &Path) -> io::Result<()> {
    match fs::remove_dir(path) {
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        result => result.map_err(|e| annotate("remove directory", path, e)),
    }
}

pub(crate) fn make_dir(path: &Path) -> io::Result<()> {
    fs::create_dir(path).map_err(|e| annotate("create directory", path, e))
}

pub(crate) fn copy(src: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst)
        .map(|_| ())
        .map_err(|e| annotate("copy", src, e))
}

/// Moves `src` onto `dst`, overwriting any existing destination.
pub(crate) fn rename(src: &Path, dst: &Path) -> io::Result<()> {
    fs::rename(src, dst).map_err(|e| annotate("move", src, e))
}

fn annotate(op: &str, path: &Path, e: io::Error) -> io::Error {
    io::Error::new(e.kind(), format!("failed to {op} {}: {e}", path.display()))
}
