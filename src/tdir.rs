//! Directory tracking node and its public handle.
//!
//! A directory node owns an insertion-ordered sequence of tracked children,
//! files and nested directories alike. Commit walks the children in
//! registration order; rollback walks them in registration order too and
//! only then removes the directory itself, because removal needs an empty
//! directory.

use std::cell::RefCell;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use crate::error::Result;
use crate::storage::{self, OpenMode};
use crate::tfile::TFile;
use crate::transaction::{self, TxInner};

/// Directory node owning an ordered sequence of tracked children.
#[derive(Debug)]
pub(crate) struct TDir {
    path: PathBuf,
    /// Set when this transaction made the directory. Pre-existing
    /// directories are never removed on rollback.
    created: bool,
    children: Vec<Child>,
}

#[derive(Debug)]
enum Child {
    File(TFile),
    Dir(Rc<RefCell<TDir>>),
}

impl TDir {
    pub(crate) fn new(root: &Path, rpath: &Path) -> Self {
        Self::anchored(root.join(rpath))
    }

    /// Node for a directory the transaction does not own, such as a
    /// filesystem root.
    pub(crate) fn anchored(path: PathBuf) -> Self {
        Self {
            path,
            created: false,
            children: Vec::new(),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Makes the directory unless it is already there.
    pub(crate) fn create(&mut self) -> Result<()> {
        if storage::is_directory(&self.path) {
            return Ok(());
        }
        storage::make_dir(&self.path)?;
        self.created = true;
        log::debug!("created directory {}", self.path.display());
        Ok(())
    }

    /// Loads and claims a file node under this directory, registering it as
    /// a child. Returns the absolute target path so the caller can open the
    /// storage handle without any tree borrow held.
    ///
    /// Registration happens after the lock exists and before the body runs,
    /// which is what lets a rollback arriving mid-body restore this node.
    pub(crate) fn begin_open(&mut self, rpath: &Path) -> Result<PathBuf> {
        let file = TFile::load(&self.path, rpath);
        file.acquire()?;
        let target = file.path().to_path_buf();
        self.children.push(Child::File(file));
        Ok(target)
    }

    /// Constructs and creates a nested directory node, registering it as a
    /// child.
    pub(crate) fn add_directory(&mut self, rpath: &Path) -> Result<Rc<RefCell<TDir>>> {
        let mut dir = TDir::new(&self.path, rpath);
        dir.create()?;
        let node = Rc::new(RefCell::new(dir));
        self.children.push(Child::Dir(Rc::clone(&node)));
        Ok(node)
    }

    /// Commits children in registration order. The directory's own
    /// existence needs no commit action.
    pub(crate) fn commit(&self) -> Result<()> {
        for child in &self.children {
            match child {
                Child::File(file) => file.commit()?,
                Child::Dir(dir) => dir.borrow().commit()?,
            }
        }
        Ok(())
    }

    /// Rolls back children in registration order, then removes the
    /// directory itself when this transaction created it.
    ///
    /// Undo failures are collected instead of cutting the walk short, so
    /// one stuck path does not strand the rest of the tree.
    pub(crate) fn rollback(&self, errors: &mut Vec<String>) {
        for child in &self.children {
            match child {
                Child::File(file) => {
                    if let Err(e) = file.rollback() {
                        errors.push(e.to_string());
                    }
                }
                Child::Dir(dir) => dir.borrow().rollback(errors),
            }
        }
        if self.created {
            if let Err(e) = storage::remove_dir(&self.path) {
                errors.push(e.to_string());
            }
        }
    }
}

/// Runs one tracked open against `node`: claim and register the file, then
/// hand a scoped storage handle to `body`.
///
/// No tree borrow is held while the body runs, so the body may commit or
/// roll back the owning transaction. The handle closes when it drops, on
/// every exit path; the lock stays until commit or rollback.
pub(crate) fn open_in<F>(
    node: &Rc<RefCell<TDir>>,
    rpath: &Path,
    mode: OpenMode,
    body: F,
) -> Result<()>
where
    F: FnOnce(&mut File) -> Result<()>,
{
    let target = node.borrow_mut().begin_open(rpath)?;
    let mut handle = storage::open(&target, mode)?;
    body(&mut handle)
}

/// Handle to a tracked directory created inside a transaction.
///
/// Returned by [`FileSystem::create_directory`](crate::FileSystem::create_directory)
/// and by [`Dir::create_directory`] for nesting. Cloning yields another
/// handle to the same node.
#[derive(Debug, Clone)]
pub struct Dir {
    node: Rc<RefCell<TDir>>,
    tx: Weak<RefCell<TxInner>>,
}

impl Dir {
    pub(crate) fn new(node: Rc<RefCell<TDir>>, tx: Weak<RefCell<TxInner>>) -> Self {
        Self { node, tx }
    }

    /// Absolute path of the tracked directory.
    pub fn path(&self) -> PathBuf {
        self.node.borrow().path().to_path_buf()
    }

    /// Opens a file under this directory for writing and passes the handle
    /// to `body`. See [`Dir::open_with`].
    pub fn open<P, F>(&self, rpath: P, body: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut File) -> Result<()>,
    {
        self.open_with(rpath, OpenMode::Write, body)
    }

    /// Opens a file under this directory in `mode` and passes the handle to
    /// `body`.
    ///
    /// Errors out of the body propagate to the caller unchanged;
    /// rollback-on-error interception happens only at the
    /// [`FileSystem`](crate::FileSystem) boundary.
    pub fn open_with<P, F>(&self, rpath: P, mode: OpenMode, body: F) -> Result<()>
    where
        P: AsRef<Path>,
        F: FnOnce(&mut File) -> Result<()>,
    {
        transaction::guard_active(&self.tx)?;
        open_in(&self.node, rpath.as_ref(), mode, body)
    }

    /// Creates a tracked subdirectory and returns a handle for nested
    /// operations.
    pub fn create_directory<P: AsRef<Path>>(&self, rpath: P) -> Result<Dir> {
        transaction::guard_active(&self.tx)?;
        let node = self.node.borrow_mut().add_directory(rpath.as_ref())?;
        Ok(Dir::new(node, Weak::clone(&self.tx)))
    }
}
