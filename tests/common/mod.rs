//! Shared helpers for txfs integration tests.

use std::fs;
use std::path::{Path, PathBuf};

/// Installs the test logger once per process.
#[allow(unused)]
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Collects every `.lock` marker under `root`, recursively.
#[allow(unused)]
pub fn lock_files_under(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    collect_locks(root, &mut found);
    found
}

fn collect_locks(dir: &Path, found: &mut Vec<PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_locks(&path, found);
        } else if path.extension().is_some_and(|ext| ext == "lock") {
            found.push(path);
        }
    }
}
