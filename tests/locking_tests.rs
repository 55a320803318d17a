//! Lock marker lifecycle and misuse guards.

mod common;

use common::{init_logging, lock_files_under};
use std::fs;
use std::io::Write;
use tempfile::TempDir;
use txfs::{OpenOutcome, Transaction, TxError};

#[test]
fn second_open_of_same_path_fails_while_pending() {
    init_logging();
    let root = TempDir::new().unwrap();

    let transaction = Transaction::new();
    let fs_root = transaction.create_file_system(root.path()).unwrap();

    let _ = fs_root
        .open("testfile", |f| {
            writeln!(f, "first")?;
            Ok(())
        })
        .unwrap();

    let err = fs_root.open("testfile", |_| Ok(())).unwrap_err();
    assert!(matches!(err, TxError::AlreadyOpen(_)));
    assert!(err.to_string().contains("already open"));

    // Caller misuse does not doom the transaction.
    assert!(!transaction.is_rolled_back());
    transaction.commit().unwrap();
    assert_eq!(
        fs::read_to_string(root.path().join("testfile")).unwrap(),
        "first\n"
    );
}

#[test]
fn reopen_succeeds_after_commit() {
    init_logging();
    let root = TempDir::new().unwrap();

    Transaction::run(|transaction| {
        let fs_root = transaction.create_file_system(root.path())?;
        let _ = fs_root.open("testfile", |f| {
            write!(f, "one")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();

    Transaction::run(|transaction| {
        let fs_root = transaction.create_file_system(root.path())?;
        let outcome = fs_root.open("testfile", |f| {
            write!(f, "two")?;
            Ok(())
        })?;
        assert_eq!(outcome, OpenOutcome::Applied);
        Ok(())
    })
    .unwrap();

    assert_eq!(
        fs::read_to_string(root.path().join("testfile")).unwrap(),
        "two"
    );
}

#[test]
fn reopen_succeeds_after_rollback() {
    init_logging();
    let root = TempDir::new().unwrap();

    let transaction = Transaction::new();
    let fs_root = transaction.create_file_system(root.path()).unwrap();
    let _ = fs_root
        .open("testfile", |f| {
            write!(f, "discarded")?;
            Ok(())
        })
        .unwrap();
    transaction.rollback().unwrap();

    Transaction::run(|transaction| {
        let fs_root = transaction.create_file_system(root.path())?;
        let outcome = fs_root.open("testfile", |f| {
            write!(f, "kept")?;
            Ok(())
        })?;
        assert_eq!(outcome, OpenOutcome::Applied);
        Ok(())
    })
    .unwrap();

    assert_eq!(
        fs::read_to_string(root.path().join("testfile")).unwrap(),
        "kept"
    );
}

#[test]
fn lock_holds_backup_of_original_content() {
    init_logging();
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("testfile"), "original data").unwrap();
    let lock_path = root.path().join("testfile.lock");

    let transaction = Transaction::new();
    let fs_root = transaction.create_file_system(root.path()).unwrap();
    let _ = fs_root
        .open("testfile", |f| {
            write!(f, "new data")?;
            assert_eq!(fs::read_to_string(&lock_path)?, "original data");
            Ok(())
        })
        .unwrap();

    // The lock persists past the body, until the transaction finishes.
    assert!(lock_path.is_file());
    transaction.commit().unwrap();
    assert!(!lock_path.exists());
}

#[test]
fn lock_is_empty_marker_for_new_file() {
    init_logging();
    let root = TempDir::new().unwrap();
    let lock_path = root.path().join("testfile.lock");

    let transaction = Transaction::new();
    let fs_root = transaction.create_file_system(root.path()).unwrap();
    let _ = fs_root
        .open("testfile", |f| {
            writeln!(f, "data")?;
            assert_eq!(fs::read(&lock_path)?, b"");
            Ok(())
        })
        .unwrap();

    transaction.rollback().unwrap();
    assert!(lock_files_under(root.path()).is_empty());
}

#[test]
fn finished_transaction_rejects_new_filesystems() {
    init_logging();
    let root = TempDir::new().unwrap();

    let transaction = Transaction::new();
    transaction.commit().unwrap();

    let err = transaction.create_file_system(root.path()).unwrap_err();
    assert!(matches!(err, TxError::TransactionFinished));
}

#[test]
fn directory_handle_is_inert_after_rollback() {
    init_logging();
    let root = TempDir::new().unwrap();

    let transaction = Transaction::new();
    let fs_root = transaction.create_file_system(root.path()).unwrap();
    let dir = fs_root.create_directory("testdir").unwrap();

    transaction.rollback().unwrap();

    let err = dir.open("f", |_| Ok(())).unwrap_err();
    assert!(matches!(err, TxError::TransactionFinished));
    let err = dir.create_directory("sub").unwrap_err();
    assert!(matches!(err, TxError::TransactionFinished));

    assert!(!root.path().join("testdir").exists());
    assert!(lock_files_under(root.path()).is_empty());
}

#[test]
fn directory_handle_is_inert_after_commit() {
    init_logging();
    let root = TempDir::new().unwrap();

    let transaction = Transaction::new();
    let fs_root = transaction.create_file_system(root.path()).unwrap();
    let dir = fs_root.create_directory("testdir").unwrap();
    transaction.commit().unwrap();

    let err = dir.open("f", |_| Ok(())).unwrap_err();
    assert!(matches!(err, TxError::TransactionFinished));
    assert!(root.path().join("testdir").is_dir());
}

#[test]
fn filesystem_handle_outliving_transaction_errors() {
    init_logging();
    let root = TempDir::new().unwrap();

    let fs_root = {
        let transaction = Transaction::new();
        let fs_root = transaction.create_file_system(root.path()).unwrap();
        transaction.commit().unwrap();
        fs_root
    };

    let err = fs_root.open("testfile", |_| Ok(())).unwrap_err();
    assert!(matches!(err, TxError::TransactionFinished));
}
