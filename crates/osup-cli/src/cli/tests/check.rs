//! Tests for `osup check`.

use super::parse;
use crate::cli::commands::run_check;
use crate::cli::CliCommand;
use osup_core::config::OsupConfig;
use std::fs;
use std::path::PathBuf;

#[test]
fn cli_parse_check() {
    match parse(&["osup", "check", "--source", "/data/in"]) {
        CliCommand::Check {
            source,
            max_size_mb,
        } => {
            assert_eq!(source, PathBuf::from("/data/in"));
            assert!(max_size_mb.is_none());
        }
        _ => panic!("expected Check"),
    }
}

#[test]
fn check_passes_for_clean_tree() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/b.jpg"), b"jpeg").unwrap();
    run_check(&OsupConfig::default(), dir.path()).unwrap();
}

#[test]
fn check_fails_on_forbidden_extension() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("a.txt"), b"hello").unwrap();
    fs::write(dir.path().join("setup.EXE"), b"MZ").unwrap();
    let err = run_check(&OsupConfig::default(), dir.path()).unwrap_err();
    assert_eq!(err.to_string(), "1 file(s) failed validation");
}

#[test]
fn check_fails_on_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    assert!(run_check(&OsupConfig::default(), &dir.path().join("nope")).is_err());
}
