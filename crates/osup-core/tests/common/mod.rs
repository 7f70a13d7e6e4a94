//! Shared helpers for integration tests.

#![allow(dead_code)]

pub mod mock_store;
pub mod put_server;

use std::fs;
use std::path::{Path, PathBuf};

/// Write `len` bytes to `dir/name`, creating parent directories.
pub fn write_file(dir: &Path, name: &str, len: usize) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let body: Vec<u8> = (0u8..=250).cycle().take(len).collect();
    fs::write(&path, body).unwrap();
    path
}
