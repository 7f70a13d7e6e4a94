//! Turn a local source (file or directory tree) into upload items.
//!
//! A single file maps to `prefix/basename`; a directory maps every regular
//! file below it to `prefix/relative/path`, `/`-separated on every platform.
//! Entries are visited in name order so the item list is deterministic.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> SourceError + '_ {
    move |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// One file to upload and the object key it goes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadItem {
    pub local_path: PathBuf,
    pub key: String,
}

/// Join key parts with `/`, dropping empty and `.` segments.
pub fn join_key(prefix: &str, relative: &str) -> String {
    prefix
        .split('/')
        .chain(relative.split('/'))
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

pub fn collect_upload_items(source: &Path, target_prefix: &str) -> Result<Vec<UploadItem>, SourceError> {
    let meta = match fs::metadata(source) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SourceError::NotFound(source.to_path_buf()))
        }
        Err(e) => return Err(io_err(source)(e)),
    };

    if !meta.is_dir() {
        let name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        return Ok(vec![UploadItem {
            local_path: source.to_path_buf(),
            key: join_key(target_prefix, &name),
        }]);
    }

    let mut items = Vec::new();
    let mut relative = Vec::new();
    walk(source, target_prefix, &mut relative, &mut items)?;
    tracing::debug!(source = %source.display(), files = items.len(), "collected upload items");
    Ok(items)
}

fn walk(
    dir: &Path,
    prefix: &str,
    relative: &mut Vec<String>,
    out: &mut Vec<UploadItem>,
) -> Result<(), SourceError> {
    let mut entries = fs::read_dir(dir)
        .map_err(io_err(dir))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(io_err(dir))?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type().map_err(io_err(&path))?;
        let is_dir = if file_type.is_symlink() {
            // Follow links to files, but never into directories (cycles).
            match fs::metadata(&path) {
                Ok(m) if m.is_dir() => {
                    tracing::debug!(path = %path.display(), "skipping symlinked directory");
                    continue;
                }
                _ => false,
            }
        } else {
            file_type.is_dir()
        };

        relative.push(entry.file_name().to_string_lossy().into_owned());
        if is_dir {
            walk(&path, prefix, relative, out)?;
        } else {
            out.push(UploadItem {
                local_path: path,
                key: join_key(prefix, &relative.join("/")),
            });
        }
        relative.pop();
    }
    Ok(())
}
