//! Local directory backend (`file://` endpoints). Each object key becomes a
//! relative path under the root directory.

use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use url::Url;

use super::{ObjectStore, PutReceipt};
use crate::retry::TransferError;

#[derive(Debug, Clone)]
pub struct LocalDirStore {
    root: PathBuf,
}

impl LocalDirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Destination path for `key`. Keys that would escape the root are refused.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, TransferError> {
        let mut dest = self.root.clone();
        for part in key.split('/').filter(|s| !s.is_empty()) {
            let mut components = Path::new(part).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(c)), None) => dest.push(c),
                _ => {
                    return Err(TransferError::new("invalid object key")
                        .with_code("InvalidObjectName")
                        .with_context(format!("key {}", key)))
                }
            }
        }
        if dest == self.root {
            return Err(TransferError::new("empty object key").with_code("InvalidObjectName"));
        }
        Ok(dest)
    }
}

#[async_trait]
impl ObjectStore for LocalDirStore {
    async fn put_object(&self, local_path: &Path, key: &str) -> Result<PutReceipt, TransferError> {
        let dest = self.object_path(key)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TransferError::from_io(&format!("create {}", parent.display()), &e))?;
        }
        tokio::fs::copy(local_path, &dest).await.map_err(|e| {
            TransferError::from_io(
                &format!("copy {} -> {}", local_path.display(), dest.display()),
                &e,
            )
        })?;
        let url = Url::from_file_path(&dest)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| dest.display().to_string());
        Ok(PutReceipt {
            key: key.to_string(),
            url,
        })
    }

    async fn check_reachable(&self) -> Result<(), TransferError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(m) if m.is_dir() => Ok(()),
            Ok(_) => Err(TransferError::new("destination is not a directory")
                .with_code("NoSuchBucket")
                .with_context(self.root.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(TransferError::new("destination directory missing")
                    .with_code("NoSuchBucket")
                    .with_context(self.root.display().to_string()))
            }
            Err(e) => Err(TransferError::from_io(
                &format!("stat {}", self.root.display()),
                &e,
            )),
        }
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}
