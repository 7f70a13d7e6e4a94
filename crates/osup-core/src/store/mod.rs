//! Object store backends.
//!
//! The upload pipeline only needs "put this file under this key" plus a
//! reachability probe. Backends report failures as `TransferError` with
//! whatever status/code they can extract, and the retry layer decides what
//! to do with them.

mod http;
mod local;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use url::Url;

use crate::config::HttpConfig;
use crate::retry::TransferError;

pub use http::HttpStore;
pub use local::LocalDirStore;

/// Where an uploaded object ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    pub key: String,
    pub url: String,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local_path` under `key` (a `/`-separated object key).
    async fn put_object(&self, local_path: &Path, key: &str) -> Result<PutReceipt, TransferError>;

    /// Confirm the destination exists and accepts our credentials before any
    /// upload is scheduled.
    async fn check_reachable(&self) -> Result<(), TransferError> {
        Ok(())
    }

    /// Human-readable destination, for logs and the console.
    fn describe(&self) -> String;
}

/// Build a store from an endpoint URL: `http(s)://host/bucket[/prefix]` or
/// `file:///some/dir`.
pub fn open(endpoint: &str, token: Option<String>, http: &HttpConfig) -> Result<Arc<dyn ObjectStore>> {
    let url = Url::parse(endpoint).with_context(|| format!("invalid endpoint URL: {}", endpoint))?;
    match url.scheme() {
        "http" | "https" => {
            let mut store =
                HttpStore::new(url).with_timeouts(http.connect_timeout(), http.timeout());
            if let Some(token) = token {
                store = store.with_token(token);
            }
            Ok(Arc::new(store))
        }
        "file" => {
            let root = url
                .to_file_path()
                .map_err(|_| anyhow::anyhow!("file endpoint must be an absolute path: {}", endpoint))?;
            Ok(Arc::new(LocalDirStore::new(root)))
        }
        other => bail!("unsupported endpoint scheme '{}' (expected http, https or file)", other),
    }
}
