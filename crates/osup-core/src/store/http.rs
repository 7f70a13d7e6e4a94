//! HTTP PUT backend.
//!
//! Uses the curl crate (libcurl) to stream each file as the body of
//! `PUT {endpoint}/{key}`. Works with S3-compatible gateways and presigned
//! prefixes that accept a bearer token. Blocking curl calls run under
//! `spawn_blocking`.

use async_trait::async_trait;
use curl::easy::{Easy, List, ReadError};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use super::{ObjectStore, PutReceipt};
use crate::retry::TransferError;

/// Keep at most this much of an error response body (enough for an S3 error document).
const MAX_ERROR_BODY: usize = 16 * 1024;

impl From<curl::Error> for TransferError {
    fn from(e: curl::Error) -> Self {
        let err = TransferError::new(e.to_string());
        if e.is_couldnt_resolve_host() || e.is_couldnt_resolve_proxy() {
            err.with_code("ENOTFOUND")
        } else if e.is_couldnt_connect() {
            err.with_code("ECONNREFUSED")
        } else if e.is_operation_timedout() {
            err.with_code("ETIMEDOUT")
        } else if e.is_send_error() || e.is_recv_error() || e.is_got_nothing() {
            err.with_code("ECONNRESET")
        } else {
            err
        }
    }
}

/// Extract `<Code>...</Code>` from an S3-style XML error document.
fn error_code_from_body(body: &[u8]) -> Option<String> {
    let text = std::str::from_utf8(body).ok()?;
    let start = text.find("<Code>")? + "<Code>".len();
    let end = text[start..].find("</Code>")? + start;
    let code = text[start..end].trim();
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

fn http_error(status: u32, body: &[u8]) -> TransferError {
    let code = error_code_from_body(body);
    let message = match &code {
        Some(c) => format!("HTTP {}: {}", status, c),
        None => format!("HTTP {}", status),
    };
    let mut err = TransferError::new(message).with_status(status as u16);
    if let Some(c) = code {
        err = err.with_code(c);
    }
    err
}

/// Uploads to `{endpoint}/{key}` with HTTP PUT.
#[derive(Debug, Clone)]
pub struct HttpStore {
    endpoint: Url,
    token: Option<String>,
    connect_timeout: Duration,
    timeout: Duration,
}

impl HttpStore {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            token: None,
            connect_timeout: Duration::from_secs(15),
            timeout: Duration::from_secs(300),
        }
    }

    /// Sent as `Authorization: Bearer <token>`.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_timeouts(mut self, connect_timeout: Duration, timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self.timeout = timeout;
        self
    }

    /// Endpoint with the key appended as percent-encoded path segments.
    pub fn object_url(&self, key: &str) -> Result<Url, TransferError> {
        let mut url = self.endpoint.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransferError::new("endpoint cannot take a path")
                    .with_context(self.endpoint.to_string())
            })?;
            segments
                .pop_if_empty()
                .extend(key.split('/').filter(|s| !s.is_empty()));
        }
        Ok(url)
    }

    fn base_headers(&self) -> Result<List, TransferError> {
        let mut list = List::new();
        if let Some(token) = &self.token {
            list.append(&format!("Authorization: Bearer {}", token))?;
        }
        Ok(list)
    }

    fn put_blocking(&self, url: &Url, path: &Path) -> Result<(), TransferError> {
        let open_ctx = format!("open {}", path.display());
        let mut file = File::open(path).map_err(|e| TransferError::from_io(&open_ctx, &e))?;
        let size = file
            .metadata()
            .map_err(|e| TransferError::from_io(&open_ctx, &e))?
            .len();

        let mut easy = Easy::new();
        easy.url(url.as_str())?;
        easy.upload(true)?;
        easy.in_filesize(size)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.timeout)?;

        let mut headers = self.base_headers()?;
        // Send the body straight away instead of waiting for 100-continue.
        headers.append("Expect:")?;
        headers.append("Content-Type: application/octet-stream")?;
        easy.http_headers(headers)?;

        let mut body = Vec::new();
        let mut read_error = None;
        let performed = {
            let mut transfer = easy.transfer();
            transfer.read_function(|buf| match file.read(buf) {
                Ok(n) => Ok(n),
                Err(e) => {
                    read_error = Some(e);
                    Err(ReadError::Abort)
                }
            })?;
            transfer.write_function(|data| {
                let room = MAX_ERROR_BODY.saturating_sub(body.len());
                body.extend_from_slice(&data[..data.len().min(room)]);
                Ok(data.len())
            })?;
            transfer.perform()
        };
        if let Some(e) = read_error {
            return Err(TransferError::from_io(&format!("read {}", path.display()), &e));
        }
        performed?;

        let status = easy.response_code()?;
        if !(200..300).contains(&status) {
            return Err(http_error(status, &body));
        }
        Ok(())
    }

    fn head_blocking(&self) -> Result<(), TransferError> {
        let mut easy = Easy::new();
        easy.url(self.endpoint.as_str())?;
        easy.nobody(true)?;
        easy.connect_timeout(self.connect_timeout)?;
        easy.timeout(self.connect_timeout.saturating_mul(2))?;
        easy.http_headers(self.base_headers()?)?;
        easy.perform()?;

        let status = easy.response_code()?;
        match status {
            401 | 403 => Err(http_error(status, b"")),
            // HEAD carries no error document; on a bucket endpoint 404 means the bucket.
            404 => Err(TransferError::new("HTTP 404: NoSuchBucket")
                .with_status(404)
                .with_code("NoSuchBucket")),
            s if s >= 500 => Err(http_error(s, b"")),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn put_object(&self, local_path: &Path, key: &str) -> Result<PutReceipt, TransferError> {
        let url = self.object_url(key)?;
        let store = self.clone();
        let target = url.clone();
        let path: PathBuf = local_path.to_path_buf();
        tokio::task::spawn_blocking(move || store.put_blocking(&target, &path))
            .await
            .map_err(|e| TransferError::new(format!("upload task join: {}", e)))??;
        Ok(PutReceipt {
            key: key.to_string(),
            url: url.to_string(),
        })
    }

    async fn check_reachable(&self) -> Result<(), TransferError> {
        let store = self.clone();
        tokio::task::spawn_blocking(move || store.head_blocking())
            .await
            .map_err(|e| TransferError::new(format!("probe task join: {}", e)))?
    }

    fn describe(&self) -> String {
        self.endpoint.to_string()
    }
}
