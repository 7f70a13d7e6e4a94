//! In-memory object store that records calls and can be told to fail.

use async_trait::async_trait;
use osup_core::retry::TransferError;
use osup_core::store::{ObjectStore, PutReceipt};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Behavior {
    Succeed,
    AlwaysFail(TransferError),
    /// Fail only for keys containing the given fragment.
    FailMatching(String, TransferError),
}

#[derive(Debug)]
pub struct MockStore {
    behavior: Behavior,
    latency: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    keys: Mutex<Vec<String>>,
}

impl MockStore {
    pub fn new(behavior: Behavior, latency: Duration) -> Self {
        Self {
            behavior,
            latency,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            keys: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Keys in the order put_object was called (including retries).
    pub fn keys(&self) -> Vec<String> {
        self.keys.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn put_object(&self, _local_path: &Path, key: &str) -> Result<PutReceipt, TransferError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.keys.lock().unwrap().push(key.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.latency).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match &self.behavior {
            Behavior::Succeed => Ok(PutReceipt {
                key: key.to_string(),
                url: format!("mock://bucket/{}", key),
            }),
            Behavior::AlwaysFail(e) => Err(e.clone()),
            Behavior::FailMatching(fragment, e) if key.contains(fragment.as_str()) => {
                Err(e.clone())
            }
            Behavior::FailMatching(..) => Ok(PutReceipt {
                key: key.to_string(),
                url: format!("mock://bucket/{}", key),
            }),
        }
    }

    fn describe(&self) -> String {
        "mock://bucket".to_string()
    }
}
