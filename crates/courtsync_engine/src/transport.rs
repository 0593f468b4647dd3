//! Transport layer abstraction for the remote blob endpoint.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Outcome of fetching a remote blob.
///
/// `Absent` is valid business information, not a failure: it means this
/// identifier has never been written, and the caller may bootstrap it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The remote holds a body for this key.
    Present(Vec<u8>),
    /// The key has never been written (or was deleted).
    Absent,
}

/// Classified transport failures.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// The device's network-reachability signal is false; no request was
    /// attempted.
    #[error("device is offline")]
    Offline,

    /// The request exceeded its hard timeout.
    #[error("request timed out")]
    Timeout,

    /// The remote answered with a non-success status.
    #[error("remote rejected the request with status {status}")]
    Rejected {
        /// HTTP status code; 0 for connection-level failures.
        status: u16,
    },
}

/// A blob transport reads and overwrites whole snapshot bodies at the
/// remote key-value endpoint.
///
/// The trait abstracts the network layer so tests can run against an
/// in-memory remote ([`MemoryRemote`]) and production against HTTP
/// ([`crate::HttpBlobTransport`]).
pub trait BlobTransport: Send + Sync {
    /// Reads the latest body stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns a classified [`TransportError`]; "not found" is *not* an
    /// error, it is [`FetchOutcome::Absent`].
    fn fetch(&self, key: &str) -> Result<FetchOutcome, TransportError>;

    /// Overwrites the body stored under `key` unconditionally.
    ///
    /// The remote offers no conditional write; last store wins.
    ///
    /// # Errors
    ///
    /// Returns a classified [`TransportError`].
    fn store(&self, key: &str, body: Vec<u8>) -> Result<(), TransportError>;
}

#[derive(Debug, Default)]
struct RemoteInner {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
    fetch_count: AtomicU64,
    store_count: AtomicU64,
    offline: AtomicBool,
    fail_next: Mutex<Option<TransportError>>,
}

/// An in-memory remote blob endpoint for tests.
///
/// Cloning yields a handle to the *same* remote, so several simulated
/// devices can share one endpoint. Call counters and fault injection
/// support the failure-path tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRemote {
    inner: Arc<RemoteInner>,
}

impl MemoryRemote {
    /// Creates an empty remote.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetches served (including absent outcomes).
    pub fn fetch_count(&self) -> u64 {
        self.inner.fetch_count.load(Ordering::SeqCst)
    }

    /// Number of stores accepted.
    pub fn store_count(&self) -> u64 {
        self.inner.store_count.load(Ordering::SeqCst)
    }

    /// Simulates losing or regaining network reachability.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Makes the next operation fail with `error`, once.
    pub fn fail_next(&self, error: TransportError) {
        *self.inner.fail_next.lock() = Some(error);
    }

    /// Returns the stored body for `key`, if any.
    pub fn body(&self, key: &str) -> Option<Vec<u8>> {
        self.inner.blobs.read().get(key).cloned()
    }

    /// Seeds a body directly, bypassing the transport.
    pub fn seed(&self, key: &str, body: Vec<u8>) {
        self.inner.blobs.write().insert(key.to_string(), body);
    }

    fn check_faults(&self) -> Result<(), TransportError> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Offline);
        }
        if let Some(error) = self.inner.fail_next.lock().take() {
            return Err(error);
        }
        Ok(())
    }
}

impl BlobTransport for MemoryRemote {
    fn fetch(&self, key: &str) -> Result<FetchOutcome, TransportError> {
        self.check_faults()?;
        self.inner.fetch_count.fetch_add(1, Ordering::SeqCst);
        Ok(match self.inner.blobs.read().get(key) {
            Some(body) => FetchOutcome::Present(body.clone()),
            None => FetchOutcome::Absent,
        })
    }

    fn store(&self, key: &str, body: Vec<u8>) -> Result<(), TransportError> {
        self.check_faults()?;
        self.inner.store_count.fetch_add(1, Ordering::SeqCst);
        self.inner.blobs.write().insert(key.to_string(), body);
        Ok(())
    }
}
