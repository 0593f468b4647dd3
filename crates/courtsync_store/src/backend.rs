//! Durable store trait definition and errors.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the durable store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// An I/O error from the underlying backend.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted value failed to serialize or deserialize.
    #[error("store serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A persisted snapshot failed to decode.
    #[error("store codec error: {0}")]
    Codec(#[from] courtsync_model::CodecError),
}

/// A synchronous durable key-value store.
///
/// Implementations are **opaque byte stores**: they do not interpret
/// values. The sync engine persists the aggregates snapshot, the sync
/// cursor, and the sync identifier through this trait.
///
/// # Invariants
///
/// - `get` returns exactly the bytes of the most recent `set` for that
///   key, or `None` if the key was never written (or was removed)
/// - `set` is atomic per key: a reader never observes a torn value
/// - Once `set` returns, the value survives process restart (for
///   persistent implementations)
/// - Implementations must be `Send + Sync`
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - for testing
/// - [`crate::FileStore`] - for persistent storage
pub trait DurableStore: Send + Sync {
    /// Reads the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Writes `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be made durable.
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;

    /// Removes the value stored under `key`, if any.
    ///
    /// Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the removal fails.
    fn remove(&self, key: &str) -> StoreResult<()>;
}
