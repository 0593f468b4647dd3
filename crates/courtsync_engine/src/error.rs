//! Error types for the sync engine.

use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Everything here is recovered inside the engine: the orchestrator turns
/// transport and decode failures into status values, and the scheduler
/// skips `Busy`. Nothing propagates as a fault that halts the host
/// process.
#[derive(Error, Debug)]
pub enum SyncError {
    /// The device has no network reachability; no request was attempted.
    #[error("device is offline")]
    Offline,

    /// A network request exceeded its hard timeout.
    #[error("request timed out")]
    Timeout,

    /// The remote endpoint answered with a non-success status.
    #[error("remote rejected the request with status {status}")]
    RemoteRejected {
        /// HTTP status code; 0 for connection-level failures.
        status: u16,
    },

    /// The remote body could not be decoded as a snapshot envelope.
    #[error("snapshot decode failed: {0}")]
    Decode(#[from] courtsync_model::CodecError),

    /// The normalized sync identifier is too short to use safely.
    #[error("sync identifier {normalized:?} is shorter than {min} characters")]
    IdentifierTooShort {
        /// The identifier after normalization.
        normalized: String,
        /// The minimum accepted length.
        min: usize,
    },

    /// No sync identifier has been configured on this device.
    #[error("no sync identifier configured")]
    NoIdentifier,

    /// Another sync operation is already in flight for this identifier.
    #[error("a sync operation is already in flight")]
    Busy,

    /// The local durable store failed.
    #[error("local store error: {0}")]
    Store(#[from] courtsync_store::StoreError),
}

impl SyncError {
    /// Returns true if the next scheduled attempt may succeed without
    /// operator intervention.
    ///
    /// Feeds the scheduler's backoff decision, alongside
    /// `SyncOutcome::is_transient` for operations that ran to an outcome.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncError::Offline
                | SyncError::Timeout
                | SyncError::RemoteRejected { .. }
                | SyncError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(SyncError::Offline.is_transient());
        assert!(SyncError::Timeout.is_transient());
        assert!(SyncError::RemoteRejected { status: 500 }.is_transient());
        assert!(!SyncError::NoIdentifier.is_transient());
        assert!(!SyncError::Busy.is_transient());
    }

    #[test]
    fn error_display() {
        let err = SyncError::IdentifierTooShort {
            normalized: "ab".into(),
            min: 4,
        };
        assert!(err.to_string().contains("\"ab\""));
        assert!(err.to_string().contains('4'));
    }
}
