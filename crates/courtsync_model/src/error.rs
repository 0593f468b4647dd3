//! Error types for the snapshot codec.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors that can occur while encoding or decoding a snapshot envelope.
///
/// A `CodecError` is ordinary business information to the sync engine:
/// a body that fails to decode is treated as logically absent, never as
/// a fault that aborts the caller.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The body was empty.
    #[error("empty snapshot body")]
    EmptyBody,

    /// The body was not well-formed JSON or did not match the envelope
    /// shape.
    #[error("malformed snapshot body: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The envelope carried a timestamp that cannot order snapshots.
    #[error("invalid logical timestamp: {0}")]
    InvalidTimestamp(i64),
}
