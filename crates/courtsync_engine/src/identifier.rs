//! Sync identifier normalization and validation.

use crate::error::{SyncError, SyncResult};
use std::fmt;

/// Minimum normalized identifier length.
///
/// One- and two-character identifiers collide across unrelated users of
/// the shared public bucket far too easily; accidental short inputs are
/// rejected before any network traffic happens.
pub const MIN_IDENTIFIER_LEN: usize = 4;

/// A validated, normalized sync identifier.
///
/// The identifier names a replication group: every device configured with
/// the same identifier converges on the same remote snapshot. It is
/// human-typed, so normalization makes differently-cased or decorated
/// inputs resolve to the same remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SyncIdentifier(String);

impl SyncIdentifier {
    /// Parses and validates a raw, human-typed identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::IdentifierTooShort`] if fewer than
    /// [`MIN_IDENTIFIER_LEN`] characters survive normalization.
    pub fn parse(raw: &str) -> SyncResult<Self> {
        let normalized = normalize(raw);
        if normalized.len() < MIN_IDENTIFIER_LEN {
            return Err(SyncError::IdentifierTooShort {
                normalized,
                min: MIN_IDENTIFIER_LEN,
            });
        }
        Ok(Self(normalized))
    }

    /// The normalized identifier, as used for the remote lookup key.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SyncIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalizes a raw identifier: lowercases and keeps only `[a-z0-9]`.
///
/// Normalization is deterministic and idempotent; two inputs that
/// normalize identically resolve to the same remote resource.
pub fn normalize(raw: &str) -> String {
    raw.chars()
        .flat_map(|c| c.to_lowercase())
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}
