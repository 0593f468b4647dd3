//! Conflict resolution between the local cursor and a remote envelope.

use courtsync_model::SnapshotEnvelope;

/// The operation being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Scheduled or manual read of the remote snapshot.
    Pull,
    /// Publication of the local state after a mutation.
    Push,
    /// Operator override: adopt the remote regardless of recency.
    ForcePull,
}

/// What the orchestrator should do with the fetched remote state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Replace all local aggregates with the remote envelope.
    AdoptRemote,
    /// The local state wins; overwrite the remote so other devices
    /// converge on it.
    KeepLocalAndRepropagate,
    /// Local and remote already agree (or there is nothing to do).
    NoChange,
    /// The identifier has never been written; initialize it from the
    /// current local state.
    Bootstrap,
}

/// Decides between local and remote state.
///
/// Ordering is by logical timestamp only (last-write-wins). An exact
/// millisecond tie on pull is treated as already-equal and neither side
/// overwrites; this is an accepted imprecision of millisecond-granularity
/// versioning, not disambiguated by device identity.
///
/// A push that is not adopting a strictly newer remote always
/// repropagates: pushes stamp a fresh timestamp strictly greater than the
/// local cursor, so a post-mutation push lands even though the cursor
/// still equals the remote timestamp from the previous sync.
pub fn resolve(
    local_cursor: i64,
    remote: Option<&SnapshotEnvelope>,
    mode: SyncMode,
    local_is_empty: bool,
) -> Decision {
    let Some(remote) = remote else {
        return match mode {
            SyncMode::Push => Decision::Bootstrap,
            SyncMode::Pull if !local_is_empty => Decision::Bootstrap,
            // Nothing to adopt, nothing worth publishing yet.
            _ => Decision::NoChange,
        };
    };

    if mode == SyncMode::ForcePull {
        return Decision::AdoptRemote;
    }

    if remote.logical_timestamp > local_cursor {
        return Decision::AdoptRemote;
    }

    match mode {
        SyncMode::Push => Decision::KeepLocalAndRepropagate,
        SyncMode::Pull if local_cursor > remote.logical_timestamp => {
            Decision::KeepLocalAndRepropagate
        }
        _ => Decision::NoChange,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtsync_model::Aggregates;

    fn envelope(ts: i64) -> SnapshotEnvelope {
        SnapshotEnvelope::new(&Aggregates::default(), ts)
    }

    #[test]
    fn absent_remote_bootstraps_on_push() {
        assert_eq!(
            resolve(0, None, SyncMode::Push, true),
            Decision::Bootstrap
        );
        assert_eq!(
            resolve(0, None, SyncMode::Push, false),
            Decision::Bootstrap
        );
    }

    #[test]
    fn absent_remote_bootstraps_on_pull_only_with_local_data() {
        assert_eq!(
            resolve(0, None, SyncMode::Pull, false),
            Decision::Bootstrap
        );
        assert_eq!(resolve(0, None, SyncMode::Pull, true), Decision::NoChange);
    }

    #[test]
    fn absent_remote_on_force_pull_is_no_change() {
        assert_eq!(
            resolve(50, None, SyncMode::ForcePull, false),
            Decision::NoChange
        );
    }

    #[test]
    fn force_pull_adopts_unconditionally() {
        // Even a remote older than the cursor wins under force-pull.
        assert_eq!(
            resolve(100, Some(&envelope(10)), SyncMode::ForcePull, false),
            Decision::AdoptRemote
        );
        assert_eq!(
            resolve(100, Some(&envelope(100)), SyncMode::ForcePull, false),
            Decision::AdoptRemote
        );
    }

    #[test]
    fn newer_remote_is_adopted() {
        assert_eq!(
            resolve(10, Some(&envelope(20)), SyncMode::Pull, false),
            Decision::AdoptRemote
        );
        assert_eq!(
            resolve(10, Some(&envelope(20)), SyncMode::Push, false),
            Decision::AdoptRemote
        );
    }

    #[test]
    fn stale_remote_on_pull_is_repropagated() {
        assert_eq!(
            resolve(20, Some(&envelope(10)), SyncMode::Pull, false),
            Decision::KeepLocalAndRepropagate
        );
    }

    #[test]
    fn tie_on_pull_is_no_change() {
        assert_eq!(
            resolve(15, Some(&envelope(15)), SyncMode::Pull, false),
            Decision::NoChange
        );
    }

    #[test]
    fn push_publishes_when_remote_is_not_newer() {
        assert_eq!(
            resolve(15, Some(&envelope(15)), SyncMode::Push, false),
            Decision::KeepLocalAndRepropagate
        );
        assert_eq!(
            resolve(20, Some(&envelope(10)), SyncMode::Push, false),
            Decision::KeepLocalAndRepropagate
        );
    }
}
