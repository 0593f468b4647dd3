//! One-shot pull, push, and force-pull command implementations.

use super::{CliResult, Endpoint};
use courtsync_engine::{FailureKind, SyncError, SyncOutcome};

/// Which one-shot operation to run.
#[derive(Debug, Clone, Copy)]
pub enum Operation {
    /// Read the remote snapshot and converge on it.
    Pull,
    /// Publish the local state.
    Push,
    /// Adopt the remote snapshot regardless of recency.
    ForcePull,
}

/// Runs a one-shot sync operation and prints the outcome.
pub fn run(endpoint: &Endpoint, operation: Operation) -> CliResult<()> {
    let (orchestrator, store) = endpoint.open_orchestrator()?;

    let result = match operation {
        Operation::Pull => orchestrator.pull(),
        Operation::Push => orchestrator.push(),
        Operation::ForcePull => orchestrator.force_pull(),
    };

    match result {
        Ok(outcome) => {
            println!("{}", describe(outcome));
            println!("Cursor: {}", store.cursor());
            Ok(())
        }
        Err(SyncError::NoIdentifier) => {
            println!("No sync identifier is set; run `courtsync set-id <id>` first.");
            Ok(())
        }
        Err(SyncError::IdentifierTooShort { normalized, min }) => {
            println!(
                "Sync identifier '{normalized}' is too short after normalization \
                 (minimum {min} characters); run `courtsync set-id <id>` with a longer one."
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn describe(outcome: SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Synced => "In sync with the remote snapshot.".into(),
        SyncOutcome::StaleRemoteUpdated => {
            "Remote was stale; pushed local state so other devices catch up.".into()
        }
        SyncOutcome::WaitingForFirstWrite => {
            "Nothing stored under this identifier yet; waiting for the first write.".into()
        }
        SyncOutcome::Offline => "Device is offline; nothing was attempted.".into(),
        SyncOutcome::TransientError(FailureKind::Timeout) => {
            "Request timed out; will likely succeed on a retry.".into()
        }
        SyncOutcome::TransientError(FailureKind::RemoteRejected(status)) => {
            format!("Remote rejected the request (status {status}); try again shortly.")
        }
        SyncOutcome::TransientError(FailureKind::Decode) => {
            "Remote body is unreadable; left untouched. A push will overwrite it.".into()
        }
    }
}
