//! The sync orchestrator state machine.

use crate::clock::TimeSource;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::identifier::SyncIdentifier;
use crate::resolver::{resolve, Decision, SyncMode};
use crate::transport::{BlobTransport, FetchOutcome, TransportError};
use courtsync_model::{decode, encode, SnapshotEnvelope};
use courtsync_store::{DurableStore, StateStore};
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The orchestrator's reentrancy guard state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No operation in progress.
    Idle,
    /// An operation is running against the remote.
    InFlight(SyncMode),
    /// A remote snapshot is being adopted; mutation observers must not
    /// arm pushes.
    Locked,
}

/// Classified transient failure carried in a status report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// A request exceeded its hard timeout.
    Timeout,
    /// The remote rejected the request with this status.
    RemoteRejected(u16),
    /// The remote body could not be decoded.
    Decode,
}

/// Outcome of one orchestrator operation, surfaced to the operator
/// indicator. Always one of a small fixed set, never a raw error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Local and remote agree (adopted, published, or already equal).
    Synced,
    /// The remote was stale; the local state was pushed to catch it up.
    StaleRemoteUpdated,
    /// The identifier has never been written and this device has nothing
    /// worth publishing yet.
    WaitingForFirstWrite,
    /// A transient failure; the next scheduled attempt may succeed.
    TransientError(FailureKind),
    /// The device is offline; no request was attempted.
    Offline,
}

impl SyncOutcome {
    /// True when the next scheduled attempt may succeed on its own,
    /// without operator intervention.
    ///
    /// The scheduler lengthens its pull interval while outcomes stay
    /// transient and resets it on the first one that is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SyncOutcome::TransientError(_) | SyncOutcome::Offline
        )
    }
}

/// Operator-facing connection indicator.
///
/// Distinguishes "never yet connected" from "was connected, now
/// failing", so an operator knows whether to check the identifier or
/// check the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    /// No sync operation has ever reached the remote.
    NeverConnected,
    /// The last operation converged.
    Synced,
    /// The last operation pushed local state over a stale remote.
    StaleRemoteUpdated,
    /// Waiting for the first write to this identifier.
    WaitingForFirstWrite,
    /// The device is offline.
    Offline,
    /// Previously connected, currently failing.
    Degraded,
}

/// Counters and status for the operator indicator.
#[derive(Debug, Clone, Default)]
pub struct SyncStats {
    /// Operations completed (including failed ones).
    pub cycles: u64,
    /// Envelopes written to the remote.
    pub snapshots_pushed: u64,
    /// Remote snapshots adopted locally.
    pub snapshots_adopted: u64,
    /// Consecutive transient failures since the last success.
    pub consecutive_failures: u32,
    /// Outcome of the most recent operation.
    pub last_outcome: Option<SyncOutcome>,
    /// Logical timestamp of the last successful convergence.
    pub last_synced_ms: Option<i64>,
    /// True once any operation has completed a remote round trip.
    pub ever_synced: bool,
}

/// The state machine coordinating pull, push, and force-pull against one
/// identifier.
///
/// Operations are totally ordered per device: the `InFlight`/`Locked`
/// guard refuses to start while another operation is running or while a
/// just-adopted snapshot is settling. Transport failures never corrupt
/// local state; the store is either left unchanged or replaced wholesale
/// by one consistent envelope.
pub struct Orchestrator<T: BlobTransport, S: DurableStore> {
    config: SyncConfig,
    transport: Arc<T>,
    store: Arc<StateStore<S>>,
    clock: Arc<dyn TimeSource>,
    state: Mutex<EngineState>,
    locked_until: Mutex<Option<Instant>>,
    stats: RwLock<SyncStats>,
}

/// Restores `Idle` on every exit path so no operation can orphan the
/// guard.
struct InFlightGuard<'a> {
    state: &'a Mutex<EngineState>,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock() = EngineState::Idle;
    }
}

impl<T: BlobTransport, S: DurableStore> Orchestrator<T, S> {
    /// Creates an orchestrator over the given transport and state store.
    pub fn new(
        config: SyncConfig,
        transport: Arc<T>,
        store: Arc<StateStore<S>>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            config,
            transport,
            store,
            clock,
            state: Mutex::new(EngineState::Idle),
            locked_until: Mutex::new(None),
            stats: RwLock::new(SyncStats::default()),
        }
    }

    /// The configuration this orchestrator was built with.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// The current guard state.
    pub fn state(&self) -> EngineState {
        *self.state.lock()
    }

    /// Returns true while an adoption is in progress or settling.
    ///
    /// The scheduler consults this before arming a push debounce: a
    /// mutation observed inside this window is the adoption itself, not a
    /// local edit, and pushing it back would close a feedback loop.
    pub fn is_locked(&self) -> bool {
        if *self.state.lock() == EngineState::Locked {
            return true;
        }
        self.locked_until
            .lock()
            .is_some_and(|until| Instant::now() < until)
    }

    /// A snapshot of the counters and last outcome.
    pub fn stats(&self) -> SyncStats {
        self.stats.read().clone()
    }

    /// The operator-facing indicator derived from the stats.
    pub fn indicator(&self) -> Indicator {
        let stats = self.stats.read();
        match stats.last_outcome {
            None => Indicator::NeverConnected,
            Some(SyncOutcome::Synced) => Indicator::Synced,
            Some(SyncOutcome::StaleRemoteUpdated) => Indicator::StaleRemoteUpdated,
            Some(SyncOutcome::WaitingForFirstWrite) => Indicator::WaitingForFirstWrite,
            Some(SyncOutcome::Offline) => Indicator::Offline,
            Some(SyncOutcome::TransientError(_)) => {
                if stats.ever_synced {
                    Indicator::Degraded
                } else {
                    Indicator::NeverConnected
                }
            }
        }
    }

    /// Reads the remote snapshot and converges on it.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Busy`] when another operation holds the
    /// guard, identifier errors when none is usable, and store errors if
    /// local persistence fails. Transport failures are *not* errors; they
    /// come back as [`SyncOutcome`] values.
    pub fn pull(&self) -> SyncResult<SyncOutcome> {
        self.run(SyncMode::Pull)
    }

    /// Publishes the current local state.
    ///
    /// # Errors
    ///
    /// Same contract as [`Orchestrator::pull`].
    pub fn push(&self) -> SyncResult<SyncOutcome> {
        self.run(SyncMode::Push)
    }

    /// Adopts the remote snapshot regardless of recency.
    ///
    /// The one operation allowed to move the cursor backward; used when
    /// the operator decides this device's state is wrong.
    ///
    /// # Errors
    ///
    /// Same contract as [`Orchestrator::pull`].
    pub fn force_pull(&self) -> SyncResult<SyncOutcome> {
        self.run(SyncMode::ForcePull)
    }

    fn run(&self, mode: SyncMode) -> SyncResult<SyncOutcome> {
        let identifier = self.current_identifier()?;

        let guard = self.begin(mode)?;
        debug!(mode = ?mode, id = %identifier, "sync operation started");

        let outcome = self.execute(mode, &identifier, guard)?;
        self.record(outcome);
        debug!(mode = ?mode, outcome = ?outcome, "sync operation finished");
        Ok(outcome)
    }

    fn current_identifier(&self) -> SyncResult<SyncIdentifier> {
        let raw = self.store.identifier().ok_or(SyncError::NoIdentifier)?;
        SyncIdentifier::parse(&raw).map_err(|e| {
            warn!("refusing sync: {e}");
            e
        })
    }

    fn begin(&self, mode: SyncMode) -> SyncResult<InFlightGuard<'_>> {
        let mut state = self.state.lock();
        if *state != EngineState::Idle {
            return Err(SyncError::Busy);
        }
        if self
            .locked_until
            .lock()
            .is_some_and(|until| Instant::now() < until)
        {
            return Err(SyncError::Busy);
        }
        *state = EngineState::InFlight(mode);
        Ok(InFlightGuard { state: &self.state })
    }

    fn execute(
        &self,
        mode: SyncMode,
        identifier: &SyncIdentifier,
        guard: InFlightGuard<'_>,
    ) -> SyncResult<SyncOutcome> {
        let key = identifier.as_str();

        let fetched = match self.transport.fetch(key) {
            Ok(outcome) => outcome,
            Err(e) => return Ok(Self::transport_outcome(e)),
        };

        let mut decode_failed = false;
        let remote = match &fetched {
            FetchOutcome::Present(body) => match decode(body) {
                Ok(envelope) => Some(envelope),
                Err(e) => {
                    warn!(id = %identifier, "remote body undecodable, treating as absent: {e}");
                    decode_failed = true;
                    None
                }
            },
            FetchOutcome::Absent => None,
        };

        let aggregates = self.store.read();
        let cursor = self.store.cursor();
        let decision = resolve(cursor, remote.as_ref(), mode, aggregates.is_empty());
        debug!(?decision, cursor, "resolved");

        match decision {
            Decision::AdoptRemote => {
                // The resolver only adopts a present remote; force-pull
                // on an absent remote resolves to NoChange.
                let Some(envelope) = remote else {
                    return Ok(SyncOutcome::WaitingForFirstWrite);
                };
                self.adopt(envelope, guard)?;
                Ok(SyncOutcome::Synced)
            }
            Decision::Bootstrap | Decision::KeepLocalAndRepropagate => {
                if decode_failed && mode == SyncMode::Pull {
                    // Never clobber a body we could not read on a mere
                    // pull; a push will overwrite it deliberately.
                    return Ok(SyncOutcome::TransientError(FailureKind::Decode));
                }
                let stamp = self.clock.now_ms().max(cursor + 1);
                let body = encode(&aggregates, stamp)?;
                if let Err(e) = self.transport.store(key, body) {
                    return Ok(Self::transport_outcome(e));
                }
                self.store.set_cursor(stamp)?;
                self.stats.write().snapshots_pushed += 1;
                if decision == Decision::Bootstrap {
                    info!(id = %identifier, stamp, "bootstrapped remote from local state");
                    Ok(SyncOutcome::Synced)
                } else if mode == SyncMode::Pull {
                    info!(id = %identifier, stamp, "remote was stale, pushed local state");
                    Ok(SyncOutcome::StaleRemoteUpdated)
                } else {
                    Ok(SyncOutcome::Synced)
                }
            }
            Decision::NoChange => {
                if decode_failed {
                    Ok(SyncOutcome::TransientError(FailureKind::Decode))
                } else if remote.is_none() {
                    Ok(SyncOutcome::WaitingForFirstWrite)
                } else {
                    Ok(SyncOutcome::Synced)
                }
            }
        }
    }

    /// Replaces all local aggregates with the remote envelope under the
    /// lock, then arms the settle window.
    ///
    /// The replacement is wholesale: partial field-level adoption is
    /// disallowed, so local state is always one consistent envelope.
    fn adopt(&self, envelope: SnapshotEnvelope, guard: InFlightGuard<'_>) -> SyncResult<()> {
        *self.state.lock() = EngineState::Locked;

        let stamp = envelope.logical_timestamp;
        let result = self.store.replace_all(envelope.into_aggregates(), stamp);

        *self.locked_until.lock() = Some(Instant::now() + self.config.settle_delay);
        drop(guard);

        result?;
        self.stats.write().snapshots_adopted += 1;
        info!(stamp, "adopted remote snapshot");
        Ok(())
    }

    fn transport_outcome(e: TransportError) -> SyncOutcome {
        match e {
            TransportError::Offline => SyncOutcome::Offline,
            TransportError::Timeout => SyncOutcome::TransientError(FailureKind::Timeout),
            TransportError::Rejected { status } => {
                SyncOutcome::TransientError(FailureKind::RemoteRejected(status))
            }
        }
    }

    fn record(&self, outcome: SyncOutcome) {
        let mut stats = self.stats.write();
        stats.cycles += 1;
        stats.last_outcome = Some(outcome);
        match outcome {
            SyncOutcome::Synced
            | SyncOutcome::StaleRemoteUpdated
            | SyncOutcome::WaitingForFirstWrite => {
                stats.consecutive_failures = 0;
                stats.ever_synced = true;
                if outcome != SyncOutcome::WaitingForFirstWrite {
                    stats.last_synced_ms = Some(self.clock.now_ms());
                }
            }
            SyncOutcome::TransientError(_) | SyncOutcome::Offline => {
                stats.consecutive_failures = stats.consecutive_failures.saturating_add(1);
            }
        }
    }
}
