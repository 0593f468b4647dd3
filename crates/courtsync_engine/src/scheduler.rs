//! Scheduled sync triggers: the pull timer and the push debounce.

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::orchestrator::{Orchestrator, SyncOutcome};
use crate::transport::BlobTransport;
use courtsync_store::{DurableStore, MutationObserver};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;
use tracing::{debug, warn};

#[derive(Debug)]
struct SchedState {
    push_due: Option<Instant>,
    next_pull: Instant,
    backoff_factor: u32,
    shutdown: bool,
}

struct Shared {
    state: Mutex<SchedState>,
    wakeup: Condvar,
}

enum Action {
    Pull,
    Push,
}

/// Drives the orchestrator on two independent triggers.
///
/// - A recurring pull timer, lengthened (up to a bound) while pulls keep
///   failing transiently and reset on the next success.
/// - A debounced push: every local mutation arms a short delay, repeated
///   mutations collapse into a single push, and the debounce is skipped
///   entirely while the orchestrator is locked adopting a remote
///   snapshot - otherwise the adoption would look like a mutation and be
///   pushed straight back.
///
/// Both triggers route through the one orchestrator, whose guard keeps
/// operations from overlapping. One worker thread runs the loop; the
/// scheduler shuts it down on drop.
pub struct Scheduler<T: BlobTransport + 'static, S: DurableStore + 'static> {
    orchestrator: Arc<Orchestrator<T, S>>,
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl<T: BlobTransport + 'static, S: DurableStore + 'static> Scheduler<T, S> {
    /// Starts the worker thread.
    ///
    /// All timing comes from the orchestrator's [`SyncConfig`]; the
    /// scheduler holds no timing knobs of its own, so the worker loop,
    /// `reset`, and the debounce helpers can never disagree on an
    /// interval.
    pub fn start(orchestrator: Arc<Orchestrator<T, S>>) -> Self {
        let config = orchestrator.config().clone();
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedState {
                push_due: None,
                next_pull: Instant::now() + config.pull_interval,
                backoff_factor: 1,
                shutdown: false,
            }),
            wakeup: Condvar::new(),
        });

        let worker = {
            let orchestrator = Arc::clone(&orchestrator);
            let shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name("courtsync-scheduler".into())
                .spawn(move || run_loop(&orchestrator, &shared, &config));
            match spawned {
                Ok(handle) => Some(handle),
                Err(e) => {
                    warn!("scheduler worker did not start: {e}");
                    None
                }
            }
        };

        Self {
            orchestrator,
            shared,
            worker,
        }
    }

    /// Reports a local business mutation, arming (or extending) the push
    /// debounce.
    ///
    /// Ignored while the orchestrator is adopting a remote snapshot: a
    /// mutation observed inside that window is the adoption itself.
    pub fn notify_mutation(&self) {
        if self.orchestrator.is_locked() {
            debug!("mutation during adoption settle window, not arming push");
            return;
        }
        let mut state = self.shared.state.lock();
        state.push_due = Some(Instant::now() + self.config_debounce());
        self.shared.wakeup.notify_one();
    }

    /// A boxed observer suitable for [`courtsync_store::StateStore::subscribe`].
    pub fn mutation_observer(&self) -> MutationObserver {
        let orchestrator = Arc::clone(&self.orchestrator);
        let shared = Arc::clone(&self.shared);
        let debounce = self.config_debounce();
        Box::new(move || {
            if orchestrator.is_locked() {
                debug!("mutation during adoption settle window, not arming push");
                return;
            }
            let mut state = shared.state.lock();
            state.push_due = Some(Instant::now() + debounce);
            shared.wakeup.notify_one();
        })
    }

    /// Runs any pending debounced push immediately.
    ///
    /// Used on shutdown so a mutation made moments earlier is not lost
    /// with the pending debounce.
    pub fn flush(&self) -> Option<SyncOutcome> {
        let armed = {
            let mut state = self.shared.state.lock();
            state.push_due.take().is_some()
        };
        if !armed {
            return None;
        }
        match self.orchestrator.push() {
            Ok(outcome) => Some(outcome),
            Err(SyncError::Busy) => None,
            Err(e) => {
                warn!("flush push failed: {e}");
                None
            }
        }
    }

    /// Cancels any pending debounce and resets the pull timer and
    /// backoff.
    ///
    /// Must be called whenever the sync identifier changes or is
    /// cleared, so nothing scheduled for the old identifier fires
    /// against the new one. The scheduler does not observe identifier
    /// changes itself: the code calling `StateStore::set_identifier`
    /// owns calling this.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock();
        state.push_due = None;
        state.backoff_factor = 1;
        state.next_pull = Instant::now() + self.orchestrator_pull_interval();
        self.shared.wakeup.notify_one();
    }

    /// The current pull-interval backoff factor.
    pub fn backoff_factor(&self) -> u32 {
        self.shared.state.lock().backoff_factor
    }

    /// Stops and joins the worker thread.
    pub fn shutdown(&mut self) {
        {
            let mut state = self.shared.state.lock();
            state.shutdown = true;
            self.shared.wakeup.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    fn config_debounce(&self) -> std::time::Duration {
        self.orchestrator_config().push_debounce
    }

    fn orchestrator_pull_interval(&self) -> std::time::Duration {
        self.orchestrator_config().pull_interval
    }

    fn orchestrator_config(&self) -> &SyncConfig {
        self.orchestrator.config()
    }
}

impl<T: BlobTransport + 'static, S: DurableStore + 'static> Drop for Scheduler<T, S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_loop<T: BlobTransport, S: DurableStore>(
    orchestrator: &Orchestrator<T, S>,
    shared: &Shared,
    config: &SyncConfig,
) {
    loop {
        let action = {
            let mut state = shared.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                let now = Instant::now();
                if state.push_due.is_some_and(|due| now >= due) {
                    state.push_due = None;
                    break Action::Push;
                }
                if now >= state.next_pull {
                    break Action::Pull;
                }
                let deadline = match state.push_due {
                    Some(due) if due < state.next_pull => due,
                    _ => state.next_pull,
                };
                shared.wakeup.wait_until(&mut state, deadline);
            }
        };

        match action {
            Action::Push => match orchestrator.push() {
                Ok(outcome) => debug!(?outcome, "debounced push completed"),
                Err(SyncError::Busy) => debug!("debounced push skipped, engine busy"),
                Err(e) => debug!("debounced push skipped: {e}"),
            },
            Action::Pull => {
                let transient = match orchestrator.pull() {
                    Ok(outcome) => {
                        debug!(?outcome, "scheduled pull finished");
                        outcome.is_transient()
                    }
                    Err(SyncError::Busy) => false,
                    Err(e) => {
                        debug!("scheduled pull skipped: {e}");
                        e.is_transient()
                    }
                };

                let mut state = shared.state.lock();
                if transient {
                    state.backoff_factor =
                        (state.backoff_factor.saturating_mul(2)).min(config.max_backoff_factor);
                } else {
                    state.backoff_factor = 1;
                }
                state.next_pull =
                    Instant::now() + config.pull_interval * state.backoff_factor;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, TimeSource};
    use crate::transport::MemoryRemote;
    use courtsync_model::{encode, Aggregates, Booking};
    use courtsync_store::{MemoryStore, StateStore};
    use std::time::Duration;

    fn engine(
        remote: &MemoryRemote,
        config: SyncConfig,
    ) -> (Arc<Orchestrator<MemoryRemote, MemoryStore>>, Arc<StateStore<MemoryStore>>) {
        let store = Arc::new(StateStore::open(MemoryStore::new()).unwrap());
        store.set_identifier(Some("club1".into())).unwrap();
        let orchestrator = Arc::new(Orchestrator::new(
            config,
            Arc::new(remote.clone()),
            Arc::clone(&store),
            Arc::new(ManualClock::new(5000)) as Arc<dyn TimeSource>,
        ));
        (orchestrator, store)
    }

    fn quiet_config() -> SyncConfig {
        // Pull timer far away so debounce behavior is isolated.
        SyncConfig::new("https://kvdb.io", "bucket1")
            .with_pull_interval(Duration::from_secs(3600))
            .with_push_debounce(Duration::from_millis(30))
            .with_settle_delay(Duration::ZERO)
    }

    fn add_booking(store: &StateStore<MemoryStore>, name: &str) {
        store
            .mutate(|aggregates| {
                aggregates
                    .bookings
                    .push(Booking::new(1, "2026-08-30", "18:00", name));
            })
            .unwrap();
    }

    #[test]
    fn burst_of_mutations_collapses_into_one_push() {
        let remote = MemoryRemote::new();
        let (orchestrator, store) = engine(&remote, quiet_config());
        let scheduler = Scheduler::start(orchestrator);
        store.subscribe(scheduler.mutation_observer());

        add_booking(&store, "An");
        add_booking(&store, "Binh");
        add_booking(&store, "Chi");

        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(remote.store_count(), 1);
        assert_eq!(store.cursor(), 5000);
    }

    #[test]
    fn adoption_does_not_rearm_a_push() {
        let remote = MemoryRemote::new();
        remote.seed("club1", encode(&Aggregates::default(), 9000).unwrap());

        let config = quiet_config().with_settle_delay(Duration::from_secs(60));
        let (orchestrator, store) = engine(&remote, config);
        let scheduler = Scheduler::start(Arc::clone(&orchestrator));
        store.subscribe(scheduler.mutation_observer());

        // Adoption replaces the aggregates silently; simulate the worst
        // case where something still pokes the observer mid-settle.
        orchestrator.pull().unwrap();
        scheduler.notify_mutation();

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(remote.store_count(), 0);
    }

    #[test]
    fn reset_cancels_a_pending_push() {
        let remote = MemoryRemote::new();
        let (orchestrator, store) = engine(&remote, quiet_config());
        let scheduler = Scheduler::start(orchestrator);
        store.subscribe(scheduler.mutation_observer());

        add_booking(&store, "An");
        scheduler.reset();

        std::thread::sleep(Duration::from_millis(200));
        assert_eq!(remote.store_count(), 0);
    }

    #[test]
    fn scheduled_pull_adopts_remote() {
        let remote = MemoryRemote::new();
        remote.seed("club1", encode(&Aggregates::default(), 9000).unwrap());

        let config = quiet_config().with_pull_interval(Duration::from_millis(30));
        let (orchestrator, store) = engine(&remote, config);
        let _scheduler = Scheduler::start(orchestrator);

        std::thread::sleep(Duration::from_millis(300));
        assert_eq!(store.cursor(), 9000);
    }

    #[test]
    fn repeated_transient_failures_lengthen_the_interval() {
        let remote = MemoryRemote::new();
        remote.set_offline(true);

        let config = quiet_config()
            .with_pull_interval(Duration::from_millis(20))
            .with_max_backoff_factor(4);
        let (orchestrator, _store) = engine(&remote, config);
        let scheduler = Scheduler::start(orchestrator);

        std::thread::sleep(Duration::from_millis(300));
        assert!(scheduler.backoff_factor() >= 2);
        assert!(scheduler.backoff_factor() <= 4);
    }

    #[test]
    fn reset_rearms_pull_on_the_engine_interval() {
        let remote = MemoryRemote::new();
        remote.seed("club1", encode(&Aggregates::default(), 9000).unwrap());

        let config = quiet_config().with_pull_interval(Duration::from_millis(40));
        let (orchestrator, store) = engine(&remote, config);
        let scheduler = Scheduler::start(orchestrator);

        // After a reset the timer runs on the engine's configured
        // interval; the scheduler has no separate notion of it.
        scheduler.reset();
        std::thread::sleep(Duration::from_millis(300));
        assert!(remote.fetch_count() >= 1);
        assert_eq!(store.cursor(), 9000);
    }

    #[test]
    fn flush_runs_a_pending_push_immediately() {
        let remote = MemoryRemote::new();
        let config = quiet_config().with_push_debounce(Duration::from_secs(3600));
        let (orchestrator, store) = engine(&remote, config);
        let scheduler = Scheduler::start(orchestrator);
        store.subscribe(scheduler.mutation_observer());

        add_booking(&store, "An");
        assert_eq!(remote.store_count(), 0);

        let outcome = scheduler.flush();
        assert_eq!(outcome, Some(SyncOutcome::Synced));
        assert_eq!(remote.store_count(), 1);

        // Nothing pending anymore.
        assert_eq!(scheduler.flush(), None);
    }
}
