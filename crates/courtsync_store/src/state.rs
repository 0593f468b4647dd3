//! The local state store: aggregates, sync cursor, sync identifier.

use crate::backend::{DurableStore, StoreResult};
use courtsync_model::Aggregates;
use parking_lot::RwLock;
use tracing::warn;

const KEY_AGGREGATES: &str = "aggregates";
const KEY_CURSOR: &str = "sync.cursor";
const KEY_IDENTIFIER: &str = "sync.id";

/// Callback invoked after a business-side mutation.
pub type MutationObserver = Box<dyn Fn() + Send + Sync>;

struct Inner {
    aggregates: Aggregates,
    cursor: i64,
    identifier: Option<String>,
}

/// The in-process authoritative copy of the business state.
///
/// Holds the three replicated aggregates plus the persisted sync cursor
/// (the logical timestamp of the last adopted or authored snapshot) and
/// the persisted sync identifier (the key naming this device's
/// replication group). All of it survives restarts through the backing
/// [`DurableStore`].
///
/// Two mutation paths exist, and they never mix:
/// - [`StateStore::mutate`] - incremental business edits; notifies
///   mutation observers so the scheduler can arm a push debounce
/// - [`StateStore::replace_all`] - wholesale replacement by the sync
///   engine when adopting a remote snapshot; silent to observers
pub struct StateStore<S: DurableStore> {
    backend: S,
    inner: RwLock<Inner>,
    observers: RwLock<Vec<MutationObserver>>,
}

impl<S: DurableStore> StateStore<S> {
    /// Opens the state store, loading any persisted state.
    ///
    /// A missing or unreadable persisted snapshot starts the device empty
    /// rather than failing: local-only operation is a supported state.
    ///
    /// # Errors
    ///
    /// Returns an error only if the backend itself cannot be read.
    pub fn open(backend: S) -> StoreResult<Self> {
        let aggregates = match backend.get(KEY_AGGREGATES)? {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(aggregates) => aggregates,
                Err(e) => {
                    warn!("discarding unreadable persisted aggregates: {e}");
                    Aggregates::default()
                }
            },
            None => Aggregates::default(),
        };

        let cursor = match backend.get(KEY_CURSOR)? {
            Some(bytes) => String::from_utf8_lossy(&bytes)
                .trim()
                .parse::<i64>()
                .unwrap_or_else(|_| {
                    warn!("discarding unreadable persisted cursor");
                    0
                }),
            None => 0,
        };

        let identifier = backend
            .get(KEY_IDENTIFIER)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
            .filter(|id| !id.is_empty());

        Ok(Self {
            backend,
            inner: RwLock::new(Inner {
                aggregates,
                cursor,
                identifier,
            }),
            observers: RwLock::new(Vec::new()),
        })
    }

    /// Returns a snapshot of the current aggregates.
    pub fn read(&self) -> Aggregates {
        self.inner.read().aggregates.clone()
    }

    /// Returns the current sync cursor.
    pub fn cursor(&self) -> i64 {
        self.inner.read().cursor
    }

    /// Returns the configured sync identifier, if any.
    pub fn identifier(&self) -> Option<String> {
        self.inner.read().identifier.clone()
    }

    /// Registers a callback fired after every business-side mutation.
    pub fn subscribe(&self, observer: MutationObserver) {
        self.observers.write().push(observer);
    }

    /// Applies an incremental business mutation and persists the result.
    ///
    /// Mutation observers are notified after the write lock is released.
    ///
    /// # Errors
    ///
    /// Returns an error if the mutated aggregates cannot be persisted;
    /// the in-memory state keeps the mutation either way.
    pub fn mutate<F>(&self, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut Aggregates),
    {
        {
            let mut inner = self.inner.write();
            f(&mut inner.aggregates);
            self.persist_aggregates(&inner.aggregates)?;
        }
        self.notify_observers();
        Ok(())
    }

    /// Replaces all aggregates and the cursor in one step.
    ///
    /// This is the sync engine's adoption path: the whole snapshot and
    /// its timestamp land together, and mutation observers stay silent so
    /// the adoption cannot re-trigger a push of the data just received.
    ///
    /// # Errors
    ///
    /// Returns an error if persistence fails. The in-memory replacement
    /// still happens as a unit.
    pub fn replace_all(&self, aggregates: Aggregates, cursor: i64) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.aggregates = aggregates;
        inner.cursor = cursor;
        self.persist_aggregates(&inner.aggregates)?;
        self.backend.set(KEY_CURSOR, cursor.to_string().as_bytes())?;
        Ok(())
    }

    /// Advances the cursor after a successful push.
    ///
    /// # Errors
    ///
    /// Returns an error if the cursor cannot be persisted.
    pub fn set_cursor(&self, cursor: i64) -> StoreResult<()> {
        let mut inner = self.inner.write();
        inner.cursor = cursor;
        self.backend.set(KEY_CURSOR, cursor.to_string().as_bytes())?;
        Ok(())
    }

    /// Sets or clears the sync identifier.
    ///
    /// Mutation observers are not notified: the identifier is engine
    /// plumbing, not business data. A running scheduler keeps whatever
    /// pull deadline and pending debounce it had, so the caller must
    /// reset it after this (the engine scheduler's `reset`), or work
    /// scheduled for the old identifier fires against the new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier cannot be persisted.
    pub fn set_identifier(&self, identifier: Option<String>) -> StoreResult<()> {
        let mut inner = self.inner.write();
        match &identifier {
            Some(id) => self.backend.set(KEY_IDENTIFIER, id.as_bytes())?,
            None => self.backend.remove(KEY_IDENTIFIER)?,
        }
        inner.identifier = identifier;
        Ok(())
    }

    fn persist_aggregates(&self, aggregates: &Aggregates) -> StoreResult<()> {
        let bytes = serde_json::to_vec(aggregates)?;
        self.backend.set(KEY_AGGREGATES, &bytes)
    }

    fn notify_observers(&self) {
        for observer in self.observers.read().iter() {
            observer();
        }
    }
}
