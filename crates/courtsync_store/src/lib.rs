//! # CourtSync Store
//!
//! Local durable storage for CourtSync.
//!
//! This crate provides:
//! - [`DurableStore`], the synchronous key-value trait the sync engine
//!   persists through
//! - [`MemoryStore`] for tests and ephemeral use
//! - [`FileStore`] for on-disk persistence across process restarts
//! - [`StateStore`], the in-process authoritative copy of the business
//!   aggregates plus the persisted sync cursor and sync identifier
//!
//! ## Ownership rules
//!
//! The [`StateStore`] is the only mutable shared resource in the system.
//! Business logic mutates it incrementally through [`StateStore::mutate`];
//! sync code replaces it wholesale through [`StateStore::replace_all`] and
//! never patches individual fields. Mutation observers fire for business
//! mutations only, so adopting a remote snapshot cannot masquerade as a
//! local edit.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod file;
mod memory;
mod state;

pub use backend::{DurableStore, StoreError, StoreResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use state::{MutationObserver, StateStore};
