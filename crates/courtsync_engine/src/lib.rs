//! The CourtSync synchronization engine.
//!
//! Keeps several devices converged on one shared snapshot through a dumb
//! remote key-value blob endpoint. The remote stores exactly one opaque
//! body per sync identifier and offers no conditional writes, so
//! convergence is whole-snapshot last-write-wins: the envelope with the
//! greatest logical timestamp replaces everything else.
//!
//! The moving parts:
//!
//! - [`resolver`] - the pure decision function between local cursor and
//!   remote envelope
//! - [`Orchestrator`] - the state machine running pull, push, and
//!   force-pull, one operation at a time
//! - [`Scheduler`] - the pull timer and the post-mutation push debounce,
//!   with feedback-loop suppression around snapshot adoption
//! - [`BlobTransport`] - the remote endpoint seam, with an HTTP
//!   implementation and an in-memory one for tests

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod http;
pub mod identifier;
pub mod orchestrator;
pub mod resolver;
pub mod scheduler;
pub mod transport;

pub use clock::{ManualClock, SystemClock, TimeSource};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use http::{HttpBlobTransport, HttpClient, HttpError, HttpResponse, ReqwestClient};
pub use identifier::{normalize, SyncIdentifier, MIN_IDENTIFIER_LEN};
pub use orchestrator::{
    EngineState, FailureKind, Indicator, Orchestrator, SyncOutcome, SyncStats,
};
pub use resolver::{resolve, Decision, SyncMode};
pub use scheduler::Scheduler;
pub use transport::{BlobTransport, FetchOutcome, MemoryRemote, TransportError};
