//! # CourtSync Model
//!
//! Business aggregates and the snapshot envelope for CourtSync.
//!
//! This crate defines:
//! - The three replicated aggregates: bookings, product catalog, and
//!   venue configuration
//! - [`Aggregates`], the unit of whole-snapshot replication
//! - [`SnapshotEnvelope`], the wire representation stored at the remote
//!   blob endpoint (aggregates plus a logical timestamp)
//! - The JSON snapshot codec ([`encode`]/[`decode`])
//!
//! ## Wire format
//!
//! Envelopes are JSON with camelCase field names, the format the devices
//! in the field already exchange. Decoding tolerates bodies written by
//! older schema revisions (missing `partnerConfig`, the legacy
//! `timestamp` field name) but rejects empty or malformed bodies with a
//! [`CodecError`] rather than a panic.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod booking;
mod catalog;
mod envelope;
mod error;
mod partner;

pub use booking::{Booking, BookingStatus, SaleItem};
pub use catalog::Product;
pub use envelope::{decode, encode, Aggregates, SnapshotEnvelope, SCHEMA_VERSION};
pub use error::{CodecError, CodecResult};
pub use partner::{Court, PartnerConfig};
