//! The snapshot envelope and its JSON codec.

use crate::booking::Booking;
use crate::catalog::Product;
use crate::error::{CodecError, CodecResult};
use crate::partner::PartnerConfig;
use serde::{Deserialize, Serialize};

/// Schema revision stamped into every envelope this crate writes.
pub const SCHEMA_VERSION: &str = "2";

/// The replicated business state: the unit of whole-snapshot sync.
///
/// Sync never patches individual fields. The engine reads a clone of the
/// whole value to publish it, and replaces the whole value when adopting
/// a remote snapshot.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregates {
    /// All bookings, across all dates.
    pub bookings: Vec<Booking>,
    /// The sellable product catalog.
    pub products: Vec<Product>,
    /// Venue configuration.
    #[serde(default)]
    pub partner_config: PartnerConfig,
}

impl Aggregates {
    /// Returns true if this device has recorded no business data yet.
    ///
    /// Used to decide whether a pull against a never-written identifier
    /// should bootstrap the remote or keep waiting: an empty device has
    /// nothing worth publishing.
    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty() && self.products.is_empty()
    }
}

/// The full serialized business state plus a logical timestamp, as
/// stored at the remote blob endpoint.
///
/// `logical_timestamp` is wall-clock epoch milliseconds, monotonically
/// non-decreasing across the envelopes written by a single device. It is
/// not a vector clock: two devices writing within the same millisecond
/// tie, and the conflict resolver treats that tie as already-equal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEnvelope {
    /// All bookings.
    pub bookings: Vec<Booking>,
    /// The product catalog.
    pub products: Vec<Product>,
    /// Venue configuration; defaulted for schema-1 envelopes.
    #[serde(default)]
    pub partner_config: PartnerConfig,
    /// Epoch-millisecond ordering key. Older devices wrote `timestamp`.
    #[serde(alias = "timestamp")]
    pub logical_timestamp: i64,
    /// Schema revision of the writer; defaulted for schema-1 envelopes.
    #[serde(default = "legacy_schema_version")]
    pub schema_version: String,
}

fn legacy_schema_version() -> String {
    "1".to_string()
}

impl SnapshotEnvelope {
    /// Builds an envelope from the current aggregates and a timestamp.
    pub fn new(aggregates: &Aggregates, logical_timestamp: i64) -> Self {
        Self {
            bookings: aggregates.bookings.clone(),
            products: aggregates.products.clone(),
            partner_config: aggregates.partner_config.clone(),
            logical_timestamp,
            schema_version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Consumes the envelope, yielding the aggregates it carries.
    pub fn into_aggregates(self) -> Aggregates {
        Aggregates {
            bookings: self.bookings,
            products: self.products,
            partner_config: self.partner_config,
        }
    }
}

/// Serializes the aggregates and timestamp into one envelope body.
///
/// Callers stamp the timestamp from their time source at call time;
/// a stale timestamp would let an older snapshot win a comparison it
/// should lose.
pub fn encode(aggregates: &Aggregates, logical_timestamp: i64) -> CodecResult<Vec<u8>> {
    if logical_timestamp < 0 {
        return Err(CodecError::InvalidTimestamp(logical_timestamp));
    }
    let envelope = SnapshotEnvelope::new(aggregates, logical_timestamp);
    Ok(serde_json::to_vec(&envelope)?)
}

/// Deserializes and validates an envelope body.
///
/// Empty and malformed bodies yield a [`CodecError`]; callers treat the
/// resource as logically absent rather than aborting.
pub fn decode(bytes: &[u8]) -> CodecResult<SnapshotEnvelope> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyBody);
    }
    let envelope: SnapshotEnvelope = serde_json::from_slice(bytes)?;
    if envelope.logical_timestamp < 0 {
        return Err(CodecError::InvalidTimestamp(envelope.logical_timestamp));
    }
    Ok(envelope)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::booking::Booking;
    use proptest::prelude::*;

    fn sample_aggregates() -> Aggregates {
        Aggregates {
            bookings: vec![Booking::new(1, "2026-08-30", "18:00", "An")],
            products: vec![Product::new("Aquafina", 10_000)],
            partner_config: PartnerConfig::default(),
        }
    }

    #[test]
    fn encode_then_decode_preserves_state() {
        let aggregates = sample_aggregates();
        let bytes = encode(&aggregates, 1_725_000_000_000).unwrap();
        let envelope = decode(&bytes).unwrap();
        assert_eq!(envelope.logical_timestamp, 1_725_000_000_000);
        assert_eq!(envelope.schema_version, SCHEMA_VERSION);
        assert_eq!(envelope.into_aggregates(), aggregates);
    }

    #[test]
    fn decode_rejects_empty_body() {
        assert!(matches!(decode(b""), Err(CodecError::EmptyBody)));
    }

    #[test]
    fn decode_rejects_malformed_body() {
        assert!(matches!(
            decode(b"<html>rate limited</html>"),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(decode(b"{"), Err(CodecError::Malformed(_))));
    }

    #[test]
    fn decode_rejects_negative_timestamp() {
        let body = br#"{"bookings":[],"products":[],"timestamp":-1}"#;
        assert!(matches!(
            decode(body),
            Err(CodecError::InvalidTimestamp(-1))
        ));
    }

    #[test]
    fn decode_accepts_schema_one_envelope() {
        // Schema 1 wrote only bookings, products, and `timestamp`.
        let body = br#"{"bookings":[],"products":[],"timestamp":1700000000000}"#;
        let envelope = decode(body).unwrap();
        assert_eq!(envelope.logical_timestamp, 1_700_000_000_000);
        assert_eq!(envelope.schema_version, "1");
        assert_eq!(envelope.partner_config, PartnerConfig::default());
    }

    #[test]
    fn encode_rejects_negative_timestamp() {
        let aggregates = Aggregates::default();
        assert!(matches!(
            encode(&aggregates, -7),
            Err(CodecError::InvalidTimestamp(-7))
        ));
    }

    #[test]
    fn empty_aggregates_report_empty() {
        assert!(Aggregates::default().is_empty());
        assert!(!sample_aggregates().is_empty());
    }

    proptest! {
        #[test]
        fn any_nonnegative_timestamp_survives_the_wire(ts in 0..i64::MAX) {
            let bytes = encode(&Aggregates::default(), ts).unwrap();
            prop_assert_eq!(decode(&bytes).unwrap().logical_timestamp, ts);
        }

        // Names and phone numbers are human-typed (diacritics, spaces,
        // punctuation); whatever an operator enters must come back from
        // the wire untouched.
        #[test]
        fn free_form_text_fields_survive_the_wire(
            name in "\\PC{0,24}",
            phone in "[0-9 +.()-]{0,14}",
        ) {
            let mut aggregates = Aggregates::default();
            let mut booking = Booking::new(1, "2026-08-30", "18:00", name.clone());
            booking.phone_number = phone.clone();
            aggregates.bookings.push(booking);

            let envelope = decode(&encode(&aggregates, 1).unwrap()).unwrap();
            prop_assert_eq!(&envelope.bookings[0].customer_name, &name);
            prop_assert_eq!(&envelope.bookings[0].phone_number, &phone);
        }
    }
}
