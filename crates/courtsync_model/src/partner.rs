//! Venue configuration aggregate.

use serde::{Deserialize, Serialize};

/// A bookable court.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Court {
    /// Court number, 1-based.
    pub id: u32,
    /// Display name.
    pub name: String,
}

/// Per-venue configuration replicated alongside the business data.
///
/// Replicating the config means a price change on one device reaches the
/// others with the next snapshot, the same way bookings do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerConfig {
    /// Venue display name.
    pub venue_name: String,
    /// Courts available for booking.
    pub courts: Vec<Court>,
    /// Court rate per hour in integer currency units.
    pub price_per_hour: i64,
    /// First bookable hour (24h).
    pub open_hour: u8,
    /// Last bookable hour (24h, exclusive).
    pub close_hour: u8,
}

impl Default for PartnerConfig {
    fn default() -> Self {
        Self {
            venue_name: "Badminton Pro".into(),
            courts: vec![
                Court {
                    id: 1,
                    name: "Court 1 (VIP)".into(),
                },
                Court {
                    id: 2,
                    name: "Court 2 (Standard)".into(),
                },
            ],
            price_per_hour: 60_000,
            open_hour: 6,
            close_hour: 22,
        }
    }
}
