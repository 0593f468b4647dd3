//! The booking aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Court time is reserved or in progress.
    Active,
    /// The booking has been checked out and settled.
    Paid,
}

/// A product sold against a booking (drinks, shuttles, ...).
///
/// The sale price and cost price are captured at the time of sale so
/// later catalog edits do not rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItem {
    /// Catalog id of the product sold.
    pub product_id: String,
    /// Product name at the time of sale.
    pub product_name: String,
    /// Units sold.
    pub quantity: u32,
    /// Unit sale price in integer currency units.
    pub price: i64,
    /// Unit cost price at the time of sale.
    #[serde(default)]
    pub cost_price: i64,
}

/// One court reservation slot.
///
/// Multi-slot and multi-court reservations are stored as one `Booking`
/// per (court, slot) pair sharing a `group_id`. Amounts are integer
/// currency units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Unique booking id.
    pub id: String,
    /// Court the slot belongs to; 0 marks a shop-only sale with no court.
    pub court_id: u32,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: String,
    /// Slot start time, `HH:MM`.
    pub time_slot: String,
    /// Wall-clock start for walk-in play, RFC 3339.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_start_time: Option<String>,
    /// True for walk-in sessions billed by elapsed time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_live: Option<bool>,
    /// Customer display name.
    pub customer_name: String,
    /// Customer phone number (free-form).
    pub phone_number: String,
    /// Total charge for the reservation.
    pub total_amount: i64,
    /// Deposit taken up front.
    pub deposit: i64,
    /// Amount still owed.
    pub remaining_amount: i64,
    /// Shared id linking the slots of one reservation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Products sold against this booking.
    #[serde(default)]
    pub service_items: Vec<SaleItem>,
    /// Payment state.
    pub status: BookingStatus,
    /// Number of 30-minute slots reserved.
    pub duration_slots: u32,
}

impl Booking {
    /// Creates a new active booking with a fresh id.
    pub fn new(
        court_id: u32,
        date: impl Into<String>,
        time_slot: impl Into<String>,
        customer_name: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            court_id,
            date: date.into(),
            time_slot: time_slot.into(),
            actual_start_time: None,
            is_live: None,
            customer_name: customer_name.into(),
            phone_number: String::new(),
            total_amount: 0,
            deposit: 0,
            remaining_amount: 0,
            group_id: None,
            service_items: Vec::new(),
            status: BookingStatus::Active,
            duration_slots: 1,
        }
    }

    /// The id this booking is grouped under (its own id when ungrouped).
    pub fn group_key(&self) -> &str {
        self.group_id.as_deref().unwrap_or(&self.id)
    }

    /// Returns true if this booking is part of a multi-slot reservation.
    pub fn is_group_member(&self) -> bool {
        self.group_id.is_some()
    }
}
