//! The product catalog aggregate.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sellable inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Sale price in integer currency units.
    pub price: i64,
    /// Purchase cost, used for margin reporting.
    #[serde(default)]
    pub cost_price: i64,
}

impl Product {
    /// Creates a new product with a fresh id.
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            price,
            cost_price: 0,
        }
    }
}
