//! Status command implementation.

use super::{CliResult, Endpoint};
use serde::Serialize;

/// Local sync status, read from the persisted state only.
///
/// No network traffic happens here: the cursor already records the
/// logical timestamp of the last snapshot this device authored or
/// adopted, which is all a one-shot status can truthfully report.
#[derive(Debug, Serialize)]
pub struct StatusResult {
    /// Configured sync identifier, if any.
    pub identifier: Option<String>,
    /// Logical timestamp of the last authored or adopted snapshot.
    pub cursor: i64,
    /// Number of bookings held locally.
    pub bookings: usize,
    /// Number of catalog products held locally.
    pub products: usize,
    /// Venue display name from the replicated configuration.
    pub venue: String,
    /// Coarse indicator derived from the persisted state.
    pub indicator: &'static str,
}

/// Runs the status command.
pub fn run(endpoint: &Endpoint, format: &str) -> CliResult<()> {
    let store = endpoint.open_store()?;
    let aggregates = store.read();

    let identifier = store.identifier();
    let cursor = store.cursor();
    let indicator = if identifier.is_none() {
        "sync-disabled"
    } else if cursor == 0 {
        "never-synced"
    } else {
        "synced"
    };

    let result = StatusResult {
        identifier,
        cursor,
        bookings: aggregates.bookings.len(),
        products: aggregates.products.len(),
        venue: aggregates.partner_config.venue_name,
        indicator,
    };

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => {
            match &result.identifier {
                Some(id) => println!("Sync identifier: {id}"),
                None => println!("Sync identifier: (not set)"),
            }
            println!("Indicator:       {}", result.indicator);
            if result.cursor > 0 {
                println!("Last snapshot:   {} (epoch ms)", result.cursor);
            } else {
                println!("Last snapshot:   never");
            }
            println!("Venue:           {}", result.venue);
            println!("Bookings:        {}", result.bookings);
            println!("Products:        {}", result.products);
        }
    }
    Ok(())
}
