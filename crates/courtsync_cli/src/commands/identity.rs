//! Set-id and clear-id command implementations.

use super::{CliResult, Endpoint};
use courtsync_engine::SyncIdentifier;

/// Normalizes, validates, and persists the sync identifier.
pub fn set(endpoint: &Endpoint, raw: &str) -> CliResult<()> {
    let identifier = SyncIdentifier::parse(raw)?;
    let store = endpoint.open_store()?;
    store.set_identifier(Some(identifier.as_str().to_string()))?;

    if identifier.as_str() != raw {
        println!("Normalized '{raw}' to '{identifier}'");
    }
    println!("Sync identifier set to '{identifier}'");
    println!("Every device using this identifier converges on the same data.");
    Ok(())
}

/// Removes the persisted sync identifier.
pub fn clear(endpoint: &Endpoint) -> CliResult<()> {
    let store = endpoint.open_store()?;
    store.set_identifier(None)?;
    println!("Sync identifier cleared; this device no longer syncs.");
    Ok(())
}
