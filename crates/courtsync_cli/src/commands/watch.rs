//! Watch command: run the scheduler in the foreground.

use super::{CliResult, Endpoint};
use courtsync_engine::Scheduler;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Runs the scheduler until the process is killed.
///
/// Prints the engine indicator whenever it changes. An initial pull runs
/// immediately so the operator sees the device converge without waiting
/// for the first timer tick.
pub fn run(endpoint: &Endpoint) -> CliResult<()> {
    let (orchestrator, store) = endpoint.open_orchestrator()?;
    let config = orchestrator.config().clone();

    println!(
        "Watching {} (pull every {:?}); stop with Ctrl-C.",
        config.resource_url(store.identifier().as_deref().unwrap_or("<no identifier>")),
        config.pull_interval
    );

    match orchestrator.pull() {
        Ok(outcome) => info!(?outcome, "initial pull"),
        Err(e) => {
            println!("Cannot start watching: {e}");
            return Ok(());
        }
    }

    let scheduler = Scheduler::start(Arc::clone(&orchestrator));
    store.subscribe(scheduler.mutation_observer());

    let mut last = orchestrator.indicator();
    println!("Indicator: {last:?}");
    loop {
        std::thread::sleep(Duration::from_secs(1));
        let indicator = orchestrator.indicator();
        if indicator != last {
            println!("Indicator: {indicator:?}");
            last = indicator;
        }
    }
}
