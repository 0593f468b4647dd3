//! CLI command implementations.

pub mod identity;
pub mod status;
pub mod sync;
pub mod watch;

use courtsync_engine::{
    HttpBlobTransport, Orchestrator, ReqwestClient, SyncConfig, SystemClock, TimeSource,
};
use courtsync_store::{FileStore, StateStore};
use std::path::PathBuf;
use std::sync::Arc;

/// Shorthand for command results.
pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// The orchestrator type every command wires up.
pub type CliOrchestrator = Orchestrator<HttpBlobTransport<ReqwestClient>, FileStore>;

/// Remote endpoint and local data directory shared by all commands.
pub struct Endpoint {
    /// Local data directory backing the [`FileStore`].
    pub data_dir: PathBuf,
    /// Base URL of the remote blob endpoint.
    pub base_url: String,
    /// Bucket path segment under the base URL.
    pub bucket: String,
}

impl Endpoint {
    fn config(&self) -> SyncConfig {
        SyncConfig::new(&self.base_url, &self.bucket)
    }

    fn open_store(&self) -> CliResult<Arc<StateStore<FileStore>>> {
        let backend = FileStore::open(&self.data_dir)?;
        Ok(Arc::new(StateStore::open(backend)?))
    }

    fn open_orchestrator(
        &self,
    ) -> CliResult<(Arc<CliOrchestrator>, Arc<StateStore<FileStore>>)> {
        let store = self.open_store()?;
        let config = self.config();
        let clock: Arc<dyn TimeSource> = Arc::new(SystemClock);
        let client = ReqwestClient::new(&config)?;
        let transport = Arc::new(HttpBlobTransport::new(
            config.clone(),
            client,
            Arc::clone(&clock),
        ));
        let orchestrator = Arc::new(Orchestrator::new(
            config,
            transport,
            Arc::clone(&store),
            clock,
        ));
        Ok((orchestrator, store))
    }
}
