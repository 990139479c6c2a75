//! Session server orchestrator.
//!
//! The server owns the session worker, wires up the command channel and event
//! bus, and exposes a builder-based API for embedding it in a binary or test.

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use game_content::{CharacterRoster, ContentFactory};
use game_core::CharacterOracle;

use crate::api::{Result, RuntimeError, ServerHandle};
use crate::config::RuntimeConfig;
use crate::events::EventBus;
use crate::session::SessionStore;
use crate::transport::TcpGateway;
use crate::workers::{Command, SessionWorker};

/// Running session server.
///
/// [`ServerHandle`] provides a cloneable façade for connections and
/// monitoring; the server itself only keeps the worker task.
pub struct Server {
    handle: ServerHandle,
    config: RuntimeConfig,
    worker: JoinHandle<()>,
}

impl Server {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Get a cloneable handle to this server
    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Binds a TCP gateway on the configured address.
    pub async fn bind_tcp(&self) -> Result<TcpGateway> {
        TcpGateway::bind(self.config.bind_addr, self.handle()).await
    }

    /// Stops the worker after the commands already queued and waits for it.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await?;
        self.worker.await.map_err(RuntimeError::WorkerJoin)
    }
}

/// Builder for [`Server`].
pub struct ServerBuilder {
    config: RuntimeConfig,
    oracle: Option<Arc<dyn CharacterOracle>>,
    seed: Option<u64>,
}

impl ServerBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            oracle: None,
            seed: None,
        }
    }

    /// Override server configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Characters players may pick. Defaults to the roster named by
    /// [`RuntimeConfig::roster_dir`], or the bundled one.
    pub fn oracle(mut self, oracle: impl CharacterOracle + 'static) -> Self {
        self.oracle = Some(Arc::new(oracle));
        self
    }

    /// Seeds room code and token generation.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Spawns the session worker. Must be called inside a Tokio runtime.
    pub async fn build(self) -> Result<Server> {
        let oracle: Arc<dyn CharacterOracle> = match self.oracle {
            Some(oracle) => oracle,
            None => Arc::new(load_roster(&self.config)?),
        };
        let characters = oracle.ids();

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let store = SessionStore::with_rng(
            oracle,
            self.config.room_ttl,
            self.config.invite_ttl,
            rng,
        );

        let (command_tx, command_rx) = mpsc::channel::<Command>(self.config.command_buffer_size);
        let event_bus = EventBus::with_capacity(self.config.event_buffer_size);

        let worker = SessionWorker::new(
            store,
            command_rx,
            event_bus.clone(),
            self.config.sweep_interval,
        );
        let worker = tokio::spawn(worker.run());

        info!(
            ?characters,
            room_ttl_secs = self.config.room_ttl.as_secs(),
            invite_ttl_secs = self.config.invite_ttl.as_secs(),
            "session server started"
        );

        Ok(Server {
            handle: ServerHandle::new(command_tx, event_bus),
            config: self.config,
            worker,
        })
    }
}

/// Loads the roster from `config.roster_dir`, or the bundled one when unset.
pub fn load_roster(config: &RuntimeConfig) -> Result<CharacterRoster> {
    let loaded = match &config.roster_dir {
        Some(dir) => ContentFactory::new(dir).load_roster(),
        None => CharacterRoster::bundled(),
    };
    loaded.map_err(|err| RuntimeError::Roster(format!("{err:#}")))
}
