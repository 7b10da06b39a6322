//! # Quiz Client
//!
//! Client-side half of the trivia game. [`TriviaClient`] opens the local
//! store and wires the components together; each component can also be
//! built on its own (the tests do).
//!
//! ## Key Components
//!
//! - `config.rs`: client configuration and environment overrides
//! - `api.rs`: remote REST client
//! - `local_store/`: SQLite key/value store, session token, cached account
//! - `connectivity/`: offline flag and health-probe monitor
//! - `questions/`: local question cache
//! - `offline/`: progress ledger, sync reconciler, online-transition wiring
//! - `game/`: game session controller

pub mod api;
pub mod config;
pub mod connectivity;
pub mod game;
pub mod local_store;
pub mod offline;
pub mod questions;

use crate::shared::config::ConfigError;
use api::{ApiClient, ApiError};
use config::Config;
use connectivity::{ConnectivityMonitor, ConnectivityState};
use game::GameController;
use local_store::{LocalStore, SessionStore, StoreError};
use offline::{OfflineCoordinator, OfflineLedger, SyncReconciler};
use questions::QuestionCache;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

/// Errors raised while assembling the client
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Api(#[from] ApiError),

    #[error("failed to open local store: {0}")]
    Store(#[from] StoreError),
}

/// Background tasks started by [`TriviaClient::start_background`].
/// Aborted on drop.
#[derive(Debug)]
pub struct BackgroundTasks {
    monitor: JoinHandle<()>,
    coordinator: JoinHandle<()>,
}

impl Drop for BackgroundTasks {
    fn drop(&mut self) {
        self.monitor.abort();
        self.coordinator.abort();
    }
}

/// Fully wired client
#[derive(Debug, Clone)]
pub struct TriviaClient {
    pub config: Config,
    pub api: ApiClient,
    pub store: LocalStore,
    pub sessions: SessionStore,
    pub ledger: OfflineLedger,
    pub cache: Arc<QuestionCache>,
    pub connectivity: ConnectivityState,
    pub reconciler: SyncReconciler,
    pub coordinator: OfflineCoordinator,
}

impl TriviaClient {
    /// Open the configured store file and build every component
    pub async fn open(config: Config) -> Result<Self, ClientError> {
        let store = LocalStore::open(&config.storage_path()).await?;
        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: LocalStore) -> Result<Self, ClientError> {
        let api = ApiClient::new(&config)?;
        let sessions = SessionStore::new(store.clone());
        let ledger = OfflineLedger::new(store.clone());
        let cache = Arc::new(QuestionCache::load(store.clone()).await);
        let connectivity = ConnectivityState::new();
        let reconciler = SyncReconciler::new(
            api.clone(),
            ledger.clone(),
            sessions.clone(),
            connectivity.clone(),
        );
        let coordinator = OfflineCoordinator::new(
            reconciler.clone(),
            Arc::clone(&cache),
            sessions.clone(),
            api.clone(),
            config.snapshot_size(),
            config.snapshot_refresh_interval(),
        );

        info!("Trivia client ready (server {})", config.server_url());
        Ok(Self {
            config,
            api,
            store,
            sessions,
            ledger,
            cache,
            connectivity,
            reconciler,
            coordinator,
        })
    }

    /// A fresh game controller sharing this client's components
    pub fn game(&self) -> GameController {
        GameController::new(
            self.api.clone(),
            Arc::clone(&self.cache),
            self.ledger.clone(),
            self.sessions.clone(),
            self.connectivity.clone(),
        )
    }

    pub fn monitor(&self) -> ConnectivityMonitor {
        ConnectivityMonitor::new(
            self.connectivity.clone(),
            self.api.clone(),
            self.config.probe_interval(),
            self.config.probe_timeout(),
        )
    }

    /// Start health probing and online-transition handling
    pub fn start_background(&self) -> BackgroundTasks {
        let coordinator = self
            .coordinator
            .clone()
            .spawn(self.connectivity.subscribe());
        let monitor = self.monitor().spawn();
        BackgroundTasks {
            monitor,
            coordinator,
        }
    }
}
