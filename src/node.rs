//! Node orchestration: config → persistence → ledger → API server.

use crate::config::Config;
use crate::error::{ChainError, Result};
use crate::ledger::Ledger;
use crate::persistence::{Database, InMemoryPersistence, Persistence};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Ready,
    /// Serving, but without durable storage.
    Degraded,
}

pub struct Node {
    pub config: Config,
    pub ledger: Arc<Ledger>,
    pub state: Arc<RwLock<NodeState>>,
    // true when the configured database could not be opened
    degraded: bool,
}

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    let db_path = Path::new(&config.database.path);
    if !config.database.is_in_memory() {
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ChainError::Io(format!("Failed to create data dir {:?}: {}", parent, e))
                })?;
            }
        }
    }
    Database::open(&config.database.path)
}

impl Node {
    pub fn init(config: Config) -> Result<Self> {
        config.validate()?;

        // Setup persistence
        let (persistence, degraded): (Box<dyn Persistence>, bool) =
            if config.database.is_in_memory() {
                info!(
                    "database.path is {}; running without durable storage",
                    config.database.path
                );
                (Box::new(InMemoryPersistence::new()), false)
            } else {
                match open_database(&config) {
                    Ok(db) => (Box::new(db), false),
                    Err(e) => {
                        warn!(
                            "Failed to open DB at {}: {}. Falling back to in-memory persistence.",
                            config.database.path, e
                        );
                        (Box::new(InMemoryPersistence::new()), true)
                    }
                }
            };

        // A database that opens but holds a broken history is an error, not
        // a reason to start over.
        let ledger = Ledger::open(&config.ledger.genesis_data, persistence)?;
        info!(blocks = ledger.len(), "ledger ready");

        Ok(Self {
            config,
            ledger: Arc::new(ledger),
            state: Arc::new(RwLock::new(NodeState::Booting)),
            degraded,
        })
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    async fn mark_serving(&self) {
        let mut s = self.state.write().await;
        *s = if self.degraded {
            NodeState::Degraded
        } else {
            NodeState::Ready
        };
    }

    /// Binds the configured address and serves until Ctrl-C.
    #[cfg(feature = "api")]
    pub async fn start(self: Arc<Self>) -> Result<()> {
        let bind = self.config.bind_address();
        let listener = tokio::net::TcpListener::bind(&bind)
            .await
            .map_err(|e| ChainError::Io(format!("API address {} unavailable: {}", bind, e)))?;

        self.serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            info!("shutdown requested");
        })
        .await
    }

    /// Serves the API on `listener` until `shutdown` resolves.
    #[cfg(feature = "api")]
    pub async fn serve<F>(
        self: Arc<Self>,
        listener: tokio::net::TcpListener,
        shutdown: F,
    ) -> Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let api_node = Arc::new(crate::api::Node::new_shared(
            self.ledger.clone(),
            Some(self.state.clone()),
        ));

        self.mark_serving().await;
        crate::api::run_api_server(api_node, listener, shutdown).await?;
        Ok(())
    }

    #[cfg(not(feature = "api"))]
    pub async fn start(self: Arc<Self>) -> Result<()> {
        Err(ChainError::Config(
            "API feature not enabled in this build".to_string(),
        ))
    }
}
