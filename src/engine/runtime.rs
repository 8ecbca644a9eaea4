// src/engine/runtime.rs

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::api::build_router;
use crate::config::ConfigFile;
use crate::dag::TaskGraphStore;
use crate::errors::Result;

use super::sweep::spawn_readiness_sweep;
use super::{ShutdownReceiver, wait_for_shutdown};

/// Serves the HTTP API over a shared store and runs the readiness sweep.
pub struct Orchestrator {
    store: Arc<TaskGraphStore>,
    readiness_interval: Duration,
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("readiness_interval", &self.readiness_interval)
            .finish_non_exhaustive()
    }
}

impl Orchestrator {
    pub fn new(store: Arc<TaskGraphStore>, readiness_interval: Duration) -> Self {
        Self {
            store,
            readiness_interval,
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(
            Arc::new(TaskGraphStore::from_config(cfg)),
            cfg.readiness_interval(),
        )
    }

    pub fn store(&self) -> Arc<TaskGraphStore> {
        Arc::clone(&self.store)
    }

    pub fn router(&self) -> Router {
        build_router(self.store())
    }

    /// Serve on `listener` until `shutdown` fires, then drain in-flight
    /// requests and stop the sweep.
    pub async fn serve(self, listener: TcpListener, shutdown: ShutdownReceiver) -> Result<()> {
        let addr = listener.local_addr().context("reading listener address")?;
        let sweep = spawn_readiness_sweep(self.store(), self.readiness_interval, shutdown.clone());

        info!(%addr, "orchestrator listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(wait_for_shutdown(shutdown))
            .await
            .context("HTTP server failed")?;

        sweep.await.context("joining readiness sweep")?;
        info!("orchestrator stopped");
        Ok(())
    }
}
