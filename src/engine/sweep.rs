// src/engine/sweep.rs

//! Periodic readiness sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::dag::TaskGraphStore;
use crate::engine::{ShutdownReceiver, wait_for_shutdown};

/// Spawn the background sweep that calls [`TaskGraphStore::sweep`] every
/// `interval` until shutdown.
pub fn spawn_readiness_sweep(
    store: Arc<TaskGraphStore>,
    interval: Duration,
    shutdown: ShutdownReceiver,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let stopped = wait_for_shutdown(shutdown);
        tokio::pin!(stopped);

        info!(interval_ms = interval.as_millis() as u64, "readiness sweep started");
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let newly_ready = store.sweep();
                    if newly_ready > 0 {
                        debug!(newly_ready, "sweep tick");
                    }
                }
                () = &mut stopped => break,
            }
        }
        info!("readiness sweep stopped");
    })
}
