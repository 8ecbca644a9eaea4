// src/engine/mod.rs

//! Orchestrator runtime.
//!
//! This module ties together:
//! - the shared [`TaskGraphStore`](crate::dag::TaskGraphStore)
//! - the HTTP router from [`crate::api`]
//! - the periodic readiness sweep ([`sweep`])
//! - graceful shutdown, signalled through a `watch` channel
//!
//! The server lifecycle lives in [`runtime`].

use tokio::sync::watch;

pub mod runtime;
pub mod sweep;

pub use runtime::Orchestrator;
pub use sweep::spawn_readiness_sweep;

/// Sender half used to request shutdown; receivers see `true`.
pub type ShutdownSender = watch::Sender<bool>;
pub type ShutdownReceiver = watch::Receiver<bool>;

pub fn shutdown_channel() -> (ShutdownSender, ShutdownReceiver) {
    watch::channel(false)
}

/// Resolve once shutdown was requested or every sender is gone.
pub async fn wait_for_shutdown(mut rx: ShutdownReceiver) {
    while !*rx.borrow_and_update() {
        if rx.changed().await.is_err() {
            return;
        }
    }
}
