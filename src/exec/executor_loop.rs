// src/exec/executor_loop.rs

//! Fixed-size worker pool.
//!
//! Every worker repeatedly claims a task, processes it and reports the
//! result. A shared [`AdmissionCounter`] gates claims: a worker only asks for
//! a task while fewer than `workers` tasks are claimed-but-unfinished.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::ConfigFile;
use crate::engine::ShutdownReceiver;
use crate::exec::backend::DispatchClient;
use crate::exec::retry::RetryPolicy;
use crate::exec::task_runner::run_task;

/// Soft count of claimed-but-unfinished tasks.
///
/// `has_capacity` followed by `admit` is not atomic, so a few extra claims
/// may slip through under contention.
#[derive(Debug)]
pub struct AdmissionCounter {
    active: AtomicUsize,
    limit: usize,
}

impl AdmissionCounter {
    pub fn new(limit: usize) -> Self {
        Self {
            active: AtomicUsize::new(0),
            limit,
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.active() < self.limit
    }

    /// Count one more active task. The returned permit releases it on drop.
    pub fn admit(self: &Arc<Self>) -> AdmissionPermit {
        self.active.fetch_add(1, Ordering::SeqCst);
        AdmissionPermit {
            counter: Arc::clone(self),
        }
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    fn release(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct AdmissionPermit {
    counter: Arc<AdmissionCounter>,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.counter.release();
    }
}

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub workers: usize,
    /// Sleep between claims when nothing is ready.
    pub poll_interval: Duration,
    pub retry: RetryPolicy,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            workers: 10,
            poll_interval: Duration::from_secs(1),
            retry: RetryPolicy::default(),
        }
    }
}

impl WorkerSettings {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            workers: cfg.agent.computing_power,
            poll_interval: Duration::from_millis(cfg.agent.poll_interval_ms),
            retry: RetryPolicy::from_config(cfg),
        }
    }
}

pub struct WorkerPool<C> {
    client: Arc<C>,
    settings: WorkerSettings,
    admission: Arc<AdmissionCounter>,
}

impl<C> WorkerPool<C>
where
    C: DispatchClient + 'static,
{
    pub fn new(client: Arc<C>, settings: WorkerSettings) -> Self {
        let admission = Arc::new(AdmissionCounter::new(settings.workers));
        Self {
            client,
            settings,
            admission,
        }
    }

    pub fn admission(&self) -> Arc<AdmissionCounter> {
        Arc::clone(&self.admission)
    }

    /// Run every worker until `shutdown` becomes `true` (or its sender is
    /// dropped).
    pub async fn run(self, shutdown: ShutdownReceiver) {
        info!(workers = self.settings.workers, "worker pool started");

        let mut workers = JoinSet::new();
        for worker in 0..self.settings.workers {
            workers.spawn(worker_loop(
                worker,
                Arc::clone(&self.client),
                Arc::clone(&self.admission),
                self.settings.clone(),
                shutdown.clone(),
            ));
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "worker task panicked");
            }
        }

        info!("worker pool stopped");
    }

    pub fn spawn(self, shutdown: ShutdownReceiver) -> tokio::task::JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

async fn worker_loop<C>(
    worker: usize,
    client: Arc<C>,
    admission: Arc<AdmissionCounter>,
    settings: WorkerSettings,
    mut shutdown: ShutdownReceiver,
) where
    C: DispatchClient + 'static,
{
    debug!(worker, "worker started");

    loop {
        if *shutdown.borrow() {
            break;
        }

        if !admission.has_capacity() {
            if idle(&mut shutdown, settings.poll_interval).await {
                break;
            }
            continue;
        }

        let permit = admission.admit();
        let claimed = tokio::select! {
            res = client.claim_task() => res,
            _ = shutdown.changed() => break,
        };

        match claimed {
            Ok(Some(task)) => {
                let id = task.id;
                tokio::select! {
                    () = run_task(client.as_ref(), task, &settings.retry) => {}
                    _ = shutdown.changed() => {
                        info!(worker, task = %id, "shutdown while processing; task abandoned");
                        break;
                    }
                }
                drop(permit);
            }
            Ok(None) => {
                drop(permit);
                if idle(&mut shutdown, settings.poll_interval).await {
                    break;
                }
            }
            Err(err) => {
                drop(permit);
                warn!(worker, error = %err, "claim failed");
                if idle(&mut shutdown, settings.poll_interval).await {
                    break;
                }
            }
        }
    }

    debug!(worker, "worker stopped");
}

/// Sleep for `interval`. Returns `true` if shutdown was requested meanwhile.
async fn idle(shutdown: &mut ShutdownReceiver, interval: Duration) -> bool {
    tokio::select! {
        () = tokio::time::sleep(interval) => false,
        _ = shutdown.changed() => true,
    }
}
