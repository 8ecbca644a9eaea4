// src/exec/retry.rs

//! Bounded retry with linear backoff for dependency fetches.

use std::time::Duration;

use tracing::{debug, warn};

use crate::config::ConfigFile;
use crate::exec::WorkerError;
use crate::exec::backend::DispatchClient;
use crate::types::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        let retry = &cfg.agent.retry;
        Self {
            max_attempts: retry.max_attempts,
            base_backoff: Duration::from_millis(retry.base_backoff_ms),
        }
    }

    /// Delay after failed attempt `attempt` (1-based): `attempt × base`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_backoff.saturating_mul(attempt)
    }

    /// Sum of every delay when all attempts fail.
    pub fn total_backoff(&self) -> Duration {
        (1..=self.max_attempts)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}

/// Fetch the result of `task`, retrying with linear backoff.
///
/// Each failed attempt, whether "not available yet" or a transport error, is
/// followed by its backoff sleep, including the last one. After
/// `max_attempts` failures this returns [`WorkerError::DependencyUnresolved`].
pub async fn fetch_with_retry<C>(
    client: &C,
    task: TaskId,
    policy: &RetryPolicy,
) -> Result<f64, WorkerError>
where
    C: DispatchClient + ?Sized,
{
    for attempt in 1..=policy.max_attempts {
        match client.fetch_result(task).await {
            Ok(Some(value)) => {
                debug!(task = %task, attempt, "dependency resolved");
                return Ok(value);
            }
            Ok(None) => {
                debug!(task = %task, attempt, "dependency not ready");
            }
            Err(err) => {
                warn!(task = %task, attempt, error = %err, "dependency fetch failed");
            }
        }
        tokio::time::sleep(policy.delay_for(attempt)).await;
    }

    Err(WorkerError::DependencyUnresolved {
        task,
        attempts: policy.max_attempts,
    })
}
