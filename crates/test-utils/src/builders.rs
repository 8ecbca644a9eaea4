#![allow(dead_code)]

use std::time::Duration;

use calcdag::config::{ConfigFile, RawConfigFile};
use calcdag::dag::ClaimedTask;
use calcdag::types::{Argument, ExpressionId, Operator, TaskId};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.config.orchestrator.bind = addr.to_string();
        self
    }

    pub fn readiness_interval_ms(mut self, ms: u64) -> Self {
        self.config.orchestrator.readiness_interval_ms = ms;
        self
    }

    pub fn claim_lease_ms(mut self, ms: u64) -> Self {
        self.config.orchestrator.claim_lease_ms = Some(ms);
        self
    }

    /// Same duration for every operator.
    pub fn operation_ms(mut self, ms: u64) -> Self {
        let ops = &mut self.config.operations;
        ops.addition_ms = ms;
        ops.subtraction_ms = ms;
        ops.multiplication_ms = ms;
        ops.division_ms = ms;
        self
    }

    pub fn computing_power(mut self, n: usize) -> Self {
        self.config.agent.computing_power = n;
        self
    }

    pub fn orchestrator_url(mut self, url: &str) -> Self {
        self.config.agent.orchestrator_url = url.to_string();
        self
    }

    pub fn poll_interval_ms(mut self, ms: u64) -> Self {
        self.config.agent.poll_interval_ms = ms;
        self
    }

    pub fn retry(mut self, max_attempts: u32, base_backoff_ms: u64) -> Self {
        self.config.agent.retry.max_attempts = max_attempts;
        self.config.agent.retry.base_backoff_ms = base_backoff_ms;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A claimed task with zero operation time.
pub fn claimed_task(id: u64, operator: Operator, arg1: Argument, arg2: Argument) -> ClaimedTask {
    ClaimedTask {
        id: TaskId(id),
        expression_id: ExpressionId(1),
        arg1,
        arg2,
        operator,
        operation_time: Duration::ZERO,
    }
}
