// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

use crate::types::Operator;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [orchestrator]
/// bind = "0.0.0.0:8080"
/// readiness_interval_ms = 500
///
/// [operations]
/// addition_ms = 100
/// multiplication_ms = 200
///
/// [agent]
/// orchestrator_url = "http://localhost:8080"
/// computing_power = 4
///
/// [agent.retry]
/// max_attempts = 5
/// base_backoff_ms = 2000
/// ```
///
/// All sections are optional and have defaults matching the reference
/// deployment. Use [`ConfigFile::try_from`] to get a validated config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub orchestrator: OrchestratorSection,

    #[serde(default)]
    pub operations: OperationsSection,

    #[serde(default)]
    pub agent: AgentSection,
}

/// Validated configuration. Built from a [`RawConfigFile`] via `TryFrom`.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub orchestrator: OrchestratorSection,
    pub operations: OperationsSection,
    pub agent: AgentSection,
}

impl ConfigFile {
    /// Build without validation. Only `validate.rs` should call this.
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            orchestrator: raw.orchestrator,
            operations: raw.operations,
            agent: raw.agent,
        }
    }

    pub fn operation_times(&self) -> OperationTimes {
        self.operations.operation_times()
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.orchestrator.readiness_interval_ms)
    }

    /// Claim lease for the stuck-task reclaim enhancement; `None` keeps
    /// abandoned claims `InProgress` forever.
    pub fn claim_lease(&self) -> Option<Duration> {
        self.orchestrator.claim_lease_ms.map(Duration::from_millis)
    }
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorSection {
    /// Socket address the HTTP API binds to.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Period of the background readiness sweep.
    #[serde(default = "default_readiness_interval_ms")]
    pub readiness_interval_ms: u64,

    /// Optional claim lease. Absent means no lease (tasks abandoned by a
    /// worker stay claimed).
    #[serde(default)]
    pub claim_lease_ms: Option<u64>,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_readiness_interval_ms() -> u64 {
    500
}

impl Default for OrchestratorSection {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            readiness_interval_ms: default_readiness_interval_ms(),
            claim_lease_ms: None,
        }
    }
}

/// `[operations]` section: simulated execution time per operator.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationsSection {
    #[serde(default = "default_addition_ms")]
    pub addition_ms: u64,
    #[serde(default = "default_subtraction_ms")]
    pub subtraction_ms: u64,
    #[serde(default = "default_multiplication_ms")]
    pub multiplication_ms: u64,
    #[serde(default = "default_division_ms")]
    pub division_ms: u64,
}

fn default_addition_ms() -> u64 {
    100
}

fn default_subtraction_ms() -> u64 {
    100
}

fn default_multiplication_ms() -> u64 {
    200
}

fn default_division_ms() -> u64 {
    300
}

impl Default for OperationsSection {
    fn default() -> Self {
        Self {
            addition_ms: default_addition_ms(),
            subtraction_ms: default_subtraction_ms(),
            multiplication_ms: default_multiplication_ms(),
            division_ms: default_division_ms(),
        }
    }
}

impl OperationsSection {
    pub fn operation_times(&self) -> OperationTimes {
        OperationTimes {
            addition: Duration::from_millis(self.addition_ms),
            subtraction: Duration::from_millis(self.subtraction_ms),
            multiplication: Duration::from_millis(self.multiplication_ms),
            division: Duration::from_millis(self.division_ms),
        }
    }
}

/// Per-operator simulated execution time, as stamped onto each task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimes {
    pub addition: Duration,
    pub subtraction: Duration,
    pub multiplication: Duration,
    pub division: Duration,
}

impl OperationTimes {
    /// All operations complete instantly. Handy for tests.
    pub fn zero() -> Self {
        Self {
            addition: Duration::ZERO,
            subtraction: Duration::ZERO,
            multiplication: Duration::ZERO,
            division: Duration::ZERO,
        }
    }

    pub fn for_operator(&self, op: Operator) -> Duration {
        match op {
            Operator::Add => self.addition,
            Operator::Subtract => self.subtraction,
            Operator::Multiply => self.multiplication,
            Operator::Divide => self.division,
        }
    }
}

impl Default for OperationTimes {
    fn default() -> Self {
        OperationsSection::default().operation_times()
    }
}

/// `[agent]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    /// Base URL of the orchestrator's HTTP API.
    #[serde(default = "default_orchestrator_url")]
    pub orchestrator_url: String,

    /// Worker pool size, also the admission limit for concurrent claims.
    #[serde(default = "default_computing_power")]
    pub computing_power: usize,

    /// How long an idle worker waits before asking for a task again.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Per-request timeout for calls to the orchestrator.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    #[serde(default)]
    pub retry: RetrySection,
}

fn default_orchestrator_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_computing_power() -> usize {
    10
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            orchestrator_url: default_orchestrator_url(),
            computing_power: default_computing_power(),
            poll_interval_ms: default_poll_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            retry: RetrySection::default(),
        }
    }
}

/// `[agent.retry]` section: dependency fetch retry policy.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Attempt `i` (1-based) is followed by a sleep of `i * base_backoff_ms`.
    #[serde(default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_backoff_ms() -> u64 {
    2000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
        }
    }
}
