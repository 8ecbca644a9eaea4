// src/config/mod.rs

//! Configuration loading and validation for calcdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file and apply environment overrides (`loader.rs`).
//! - Validate basic invariants like pool size and addresses (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{apply_env_overrides, load_and_validate, load_from_path, load_raw};
pub use model::{
    AgentSection, ConfigFile, OperationTimes, OperationsSection, OrchestratorSection,
    RawConfigFile, RetrySection,
};
