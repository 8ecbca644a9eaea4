// src/config/validate.rs

use std::net::SocketAddr;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{CalcError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::CalcError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_orchestrator(cfg)?;
    validate_agent(cfg)?;
    Ok(())
}

fn validate_orchestrator(cfg: &RawConfigFile) -> Result<()> {
    if cfg.orchestrator.bind.parse::<SocketAddr>().is_err() {
        return Err(CalcError::ConfigError(format!(
            "[orchestrator].bind must be a socket address like \"0.0.0.0:8080\" (got {:?})",
            cfg.orchestrator.bind
        )));
    }

    if cfg.orchestrator.readiness_interval_ms == 0 {
        return Err(CalcError::ConfigError(
            "[orchestrator].readiness_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.orchestrator.claim_lease_ms == Some(0) {
        return Err(CalcError::ConfigError(
            "[orchestrator].claim_lease_ms must be >= 1 when set (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_agent(cfg: &RawConfigFile) -> Result<()> {
    let agent = &cfg.agent;

    if agent.computing_power == 0 {
        return Err(CalcError::ConfigError(
            "[agent].computing_power must be >= 1 (got 0)".to_string(),
        ));
    }

    if agent.retry.max_attempts == 0 {
        return Err(CalcError::ConfigError(
            "[agent.retry].max_attempts must be >= 1 (got 0)".to_string(),
        ));
    }

    let url = agent.orchestrator_url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(CalcError::ConfigError(format!(
            "[agent].orchestrator_url must start with http:// or https:// (got {:?})",
            agent.orchestrator_url
        )));
    }

    Ok(())
}
