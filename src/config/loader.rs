// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** apply environment
/// overrides or validate. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load the raw config and apply process environment overrides.
///
/// - An explicit `path` must exist.
/// - Without a path, [`default_config_path`] is used if present; otherwise
///   all defaults apply.
pub fn load_raw(path: Option<&Path>) -> Result<RawConfigFile> {
    let mut raw = match path {
        Some(path) => load_from_path(path)?,
        None => {
            let default_path = default_config_path();
            if default_path.is_file() {
                debug!(path = ?default_path, "loading default config file");
                load_from_path(&default_path)?
            } else {
                debug!("no config file; using defaults");
                RawConfigFile::default()
            }
        }
    };

    apply_env_overrides(&mut raw, |key| std::env::var(key).ok());
    Ok(raw)
}

/// Load, apply environment overrides, and validate.
pub fn load_and_validate(path: Option<&Path>) -> Result<ConfigFile> {
    let raw = load_raw(path)?;
    ConfigFile::try_from(raw)
}

/// Apply environment overrides using the given variable lookup.
///
/// Recognised variables:
/// - `PORT`: replaces the port of `[orchestrator].bind`
/// - `TIME_ADDITION_MS`, `TIME_SUBTRACTION_MS`, `TIME_MULTIPLICATIONS_MS`,
///   `TIME_DIVISIONS_MS`
/// - `COMPUTING_POWER`
/// - `ORCHESTRATOR_URL`, or else `ORCHESTRATOR_HOST` (a bare host name,
///   reached over HTTP on port 8080)
///
/// Unparseable numeric values are ignored with a warning, keeping the value
/// from the file (or the default).
pub fn apply_env_overrides<F>(raw: &mut RawConfigFile, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(port) = parse_var::<u16>(&lookup, "PORT") {
        let host = raw
            .orchestrator
            .bind
            .rsplit_once(':')
            .map(|(host, _)| host.to_string())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        raw.orchestrator.bind = format!("{host}:{port}");
    }

    if let Some(ms) = parse_var(&lookup, "TIME_ADDITION_MS") {
        raw.operations.addition_ms = ms;
    }
    if let Some(ms) = parse_var(&lookup, "TIME_SUBTRACTION_MS") {
        raw.operations.subtraction_ms = ms;
    }
    if let Some(ms) = parse_var(&lookup, "TIME_MULTIPLICATIONS_MS") {
        raw.operations.multiplication_ms = ms;
    }
    if let Some(ms) = parse_var(&lookup, "TIME_DIVISIONS_MS") {
        raw.operations.division_ms = ms;
    }

    if let Some(power) = parse_var(&lookup, "COMPUTING_POWER") {
        raw.agent.computing_power = power;
    }

    let non_empty = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    if let Some(url) = non_empty("ORCHESTRATOR_URL") {
        raw.agent.orchestrator_url = url;
    } else if let Some(host) = non_empty("ORCHESTRATOR_HOST") {
        raw.agent.orchestrator_url = format!("http://{host}:{ORCHESTRATOR_HOST_PORT}");
    }
}

/// Port assumed when the orchestrator is given by `ORCHESTRATOR_HOST`.
const ORCHESTRATOR_HOST_PORT: u16 = 8080;

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let value = lookup(key)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = key, value = %trimmed, "invalid value in environment; ignoring");
            None
        }
    }
}

/// Config file looked up when `--config` is not given.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Calcdag.toml")
}
