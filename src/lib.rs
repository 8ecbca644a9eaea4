// src/lib.rs

pub mod api;
pub mod cli;
pub mod compiler;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod types;

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::compiler::{ExpressionOutput, TaskIdSequence, compile_expression};
use crate::config::{ConfigFile, RawConfigFile, load_raw};
use crate::dag::TaskGraph;
use crate::engine::{Orchestrator, ShutdownSender, shutdown_channel};
use crate::exec::{HttpDispatch, LocalDispatch, WorkerPool, WorkerSettings};
use crate::types::ExpressionId;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file, environment, then CLI flags)
/// - the orchestrator, the worker pool, or both
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut raw = load_raw(args.config.as_deref())?;
    apply_cli_overrides(&mut raw, &args.command);
    let cfg = ConfigFile::try_from(raw)?;

    match args.command {
        Command::Orchestrator { .. } => run_orchestrator(&cfg).await,
        Command::Agent { .. } => run_agent(&cfg).await,
        Command::Local { .. } => run_local(&cfg).await,
        Command::Check { expression } => check_expression(&cfg, &expression),
    }
}

fn apply_cli_overrides(raw: &mut RawConfigFile, command: &Command) {
    match command {
        Command::Orchestrator { bind } => override_bind(raw, *bind),
        Command::Agent {
            orchestrator_url,
            computing_power,
        } => {
            if let Some(url) = orchestrator_url {
                raw.agent.orchestrator_url = url.clone();
            }
            override_computing_power(raw, *computing_power);
        }
        Command::Local {
            bind,
            computing_power,
        } => {
            override_bind(raw, *bind);
            override_computing_power(raw, *computing_power);
        }
        Command::Check { .. } => {}
    }
}

fn override_bind(raw: &mut RawConfigFile, bind: Option<SocketAddr>) {
    if let Some(addr) = bind {
        raw.orchestrator.bind = addr.to_string();
    }
}

fn override_computing_power(raw: &mut RawConfigFile, power: Option<NonZeroUsize>) {
    if let Some(n) = power {
        raw.agent.computing_power = n.get();
    }
}

/// Ctrl-C flips the shutdown channel.
fn spawn_ctrl_c(tx: ShutdownSender) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            return;
        }
        info!("shutdown requested");
        let _ = tx.send(true);
    });
}

async fn bind_listener(cfg: &ConfigFile) -> Result<TcpListener> {
    TcpListener::bind(&cfg.orchestrator.bind)
        .await
        .with_context(|| format!("binding {}", cfg.orchestrator.bind))
}

async fn run_orchestrator(cfg: &ConfigFile) -> Result<()> {
    let (tx, rx) = shutdown_channel();
    spawn_ctrl_c(tx);

    let listener = bind_listener(cfg).await?;
    Orchestrator::from_config(cfg).serve(listener, rx).await?;
    Ok(())
}

async fn run_agent(cfg: &ConfigFile) -> Result<()> {
    let (tx, rx) = shutdown_channel();
    spawn_ctrl_c(tx);

    let client = HttpDispatch::new(
        &cfg.agent.orchestrator_url,
        Duration::from_millis(cfg.agent.request_timeout_ms),
    )?;
    info!(orchestrator = %client.base_url(), "agent starting");

    WorkerPool::new(Arc::new(client), WorkerSettings::from_config(cfg))
        .run(rx)
        .await;
    Ok(())
}

async fn run_local(cfg: &ConfigFile) -> Result<()> {
    let (tx, rx) = shutdown_channel();
    spawn_ctrl_c(tx);

    let orchestrator = Orchestrator::from_config(cfg);
    let dispatch = LocalDispatch::new(orchestrator.store());
    let workers = WorkerPool::new(Arc::new(dispatch), WorkerSettings::from_config(cfg))
        .spawn(rx.clone());

    let listener = bind_listener(cfg).await?;
    orchestrator.serve(listener, rx).await?;
    workers.await.context("joining worker pool")?;
    Ok(())
}

/// Print the task DAG of one expression, grouped into parallel waves.
fn check_expression(cfg: &ConfigFile, text: &str) -> Result<()> {
    let compiled = compile_expression(
        text,
        ExpressionId(1),
        &TaskIdSequence::new(),
        &cfg.operation_times(),
    )?;
    let graph = TaskGraph::from_compiled(&compiled)?;

    println!("calcdag check: {}", text.trim());
    match compiled.output {
        ExpressionOutput::Literal(value) => {
            println!("  literal expression, result {value}");
            return Ok(());
        }
        ExpressionOutput::Task(root) => {
            println!("  tasks: {}, root: {root}", compiled.tasks.len());
        }
    }

    for (n, wave) in graph.waves().iter().enumerate() {
        println!("  wave {}:", n + 1);
        for id in wave {
            if let Some(task) = compiled.tasks.iter().find(|t| t.id == *id) {
                println!(
                    "    {} = {} {} {}  ({} ms)",
                    task.id,
                    task.arg1,
                    task.operator,
                    task.arg2,
                    task.operation_time.as_millis()
                );
            }
        }
    }
    Ok(())
}
