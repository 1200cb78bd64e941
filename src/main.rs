//! Automation Orchestrator - task execution against a reasoning service
//!
//! This is the main entry point for the orchestrator binary. A task is
//! submitted, the reasoning service decides whether it follows the default
//! path or the dynamic generate/execute path, and the resulting task state
//! is printed as JSON.

mod cli;
mod config;
mod error;
mod executor;
mod logging;
mod reasoning;
mod types;
mod version;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{debug, info, warn};

use crate::cli::{Cli, Commands, ConfigSubcommand};
use crate::config::OrchestratorConfig;
use crate::error::{Error, Result};
use crate::executor::ExecutionOrchestrator;
use crate::reasoning::{HttpReasoningClient, ReasoningClients};
use crate::types::{Task, TaskDescriptor, TaskId, TaskStatus};

/// How often `--wait` re-reads the task
const STATUS_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// How long Ctrl+C waits for the worker to record the interruption
const SETTLE_TIMEOUT: Duration = Duration::from_secs(1);
const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(20);

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        tracing::debug!(error = %e.format_for_log(), "Command failed");
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            version::print_version();
            Ok(())
        }
        Commands::Config { subcommand } => {
            // Config commands use minimal logging
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Execute {
            name,
            description,
            task_type,
            wait,
            timeout_secs,
            config,
        } => {
            let config = OrchestratorConfig::load(config.as_deref())?;

            // The guards must be kept alive for the lifetime of the program
            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
            log_startup();

            let mut descriptor = TaskDescriptor::new(name, description);
            if let Some(task_type) = task_type {
                descriptor = descriptor.with_type(task_type);
            }

            let limits = WaitLimits::new(wait, timeout_secs);
            build_runtime()?.block_on(execute_command(config, descriptor, limits))
        }
        Commands::Batch {
            file,
            wait,
            timeout_secs,
            config,
        } => {
            let config = OrchestratorConfig::load(config.as_deref())?;
            let _log_guards = logging::init_logging(&config.logging, cli.verbose, cli.quiet)?;
            log_startup();

            let descriptors = read_batch_file(&file)?;
            info!(file = %file, tasks = descriptors.len(), "Loaded task batch");

            let limits = WaitLimits::new(wait, timeout_secs);
            build_runtime()?.block_on(batch_command(config, descriptors, limits))
        }
    }
}

fn log_startup() {
    let build = version::build_info();
    info!(
        version = %build.full_version(),
        target = %build.target,
        profile = %build.profile,
        "Starting automation orchestrator"
    );
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("automation-orchestrator")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))
}

fn build_orchestrator(config: &OrchestratorConfig) -> Result<ExecutionOrchestrator> {
    let client = HttpReasoningClient::new(&config.reasoning)?;
    Ok(ExecutionOrchestrator::new(
        ReasoningClients::from_service(Arc::new(client)),
        config.worker_config(),
    ))
}

/// Parse a JSON array of task descriptors
fn read_batch_file(file: &str) -> Result<Vec<TaskDescriptor>> {
    let path = PathBuf::from(file);
    let content = std::fs::read_to_string(&path).map_err(|source| Error::IoRead {
        path: path.clone(),
        source,
    })?;

    let descriptors: Vec<TaskDescriptor> = serde_json::from_str(&content)
        .map_err(|e| Error::validation("file", format!("{}: {}", path.display(), e)))?;

    if descriptors.is_empty() {
        return Err(Error::validation("file", format!("{}: no tasks listed", path.display())));
    }

    Ok(descriptors)
}

/// Whether and how long the CLI waits for background work
#[derive(Debug, Clone, Copy)]
struct WaitLimits {
    wait: bool,
    timeout: Option<Duration>,
}

impl WaitLimits {
    fn new(wait: bool, timeout_secs: Option<u64>) -> Self {
        Self {
            wait,
            timeout: timeout_secs.map(Duration::from_secs),
        }
    }
}

/// How a wait ended
enum Waited {
    /// The task reached a terminal state, possibly after a timeout cancelled it
    Settled(Task),
    /// Ctrl+C stopped the wait; the snapshot is the latest the store holds
    Interrupted(Task),
}

/// Submit one task and report its state
async fn execute_command(config: OrchestratorConfig, descriptor: TaskDescriptor, limits: WaitLimits) -> Result<()> {
    let orchestrator = build_orchestrator(&config)?;

    let mut task = orchestrator.execute_task(descriptor).await?;

    if limits.wait && !task.is_terminal() {
        match wait_for_terminal(&orchestrator, task.id, limits.timeout).await? {
            Waited::Settled(settled) => task = settled,
            Waited::Interrupted(latest) => {
                println!("{}", serde_json::to_string_pretty(&latest)?);
                return Err(Error::Cancelled {
                    task_id: latest.id.to_string(),
                });
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&task)?);

    if task.status == TaskStatus::Failed {
        return Err(Error::ExecutionFailed {
            task_id: Some(task.id.to_string()),
            message: task.description,
        });
    }

    Ok(())
}

/// Submit every task of a batch and report all task states
///
/// A submission error does not stop the batch; the first one is returned
/// after the listing is printed.
async fn batch_command(config: OrchestratorConfig, descriptors: Vec<TaskDescriptor>, limits: WaitLimits) -> Result<()> {
    let orchestrator = build_orchestrator(&config)?;
    let total = descriptors.len();
    let mut first_error = None;

    for descriptor in descriptors {
        let name = descriptor.name.clone();
        match orchestrator.execute_task(descriptor).await {
            Ok(task) => debug!(task_id = %task.id, name = %name, status = %task.status, "Batch task submitted"),
            Err(e) => {
                warn!(name = %name, error = %e.format_for_log(), "Batch task rejected");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    let mut interrupted = None;
    if limits.wait {
        let pending: Vec<TaskId> = orchestrator
            .list_tasks()
            .into_iter()
            .filter(|task| !task.is_terminal())
            .map(|task| task.id)
            .collect();

        for id in pending {
            if let Waited::Interrupted(task) = wait_for_terminal(&orchestrator, id, limits.timeout).await? {
                interrupted = Some(task.id);
                break;
            }
        }
    }

    let tasks = orchestrator.list_tasks();
    println!("{}", serde_json::to_string_pretty(&tasks)?);

    if let Some(id) = interrupted {
        return Err(Error::Cancelled { task_id: id.to_string() });
    }
    if let Some(e) = first_error {
        return Err(e);
    }

    let failed = tasks.iter().filter(|task| task.status == TaskStatus::Failed).count();
    info!(total, failed, "Batch finished");
    if failed > 0 {
        return Err(Error::ExecutionFailed {
            task_id: None,
            message: format!("{} of {} tasks failed", failed, total),
        });
    }

    Ok(())
}

/// Poll the store until the task is terminal
///
/// A timeout cancels the task's background work and keeps waiting for the
/// resulting failure. Ctrl+C interrupts all outstanding work and returns the
/// snapshot once the worker has recorded it, or after `SETTLE_TIMEOUT`.
async fn wait_for_terminal(orchestrator: &ExecutionOrchestrator, id: TaskId, timeout: Option<Duration>) -> Result<Waited> {
    info!(task_id = %id, timeout = ?timeout, "Waiting for task to finish");

    let shutdown_signal = tokio::signal::ctrl_c();
    tokio::pin!(shutdown_signal);

    let deadline = async {
        match timeout {
            Some(limit) => tokio::time::sleep(limit).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let mut timed_out = false;

    let mut poll = tokio::time::interval(STATUS_POLL_INTERVAL);
    poll.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = &mut shutdown_signal => {
                warn!(task_id = %id, "Shutdown signal received");
                orchestrator.shutdown();
                return settle(orchestrator, &id).await.map(Waited::Interrupted);
            }
            _ = &mut deadline, if !timed_out => {
                timed_out = true;
                warn!(task_id = %id, "Task did not finish in time, cancelling");
                if !orchestrator.cancel_task(&id) {
                    debug!(task_id = %id, "No outstanding work to cancel");
                }
            }
            _ = poll.tick() => {
                let current = orchestrator.get_task_status(&id)?;
                debug!(task_id = %current.id, status = %current.status, "Polled task status");
                if current.is_terminal() {
                    return Ok(Waited::Settled(current));
                }
            }
        }
    }
}

/// Give the worker a moment to record an interruption
async fn settle(orchestrator: &ExecutionOrchestrator, id: &TaskId) -> Result<Task> {
    let check = async {
        loop {
            match orchestrator.get_task_status(id) {
                Ok(current) if !current.is_terminal() => tokio::time::sleep(SETTLE_POLL_INTERVAL).await,
                other => return other,
            }
        }
    };

    match tokio::time::timeout(SETTLE_TIMEOUT, check).await {
        Ok(result) => result,
        Err(_) => {
            debug!(task_id = %id, "Interruption not recorded yet, reporting latest snapshot");
            orchestrator.get_task_status(id)
        }
    }
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = OrchestratorConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration file created: {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            OrchestratorConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
