//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the automation orchestrator.

use clap::{Parser, Subcommand};

/// Automation Orchestrator - task execution against a reasoning service
///
/// Submits automation tasks, lets the reasoning service decide how they run,
/// and reports the resulting task state as JSON.
#[derive(Parser, Debug)]
#[command(name = "automation-orchestrator")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute a task and print its state as JSON
    Execute {
        /// Task name
        #[arg(short, long)]
        name: String,

        /// Free-form task description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Optional task category
        #[arg(short = 't', long = "type")]
        task_type: Option<String>,

        /// Poll until the task reaches a terminal state
        #[arg(short, long)]
        wait: bool,

        /// Cancel the task if it has not finished after this many seconds
        #[arg(long, requires = "wait")]
        timeout_secs: Option<u64>,

        /// Path to configuration file
        #[arg(short, long, env = "AUTOMATION_CONFIG")]
        config: Option<String>,
    },

    /// Execute every task in a JSON file and print all task states
    Batch {
        /// JSON array of task descriptors ({"name", "description", "taskType"})
        #[arg(short, long)]
        file: String,

        /// Poll until every task reaches a terminal state
        #[arg(short, long)]
        wait: bool,

        /// Cancel a task if it has not finished after this many seconds
        #[arg(long, requires = "wait")]
        timeout_secs: Option<u64>,

        /// Path to configuration file
        #[arg(short, long, env = "AUTOMATION_CONFIG")]
        config: Option<String>,
    },

    /// Display version and build information
    Version,

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}
