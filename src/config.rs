//! Configuration system for the automation orchestrator
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (AUTOMATION_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::executor::CompletionWorkerConfig;

/// Main orchestrator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Reasoning service connection settings
    pub reasoning: ReasoningSettings,

    /// Background completion settings
    pub worker: WorkerSettings,

    /// Logging configuration
    pub logging: LoggingSettings,
}

/// Reasoning service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningSettings {
    /// Base URL; `/analyze`, `/generate` and `/execute` are appended
    pub base_url: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Background completion settings for the default path
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// How long default-path work takes, in milliseconds
    pub completion_interval_ms: u64,

    /// Maximum background completions running at once
    pub max_concurrent: usize,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// How often the log file rolls over: hourly, daily, never
    pub rotation: String,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

// Default implementations

impl Default for ReasoningSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/llm".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            completion_interval_ms: 5000,
            max_concurrent: 8,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            rotation: "daily".to_string(),
            max_files: 5,
            json_format: false,
        }
    }
}

impl OrchestratorConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::IoRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // An explicit path must exist
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        for path in &search_paths() {
            if path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // Reasoning settings
        if let Ok(val) = std::env::var("AUTOMATION_REASONING_URL") {
            self.reasoning.base_url = val;
        }
        if let Ok(val) = std::env::var("AUTOMATION_REASONING_TIMEOUT_SECS") {
            if let Ok(n) = val.parse() {
                self.reasoning.timeout_secs = n;
            }
        }

        // Worker settings
        if let Ok(val) = std::env::var("AUTOMATION_COMPLETION_INTERVAL_MS") {
            if let Ok(n) = val.parse() {
                self.worker.completion_interval_ms = n;
            }
        }
        if let Ok(val) = std::env::var("AUTOMATION_MAX_CONCURRENT") {
            if let Ok(n) = val.parse() {
                self.worker.max_concurrent = n;
            }
        }

        // Logging settings
        if let Ok(val) = std::env::var("AUTOMATION_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("AUTOMATION_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("AUTOMATION_LOG_JSON") {
            self.logging.json_format = val.to_lowercase() == "true" || val == "1";
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = url::Url::parse(&self.reasoning.base_url).map_err(|e| {
            Error::config_field_invalid(
                "reasoning.base_url",
                format!("'{}' is not a valid URL: {}", self.reasoning.base_url, e),
            )
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::config_field_invalid(
                "reasoning.base_url",
                "Reasoning service URL must start with http:// or https://",
            ));
        }

        if self.reasoning.timeout_secs == 0 {
            return Err(Error::config_field_invalid(
                "reasoning.timeout_secs",
                "timeout_secs must be greater than 0",
            ));
        }

        if self.worker.max_concurrent == 0 {
            return Err(Error::config_field_invalid(
                "worker.max_concurrent",
                "max_concurrent must be greater than 0",
            ));
        }

        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        let valid_rotations = ["hourly", "daily", "never"];
        if !valid_rotations.contains(&self.logging.rotation.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.rotation",
                format!(
                    "Invalid rotation '{}'. Must be one of: {}",
                    self.logging.rotation,
                    valid_rotations.join(", ")
                ),
            ));
        }

        Ok(())
    }

    /// Completion worker settings derived from `[worker]`
    pub fn worker_config(&self) -> CompletionWorkerConfig {
        CompletionWorkerConfig {
            completion_interval: Duration::from_millis(self.worker.completion_interval_ms),
            max_concurrent: self.worker.max_concurrent,
        }
    }
}

/// Standard configuration file locations, in search order
fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![
        // Current directory
        PathBuf::from("automation.toml"),
        PathBuf::from("config.toml"),
    ];
    // User config directory
    if let Some(dir) = dirs::config_dir() {
        paths.push(dir.join("automation").join("orchestrator.toml"));
    }
    // Home directory
    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".automation").join("orchestrator.toml"));
    }
    // System config (Linux)
    paths.push(PathBuf::from("/etc/automation/orchestrator.toml"));
    paths
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or_else(|_| std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location used by `config init`
pub fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".automation")
        .join("orchestrator.toml")
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    // Check if file exists
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    // Create parent directories
    if let Some(parent) = config_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| Error::IoWrite {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&config_path, generate_default_config()).map_err(|source| Error::IoWrite {
        path: config_path.clone(),
        source,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# Automation Orchestrator Configuration

[reasoning]
# Reasoning service base URL (/analyze, /generate and /execute are appended)
base_url = "http://localhost:5000/api/llm"

# Request timeout in seconds
timeout_secs = 30

[worker]
# How long default-path tasks take to complete, in milliseconds
completion_interval_ms = 5000

# Maximum background completions running at once
max_concurrent = 8

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "~/.automation/logs/orchestrator.log"

# How often the log file rolls over: hourly, daily, never
rotation = "daily"

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false
"#
    .to_string()
}
