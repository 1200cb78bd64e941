//! Error types for the automation orchestrator
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Reasoning-service failures come in two distinct flavours that callers
//! must handle differently: `ServiceUnavailable` (the service could not be
//! reached or answered with a transport-level failure) and `NegativeResult`
//! (the service answered but reported `success=false`).

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for orchestrator operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Reasoning service errors (3xx)
    ServiceUnavailable = 300,
    ServiceNegativeResult = 310,
    ServiceMalformed = 311,

    // Request errors (4xx)
    Validation = 400,
    TaskNotFound = 404,

    // Execution errors (5xx)
    ExecutionFailed = 500,
    ExecutionCancelled = 502,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E100")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10,
            200..=299 => 20,
            300..=399 => 30,
            400..=499 => 40,
            500..=599 => 50,
            900..=999 => 90,
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type for the orchestrator
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Reasoning Service Errors
    // ─────────────────────────────────────────────────────────────

    /// The reasoning service could not be reached or failed at transport level
    #[error("Reasoning service unavailable at {endpoint}: {message}")]
    ServiceUnavailable { endpoint: String, message: String },

    /// The reasoning service answered but reported a negative result
    #[error("Reasoning service reported failure at {endpoint}: {reason}")]
    NegativeResult { endpoint: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Request Errors
    // ─────────────────────────────────────────────────────────────

    /// Malformed task input
    #[error("Invalid task: {message}")]
    Validation { field: String, message: String },

    /// Unknown task id
    #[error("Task not found: {task_id}")]
    TaskNotFound { task_id: String },

    // ─────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────

    /// Terminal failure recorded on a task
    #[error("Task execution failed: {message}")]
    ExecutionFailed {
        task_id: Option<String>,
        message: String,
    },

    /// Work was cancelled before it finished
    #[error("Task {task_id} was cancelled")]
    Cancelled { task_id: String },

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::Config(_) => ErrorCode::ConfigValidation,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,
            Error::Json(_) => ErrorCode::ServiceMalformed,

            Error::ServiceUnavailable { .. } => ErrorCode::ServiceUnavailable,
            Error::NegativeResult { .. } => ErrorCode::ServiceNegativeResult,

            Error::Validation { .. } => ErrorCode::Validation,
            Error::TaskNotFound { .. } => ErrorCode::TaskNotFound,

            Error::ExecutionFailed { .. } => ErrorCode::ExecutionFailed,
            Error::Cancelled { .. } => ErrorCode::ExecutionCancelled,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'automation-orchestrator config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'automation-orchestrator config validate' to see details."
            ),
            Error::ConfigValidation { .. } | Error::Config(_) => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::ServiceUnavailable { .. } => Some(
                "Check that the reasoning service is running and that [reasoning].base_url points at it."
            ),
            Error::NegativeResult { .. } => Some(
                "The reasoning service rejected the request. Check its logs for details."
            ),
            Error::Validation { .. } => Some(
                "A task needs a non-empty name of at most 256 characters."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            self.code().as_str(),
            self
        );

        if let Some(hint) = self.suggestion() {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a reasoning-service transport error
    pub fn service_unavailable(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ServiceUnavailable {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Create a reasoning-service negative result
    pub fn negative_result(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::NegativeResult {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create a task validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a task-not-found error
    pub fn task_not_found(task_id: impl ToString) -> Self {
        Error::TaskNotFound {
            task_id: task_id.to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
