//! Task record and reasoning-service payload types
//!
//! The wire shapes mirror the JSON exchanged with the API layer and the
//! reasoning service: tasks use camelCase field names, statuses are
//! snake_case strings.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::{Error, Result};

/// Maximum accepted length of a task name (in characters)
pub const MAX_TASK_NAME_LEN: usize = 256;

/// Opaque task identifier
pub type TaskId = Uuid;

// ─────────────────────────────────────────────────────────────────
// Task Status
// ─────────────────────────────────────────────────────────────────

/// Lifecycle state of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Accepted, nothing has happened yet
    Created,
    /// Running on the default completion path
    InProgress,
    /// Finished successfully
    Completed,
    /// Finished with a failure recorded in the description
    Failed,
}

impl TaskStatus {
    /// Whether no further transitions are allowed
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Whether `self -> next` is a legal transition
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Created, TaskStatus::InProgress) => true,
            (TaskStatus::Created | TaskStatus::InProgress, TaskStatus::Completed) => true,
            (TaskStatus::Created | TaskStatus::InProgress, TaskStatus::Failed) => true,
            _ => false,
        }
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Created
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Created => write!(f, "created"),
            TaskStatus::InProgress => write!(f, "in_progress"),
            TaskStatus::Completed => write!(f, "completed"),
            TaskStatus::Failed => write!(f, "failed"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Task Descriptor
// ─────────────────────────────────────────────────────────────────

/// Caller-supplied description of a unit of work
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

impl TaskDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            task_type: None,
        }
    }

    pub fn with_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = Some(task_type.into());
        self
    }

    /// Reject malformed input before any task is created
    pub fn validate(&self) -> Result<()> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(Error::validation("name", "name must not be empty"));
        }
        if name.chars().count() > MAX_TASK_NAME_LEN {
            return Err(Error::validation(
                "name",
                format!("name must be at most {} characters", MAX_TASK_NAME_LEN),
            ));
        }
        if let Some(task_type) = &self.task_type {
            if task_type.trim().is_empty() {
                return Err(Error::validation("taskType", "taskType must not be blank when set"));
            }
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Task
// ─────────────────────────────────────────────────────────────────

/// A unit of work and its lifecycle record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped on every status change; orders writes to the store
    pub revision: u64,
}

impl Task {
    /// Build a fresh `created` task from a validated descriptor
    pub fn from_descriptor(descriptor: TaskDescriptor) -> Result<Self> {
        descriptor.validate()?;
        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            name: descriptor.name.trim().to_string(),
            description: descriptor.description,
            task_type: descriptor.task_type,
            status: TaskStatus::Created,
            created_at: now,
            updated_at: now,
            revision: 0,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Move to `next`, refreshing `updated_at` and the revision
    pub fn transition(&mut self, next: TaskStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::Internal(format!(
                "illegal transition for task {}: {} -> {}",
                self.id, self.status, next
            )));
        }
        self.status = next;
        self.touch();
        Ok(())
    }

    /// Move to `in_progress`
    pub fn mark_in_progress(&mut self) -> Result<()> {
        self.transition(TaskStatus::InProgress)
    }

    /// Move to `completed`, replacing the description with the result text
    pub fn mark_completed(&mut self, result: Option<String>) -> Result<()> {
        self.transition(TaskStatus::Completed)?;
        if let Some(result) = result {
            self.description = result;
        }
        Ok(())
    }

    /// Move to `failed`, replacing the description with the failure cause
    pub fn mark_failed(&mut self, cause: impl Into<String>) -> Result<()> {
        self.transition(TaskStatus::Failed)?;
        self.description = cause.into();
        Ok(())
    }

    // updated_at must strictly increase even when the clock has not moved
    fn touch(&mut self) {
        let now = Utc::now();
        self.updated_at = if now > self.updated_at {
            now
        } else {
            self.updated_at + Duration::microseconds(1)
        };
        self.revision += 1;
    }
}

// ─────────────────────────────────────────────────────────────────
// Reasoning Service Payloads
// ─────────────────────────────────────────────────────────────────

/// Outcome of `/analyze`
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub requires_code_generation: bool,
    /// Full analysis response, forwarded untouched to code generation
    pub context: Value,
}

impl AnalysisResult {
    /// Interpret a raw `/analyze` response body
    ///
    /// Returns `None` when `requires_code_generation` is missing or not a
    /// boolean.
    pub fn from_response(body: Value) -> Option<Self> {
        let requires_code_generation = body.get("requires_code_generation")?.as_bool()?;
        Some(Self {
            requires_code_generation,
            context: body,
        })
    }

    /// Decide the execution strategy once
    pub fn strategy(self) -> ExecutionStrategy {
        if self.requires_code_generation {
            ExecutionStrategy::Dynamic(self.context)
        } else {
            ExecutionStrategy::Default
        }
    }
}

/// How a task is carried out
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionStrategy {
    /// Fixed completion path run by the background worker
    Default,
    /// Generate code with the given analysis context, then execute it
    Dynamic(Value),
}

impl ExecutionStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            ExecutionStrategy::Default => "default",
            ExecutionStrategy::Dynamic(_) => "dynamic",
        }
    }
}

/// Response of `/generate`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeGenResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CodeGenResult {
    /// The generated code, or the reason generation is unusable
    pub fn into_code(self) -> std::result::Result<Value, String> {
        match (self.success, self.code) {
            (true, Some(code)) if !code.is_null() => Ok(code),
            (true, _) => Err("response did not include generated code".to_string()),
            (false, _) => Err(self
                .error
                .unwrap_or_else(|| "code generation was unsuccessful".to_string())),
        }
    }
}

/// Response of `/execute`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecResult {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExecResult {
    /// The result text, or the reason execution failed
    pub fn into_text(self) -> std::result::Result<String, String> {
        if !self.success {
            return Err(self
                .error
                .unwrap_or_else(|| "execution was unsuccessful".to_string()));
        }
        match self.result {
            Some(Value::String(text)) => Ok(text),
            Some(Value::Null) | None => Err("response did not include a result".to_string()),
            Some(other) => Ok(other.to_string()),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
