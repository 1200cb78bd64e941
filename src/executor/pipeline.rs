//! Dynamic execution pipeline
//!
//! generate -> execute against the reasoning service. The pipeline never
//! fails to its caller: every outcome ends in a terminal task state with a
//! description of what happened.

use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info, warn};

use crate::error::Error;
use crate::reasoning::{CodeExecClient, CodeGenClient};
use crate::types::Task;

/// Sequences code generation and code execution for one task
pub struct DynamicExecutionPipeline {
    codegen: Arc<dyn CodeGenClient>,
    exec: Arc<dyn CodeExecClient>,
}

impl DynamicExecutionPipeline {
    pub fn new(codegen: Arc<dyn CodeGenClient>, exec: Arc<dyn CodeExecClient>) -> Self {
        Self { codegen, exec }
    }

    /// Drive `task` to `completed` or `failed`
    pub async fn run(&self, mut task: Task, context: &Value) -> Task {
        let outcome = match self.codegen.generate(&task, context).await {
            Ok(code) => {
                info!(task_id = %task.id, "Generated code received, executing");
                match self.exec.execute(&task, &code).await {
                    Ok(result) => Ok(result),
                    Err(e) => Err(describe_exec_failure(&e)),
                }
            }
            Err(e) => Err(describe_codegen_failure(&e)),
        };

        let transition = match outcome {
            Ok(result) => {
                info!(task_id = %task.id, "Dynamic execution completed");
                task.mark_completed(Some(result))
            }
            Err(cause) => {
                warn!(task_id = %task.id, cause = %cause, "Dynamic execution failed");
                task.mark_failed(cause)
            }
        };

        // Only reachable if the caller handed over a terminal task
        if let Err(e) = transition {
            error!(task_id = %task.id, error = %e, "Dynamic execution could not record its outcome");
        }

        task
    }
}

fn describe_codegen_failure(error: &Error) -> String {
    match error {
        Error::NegativeResult { reason, .. } => {
            format!("Code generation reported failure: {}", reason)
        }
        other => format!("Failed to generate dynamic code: {}", other),
    }
}

fn describe_exec_failure(error: &Error) -> String {
    match error {
        Error::NegativeResult { reason, .. } => format!("Dynamic execution failed: {}", reason),
        other => format!("Error during dynamic execution: {}", other),
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
