//! Execution orchestrator
//!
//! Entry point for `execute` and `status`: asks the reasoning service how to
//! run a task, then either hands it to the background completion worker or
//! drives it through the dynamic execution pipeline.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::Result;
use crate::reasoning::{ReasoningClients, EXECUTE_ACTION};
use crate::types::{ExecutionStrategy, Task, TaskDescriptor, TaskId};

use super::{CompletionWorkerConfig, DefaultCompletionWorker, DynamicExecutionPipeline, TaskStore};

// ─────────────────────────────────────────────────────────────────
// Execution Orchestrator
// ─────────────────────────────────────────────────────────────────

/// Decides how each task runs and tracks it to completion
pub struct ExecutionOrchestrator {
    clients: ReasoningClients,
    store: Arc<TaskStore>,
    pipeline: DynamicExecutionPipeline,
    worker: DefaultCompletionWorker,
}

impl ExecutionOrchestrator {
    pub fn new(clients: ReasoningClients, worker_config: CompletionWorkerConfig) -> Self {
        let store = Arc::new(TaskStore::new());
        let pipeline = DynamicExecutionPipeline::new(clients.codegen.clone(), clients.exec.clone());
        let worker = DefaultCompletionWorker::new(store.clone(), worker_config);

        Self {
            clients,
            store,
            pipeline,
            worker,
        }
    }

    /// Run a task
    ///
    /// Fails with a validation error for malformed input and with a
    /// reasoning-service error when analysis cannot be obtained; nothing is
    /// stored in either case. Once analysis succeeds a task is always
    /// returned: `in_progress` on the default path, terminal on the dynamic
    /// path.
    pub async fn execute_task(&self, descriptor: TaskDescriptor) -> Result<Task> {
        let mut task = Task::from_descriptor(descriptor)?;

        let analysis = match self.clients.analysis.analyze(&task, EXECUTE_ACTION).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!(task_id = %task.id, error = %e, "Task analysis failed");
                return Err(e);
            }
        };

        let strategy = analysis.strategy();
        info!(
            task_id = %task.id,
            name = %task.name,
            strategy = strategy.name(),
            "Execution strategy selected"
        );

        match strategy {
            ExecutionStrategy::Dynamic(context) => {
                self.store.put(task.clone());
                let finished = self.pipeline.run(task, &context).await;
                self.store.put(finished.clone());
                info!(task_id = %finished.id, status = %finished.status, "Dynamic task finished");
                Ok(finished)
            }
            ExecutionStrategy::Default => {
                task.mark_in_progress()?;
                self.store.put(task.clone());
                // Detached: the caller never waits on completion
                drop(self.worker.schedule(&task));
                Ok(task)
            }
        }
    }

    /// Current snapshot of a task
    pub fn get_task_status(&self, id: &TaskId) -> Result<Task> {
        self.store.get(id)
    }

    /// All known tasks, newest first
    pub fn list_tasks(&self) -> Vec<Task> {
        self.store.list()
    }

    /// Interrupt the background work of one default-path task
    ///
    /// Returns `false` when the task has no outstanding work.
    pub fn cancel_task(&self, id: &TaskId) -> bool {
        let cancelled = self.worker.cancel(id);
        if cancelled {
            info!(task_id = %id, "Task cancellation requested");
        }
        cancelled
    }

    /// Interrupt outstanding default-path work
    pub fn shutdown(&self) {
        self.worker.shutdown();
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
