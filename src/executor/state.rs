//! Task store
//!
//! The canonical record of every known task. All status reads go through
//! here, and every writer (request flows and background workers) commits
//! through here.
//!
//! Writes for a given id are serialized by the write lock and ordered by
//! `Task::revision`: a write carrying an older revision than the stored
//! record is dropped, and a terminal record is never replaced by a
//! non-terminal one.

use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{Task, TaskId};

/// Result of a `put`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutOutcome {
    /// The record was inserted or overwritten
    Applied,
    /// The record was older than what is stored, or would regress a terminal state
    Stale,
}

/// Concurrent map from task id to task record
#[derive(Default)]
pub struct TaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a task record, last writer wins unless the write is stale
    pub fn put(&self, task: Task) -> PutOutcome {
        let mut tasks = self.tasks.write();

        if let Some(existing) = tasks.get(&task.id) {
            if is_stale(existing, &task) {
                warn!(
                    task_id = %task.id,
                    stored_status = %existing.status,
                    stored_revision = existing.revision,
                    incoming_status = %task.status,
                    incoming_revision = task.revision,
                    "Dropping stale task write"
                );
                return PutOutcome::Stale;
            }
        }

        debug!(task_id = %task.id, status = %task.status, revision = task.revision, "Task stored");
        tasks.insert(task.id, task);
        PutOutcome::Applied
    }

    /// Snapshot of a task
    pub fn get(&self, id: &TaskId) -> Result<Task> {
        self.tasks
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| Error::task_not_found(id))
    }

    /// Apply `f` to the latest committed record under the write lock
    ///
    /// Returns the record as committed. If `f` fails the record is left
    /// untouched and the error is returned.
    pub fn update<F>(&self, id: &TaskId, f: F) -> Result<Task>
    where
        F: FnOnce(&mut Task) -> Result<()>,
    {
        let mut tasks = self.tasks.write();
        let stored = tasks.get_mut(id).ok_or_else(|| Error::task_not_found(id))?;

        let mut working = stored.clone();
        f(&mut working)?;
        *stored = working.clone();

        debug!(task_id = %id, status = %working.status, revision = working.revision, "Task updated");
        Ok(working)
    }

    /// All tasks, newest first
    pub fn list(&self) -> Vec<Task> {
        let mut items: Vec<Task> = self.tasks.read().values().cloned().collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items
    }
}

fn is_stale(existing: &Task, incoming: &Task) -> bool {
    incoming.revision < existing.revision
        || (existing.is_terminal() && !incoming.is_terminal())
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
