//! Default completion worker
//!
//! Background completion for tasks on the default path. Each scheduled task
//! waits for a slot in a bounded pool, then for the completion interval,
//! and is then moved to `completed` through the store. Cancelling a task
//! (or shutting the worker down) before that point moves it to `failed`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Error;
use crate::types::{Task, TaskId, TaskStatus};

use super::TaskStore;

/// Description recorded on tasks whose background work was interrupted
pub const INTERRUPTED_DESCRIPTION: &str = "Task interrupted before completion";

// ─────────────────────────────────────────────────────────────────
// Worker Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for the completion worker
#[derive(Debug, Clone)]
pub struct CompletionWorkerConfig {
    /// How long default-path work takes before the task completes
    pub completion_interval: Duration,

    /// Maximum completions waiting on their interval at once
    pub max_concurrent: usize,
}

impl Default for CompletionWorkerConfig {
    fn default() -> Self {
        Self {
            completion_interval: Duration::from_secs(5),
            max_concurrent: 8,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Completion Worker
// ─────────────────────────────────────────────────────────────────

type ActiveMap = Arc<Mutex<HashMap<TaskId, (u64, CancellationToken)>>>;

/// Completes default-path tasks asynchronously
pub struct DefaultCompletionWorker {
    store: Arc<TaskStore>,
    config: CompletionWorkerConfig,
    permits: Arc<Semaphore>,
    root: CancellationToken,
    active: ActiveMap,
    next_generation: AtomicU64,
}

impl DefaultCompletionWorker {
    pub fn new(store: Arc<TaskStore>, config: CompletionWorkerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            store,
            config,
            permits,
            root: CancellationToken::new(),
            active: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
        }
    }

    /// Start background completion for a task already stored as `in_progress`
    ///
    /// The outcome is only committed while the stored record is still the
    /// run that was scheduled: same revision and still `in_progress`. Work
    /// replaced by a later `schedule` for the same id commits nothing.
    /// Must be called from within a tokio runtime.
    pub fn schedule(&self, task: &Task) -> JoinHandle<()> {
        let id = task.id;
        let scheduled_revision = task.revision;
        let token = self.root.child_token();
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);

        if let Some((_, previous)) = self.active.lock().insert(id, (generation, token.clone())) {
            debug!(task_id = %id, "Replacing background work scheduled for a reused id");
            previous.cancel();
        }

        info!(
            task_id = %id,
            revision = scheduled_revision,
            interval_ms = self.config.completion_interval.as_millis() as u64,
            "Background completion scheduled"
        );

        let store = self.store.clone();
        let permits = self.permits.clone();
        let active = self.active.clone();
        let interval = self.config.completion_interval;

        tokio::spawn(async move {
            let finished = tokio::select! {
                biased;
                _ = token.cancelled() => false,
                finished = wait_for_completion(permits, interval) => finished,
            };

            // Deregister first; a mismatch means a later schedule owns this id
            let superseded = {
                let mut active = active.lock();
                match active.get(&id) {
                    Some((g, _)) if *g == generation => {
                        active.remove(&id);
                        false
                    }
                    _ => true,
                }
            };
            if superseded {
                debug!(task_id = %id, "Background work superseded, nothing to record");
                return;
            }

            let committed = store.update(&id, |t| {
                if t.revision != scheduled_revision || t.status != TaskStatus::InProgress {
                    return Err(Error::Cancelled { task_id: id.to_string() });
                }
                if finished {
                    t.mark_completed(None)
                } else {
                    t.mark_failed(INTERRUPTED_DESCRIPTION)
                }
            });

            match committed {
                Ok(task) if finished => info!(task_id = %id, status = %task.status, "Task completed"),
                Ok(task) => warn!(task_id = %id, status = %task.status, "Task interrupted"),
                Err(Error::Cancelled { .. }) => {
                    debug!(task_id = %id, "Task record moved on, background outcome dropped")
                }
                Err(e) => warn!(task_id = %id, error = %e, "Background completion could not be recorded"),
            }
        })
    }

    /// Interrupt the background work for one task
    pub fn cancel(&self, id: &TaskId) -> bool {
        match self.active.lock().get(id) {
            Some((_, token)) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    /// Interrupt all outstanding work; later schedules fail immediately
    pub fn shutdown(&self) {
        info!(active = self.active_count(), "Shutting down completion worker");
        self.root.cancel();
    }

    /// Number of tasks whose background work has not finished
    pub fn active_count(&self) -> usize {
        self.active.lock().len()
    }
}

/// Hold a pool slot for the completion interval
async fn wait_for_completion(permits: Arc<Semaphore>, interval: Duration) -> bool {
    let Ok(_permit) = permits.acquire_owned().await else {
        return false;
    };
    tokio::time::sleep(interval).await;
    true
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
