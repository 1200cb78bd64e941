//! Scripted reasoning service for testing
//!
//! Answers each contract with a configured reply and counts calls, so the
//! orchestrator and pipeline can be driven through every branch without a
//! network.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::types::{AnalysisResult, Task};

use super::{AnalysisClient, CodeExecClient, CodeGenClient};

/// Scripted reply for one contract
#[derive(Debug, Clone)]
pub enum MockReply<T> {
    Ok(T),
    /// The service answered with `success=false` and this reason
    Negative(String),
    /// The service could not be reached
    Unavailable(String),
}

impl<T: Clone> MockReply<T> {
    fn resolve(&self, endpoint: &str) -> Result<T> {
        match self {
            MockReply::Ok(value) => Ok(value.clone()),
            MockReply::Negative(reason) => Err(Error::negative_result(endpoint, reason.clone())),
            MockReply::Unavailable(message) => Err(Error::service_unavailable(endpoint, message.clone())),
        }
    }
}

/// Configuration for mock service behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub analyze: MockReply<bool>,
    pub generate: MockReply<Value>,
    pub execute: MockReply<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            analyze: MockReply::Ok(false),
            generate: MockReply::Ok(json!("public class GeneratedJob {}")),
            execute: MockReply::Ok("executed".to_string()),
        }
    }
}

/// Track method call counts for verification
#[derive(Debug, Default, Clone)]
struct CallCounts {
    analyze: u32,
    generate: u32,
    execute: u32,
}

/// In-process stand-in for the reasoning service
pub struct MockReasoningService {
    config: MockConfig,
    call_counts: RwLock<CallCounts>,
    last_context: RwLock<Option<Value>>,
    last_code: RwLock<Option<Value>>,
    last_task: RwLock<Option<Task>>,
}

impl MockReasoningService {
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    pub fn with_config(config: MockConfig) -> Self {
        Self {
            config,
            call_counts: RwLock::new(CallCounts::default()),
            last_context: RwLock::new(None),
            last_code: RwLock::new(None),
            last_task: RwLock::new(None),
        }
    }

    /// Analysis says "default path"
    pub fn default_path() -> Self {
        Self::new()
    }

    /// Analysis says "dynamic path"; generation and execution use the given replies
    pub fn dynamic_path(generate: MockReply<Value>, execute: MockReply<String>) -> Self {
        Self::with_config(MockConfig {
            analyze: MockReply::Ok(true),
            generate,
            execute,
        })
    }

    /// Get the number of times a contract was called
    pub fn call_count(&self, method: &str) -> u32 {
        let counts = self.call_counts.read();
        match method {
            "analyze" => counts.analyze,
            "generate" => counts.generate,
            "execute" => counts.execute,
            _ => 0,
        }
    }

    /// Context passed to the most recent `generate` call
    pub fn last_context(&self) -> Option<Value> {
        self.last_context.read().clone()
    }

    /// Code passed to the most recent `execute` call
    pub fn last_code(&self) -> Option<Value> {
        self.last_code.read().clone()
    }

    /// Task passed to the most recent call of any contract
    pub fn last_task(&self) -> Option<Task> {
        self.last_task.read().clone()
    }
}

impl Default for MockReasoningService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AnalysisClient for MockReasoningService {
    async fn analyze(&self, task: &Task, action: &str) -> Result<AnalysisResult> {
        self.call_counts.write().analyze += 1;
        *self.last_task.write() = Some(task.clone());
        let requires = self.config.analyze.resolve("mock://analyze")?;
        let body = json!({ "requires_code_generation": requires, "action": action });
        AnalysisResult::from_response(body)
            .ok_or_else(|| Error::Internal("mock analysis produced an invalid body".to_string()))
    }
}

#[async_trait]
impl CodeGenClient for MockReasoningService {
    async fn generate(&self, task: &Task, context: &Value) -> Result<Value> {
        self.call_counts.write().generate += 1;
        *self.last_task.write() = Some(task.clone());
        *self.last_context.write() = Some(context.clone());
        self.config.generate.resolve("mock://generate")
    }
}

#[async_trait]
impl CodeExecClient for MockReasoningService {
    async fn execute(&self, task: &Task, code: &Value) -> Result<String> {
        self.call_counts.write().execute += 1;
        *self.last_task.write() = Some(task.clone());
        *self.last_code.write() = Some(code.clone());
        self.config.execute.resolve("mock://execute")
    }
}
