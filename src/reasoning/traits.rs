//! Reasoning-service client contracts
//!
//! Each contract is one request/response exchange with a single attempt.
//! Implementations report transport failures as
//! [`Error::ServiceUnavailable`](crate::error::Error::ServiceUnavailable)
//! and application-level negative answers as
//! [`Error::NegativeResult`](crate::error::Error::NegativeResult); no other
//! error variants are produced.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::types::{AnalysisResult, Task};

/// Action requested from `/analyze` by the orchestrator
pub const EXECUTE_ACTION: &str = "execute";

/// Asks the reasoning service how a task should be carried out
#[async_trait]
pub trait AnalysisClient: Send + Sync {
    async fn analyze(&self, task: &Task, action: &str) -> Result<AnalysisResult>;
}

/// Asks the reasoning service to generate code for a task
#[async_trait]
pub trait CodeGenClient: Send + Sync {
    /// Returns the generated code; `success=false` or a response without
    /// code is a negative result
    async fn generate(&self, task: &Task, context: &Value) -> Result<Value>;
}

/// Asks the reasoning service to run previously generated code
#[async_trait]
pub trait CodeExecClient: Send + Sync {
    /// Returns the result text; `success=false` is a negative result
    async fn execute(&self, task: &Task, code: &Value) -> Result<String>;
}

/// The three reasoning-service contracts bundled for wiring
#[derive(Clone)]
pub struct ReasoningClients {
    pub analysis: Arc<dyn AnalysisClient>,
    pub codegen: Arc<dyn CodeGenClient>,
    pub exec: Arc<dyn CodeExecClient>,
}

impl ReasoningClients {
    /// Use one service implementation for all three contracts
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: AnalysisClient + CodeGenClient + CodeExecClient + 'static,
    {
        Self {
            analysis: service.clone(),
            codegen: service.clone(),
            exec: service,
        }
    }
}
