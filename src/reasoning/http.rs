//! HTTP client for the reasoning service
//!
//! Posts JSON to `<base_url>/analyze`, `<base_url>/generate` and
//! `<base_url>/execute`. Every call is a single attempt bounded by the
//! configured request timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::ReasoningSettings;
use crate::error::{Error, Result};
use crate::types::{AnalysisResult, CodeGenResult, ExecResult, Task};

use super::{AnalysisClient, CodeExecClient, CodeGenClient};

// ─────────────────────────────────────────────────────────────────
// Request bodies
// ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    task: &'a Task,
    action: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    task: &'a Task,
    context: &'a Value,
}

#[derive(Debug, Serialize)]
struct ExecuteRequest<'a> {
    task: &'a Task,
    code: &'a Value,
}

// ─────────────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────────────

/// Reasoning service reached over HTTP
pub struct HttpReasoningClient {
    base_url: String,
    client: Client,
}

impl HttpReasoningClient {
    /// Create a client from the `[reasoning]` settings
    pub fn new(settings: &ReasoningSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = settings.base_url.trim_end_matches('/').to_string();

        info!(
            base_url = %base_url,
            timeout_secs = settings.timeout_secs,
            "Reasoning service client created"
        );

        Ok(Self { base_url, client })
    }

    fn endpoint_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    /// POST `body` to `endpoint` and decode the JSON response
    async fn post<B, R>(&self, endpoint: &str, body: &B) -> Result<R>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        let url = self.endpoint_url(endpoint);
        debug!(url = %url, "Calling reasoning service");

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    "request timed out"
                } else if e.is_connect() {
                    "connection failed"
                } else {
                    "request failed"
                };
                warn!(url = %url, error = %e, "Reasoning service {}", kind);
                Error::service_unavailable(&url, format!("{}: {}", kind, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(url = %url, status = %status, "Reasoning service returned an error status");
            return Err(Error::service_unavailable(
                &url,
                format!("HTTP {}: {}", status, body.trim()),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::service_unavailable(&url, format!("failed to read response: {}", e)))?;

        decode_body(&url, &bytes)
    }
}

/// Decode a 2xx response body; an unusable body is a negative result
fn decode_body<R: DeserializeOwned>(url: &str, bytes: &[u8]) -> Result<R> {
    serde_json::from_slice(bytes)
        .map_err(|e| Error::negative_result(url, format!("malformed response: {}", e)))
}

#[async_trait]
impl AnalysisClient for HttpReasoningClient {
    async fn analyze(&self, task: &Task, action: &str) -> Result<AnalysisResult> {
        let body: Value = self.post("analyze", &AnalyzeRequest { task, action }).await?;
        AnalysisResult::from_response(body).ok_or_else(|| {
            Error::negative_result(
                self.endpoint_url("analyze"),
                "response did not include a boolean requires_code_generation",
            )
        })
    }
}

#[async_trait]
impl CodeGenClient for HttpReasoningClient {
    async fn generate(&self, task: &Task, context: &Value) -> Result<Value> {
        let response: CodeGenResult = self.post("generate", &GenerateRequest { task, context }).await?;
        response
            .into_code()
            .map_err(|reason| Error::negative_result(self.endpoint_url("generate"), reason))
    }
}

#[async_trait]
impl CodeExecClient for HttpReasoningClient {
    async fn execute(&self, task: &Task, code: &Value) -> Result<String> {
        let response: ExecResult = self.post("execute", &ExecuteRequest { task, code }).await?;
        response
            .into_text()
            .map_err(|reason| Error::negative_result(self.endpoint_url("execute"), reason))
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
