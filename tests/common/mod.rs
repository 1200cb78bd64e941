//! Common test utilities and fixtures
//!
//! Shared infrastructure for the binary-level tests: an isolated command
//! environment and a canned reasoning service on a loopback port.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use assert_cmd::Command;
use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Environment variables that would leak host configuration into a test
const AMBIENT_ENV: &[&str] = &[
    "AUTOMATION_CONFIG",
    "AUTOMATION_REASONING_URL",
    "AUTOMATION_REASONING_TIMEOUT_SECS",
    "AUTOMATION_COMPLETION_INTERVAL_MS",
    "AUTOMATION_MAX_CONCURRENT",
    "AUTOMATION_LOG_LEVEL",
    "AUTOMATION_LOG_FILE",
    "AUTOMATION_LOG_JSON",
    "RUST_LOG",
];

/// Command for the orchestrator binary, isolated from host config files
pub fn orchestrator_cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("automation-orchestrator").unwrap();
    cmd.current_dir(home)
        .env("HOME", home)
        .env("XDG_CONFIG_HOME", home.join(".config"));
    for var in AMBIENT_ENV {
        cmd.env_remove(var);
    }
    cmd
}

/// Write a config file pointing at `base_url`
pub fn write_config(dir: &Path, base_url: &str, completion_interval_ms: u64) -> std::path::PathBuf {
    let path = dir.join("orchestrator.toml");
    let content = format!(
        "[reasoning]\nbase_url = \"{}\"\ntimeout_secs = 5\n\n[worker]\ncompletion_interval_ms = {}\n",
        base_url, completion_interval_ms
    );
    std::fs::write(&path, content).unwrap();
    path
}

/// Request the stub received
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub endpoint: String,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    routes: Arc<HashMap<String, Value>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

/// Reasoning service stub answering each endpoint with a fixed JSON body
pub struct ReasoningStub {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl ReasoningStub {
    /// Serve `routes` (endpoint name -> JSON body) until the test process exits
    ///
    /// Endpoints without a route answer 404.
    pub fn start(routes: &[(&str, &str)]) -> Self {
        let routes: HashMap<String, Value> = routes
            .iter()
            .map(|(endpoint, body)| (endpoint.to_string(), serde_json::from_str(body).unwrap()))
            .collect();
        let state = StubState {
            routes: Arc::new(routes),
            requests: Arc::new(Mutex::new(Vec::new())),
        };
        let requests = state.requests.clone();

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let port = listener.local_addr().unwrap().port();

        let app = Router::new()
            .route("/api/llm/{endpoint}", post(answer))
            .with_state(state);

        thread::spawn(move || {
            runtime.block_on(async move {
                axum::serve(listener, app).await.unwrap();
            });
        });

        Self {
            base_url: format!("http://127.0.0.1:{}/api/llm", port),
            requests,
        }
    }

    /// Bodies received on `endpoint`, oldest first
    pub fn bodies(&self, endpoint: &str) -> Vec<Value> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|request| request.endpoint == endpoint)
            .map(|request| request.body.clone())
            .collect()
    }
}

async fn answer(
    State(state): State<StubState>,
    UrlPath(endpoint): UrlPath<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let reply = state.routes.get(&endpoint).cloned();
    state.requests.lock().unwrap().push(RecordedRequest { endpoint, body });

    match reply {
        Some(reply) => (StatusCode::OK, Json(reply)),
        None => (StatusCode::NOT_FOUND, Json(json!({}))),
    }
}
