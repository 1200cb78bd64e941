//! End-to-end `execute` tests against a canned reasoning service

mod common;

use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;

use common::{orchestrator_cmd, write_config, ReasoningStub};

const DEFAULT_ANALYSIS: &str = r#"{"requires_code_generation": false}"#;
const DYNAMIC_ANALYSIS: &str = r#"{"requires_code_generation": true, "language": "java"}"#;
const GENERATED: &str = r#"{"success": true, "code": "public class Job {}"}"#;

/// Run `execute` and parse the task JSON printed on stdout
fn execute(stub: &ReasoningStub, extra: &[&str], expect_success: bool) -> Value {
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &stub.base_url, 200);

    let mut cmd = orchestrator_cmd(home.path());
    cmd.args(["--quiet", "execute", "--name", "sync-report", "--description", "nightly sync"])
        .args(extra)
        .arg("--config")
        .arg(&config);

    let assert = if expect_success {
        cmd.assert().success()
    } else {
        cmd.assert().failure().code(50)
    };

    serde_json::from_slice(&assert.get_output().stdout).unwrap()
}

#[test]
fn test_default_path_returns_in_progress() {
    let stub = ReasoningStub::start(&[("analyze", DEFAULT_ANALYSIS)]);
    let task = execute(&stub, &[], true);

    assert_eq!(task["status"], "in_progress");
    assert_eq!(task["name"], "sync-report");
    assert_eq!(task["description"], "nightly sync");
    assert!(task["createdAt"].is_string());
    assert!(task["updatedAt"].is_string());
}

#[test]
fn test_default_path_wait_reaches_completed() {
    let stub = ReasoningStub::start(&[("analyze", DEFAULT_ANALYSIS)]);
    let task = execute(&stub, &["--wait", "--type", "report"], true);

    assert_eq!(task["status"], "completed");
    assert_eq!(task["taskType"], "report");
    assert_eq!(task["description"], "nightly sync");
}

#[test]
fn test_dynamic_path_completes_with_result() {
    let stub = ReasoningStub::start(&[
        ("analyze", DYNAMIC_ANALYSIS),
        ("generate", GENERATED),
        ("execute", r#"{"success": true, "result": "42 rows synced"}"#),
    ]);
    let task = execute(&stub, &[], true);

    assert_eq!(task["status"], "completed");
    assert_eq!(task["description"], "42 rows synced");
}

#[test]
fn test_dynamic_path_negative_execution_fails() {
    let stub = ReasoningStub::start(&[
        ("analyze", DYNAMIC_ANALYSIS),
        ("generate", GENERATED),
        ("execute", r#"{"success": false, "error": "Code validation failed"}"#),
    ]);
    let task = execute(&stub, &[], false);

    assert_eq!(task["status"], "failed");
    assert_eq!(task["description"], "Dynamic execution failed: Code validation failed");
}

#[test]
fn test_dynamic_path_negative_generation_fails() {
    let stub = ReasoningStub::start(&[
        ("analyze", DYNAMIC_ANALYSIS),
        ("generate", r#"{"success": false, "error": "no template"}"#),
    ]);
    let task = execute(&stub, &[], false);

    assert_eq!(task["status"], "failed");
    assert_eq!(task["description"], "Code generation reported failure: no template");
}

#[test]
fn test_dynamic_path_missing_endpoint_fails_task() {
    // /execute answers 404, which the pipeline records as a failure
    let stub = ReasoningStub::start(&[("analyze", DYNAMIC_ANALYSIS), ("generate", GENERATED)]);
    let task = execute(&stub, &[], false);

    assert_eq!(task["status"], "failed");
    assert!(task["description"]
        .as_str()
        .unwrap()
        .starts_with("Error during dynamic execution"));
}

#[test]
fn test_malformed_analysis_is_reported() {
    let stub = ReasoningStub::start(&[("analyze", r#"{"verdict": "maybe"}"#)]);
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &stub.base_url, 200);

    orchestrator_cmd(home.path())
        .args(["--quiet", "execute", "--name", "sync-report", "--config"])
        .arg(&config)
        .assert()
        .failure()
        .code(30)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("E310"));
}

#[test]
fn test_dynamic_path_request_bodies() {
    let stub = ReasoningStub::start(&[
        ("analyze", DYNAMIC_ANALYSIS),
        ("generate", GENERATED),
        ("execute", r#"{"success": true, "result": "done"}"#),
    ]);
    let task = execute(&stub, &[], true);

    let analyze = stub.bodies("analyze");
    assert_eq!(analyze.len(), 1);
    assert_eq!(analyze[0]["action"], "execute");
    assert_eq!(analyze[0]["task"]["name"], "sync-report");
    assert_eq!(analyze[0]["task"]["id"], task["id"]);

    // The analysis response is forwarded as the generation context
    let generate = stub.bodies("generate");
    assert_eq!(generate.len(), 1);
    assert_eq!(generate[0]["task"]["id"], task["id"]);
    assert_eq!(generate[0]["context"]["requires_code_generation"], true);
    assert_eq!(generate[0]["context"]["language"], "java");

    let executed = stub.bodies("execute");
    assert_eq!(executed.len(), 1);
    assert_eq!(executed[0]["code"], "public class Job {}");
    assert_eq!(executed[0]["task"]["id"], task["id"]);
    assert_eq!(executed[0]["task"]["description"], "nightly sync");
}

#[test]
fn test_default_path_never_generates() {
    let stub = ReasoningStub::start(&[("analyze", DEFAULT_ANALYSIS)]);
    execute(&stub, &[], true);

    assert_eq!(stub.bodies("analyze").len(), 1);
    assert!(stub.bodies("generate").is_empty());
    assert!(stub.bodies("execute").is_empty());
}

#[test]
fn test_wait_timeout_cancels_default_path_work() {
    let stub = ReasoningStub::start(&[("analyze", DEFAULT_ANALYSIS)]);
    let home = TempDir::new().unwrap();
    // Completion would take a minute; the wait gives up after one second
    let config = write_config(home.path(), &stub.base_url, 60_000);

    let assert = orchestrator_cmd(home.path())
        .args(["--quiet", "execute", "--name", "sync-report", "--wait", "--timeout-secs", "1", "--config"])
        .arg(&config)
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .code(50);

    let task: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(task["status"], "failed");
    assert_eq!(task["description"], "Task interrupted before completion");
}

#[test]
fn test_batch_waits_for_every_task() {
    let stub = ReasoningStub::start(&[("analyze", DEFAULT_ANALYSIS)]);
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &stub.base_url, 200);
    let file = home.path().join("tasks.json");
    std::fs::write(
        &file,
        r#"[
            {"name": "sync-report", "description": "nightly sync"},
            {"name": "prune-logs", "taskType": "maintenance"}
        ]"#,
    )
    .unwrap();

    let assert = orchestrator_cmd(home.path())
        .args(["--quiet", "batch", "--wait", "--file"])
        .arg(&file)
        .arg("--config")
        .arg(&config)
        .assert()
        .success();

    let tasks: Vec<Value> = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(tasks.len(), 2);
    assert!(tasks.iter().all(|task| task["status"] == "completed"));

    let mut names: Vec<&str> = tasks.iter().map(|task| task["name"].as_str().unwrap()).collect();
    names.sort_unstable();
    assert_eq!(names, ["prune-logs", "sync-report"]);
    assert_eq!(stub.bodies("analyze").len(), 2);
}

#[test]
fn test_batch_reports_failed_tasks() {
    let stub = ReasoningStub::start(&[
        ("analyze", DYNAMIC_ANALYSIS),
        ("generate", r#"{"success": false, "error": "no template"}"#),
    ]);
    let home = TempDir::new().unwrap();
    let config = write_config(home.path(), &stub.base_url, 200);
    let file = home.path().join("tasks.json");
    std::fs::write(&file, r#"[{"name": "sync-report"}]"#).unwrap();

    let assert = orchestrator_cmd(home.path())
        .args(["--quiet", "batch", "--file"])
        .arg(&file)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .code(50)
        .stderr(predicate::str::contains("1 of 1 tasks failed"));

    let tasks: Vec<Value> = serde_json::from_slice(&assert.get_output().stdout).unwrap();
    assert_eq!(tasks[0]["status"], "failed");
}
