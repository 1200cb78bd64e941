//! Build script for the automation orchestrator
//!
//! Embeds the git revision, build timestamp, target and compiler version
//! so `automation-orchestrator version` can report them.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");

    let git_hash = run_capture("git", &["rev-parse", "--short=8", "HEAD"]);
    let git_dirty = match Command::new("git").args(["status", "--porcelain"]).output() {
        Ok(output) if output.status.success() => (!output.stdout.is_empty()).to_string(),
        _ => "unknown".to_string(),
    };

    let vars = [
        ("AUTOMATION_GIT_HASH", git_hash),
        ("AUTOMATION_GIT_DIRTY", git_dirty),
        (
            "AUTOMATION_BUILD_TIMESTAMP",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        ),
        ("AUTOMATION_TARGET", env_or_unknown("TARGET")),
        ("AUTOMATION_PROFILE", env_or_unknown("PROFILE")),
        ("AUTOMATION_RUSTC_VERSION", run_capture("rustc", &["--version"])),
    ];

    for (key, value) in vars {
        println!("cargo:rustc-env={}={}", key, value);
    }
}

/// Run a command and return its trimmed stdout, or "unknown"
fn run_capture(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn env_or_unknown(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| "unknown".to_string())
}
