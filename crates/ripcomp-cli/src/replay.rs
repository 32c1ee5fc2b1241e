//! Editor session replay.
//!
//! A script is one step per line:
//!
//! ```text
//! # comments and blank lines are skipped
//! file src/main.rs
//! type hel
//! type hell
//! toggle-debug
//! type hello
//! wait 2000
//! toggle-enabled
//! ```
//!
//! `type` issues a completion request without waiting, the way an editor
//! does on every keystroke. `wait` blocks until the running search finishes
//! (default 5000ms).

use anyhow::Result;
use owo_colors::OwoColorize;
use ripcomp_controller::{Invocation, InvocationStatus, Outcome, SearchController};
use ripcomp_core::{BackendKind, Config, Error};
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_WAIT: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Type(String),
    File(PathBuf),
    ToggleEnabled,
    ToggleDebug,
    Wait(Duration),
}

pub fn parse_script(source: &str) -> ripcomp_core::Result<Vec<Step>> {
    let mut steps = Vec::new();
    for (index, raw) in source.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };
        let step = match (word, arg) {
            ("type", "") | ("file", "") => {
                return Err(Error::Parse(format!(
                    "line {}: `{word}` needs an argument",
                    index + 1
                )))
            }
            ("type", prefix) => Step::Type(prefix.to_string()),
            ("file", path) => Step::File(PathBuf::from(path)),
            ("toggle-enabled", "") => Step::ToggleEnabled,
            ("toggle-debug", "") => Step::ToggleDebug,
            ("wait", "") => Step::Wait(DEFAULT_WAIT),
            ("wait", ms) => {
                let ms: u64 = ms.parse().map_err(|_| {
                    Error::Parse(format!("line {}: bad wait duration `{ms}`", index + 1))
                })?;
                Step::Wait(Duration::from_millis(ms))
            }
            _ => {
                return Err(Error::Parse(format!(
                    "line {}: unknown step `{line}`",
                    index + 1
                )))
            }
        };
        steps.push(step);
    }
    Ok(steps)
}

pub fn run(
    config: Config,
    backend: BackendKind,
    file: PathBuf,
    steps: &[Step],
    json: bool,
) -> Result<()> {
    let mut controller = SearchController::with_backend(config, backend);
    let mut origin = file;

    for step in steps {
        match step {
            Step::Type(prefix) => {
                controller.request(prefix, &origin);
            }
            Step::File(path) => origin = path.clone(),
            Step::ToggleEnabled => {
                controller.toggle_enabled();
            }
            Step::ToggleDebug => {
                controller.toggle_debug();
            }
            Step::Wait(timeout) => {
                controller.wait_idle(*timeout);
            }
        }
    }
    controller.wait_idle(DEFAULT_WAIT);

    if json {
        let report = serde_json::json!({
            "invocations": controller.invocations(),
            "messages": controller.messages(),
        });
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "Invocations".bold());
    for invocation in controller.invocations() {
        println!(
            "  #{:<3} {:<10} {}",
            invocation.id,
            status_label(invocation),
            invocation.descriptor.summary().join(" ")
        );
    }
    println!("{}", "Messages".bold());
    for message in controller.messages() {
        println!("  {message}");
    }

    Ok(())
}

fn status_label(invocation: &Invocation) -> String {
    match (invocation.status, &invocation.outcome) {
        (InvocationStatus::Completed, Some(Outcome::Matches)) => {
            format!("matches({})", invocation.results.len())
        }
        (InvocationStatus::Completed, Some(Outcome::NoMatches)) => "no-matches".to_string(),
        (InvocationStatus::Completed, Some(Outcome::Error(_))) => "error".to_string(),
        (InvocationStatus::Completed, None) => "completed".to_string(),
        (InvocationStatus::Pending, _) => "pending".to_string(),
        (InvocationStatus::Running, _) => "running".to_string(),
        (InvocationStatus::Killed, _) => "killed".to_string(),
        (InvocationStatus::Skipped, _) => "skipped".to_string(),
    }
}
