//! Search tool availability report.

use owo_colors::OwoColorize;
use ripcomp_backend::BackendTool;
use std::process::{Command, Stdio};
use tracing::debug;

/// Result of probing one search tool.
#[derive(Debug)]
pub struct ToolHealth {
    pub tool: BackendTool,
    pub status: Result<String, String>,
}

pub fn probe(tool: BackendTool) -> ToolHealth {
    let program = tool.program();
    debug!("Probing {program}");
    let status = match Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .output()
    {
        Ok(output) if output.status.success() => Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .next()
            .unwrap_or("")
            .trim()
            .to_string()),
        Ok(output) => Err(format!("{program} --version exited with {}", output.status)),
        Err(err) => Err(format!("failed to spawn {program}: {err}")),
    };
    ToolHealth { tool, status }
}

/// Print one line per tool; returns whether every tool is usable.
pub fn run() -> bool {
    let mut healthy = true;
    for tool in [BackendTool::Ripgrep, BackendTool::GitGrep] {
        let report = probe(tool);
        match &report.status {
            Ok(version) => println!(
                "{} {:<16} {}",
                "ok".green(),
                report.tool.backend_name(),
                version.dimmed()
            ),
            Err(reason) => {
                healthy = false;
                println!("{} {:<16} {}", "FAIL".red(), report.tool.backend_name(), reason);
            }
        }
    }
    healthy
}
