//! One-shot completion: a single request, waited on, printed.

use anyhow::{bail, Result};
use owo_colors::OwoColorize;
use ripcomp_controller::SearchController;
use ripcomp_core::{BackendKind, Config};
use ripcomp_preview::{present, CompletionItem, Highlighter};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Table,
    Json,
    Plain,
}

impl FromStr for Format {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "table" => Ok(Format::Table),
            "json" => Ok(Format::Json),
            "plain" => Ok(Format::Plain),
            other => bail!("unknown format: {other} (expected table, json or plain)"),
        }
    }
}

pub struct Options {
    pub backend: BackendKind,
    pub format: Format,
    pub preview: bool,
    pub timeout_ms: u64,
}

pub fn run(config: Config, prefix: &str, file: &Path, options: &Options) -> Result<()> {
    let context_size = config.context_size;
    let mut controller = SearchController::with_backend(config, options.backend);

    controller.request(prefix, file);
    if !controller.wait_idle(Duration::from_millis(options.timeout_ms)) {
        warn!("Search still running after {}ms", options.timeout_ms);
    }

    for message in controller.messages() {
        eprintln!("{message}");
    }

    let items = present(controller.presentable_results(), prefix, context_size);

    match options.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&items)?),
        Format::Plain => {
            for item in &items {
                println!("{}", item.insert_text);
            }
        }
        Format::Table => print_table(&items, options.preview),
    }

    Ok(())
}

fn print_table(items: &[CompletionItem], preview: bool) {
    if items.is_empty() {
        println!("{}", "No completions".dimmed());
        return;
    }

    println!("{:<32} {:<5} LOCATION", "WORD", "TOOL");
    let highlighter = preview.then(Highlighter::new);
    for item in items {
        let location = item
            .documentation
            .match_line()
            .map(|line| format!("{}:{}", item.documentation.path.display(), line.line_number))
            .unwrap_or_else(|| item.documentation.path.display().to_string());
        println!(
            "{:<32} {:<5} {}",
            item.insert_text.bold(),
            item.tool.tag(),
            location.dimmed()
        );
        if let Some(highlighter) = &highlighter {
            print!("{}", highlighter.render_ansi(&item.documentation));
        }
    }
}
