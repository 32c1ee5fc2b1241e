//! ripcomp-cli: Command-line driver for ripcomp.

mod complete;
mod health;
mod replay;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ripcomp_core::{BackendKind, Config};
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "ripcomp")]
#[command(about = "Project-wide word completion backed by ripgrep and git grep", long_about = None)]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version and build metadata
    #[arg(short = 'V', long)]
    version: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a prefix as if typed in a file
    Complete {
        /// Word prefix being typed
        prefix: String,

        /// File the prefix is typed in
        #[arg(short, long)]
        file: PathBuf,

        /// Search backend (ripgrep, gitgrep, gitgrep-or-ripgrep)
        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Output format (table, json, plain)
        #[arg(long, default_value = "table")]
        format: String,

        /// Show a highlighted preview under each item (table format)
        #[arg(long)]
        preview: bool,

        /// How long to wait for the search to finish
        #[arg(long, default_value = "5000")]
        timeout_ms: u64,
    },

    /// Replay an editor session script (stdin when no file is given)
    Replay {
        /// Script with `type`, `file`, `toggle-enabled`, `toggle-debug` and `wait` lines
        script: Option<PathBuf>,

        /// File that `type` lines are typed in until a `file` line changes it
        #[arg(short, long, default_value = "scratch.txt")]
        file: PathBuf,

        /// Search backend (ripgrep, gitgrep, gitgrep-or-ripgrep)
        #[arg(short, long)]
        backend: Option<BackendKind>,

        /// Print the invocation log as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that the search tools can be spawned
    Health,

    /// Print the effective configuration
    Config,
}

fn main() -> Result<()> {
    ripcomp_core::logging::init();

    let cli = Cli::parse();

    if cli.version {
        println!("{}", ripcomp_core::build_info::version_string("ripcomp"));
        return Ok(());
    }

    match cli.command {
        Some(Commands::Complete {
            prefix,
            file,
            backend,
            format,
            preview,
            timeout_ms,
        }) => {
            let config = load_config()?;
            let options = complete::Options {
                backend: backend.unwrap_or(config.backend),
                format: format.parse()?,
                preview,
                timeout_ms,
            };
            complete::run(config, &prefix, &file, &options)?;
        }
        Some(Commands::Replay {
            script,
            file,
            backend,
            json,
        }) => {
            let config = load_config()?;
            let source = match &script {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("reading script {}", path.display()))?,
                None => std::io::read_to_string(std::io::stdin())?,
            };
            let steps = replay::parse_script(&source)?;
            let backend = backend.unwrap_or(config.backend);
            replay::run(config, backend, file, &steps, json)?;
        }
        Some(Commands::Health) => {
            if !health::run() {
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            let config = load_config()?;
            print!("{}", config.to_toml()?);
        }
        None => {
            println!("{}", ripcomp_core::build_info::version_string("ripcomp"));
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    let config_path = ripcomp_core::paths::config_path();

    if config_path.exists() {
        debug!("Loading config from {}", config_path.display());
        Config::load(&config_path)
            .with_context(|| format!("loading {}", config_path.display()))
    } else {
        Ok(Config::default())
    }
}
