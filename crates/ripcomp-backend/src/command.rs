//! Search command construction for each backend.

use crate::root::SearchScope;
use ripcomp_core::{BackendKind, Config, SearchCasing};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// The external tool that services a search command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendTool {
    Ripgrep,
    GitGrep,
}

impl BackendTool {
    /// Name used in log messages, e.g. "killed previous RipgrepBackend invocation".
    pub fn backend_name(self) -> &'static str {
        match self {
            BackendTool::Ripgrep => "RipgrepBackend",
            BackendTool::GitGrep => "GitGrepBackend",
        }
    }

    /// Short tag shown next to completion labels.
    pub fn tag(self) -> &'static str {
        match self {
            BackendTool::Ripgrep => "rg",
            BackendTool::GitGrep => "git",
        }
    }

    /// Executable spawned for this tool.
    pub fn program(self) -> &'static str {
        match self {
            BackendTool::Ripgrep => "rg",
            BackendTool::GitGrep => "git",
        }
    }
}

impl fmt::Display for BackendTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.backend_name())
    }
}

/// A fully built external search command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchCommand {
    /// Tool that services the command.
    pub tool: BackendTool,
    /// Executable name.
    pub program: String,
    /// Ordered argument list.
    pub args: Vec<String>,
    /// Directory relative output paths are resolved against.
    pub base_dir: PathBuf,
}

impl SearchCommand {
    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// A shell-quoted line reproducing the command verbatim.
    pub fn shell_line(&self) -> String {
        self.argv()
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Build a `std::process::Command` for this search.
    pub fn to_process_command(&self) -> std::process::Command {
        let mut command = std::process::Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// Everything the builder needs to turn a prefix into a command.
#[derive(Debug, Clone, Copy)]
pub struct CommandInput<'a> {
    pub backend: BackendKind,
    pub scope: &'a SearchScope,
    pub prefix: &'a str,
    pub config: &'a Config,
}

/// Build the command for `input`, or `None` when no search should run.
///
/// Prefixes shorter than `prefix_min_len`, or containing whitespace, produce
/// no command. The git-grep backend produces no command outside a repository.
pub fn build_command(input: CommandInput<'_>) -> Option<SearchCommand> {
    let prefix = input.prefix;
    if prefix.is_empty()
        || prefix.chars().count() < input.config.prefix_min_len
        || prefix.chars().any(char::is_whitespace)
    {
        return None;
    }

    match input.backend {
        BackendKind::Ripgrep => Some(ripgrep_command(input)),
        BackendKind::GitGrep => git_grep_command(input),
        BackendKind::GitGrepOrRipgrep => {
            git_grep_command(input).or_else(|| Some(ripgrep_command(input)))
        }
    }
}

fn ripgrep_command(input: CommandInput<'_>) -> SearchCommand {
    let config = input.config;
    let casing = match config.search_casing {
        SearchCasing::IgnoreCase => "--ignore-case",
        SearchCasing::SmartCase => "--smart-case",
        SearchCasing::CaseSensitive => "--case-sensitive",
    };

    let mut args = vec![
        "--no-config".to_string(),
        "--json".to_string(),
        "--word-regexp".to_string(),
        format!("--max-filesize={}", config.max_filesize),
        casing.to_string(),
        format!("--context={}", config.context_size),
    ];
    args.extend(config.additional_rg_options.iter().cloned());
    args.push("--".to_string());
    args.push(format!("{}[\\w_-]+", escape_pattern(input.prefix)));
    args.push(input.scope.root.to_string_lossy().into_owned());
    args.extend(
        config
            .additional_paths
            .iter()
            .map(|p| p.to_string_lossy().into_owned()),
    );

    SearchCommand {
        tool: BackendTool::Ripgrep,
        program: BackendTool::Ripgrep.program().to_string(),
        args,
        base_dir: input.scope.root.clone(),
    }
}

fn git_grep_command(input: CommandInput<'_>) -> Option<SearchCommand> {
    let repo_root = input.scope.git_root.as_ref()?;
    let config = input.config;

    let ignore_case = config.search_casing.ignores_case(input.prefix);

    let mut args = vec![
        "-C".to_string(),
        repo_root.to_string_lossy().into_owned(),
        "grep".to_string(),
        "--recurse-submodules".to_string(),
        "--null".to_string(),
        "--line-number".to_string(),
        "--column".to_string(),
        "--no-color".to_string(),
        "--extended-regexp".to_string(),
        "--word-regexp".to_string(),
    ];
    if ignore_case {
        args.push("--ignore-case".to_string());
    }
    args.push(format!("--context={}", config.context_size));
    args.push("-e".to_string());
    args.push(format!("{}[[:alnum:]_-]+", escape_pattern(input.prefix)));

    Some(SearchCommand {
        tool: BackendTool::GitGrep,
        program: BackendTool::GitGrep.program().to_string(),
        args,
        base_dir: repo_root.clone(),
    })
}

/// Escape regex metacharacters shared by ripgrep and POSIX extended syntax.
fn escape_pattern(prefix: &str) -> String {
    let mut out = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(
            ch,
            '\\' | '.' | '+' | '*' | '?' | '(' | ')' | '|' | '[' | ']' | '{' | '}' | '^' | '$'
        ) {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

fn shell_quote(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/' | '=' | ':' | ','));
    if safe {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
