//! Configuration management for ripcomp.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Which search backend services completion requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Plain ripgrep.
    #[default]
    Ripgrep,
    /// `git grep`, scoped to the enclosing repository.
    #[serde(rename = "gitgrep")]
    GitGrep,
    /// `git grep` inside a repository, ripgrep everywhere else.
    #[serde(rename = "gitgrep-or-ripgrep")]
    GitGrepOrRipgrep,
}

impl BackendKind {
    /// Configuration name of the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            BackendKind::Ripgrep => "ripgrep",
            BackendKind::GitGrep => "gitgrep",
            BackendKind::GitGrepOrRipgrep => "gitgrep-or-ripgrep",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s {
            "ripgrep" | "rg" => Ok(BackendKind::Ripgrep),
            "gitgrep" | "git-grep" => Ok(BackendKind::GitGrep),
            "gitgrep-or-ripgrep" => Ok(BackendKind::GitGrepOrRipgrep),
            other => Err(crate::Error::Config(format!("unknown backend: {other}"))),
        }
    }
}

/// Case sensitivity policy for searches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchCasing {
    #[default]
    IgnoreCase,
    SmartCase,
    CaseSensitive,
}

impl SearchCasing {
    /// Whether a search for `prefix` matches case-insensitively.
    ///
    /// Smart case ignores case unless the prefix has an uppercase letter.
    pub fn ignores_case(self, prefix: &str) -> bool {
        match self {
            SearchCasing::IgnoreCase => true,
            SearchCasing::SmartCase => !prefix.chars().any(char::is_uppercase),
            SearchCasing::CaseSensitive => false,
        }
    }
}

/// Main configuration structure for ripcomp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend used to search for matches.
    pub backend: BackendKind,

    /// Prefixes shorter than this never start a search.
    pub prefix_min_len: usize,

    /// Lines of context shown on each side of a match.
    pub context_size: usize,

    /// Largest file the backend will search, in ripgrep's size syntax (`1M`).
    pub max_filesize: String,

    /// Case sensitivity policy.
    pub search_casing: SearchCasing,

    /// Files or directories that mark a project root.
    pub project_root_marker: Vec<String>,

    /// Search the origin file's directory when no project root is found.
    pub project_root_fallback: bool,

    /// Search roots under these paths are never searched.
    pub ignore_paths: Vec<PathBuf>,

    /// Extra roots searched alongside the project root (ripgrep only).
    pub additional_paths: Vec<PathBuf>,

    /// Extra arguments passed to ripgrep verbatim.
    pub additional_rg_options: Vec<String>,

    /// Whether completion is enabled when a session starts.
    pub enabled: bool,

    /// Whether debug mode is on when a session starts.
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            prefix_min_len: 3,
            context_size: 5,
            max_filesize: "1M".to_string(),
            search_casing: SearchCasing::default(),
            project_root_marker: vec![".git".to_string()],
            project_root_fallback: true,
            ignore_paths: Vec::new(),
            additional_paths: Vec::new(),
            additional_rg_options: Vec::new(),
            enabled: true,
            debug: false,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!("Read configuration from {}", path.display());
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))?;

        config.expand_paths()?;
        config.validate()?;

        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Check values the backends would otherwise reject at spawn time.
    pub fn validate(&self) -> crate::Result<()> {
        if !is_valid_filesize(&self.max_filesize) {
            return Err(crate::Error::Config(format!(
                "invalid max_filesize: {:?} (expected e.g. 512K, 1M, 2G)",
                self.max_filesize
            )));
        }

        if self.project_root_marker.iter().any(|m| m.is_empty()) {
            return Err(crate::Error::Config(
                "project_root_marker entries must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Expand `~` and environment variables in all path fields.
    fn expand_paths(&mut self) -> crate::Result<()> {
        self.ignore_paths = self
            .ignore_paths
            .iter()
            .map(|p| expand_path(p))
            .collect::<crate::Result<_>>()?;
        self.additional_paths = self
            .additional_paths
            .iter()
            .map(|p| expand_path(p))
            .collect::<crate::Result<_>>()?;
        Ok(())
    }
}

/// Expand `~` and `$VAR` references in a single path.
pub fn expand_path(path: &Path) -> crate::Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw)
        .map_err(|e| crate::Error::Config(format!("cannot expand {raw}: {e}")))?;
    Ok(PathBuf::from(expanded.into_owned()))
}

fn is_valid_filesize(value: &str) -> bool {
    let digits = value.trim_end_matches(['K', 'M', 'G']);
    let suffix_len = value.len() - digits.len();
    suffix_len <= 1 && !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
