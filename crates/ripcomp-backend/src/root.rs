//! Project root resolution.

use ripcomp_core::Config;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where a search request is allowed to look.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchScope {
    /// Directory searched by ripgrep: the project root, or the origin file's
    /// directory when falling back.
    pub root: PathBuf,
    /// Nearest enclosing git repository, used by the git-grep backend.
    pub git_root: Option<PathBuf>,
}

/// Resolve the search scope for a request originating in `origin`.
///
/// Returns `None` when no project root marker encloses the origin and
/// `project_root_fallback` is disabled.
pub fn resolve_scope(origin: &Path, config: &Config) -> Option<SearchScope> {
    let start = start_dir(origin);
    let git_root = find_git_root(&start);

    let root = match find_marked_root(&start, &config.project_root_marker) {
        Some(root) => root,
        None if config.project_root_fallback => {
            debug!(
                "No project root above {}, falling back to its directory",
                start.display()
            );
            start
        }
        None => return None,
    };

    Some(SearchScope { root, git_root })
}

/// Find the nearest ancestor of `start` containing a `.git` entry.
///
/// Worktrees and submodules use a `.git` file rather than a directory, so
/// both count.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    find_marked_root(start, &[".git"])
}

fn find_marked_root(start: &Path, markers: &[impl AsRef<str>]) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| {
            markers
                .iter()
                .any(|marker| dir.join(marker.as_ref()).symlink_metadata().is_ok())
        })
        .map(Path::to_path_buf)
}

/// Absolute directory a search starts from.
fn start_dir(origin: &Path) -> PathBuf {
    let absolute = if origin.is_absolute() {
        origin.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(origin))
            .unwrap_or_else(|_| origin.to_path_buf())
    };

    if absolute.is_dir() {
        return absolute;
    }

    match absolute.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
