//! Path filtering helpers (ignore paths).

use std::path::Path;

/// Return `true` if `path` lies inside one of the configured ignore paths.
///
/// Matching is component-wise, so `/work/app` ignores `/work/app/src` but
/// not `/work/application`.
pub fn is_ignored_path(path: &Path, ignore_paths: &[impl AsRef<Path>]) -> bool {
    ignore_paths.iter().any(|ignored| {
        let ignored = ignored.as_ref();
        !ignored.as_os_str().is_empty() && path.starts_with(ignored)
    })
}
