//! Search requests issued per qualifying edit.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A prefix typed in `origin_file` at `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchRequest {
    pub prefix: String,
    pub origin_file: PathBuf,
    pub timestamp: DateTime<Utc>,
}

impl SearchRequest {
    pub fn new(prefix: impl Into<String>, origin_file: impl AsRef<Path>) -> Self {
        Self {
            prefix: prefix.into(),
            origin_file: origin_file.as_ref().to_path_buf(),
            timestamp: Utc::now(),
        }
    }
}
