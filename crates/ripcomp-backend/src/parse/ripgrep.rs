//! Parser for `rg --json` output.

use super::{resolve_path, strip_line_ending, BlockLine, FileBlock, OutputParser};
use crate::{BackendTool, MatchResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
enum Message {
    Begin(FileData),
    Match(LineData),
    Context(LineData),
    End(FileData),
    /// Run statistics; nothing in them is used.
    Summary {},
}

#[derive(Debug, Deserialize)]
struct FileData {
    path: Data,
}

#[derive(Debug, Deserialize)]
struct LineData {
    path: Data,
    lines: Data,
    line_number: Option<usize>,
    #[serde(default)]
    submatches: Vec<Submatch>,
}

#[derive(Debug, Deserialize)]
struct Submatch {
    start: usize,
    end: usize,
}

/// ripgrep reports UTF-8 as `text` and anything else base64-encoded as `bytes`.
#[derive(Debug, Deserialize)]
struct Data {
    text: Option<String>,
}

/// Incremental parser for ripgrep's JSON lines.
pub struct RipgrepParser {
    base_dir: PathBuf,
    context_size: usize,
    block: Option<FileBlock>,
}

impl RipgrepParser {
    pub fn new(base_dir: &Path, context_size: usize) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            context_size,
            block: None,
        }
    }

    fn flush(&mut self) -> Vec<MatchResult> {
        self.block
            .take()
            .map(|block| block.into_matches(BackendTool::Ripgrep, self.context_size))
            .unwrap_or_default()
    }

    fn push_data(&mut self, data: LineData, is_match: bool) -> Vec<MatchResult> {
        let (Some(path), Some(text), Some(line_number)) =
            (data.path.text, data.lines.text, data.line_number)
        else {
            return Vec::new();
        };

        let path = resolve_path(&self.base_dir, &path);
        let mut done = Vec::new();
        if self.block.as_ref().map_or(true, |block| block.path != path) {
            done = self.flush();
            self.block = Some(FileBlock::new(path));
        }

        let text = strip_line_ending(&text).to_string();
        let spans = if is_match {
            data.submatches
                .iter()
                .filter(|s| s.start < s.end && s.end <= text.len())
                .map(|s| (s.start, s.end))
                .collect()
        } else {
            Vec::new()
        };

        if let Some(block) = self.block.as_mut() {
            block.push(BlockLine {
                line_number,
                text,
                spans,
            });
        }
        done
    }
}

impl OutputParser for RipgrepParser {
    fn push_line(&mut self, line: &str) -> Vec<MatchResult> {
        let message: Message = match serde_json::from_str(line) {
            Ok(message) => message,
            Err(e) => {
                debug!("Skipping unparseable ripgrep output: {}", e);
                return Vec::new();
            }
        };

        match message {
            Message::Begin(file) => {
                let done = self.flush();
                if let Some(path) = file.path.text {
                    self.block = Some(FileBlock::new(resolve_path(&self.base_dir, &path)));
                }
                done
            }
            Message::Match(data) => self.push_data(data, true),
            Message::Context(data) => self.push_data(data, false),
            Message::End(_) | Message::Summary {} => self.flush(),
        }
    }

    fn finish(&mut self) -> Vec<MatchResult> {
        self.flush()
    }
}
