//! Parsers turning backend stdout into match results.
//!
//! Both backends emit a file's matches and context lines interleaved; the
//! parsers buffer one file block at a time and attach every buffered line
//! within `context_size` of a match to that match.

mod git_grep;
mod ripgrep;

pub use git_grep::GitGrepParser;
pub use ripgrep::RipgrepParser;

use crate::BackendTool;
use ripcomp_core::SearchCasing;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A line surrounding a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextLine {
    pub line_number: usize,
    pub text: String,
}

/// One matched word reported by a backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// File containing the match.
    pub path: PathBuf,
    /// 1-based line number of the match.
    pub line_number: usize,
    /// 1-based byte column where the matched word starts.
    pub column: usize,
    /// Full text of the matching line, without its line terminator.
    pub line: String,
    /// The matched word.
    pub matched_text: String,
    /// Byte offset of the matched word within `line`.
    pub match_start: usize,
    /// Byte offset one past the end of the matched word within `line`.
    pub match_end: usize,
    /// Surrounding lines in ascending order, excluding the match line.
    pub context: Vec<ContextLine>,
    /// Tool that produced the match.
    pub tool: BackendTool,
}

/// Incremental parser over a backend's stdout, one line at a time.
pub trait OutputParser {
    /// Feed one stdout line; returns matches whose file block is complete.
    fn push_line(&mut self, line: &str) -> Vec<MatchResult>;

    /// Flush whatever is still buffered once the process has exited.
    fn finish(&mut self) -> Vec<MatchResult>;
}

/// Parser for the given tool's output format.
///
/// ripgrep reports every submatch itself; git grep only reports where the
/// first match on a line starts, so its parser uses `matcher` to find the rest.
pub fn parser_for(
    tool: BackendTool,
    base_dir: &Path,
    context_size: usize,
    matcher: WordMatcher,
) -> Box<dyn OutputParser> {
    match tool {
        BackendTool::Ripgrep => Box::new(RipgrepParser::new(base_dir, context_size)),
        BackendTool::GitGrep => Box::new(GitGrepParser::new(base_dir, context_size, matcher)),
    }
}

/// Finds the words on a line that complete a prefix.
///
/// A candidate starts at a word boundary, begins with the prefix and
/// continues with at least one more word character or `-`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordMatcher {
    prefix: Vec<char>,
    ignore_case: bool,
}

impl WordMatcher {
    pub fn new(prefix: &str, casing: SearchCasing) -> Self {
        Self {
            prefix: prefix.chars().collect(),
            ignore_case: casing.ignores_case(prefix),
        }
    }

    /// `(start, end)` byte spans of every candidate on `text`, left to right.
    pub fn spans(&self, text: &str) -> Vec<(usize, usize)> {
        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let byte_at = |i: usize| chars.get(i).map_or(text.len(), |&(b, _)| b);

        let mut spans = Vec::new();
        let mut i = 0;
        while i < chars.len() {
            let at_boundary = i == 0 || !is_word_char(chars[i - 1].1);
            if at_boundary && self.prefix_at(&chars[i..]) {
                let after_prefix = i + self.prefix.len();
                let end = chars[after_prefix..]
                    .iter()
                    .take_while(|&&(_, c)| is_word_char(c) || c == '-')
                    .count()
                    + after_prefix;
                if end > after_prefix {
                    spans.push((byte_at(i), byte_at(end)));
                    i = end;
                    continue;
                }
            }
            i += 1;
        }
        spans
    }

    fn prefix_at(&self, chars: &[(usize, char)]) -> bool {
        chars.len() >= self.prefix.len()
            && self
                .prefix
                .iter()
                .zip(chars)
                .all(|(&p, &(_, c))| same_char(p, c, self.ignore_case))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn same_char(a: char, b: char, ignore_case: bool) -> bool {
    a == b || (ignore_case && a.to_lowercase().eq(b.to_lowercase()))
}

/// A buffered line of a file block.
#[derive(Debug, Clone)]
struct BlockLine {
    line_number: usize,
    text: String,
    /// `(start, end)` byte spans of matched words; empty for context lines.
    spans: Vec<(usize, usize)>,
}

/// Lines buffered for the file currently being reported.
#[derive(Debug)]
struct FileBlock {
    path: PathBuf,
    lines: Vec<BlockLine>,
}

impl FileBlock {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            lines: Vec::new(),
        }
    }

    fn push(&mut self, line: BlockLine) {
        // Overlapping hunks can report the same line twice; keep the first.
        if self
            .lines
            .iter()
            .any(|existing| existing.line_number == line.line_number)
        {
            return;
        }
        self.lines.push(line);
    }

    fn into_matches(mut self, tool: BackendTool, context_size: usize) -> Vec<MatchResult> {
        self.lines.sort_by_key(|l| l.line_number);

        let mut out = Vec::new();
        for line in self.lines.iter().filter(|l| !l.spans.is_empty()) {
            let context: Vec<ContextLine> = self
                .lines
                .iter()
                .filter(|other| {
                    other.line_number != line.line_number
                        && other.line_number.abs_diff(line.line_number) <= context_size
                })
                .map(|other| ContextLine {
                    line_number: other.line_number,
                    text: other.text.clone(),
                })
                .collect();

            for &(start, end) in &line.spans {
                let Some(matched) = line.text.get(start..end) else {
                    continue;
                };
                out.push(MatchResult {
                    path: self.path.clone(),
                    line_number: line.line_number,
                    column: start + 1,
                    line: line.text.clone(),
                    matched_text: matched.to_string(),
                    match_start: start,
                    match_end: end,
                    context: context.clone(),
                    tool,
                });
            }
        }
        out
    }
}

fn strip_line_ending(s: &str) -> &str {
    let s = s.strip_suffix('\n').unwrap_or(s);
    s.strip_suffix('\r').unwrap_or(s)
}

fn resolve_path(base_dir: &Path, reported: &str) -> PathBuf {
    let path = Path::new(reported);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}
