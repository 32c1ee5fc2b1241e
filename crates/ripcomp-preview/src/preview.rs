//! Context-window previews centred on a match.

use ripcomp_backend::MatchResult;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewLine {
    pub line_number: usize,
    pub text: String,
    pub is_match: bool,
}

/// The lines shown as a completion item's documentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Preview {
    pub path: PathBuf,
    pub lines: Vec<PreviewLine>,
    /// Byte span of the matched word on the match line.
    pub match_start: usize,
    pub match_end: usize,
}

impl Preview {
    /// Up to `context_size` lines on each side of the match, in file order.
    pub fn from_match(result: &MatchResult, context_size: usize) -> Self {
        let mut lines: Vec<PreviewLine> = result
            .context
            .iter()
            .filter(|c| c.line_number.abs_diff(result.line_number) <= context_size)
            .map(|c| PreviewLine {
                line_number: c.line_number,
                text: c.text.clone(),
                is_match: false,
            })
            .collect();

        lines.push(PreviewLine {
            line_number: result.line_number,
            text: result.line.clone(),
            is_match: true,
        });
        lines.sort_by_key(|l| l.line_number);

        Self {
            path: result.path.clone(),
            lines,
            match_start: result.match_start,
            match_end: result.match_end,
        }
    }

    pub fn match_line(&self) -> Option<&PreviewLine> {
        self.lines.iter().find(|l| l.is_match)
    }

    pub fn line_numbers(&self) -> Vec<usize> {
        self.lines.iter().map(|l| l.line_number).collect()
    }

    /// Plain text with a right-aligned line number gutter.
    pub fn render_plain(&self) -> String {
        let width = self
            .lines
            .last()
            .map(|l| l.line_number.to_string().len())
            .unwrap_or(1);

        self.lines
            .iter()
            .map(|l| {
                let marker = if l.is_match { '>' } else { ' ' };
                format!("{marker}{:>width$} {}", l.line_number, l.text)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
