//! Syntax highlighting for previews.

use crate::Preview;
use std::fmt::Write as _;
use syntect::{
    easy::HighlightLines,
    highlighting::{FontStyle, Style, Theme, ThemeSet},
    parsing::{SyntaxReference, SyntaxSet},
};

/// A run of text sharing one style.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledSegment {
    pub text: String,
    pub fg: Option<(u8, u8, u8)>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    /// Part of the matched word.
    pub is_match: bool,
}

pub type StyledLine = Vec<StyledSegment>;

/// Loaded syntax definitions and theme.
pub struct Highlighter {
    syntaxes: SyntaxSet,
    theme: Option<Theme>,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        let syntaxes = SyntaxSet::load_defaults_newlines();
        let themes = ThemeSet::load_defaults();
        let theme = pick_theme(&themes).cloned();
        Self { syntaxes, theme }
    }

    /// Highlight every preview line; the matched word is emphasised.
    pub fn highlight(&self, preview: &Preview) -> Vec<StyledLine> {
        let first_line = preview.lines.first().map(|l| l.text.as_str()).unwrap_or("");
        let syntax = self.find_syntax(preview, first_line);
        let mut highlighter = match (&self.theme, syntax) {
            (Some(theme), Some(syntax)) => Some(HighlightLines::new(syntax, theme)),
            _ => None,
        };

        preview
            .lines
            .iter()
            .map(|line| {
                let mut segments = match highlighter.as_mut() {
                    Some(h) => self.highlight_line(h, &line.text),
                    None => vec![plain_segment(&line.text)],
                };
                if line.is_match {
                    segments = mark_match(segments, preview.match_start, preview.match_end);
                }
                segments
                    .into_iter()
                    .map(|mut s| {
                        s.text = sanitize(&s.text);
                        s
                    })
                    .filter(|s| !s.text.is_empty())
                    .collect()
            })
            .collect()
    }

    /// Render a preview as 24-bit ANSI text with a line number gutter.
    pub fn render_ansi(&self, preview: &Preview) -> String {
        let width = preview
            .lines
            .last()
            .map(|l| l.line_number.to_string().len())
            .unwrap_or(1);

        let mut out = String::new();
        for (line, styled) in preview.lines.iter().zip(self.highlight(preview)) {
            let _ = write!(out, "\x1b[2m{:>width$}\x1b[0m ", line.line_number);
            for segment in styled {
                push_ansi(&mut out, &segment);
            }
            out.push('\n');
        }
        out
    }

    fn highlight_line(&self, highlighter: &mut HighlightLines<'_>, text: &str) -> Vec<StyledSegment> {
        let with_newline = format!("{text}\n");
        match highlighter.highlight_line(&with_newline, &self.syntaxes) {
            Ok(ranges) => ranges
                .into_iter()
                .map(|(style, fragment)| StyledSegment {
                    text: fragment.trim_end_matches(['\n', '\r']).to_string(),
                    ..segment_style(style)
                })
                .filter(|s| !s.text.is_empty())
                .collect(),
            Err(_) => vec![plain_segment(text)],
        }
    }

    fn find_syntax(&self, preview: &Preview, first_line: &str) -> Option<&SyntaxReference> {
        if let Some(ext) = preview.path.extension().and_then(|e| e.to_str()) {
            if let Some(syntax) = self.syntaxes.find_syntax_by_extension(ext) {
                return Some(syntax);
            }
        }

        self.syntaxes
            .find_syntax_by_first_line(first_line)
            .or_else(|| Some(self.syntaxes.find_syntax_plain_text()))
    }
}

fn pick_theme(themes: &ThemeSet) -> Option<&Theme> {
    themes
        .themes
        .get("base16-ocean.dark")
        .or_else(|| themes.themes.get("Solarized (dark)"))
        .or_else(|| themes.themes.values().next())
}

fn plain_segment(text: &str) -> StyledSegment {
    StyledSegment {
        text: text.to_string(),
        ..Default::default()
    }
}

fn segment_style(style: Style) -> StyledSegment {
    StyledSegment {
        fg: Some((style.foreground.r, style.foreground.g, style.foreground.b)),
        bold: style.font_style.contains(FontStyle::BOLD),
        italic: style.font_style.contains(FontStyle::ITALIC),
        underline: style.font_style.contains(FontStyle::UNDERLINE),
        ..Default::default()
    }
}

/// Split segments at the match span and flag the covered pieces.
fn mark_match(segments: Vec<StyledSegment>, start: usize, end: usize) -> Vec<StyledSegment> {
    let mut out = Vec::with_capacity(segments.len() + 2);
    let mut offset = 0;

    for segment in segments {
        let seg_start = offset;
        let seg_end = offset + segment.text.len();
        offset = seg_end;

        let cut_a = start.clamp(seg_start, seg_end) - seg_start;
        let cut_b = end.clamp(seg_start, seg_end) - seg_start;
        if cut_a == cut_b
            || !segment.text.is_char_boundary(cut_a)
            || !segment.text.is_char_boundary(cut_b)
        {
            out.push(segment);
            continue;
        }

        let (before, rest) = segment.text.split_at(cut_a);
        let (inside, after) = rest.split_at(cut_b - cut_a);
        for (text, is_match) in [(before, false), (inside, true), (after, false)] {
            if text.is_empty() {
                continue;
            }
            out.push(StyledSegment {
                text: text.to_string(),
                bold: segment.bold || is_match,
                underline: segment.underline || is_match,
                is_match,
                ..segment.clone()
            });
        }
    }
    out
}

fn sanitize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\t' => out.push_str("    "),
            '\r' | '\n' => {}
            // Avoid raw ANSI/control chars affecting terminal state.
            c if c.is_control() => out.push('\u{FFFD}'),
            _ => out.push(ch),
        }
    }
    out
}

fn push_ansi(out: &mut String, segment: &StyledSegment) {
    if let Some((r, g, b)) = segment.fg {
        let _ = write!(out, "\x1b[38;2;{r};{g};{b}m");
    }
    if segment.bold {
        out.push_str("\x1b[1m");
    }
    if segment.italic {
        out.push_str("\x1b[3m");
    }
    if segment.underline {
        out.push_str("\x1b[4m");
    }
    out.push_str(&segment.text);
    out.push_str("\x1b[0m");
}
