//! Parser for `git grep --null --line-number --column` output.
//!
//! With `--null` git terminates the path with NUL. Depending on the git
//! version the line and column separators are either NUL as well or the
//! classic `:` (match) / `-` (context) signs; both layouts are accepted.
//! Matches always carry a column, context lines never do. The column only
//! locates the first match on a line, so the line is rescanned for the rest.

use super::{resolve_path, strip_line_ending, BlockLine, FileBlock, OutputParser, WordMatcher};
use crate::{BackendTool, MatchResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Incremental parser for git grep's plain-text output.
pub struct GitGrepParser {
    base_dir: PathBuf,
    context_size: usize,
    matcher: WordMatcher,
    block: Option<FileBlock>,
}

/// One decoded output line.
#[derive(Debug, PartialEq, Eq)]
struct Record<'a> {
    path: &'a str,
    line_number: usize,
    column: Option<usize>,
    text: &'a str,
}

impl GitGrepParser {
    pub fn new(base_dir: &Path, context_size: usize, matcher: WordMatcher) -> Self {
        Self {
            base_dir: base_dir.to_path_buf(),
            context_size,
            matcher,
            block: None,
        }
    }

    fn flush(&mut self) -> Vec<MatchResult> {
        self.block
            .take()
            .map(|block| block.into_matches(BackendTool::GitGrep, self.context_size))
            .unwrap_or_default()
    }
}

impl OutputParser for GitGrepParser {
    fn push_line(&mut self, line: &str) -> Vec<MatchResult> {
        let line = strip_line_ending(line);
        if line == "--" || line.is_empty() {
            return Vec::new();
        }

        let Some(record) = decode(line) else {
            debug!("Skipping unparseable git grep output: {:?}", line);
            return Vec::new();
        };

        let path = resolve_path(&self.base_dir, record.path);
        let mut done = Vec::new();
        if self.block.as_ref().map_or(true, |block| block.path != path) {
            done = self.flush();
            self.block = Some(FileBlock::new(path));
        }

        let spans = match record.column {
            Some(column) => {
                let spans = self.matcher.spans(record.text);
                if spans.is_empty() {
                    word_span(record.text, column).into_iter().collect()
                } else {
                    spans
                }
            }
            None => Vec::new(),
        };

        if let Some(block) = self.block.as_mut() {
            block.push(BlockLine {
                line_number: record.line_number,
                text: record.text.to_string(),
                spans,
            });
        }
        done
    }

    fn finish(&mut self) -> Vec<MatchResult> {
        self.flush()
    }
}

fn decode(line: &str) -> Option<Record<'_>> {
    let (path, rest) = line.split_once('\0')?;
    let (line_number, sep, rest) = take_number(rest)?;

    match sep {
        '-' => Some(Record {
            path,
            line_number,
            column: None,
            text: rest,
        }),
        ':' => {
            let (column, col_sep, text) = take_number(rest)?;
            (col_sep == ':').then_some(Record {
                path,
                line_number,
                column: Some(column),
                text,
            })
        }
        '\0' => match take_number(rest) {
            Some((column, '\0', text)) => Some(Record {
                path,
                line_number,
                column: Some(column),
                text,
            }),
            _ => Some(Record {
                path,
                line_number,
                column: None,
                text: rest,
            }),
        },
        _ => None,
    }
}

/// Split a leading decimal number and the separator character after it.
fn take_number(s: &str) -> Option<(usize, char, &str)> {
    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let number = s[..digits].parse().ok()?;
    let mut rest = s[digits..].chars();
    let sep = rest.next()?;
    Some((number, sep, rest.as_str()))
}

/// Byte span of the word starting at 1-based byte `column`.
fn word_span(text: &str, column: usize) -> Option<(usize, usize)> {
    let start = column.checked_sub(1)?;
    let tail = text.get(start..)?;
    let len: usize = tail
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_' || *c == '-')
        .map(char::len_utf8)
        .sum();
    (len > 0).then_some((start, start + len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripcomp_core::SearchCasing;

    fn git_parser(context_size: usize, prefix: &str) -> GitGrepParser {
        GitGrepParser::new(
            Path::new("/repo"),
            context_size,
            WordMatcher::new(prefix, SearchCasing::IgnoreCase),
        )
    }

    #[test]
    fn decodes_nul_separated_records() {
        assert_eq!(
            decode("src/a.rs\u{0}7\u{0}5\u{0}    hello_world();"),
            Some(Record {
                path: "src/a.rs",
                line_number: 7,
                column: Some(5),
                text: "    hello_world();",
            })
        );
        assert_eq!(
            decode("src/a.rs\u{0}6\u{0}fn main() {"),
            Some(Record {
                path: "src/a.rs",
                line_number: 6,
                column: None,
                text: "fn main() {",
            })
        );
    }

    #[test]
    fn decodes_sign_separated_records() {
        assert_eq!(
            decode("src/a.rs\u{0}7:5:x = 1"),
            Some(Record {
                path: "src/a.rs",
                line_number: 7,
                column: Some(5),
                text: "x = 1",
            })
        );
        assert_eq!(
            decode("src/a.rs\u{0}8-let y: u8 = 2;"),
            Some(Record {
                path: "src/a.rs",
                line_number: 8,
                column: None,
                text: "let y: u8 = 2;",
            })
        );
    }

    #[test]
    fn rejects_lines_without_a_path() {
        assert_eq!(decode("Binary file x.bin matches"), None);
    }

    #[test]
    fn groups_context_by_file() {
        let mut parser = git_parser(2, "hel");
        let lines = [
            "a.txt\u{0}1\u{0}one",
            "a.txt\u{0}2\u{0}1\u{0}hello_there",
            "a.txt\u{0}3\u{0}three",
            "--",
        ];
        for line in lines {
            assert!(parser.push_line(line).is_empty());
        }

        let flushed = parser.push_line("b.txt\u{0}4\u{0}3\u{0}a hello_again");
        assert_eq!(flushed.len(), 1);
        assert_eq!(flushed[0].path, PathBuf::from("/repo/a.txt"));
        assert_eq!(flushed[0].matched_text, "hello_there");
        assert_eq!(
            flushed[0]
                .context
                .iter()
                .map(|c| c.text.as_str())
                .collect::<Vec<_>>(),
            vec!["one", "three"]
        );

        let rest = parser.finish();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].matched_text, "hello_again");
        assert_eq!(rest[0].match_start, 2);
        assert_eq!(rest[0].tool, BackendTool::GitGrep);
    }

    #[test]
    fn every_match_on_a_line_is_reported() {
        let mut parser = git_parser(5, "ban");
        parser.push_line("fruit.txt\u{0}1\u{0}1\u{0}banana banana_with_text");

        let results = parser.finish();
        let words: Vec<&str> = results.iter().map(|r| r.matched_text.as_str()).collect();
        assert_eq!(words, vec!["banana", "banana_with_text"]);
        assert_eq!(results[1].match_start, 7);
        assert_eq!(results[1].column, 8);
        assert!(results.iter().all(|r| r.line_number == 1));
    }

    #[test]
    fn falls_back_to_the_reported_column() {
        let mut parser = git_parser(5, "zzz");
        parser.push_line("a.txt\u{0}3\u{0}3\u{0}a hello_again");

        let results = parser.finish();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].matched_text, "hello_again");
    }

    #[test]
    fn word_span_handles_multibyte_text() {
        let text = "é hello-world!";
        let column = text.find("hello").unwrap() + 1;
        assert_eq!(word_span(text, column), Some((3, 14)));
        assert_eq!(word_span(text, 2), None);
    }
}
