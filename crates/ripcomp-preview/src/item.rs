//! Completion items built from match results.

use crate::Preview;
use ripcomp_backend::{BackendTool, MatchResult};
use serde::Serialize;
use std::collections::HashSet;

/// One entry of the completion menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionItem {
    /// Text shown in the menu, e.g. `hello_world (rg)`.
    pub label: String,
    /// Text inserted when the item is accepted.
    pub insert_text: String,
    pub tool: BackendTool,
    pub documentation: Preview,
}

/// Build completion items for `prefix` from an invocation's matches.
///
/// Each distinct word yields one item, from its first match. The word being
/// typed is not suggested back.
pub fn present(results: &[MatchResult], prefix: &str, context_size: usize) -> Vec<CompletionItem> {
    let mut seen = HashSet::new();
    results
        .iter()
        .filter(|r| r.matched_text != prefix)
        .filter(|r| seen.insert(r.matched_text.as_str()))
        .map(|r| CompletionItem {
            label: format!("{} ({})", r.matched_text, r.tool.tag()),
            insert_text: r.matched_text.clone(),
            tool: r.tool,
            documentation: Preview::from_match(r, context_size),
        })
        .collect()
}
