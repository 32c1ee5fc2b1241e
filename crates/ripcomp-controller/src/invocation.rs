//! Invocations and the append-only invocation log.

use crate::SearchRequest;
use ripcomp_backend::{MatchResult, SearchCommand};
use serde::Serialize;
use std::fmt;

/// Why a request did not launch a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The search root lies under a configured ignore path.
    #[serde(rename = "ignored")]
    Ignored,
    /// No command could be built (no project root, or prefix too short).
    #[serde(rename = "ignored-because-no-command")]
    NoCommand,
    /// Completion is toggled off.
    #[serde(rename = "ignored-because-mode-is-off")]
    ModeOff,
}

impl SkipReason {
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Ignored => "ignored",
            SkipReason::NoCommand => "ignored-because-no-command",
            SkipReason::ModeOff => "ignored-because-mode-is-off",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an invocation ran, or why it ran nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Descriptor {
    Command(SearchCommand),
    Skipped(SkipReason),
}

impl Descriptor {
    /// The command's argv, or the skip reason as a single element.
    pub fn summary(&self) -> Vec<String> {
        match self {
            Descriptor::Command(command) => command.argv(),
            Descriptor::Skipped(reason) => vec![reason.as_str().to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Pending,
    Running,
    Completed,
    Killed,
    Skipped,
}

/// How a completed invocation ended, for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "kebab-case")]
pub enum Outcome {
    Matches,
    NoMatches,
    Error(String),
}

/// One attempt to service a request.
#[derive(Debug, Clone, Serialize)]
pub struct Invocation {
    pub id: u64,
    pub request: SearchRequest,
    pub descriptor: Descriptor,
    pub status: InvocationStatus,
    pub outcome: Option<Outcome>,
    /// Matches parsed so far. Killed invocations keep what was parsed before
    /// termination.
    pub results: Vec<MatchResult>,
}

impl Invocation {
    pub fn skipped(id: u64, request: SearchRequest, reason: SkipReason) -> Self {
        Self {
            id,
            request,
            descriptor: Descriptor::Skipped(reason),
            status: InvocationStatus::Skipped,
            outcome: None,
            results: Vec::new(),
        }
    }

    pub fn pending(id: u64, request: SearchRequest, command: SearchCommand) -> Self {
        Self {
            id,
            request,
            descriptor: Descriptor::Command(command),
            status: InvocationStatus::Pending,
            outcome: None,
            results: Vec::new(),
        }
    }

    pub fn command(&self) -> Option<&SearchCommand> {
        match &self.descriptor {
            Descriptor::Command(command) => Some(command),
            Descriptor::Skipped(_) => None,
        }
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.descriptor {
            Descriptor::Skipped(reason) => Some(reason),
            Descriptor::Command(_) => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        !matches!(
            self.status,
            InvocationStatus::Pending | InvocationStatus::Running
        )
    }
}

/// Ordered record of every invocation in a session.
///
/// Ids start at 1 and equal the entry's position plus one.
#[derive(Debug, Default, Clone, Serialize)]
pub struct InvocationLog {
    entries: Vec<Invocation>,
}

impl InvocationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next appended invocation must carry.
    pub fn next_id(&self) -> u64 {
        self.entries.len() as u64 + 1
    }

    pub(crate) fn push(&mut self, invocation: Invocation) {
        debug_assert_eq!(invocation.id, self.next_id());
        self.entries.push(invocation);
    }

    pub fn get(&self, id: u64) -> Option<&Invocation> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.entries.get(index)
    }

    pub(crate) fn get_mut(&mut self, id: u64) -> Option<&mut Invocation> {
        let index = usize::try_from(id.checked_sub(1)?).ok()?;
        self.entries.get_mut(index)
    }

    pub fn entries(&self) -> &[Invocation] {
        &self.entries
    }

    pub fn last(&self) -> Option<&Invocation> {
        self.entries.last()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Each entry's command argv, or its skip reason.
    pub fn descriptors(&self) -> Vec<Vec<String>> {
        self.entries.iter().map(|i| i.descriptor.summary()).collect()
    }
}
