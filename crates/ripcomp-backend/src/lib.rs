//! ripcomp-backend: Project root resolution, search command construction, and
//! backend output parsing.

pub mod command;
pub mod parse;
pub mod root;

pub use command::{build_command, BackendTool, CommandInput, SearchCommand};
pub use parse::{parser_for, ContextLine, MatchResult, OutputParser, WordMatcher};
pub use ripcomp_core::BackendKind;
pub use root::{find_git_root, resolve_scope, SearchScope};
