//! Request gate: decides whether a request may launch a search.

use crate::{SearchRequest, SkipReason};
use ripcomp_backend::{build_command, resolve_scope, BackendKind, CommandInput, SearchCommand};
use ripcomp_core::{filter, Config, ModeState};
use tracing::debug;

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Skip(SkipReason),
    Run(SearchCommand),
}

/// Gate `request` against the current toggles and configuration.
///
/// Checks run in order: mode, project root, ignore paths, then the command
/// builder.
pub fn evaluate(
    request: &SearchRequest,
    mode: ModeState,
    config: &Config,
    backend: BackendKind,
) -> GateDecision {
    if !mode.enabled {
        return GateDecision::Skip(SkipReason::ModeOff);
    }

    let Some(scope) = resolve_scope(&request.origin_file, config) else {
        debug!(
            "No project root for {}, and fallback is disabled",
            request.origin_file.display()
        );
        return GateDecision::Skip(SkipReason::NoCommand);
    };

    if filter::is_ignored_path(&scope.root, &config.ignore_paths) {
        debug!("Search root {} is ignored", scope.root.display());
        return GateDecision::Skip(SkipReason::Ignored);
    }

    match build_command(CommandInput {
        backend,
        scope: &scope,
        prefix: &request.prefix,
        config,
    }) {
        Some(command) => GateDecision::Run(command),
        None => GateDecision::Skip(SkipReason::NoCommand),
    }
}
