//! The search invocation controller.
//!
//! All state lives in one [`SearchController`] owned by the editor's event
//! loop. Search processes run as OS processes whose output arrives over a
//! channel and is only applied when the owner calls [`SearchController::pump`]
//! or [`SearchController::wait_idle`].

use crate::gate::{self, GateDecision};
use crate::invocation::{Invocation, InvocationLog, InvocationStatus, Outcome, SkipReason};
use crate::process::{ProcessEvent, RunningProcess};
use crate::SearchRequest;
use ripcomp_backend::{
    parser_for, BackendKind, MatchResult, OutputParser, SearchCommand, WordMatcher,
};
use ripcomp_core::{Config, ModeState};
use std::path::Path;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Session-scoped state: toggles, the invocation log, and editor messages.
///
/// A fresh session starts with an empty log.
#[derive(Debug)]
pub struct Session {
    pub mode: ModeState,
    log: InvocationLog,
    messages: Vec<String>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            mode: ModeState::from_config(config),
            log: InvocationLog::new(),
            messages: Vec::new(),
        }
    }

    pub fn log(&self) -> &InvocationLog {
        &self.log
    }

    /// Messages written to the editor's message log, oldest first.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    fn message(&mut self, text: impl Into<String>) {
        let text = text.into();
        debug!("{}", text);
        self.messages.push(text);
    }
}

/// The one search currently allowed to run.
struct ActiveSearch {
    process: RunningProcess,
    parser: Box<dyn OutputParser>,
}

/// Gates requests, launches and supersedes search processes, and records
/// every outcome in the session's invocation log.
pub struct SearchController {
    config: Config,
    backend: BackendKind,
    session: Session,
    active: Option<ActiveSearch>,
    events_tx: Sender<ProcessEvent>,
    events_rx: Receiver<ProcessEvent>,
}

impl SearchController {
    pub fn new(config: Config) -> Self {
        let backend = config.backend;
        Self::with_backend(config, backend)
    }

    /// Controller using `backend` regardless of the configured one.
    pub fn with_backend(config: Config, backend: BackendKind) -> Self {
        let (events_tx, events_rx) = channel();
        let session = Session::new(&config);
        Self {
            config,
            backend,
            session,
            active: None,
            events_tx,
            events_rx,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn backend(&self) -> BackendKind {
        self.backend
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn invocations(&self) -> &[Invocation] {
        self.session.log.entries()
    }

    pub fn messages(&self) -> &[String] {
        self.session.messages()
    }

    pub fn mode(&self) -> ModeState {
        self.session.mode
    }

    /// Flip the enabled toggle; applies from the next request on.
    pub fn toggle_enabled(&mut self) -> bool {
        let enabled = self.session.mode.toggle_enabled();
        let notice = if enabled {
            "Enabled ripcomp"
        } else {
            "Disabled ripcomp"
        };
        info!("{}", notice);
        self.session.message(notice);
        enabled
    }

    /// Flip the debug toggle; applies from the next request on.
    pub fn toggle_debug(&mut self) -> bool {
        let on = self.session.mode.toggle_debug();
        let notice = if on {
            "Enabled ripcomp debug mode"
        } else {
            "Disabled ripcomp debug mode"
        };
        info!("{}", notice);
        self.session.message(notice);
        on
    }

    /// Whether a search process is still running.
    pub fn is_busy(&self) -> bool {
        self.active.is_some()
    }

    /// Handle a new prefix typed in `origin_file`.
    ///
    /// Any running search is superseded first. Returns the id of the
    /// invocation recorded for this request.
    pub fn request(&mut self, prefix: &str, origin_file: impl AsRef<Path>) -> u64 {
        self.submit(SearchRequest::new(prefix, origin_file))
    }

    /// Like [`request`](Self::request), for a prepared request.
    pub fn submit(&mut self, request: SearchRequest) -> u64 {
        // Apply anything already delivered so finished searches are recorded
        // as completed rather than killed.
        self.pump();
        self.supersede_active();

        let id = self.session.log.next_id();
        match gate::evaluate(&request, self.session.mode, &self.config, self.backend) {
            GateDecision::Skip(reason) => {
                if reason == SkipReason::NoCommand {
                    self.session.message("no command returned, skipping the search");
                }
                debug!("Invocation {} skipped: {}", id, reason);
                self.session
                    .log
                    .push(Invocation::skipped(id, request, reason));
            }
            GateDecision::Run(command) => self.start(id, request, command),
        }
        id
    }

    /// Launch `command` for `request` without gating it, superseding any
    /// running search. Returns the new invocation's id.
    pub fn launch(&mut self, request: SearchRequest, command: SearchCommand) -> u64 {
        self.pump();
        self.supersede_active();

        let id = self.session.log.next_id();
        self.start(id, request, command);
        id
    }

    fn start(&mut self, id: u64, request: SearchRequest, command: SearchCommand) {
        if self.session.mode.debug {
            self.session.message(command.shell_line());
        }

        let matcher = WordMatcher::new(&request.prefix, self.config.search_casing);
        self.session
            .log
            .push(Invocation::pending(id, request, command.clone()));

        match RunningProcess::spawn(&command, id, self.events_tx.clone()) {
            Ok(process) => {
                let parser = parser_for(
                    command.tool,
                    &command.base_dir,
                    self.config.context_size,
                    matcher,
                );
                self.set_status(id, InvocationStatus::Running);
                self.active = Some(ActiveSearch { process, parser });
            }
            Err(e) => {
                warn!("Search invocation {} failed to start: {}", id, e);
                self.session.message(format!("{}: {}", command.tool, e));
                if let Some(invocation) = self.session.log.get_mut(id) {
                    invocation.status = InvocationStatus::Completed;
                    invocation.outcome = Some(Outcome::Error(e.to_string()));
                }
            }
        }
    }

    /// Terminate the running search, if any, and record it as killed.
    fn supersede_active(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        let id = active.process.invocation();
        let tool = self
            .session
            .log
            .get(id)
            .and_then(Invocation::command)
            .map(|command| command.tool);

        if active.process.terminate() {
            if let Some(tool) = tool {
                self.session
                    .message(format!("killed previous {} invocation", tool.backend_name()));
            }
            self.set_status(id, InvocationStatus::Killed);
        } else {
            // Exited on its own; its exit event is now stale and its output
            // is superseded either way.
            self.set_status(id, InvocationStatus::Completed);
        }
    }

    /// Apply every event already delivered. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    /// Apply events until no search is running or `timeout` elapses.
    ///
    /// Returns `true` if the controller went idle.
    pub fn wait_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if self.active.is_none() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            match self.events_rx.recv_timeout(deadline - now) {
                Ok(event) => self.apply(event),
                Err(RecvTimeoutError::Timeout) => return self.active.is_none(),
                // Unreachable while we hold a sender.
                Err(RecvTimeoutError::Disconnected) => return true,
            }
        }
    }

    fn apply(&mut self, event: ProcessEvent) {
        let invocation = match &event {
            ProcessEvent::Line { invocation, .. } | ProcessEvent::Exited { invocation, .. } => {
                *invocation
            }
        };

        let Some(active) = self
            .active
            .as_mut()
            .filter(|a| a.process.invocation() == invocation)
        else {
            // Output from a superseded search.
            return;
        };

        match event {
            ProcessEvent::Line { line, .. } => {
                let results = active.parser.push_line(&line);
                self.append_results(invocation, results);
            }
            ProcessEvent::Exited { code, .. } => {
                let results = active.parser.finish();
                self.active = None;
                self.append_results(invocation, results);

                let outcome = match code {
                    Some(0) => Outcome::Matches,
                    Some(1) => Outcome::NoMatches,
                    Some(code) => Outcome::Error(format!("search exited with status {code}")),
                    None => Outcome::Error("search terminated by a signal".to_string()),
                };
                debug!("Invocation {} completed: {:?}", invocation, outcome);
                if let Some(entry) = self.session.log.get_mut(invocation) {
                    entry.status = InvocationStatus::Completed;
                    entry.outcome = Some(outcome);
                }
            }
        }
    }

    fn append_results(&mut self, id: u64, results: Vec<MatchResult>) {
        if results.is_empty() {
            return;
        }
        if let Some(entry) = self.session.log.get_mut(id) {
            entry.results.extend(results);
        }
    }

    fn set_status(&mut self, id: u64, status: InvocationStatus) {
        if let Some(entry) = self.session.log.get_mut(id) {
            entry.status = status;
        }
    }

    /// Matches of the latest invocation, once it has completed.
    ///
    /// Killed or still-running invocations present nothing.
    pub fn presentable_results(&self) -> &[MatchResult] {
        match self.session.log.last() {
            Some(last) if last.status == InvocationStatus::Completed => &last.results,
            _ => &[],
        }
    }
}

impl Drop for SearchController {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            active.process.terminate();
        }
    }
}
