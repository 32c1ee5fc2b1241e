//! Integration tests for request gating, supersession, and the invocation log.
//!
//! Process tests drive `sh` scripts tagged as ripgrep or git grep commands so
//! they do not depend on either tool being installed.

#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ripcomp_backend::{BackendTool, SearchCommand};
use ripcomp_controller::{
    InvocationStatus, Outcome, SearchController, SearchRequest, SkipReason,
};
use ripcomp_core::{BackendKind, Config};
use tempfile::TempDir;

const WAIT: Duration = Duration::from_secs(10);

fn script(tool: BackendTool, script: &str) -> SearchCommand {
    SearchCommand {
        tool,
        program: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        base_dir: PathBuf::from("/work"),
    }
}

fn printing(tool: BackendTool, lines: &[&str], then: &str) -> SearchCommand {
    let mut args = vec![
        "-c".to_string(),
        format!("printf '%s\\n' \"$@\"; {then}"),
        "sh".to_string(),
    ];
    args.extend(lines.iter().map(|l| l.to_string()));
    SearchCommand {
        tool,
        program: "sh".to_string(),
        args,
        base_dir: PathBuf::from("/work"),
    }
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join(".git")).unwrap();
    dir
}

fn request(dir: &Path, prefix: &str) -> SearchRequest {
    SearchRequest::new(prefix, dir.join("file.txt"))
}

fn rg_match_line(path: &str, line_number: usize, text: &str, word: &str) -> String {
    let start = text.find(word).unwrap();
    format!(
        r#"{{"type":"match","data":{{"path":{{"text":"{path}"}},"lines":{{"text":"{text}\n"}},"line_number":{line_number},"absolute_offset":0,"submatches":[{{"match":{{"text":"{word}"}},"start":{start},"end":{end}}}]}}}}"#,
        end = start + word.len()
    )
}

/// Pump until `done` holds or the deadline passes.
fn pump_until(controller: &mut SearchController, done: impl Fn(&SearchController) -> bool) {
    let deadline = Instant::now() + WAIT;
    while !done(controller) {
        assert!(Instant::now() < deadline, "timed out waiting for controller");
        controller.pump();
        std::thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn test_rapid_requests_are_logged_in_order() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    let prefixes = ["hel", "hell", "hello", "hello_", "hello_w"];
    for (i, prefix) in prefixes.iter().enumerate() {
        let id = controller.request(prefix, dir.path().join("file.txt"));
        assert_eq!(id, i as u64 + 1);

        // Everything before the newest entry is already finished.
        let entries = controller.invocations();
        assert_eq!(entries.len(), i + 1);
        for earlier in &entries[..i] {
            assert!(
                matches!(
                    earlier.status,
                    InvocationStatus::Killed | InvocationStatus::Completed
                ),
                "invocation {} still {:?}",
                earlier.id,
                earlier.status
            );
        }
    }

    let ids: Vec<u64> = controller.invocations().iter().map(|i| i.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4, 5]);
}

#[test]
fn test_rapid_launches_kill_each_predecessor() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    for _ in 0..4 {
        controller.launch(
            request(dir.path(), "hello"),
            script(BackendTool::Ripgrep, "exec sleep 5"),
        );
    }

    let statuses: Vec<InvocationStatus> =
        controller.invocations().iter().map(|i| i.status).collect();
    assert_eq!(
        statuses,
        vec![
            InvocationStatus::Killed,
            InvocationStatus::Killed,
            InvocationStatus::Killed,
            InvocationStatus::Running,
        ]
    );
    assert_eq!(
        controller
            .messages()
            .iter()
            .filter(|m| m.as_str() == "killed previous RipgrepBackend invocation")
            .count(),
        3
    );
}

#[test]
fn test_mode_off_skips_without_spawning() {
    let dir = project();
    let config = Config {
        enabled: false,
        ..Config::default()
    };
    let mut controller = SearchController::new(config);

    controller.request("hello", dir.path().join("file.txt"));

    let entry = &controller.invocations()[0];
    assert_eq!(entry.skip_reason(), Some(SkipReason::ModeOff));
    assert_eq!(entry.status, InvocationStatus::Skipped);
    assert!(!controller.is_busy());
    assert_eq!(
        controller.session().log().descriptors(),
        vec![vec!["ignored-because-mode-is-off".to_string()]]
    );
}

#[test]
fn test_unresolved_root_skips_every_request() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        project_root_marker: vec![".ripcomp-marker-that-does-not-exist".to_string()],
        project_root_fallback: false,
        ..Config::default()
    };
    let mut controller = SearchController::new(config);

    controller.request("hello", dir.path().join("file.txt"));
    controller.request("hello_", dir.path().join("file.txt"));

    for entry in controller.invocations() {
        assert_eq!(entry.skip_reason(), Some(SkipReason::NoCommand));
        assert!(entry.results.is_empty());
    }
    assert_eq!(controller.invocations().len(), 2);
    assert_eq!(
        controller
            .messages()
            .iter()
            .filter(|m| m.as_str() == "no command returned, skipping the search")
            .count(),
        2
    );
    assert!(controller.presentable_results().is_empty());
}

#[test]
fn test_ignored_paths_are_skipped() {
    let dir = project();
    let config = Config {
        ignore_paths: vec![dir.path().to_path_buf()],
        ..Config::default()
    };
    let mut controller = SearchController::new(config);

    controller.request("hello", dir.path().join("file.txt"));

    assert_eq!(
        controller.invocations()[0].skip_reason(),
        Some(SkipReason::Ignored)
    );
}

#[test]
fn test_kill_messages_name_the_backend() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    controller.launch(
        request(dir.path(), "hello"),
        script(BackendTool::GitGrep, "exec sleep 5"),
    );
    controller.launch(
        request(dir.path(), "hello"),
        script(BackendTool::Ripgrep, "exec sleep 5"),
    );
    controller.launch(
        request(dir.path(), "hello"),
        script(BackendTool::Ripgrep, "exec sleep 5"),
    );

    assert_eq!(
        controller.messages(),
        [
            "killed previous GitGrepBackend invocation".to_string(),
            "killed previous RipgrepBackend invocation".to_string(),
        ]
    );
}

#[test]
fn test_finished_search_is_not_reported_as_killed() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    controller.launch(
        request(dir.path(), "hello"),
        script(BackendTool::Ripgrep, "exit 1"),
    );
    assert!(controller.wait_idle(WAIT));
    controller.launch(
        request(dir.path(), "hello"),
        script(BackendTool::Ripgrep, "exit 1"),
    );

    let first = &controller.invocations()[0];
    assert_eq!(first.status, InvocationStatus::Completed);
    assert_eq!(first.outcome, Some(Outcome::NoMatches));
    assert!(controller.messages().is_empty());
}

#[test]
fn test_toggle_round_trip() {
    let dir = project();
    let mut controller = SearchController::new(Config {
        project_root_marker: vec![".git".to_string()],
        ..Config::default()
    });

    assert!(controller.mode().enabled);
    assert!(!controller.toggle_enabled());
    controller.request("hello", dir.path().join("file.txt"));
    assert!(controller.toggle_enabled());
    controller.request("hello", dir.path().join("file.txt"));

    let entries = controller.invocations();
    assert_eq!(entries[0].skip_reason(), Some(SkipReason::ModeOff));
    assert!(entries[1].command().is_some());
    assert!(controller.mode().enabled);
}

#[test]
fn test_toggles_post_notices_to_the_message_log() {
    let mut controller = SearchController::new(Config::default());

    assert!(!controller.toggle_enabled());
    assert!(controller.toggle_enabled());
    assert!(controller.toggle_debug());
    assert!(!controller.toggle_debug());

    assert_eq!(
        controller.messages(),
        [
            "Disabled ripcomp".to_string(),
            "Enabled ripcomp".to_string(),
            "Enabled ripcomp debug mode".to_string(),
            "Disabled ripcomp debug mode".to_string(),
        ]
    );
    assert!(controller.invocations().is_empty());
}

#[test]
fn test_debug_mode_logs_the_shell_command() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    controller.request("hello", dir.path().join("file.txt"));
    assert!(!controller.messages().iter().any(|m| m.starts_with("rg ")));

    assert!(controller.toggle_debug());
    controller.request("hello", dir.path().join("file.txt"));

    let command = controller.invocations()[1].command().unwrap().clone();
    assert!(controller
        .messages()
        .iter()
        .any(|m| m == &command.shell_line()));
    assert!(command.shell_line().starts_with("rg "));
}

#[test]
fn test_backend_override_is_used() {
    let dir = project();
    let mut controller =
        SearchController::with_backend(Config::default(), BackendKind::GitGrep);

    controller.request("hello", dir.path().join("file.txt"));

    let command = controller.invocations()[0].command().unwrap();
    assert_eq!(command.tool, BackendTool::GitGrep);
    assert_eq!(command.program, "git");
}

#[test]
fn test_output_is_parsed_into_results() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());
    let line = rg_match_line("/work/a.rs", 3, "let hello_world = 1;", "hello_world");

    controller.launch(
        request(dir.path(), "hello"),
        printing(BackendTool::Ripgrep, &[&line], "exit 0"),
    );
    assert!(controller.wait_idle(WAIT));

    let entry = &controller.invocations()[0];
    assert_eq!(entry.status, InvocationStatus::Completed);
    assert_eq!(entry.outcome, Some(Outcome::Matches));
    assert_eq!(entry.results.len(), 1);
    assert_eq!(entry.results[0].matched_text, "hello_world");
    assert_eq!(entry.results[0].line_number, 3);
    assert_eq!(controller.presentable_results().len(), 1);
}

#[test]
fn test_git_grep_output_is_parsed_into_results() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    let command = SearchCommand {
        tool: BackendTool::GitGrep,
        program: "printf".to_string(),
        args: vec![
            "%s\\0%s\\0%s\\0%s\\n".to_string(),
            "src/a.rs".to_string(),
            "2".to_string(),
            "5".to_string(),
            "    hello_there();".to_string(),
        ],
        base_dir: PathBuf::from("/repo"),
    };
    controller.launch(request(dir.path(), "hello"), command);
    assert!(controller.wait_idle(WAIT));

    let results = controller.presentable_results();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].path, PathBuf::from("/repo/src/a.rs"));
    assert_eq!(results[0].matched_text, "hello_there");
}

#[test]
fn test_error_exit_is_surfaced_as_error_outcome() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    controller.launch(
        request(dir.path(), "hello"),
        script(BackendTool::Ripgrep, "exit 2"),
    );
    assert!(controller.wait_idle(WAIT));

    assert!(matches!(
        controller.invocations()[0].outcome,
        Some(Outcome::Error(_))
    ));
}

#[test]
fn test_killed_search_keeps_partial_results_but_presents_nothing() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());
    let begin = r#"{"type":"begin","data":{"path":{"text":"/work/a.rs"}}}"#;
    let hit = rg_match_line("/work/a.rs", 1, "hello_one", "hello_one");
    let end = r#"{"type":"end","data":{"path":{"text":"/work/a.rs"}}}"#;

    controller.launch(
        request(dir.path(), "hello"),
        printing(BackendTool::Ripgrep, &[begin, &hit, end], "exec sleep 5"),
    );
    pump_until(&mut controller, |c| !c.invocations()[0].results.is_empty());

    controller.launch(
        request(dir.path(), "hello_"),
        script(BackendTool::Ripgrep, "exec sleep 5"),
    );

    let killed = &controller.invocations()[0];
    assert_eq!(killed.status, InvocationStatus::Killed);
    assert_eq!(killed.results.len(), 1);
    assert!(controller.presentable_results().is_empty());
}

#[test]
fn test_spawn_failure_is_not_fatal() {
    let dir = project();
    let mut controller = SearchController::new(Config::default());

    let command = SearchCommand {
        tool: BackendTool::Ripgrep,
        program: "ripcomp-definitely-missing-binary".to_string(),
        args: Vec::new(),
        base_dir: PathBuf::from("/work"),
    };
    controller.launch(request(dir.path(), "hello"), command);

    let entry = &controller.invocations()[0];
    assert_eq!(entry.status, InvocationStatus::Completed);
    assert!(matches!(entry.outcome, Some(Outcome::Error(_))));
    assert!(!controller.is_busy());
    assert!(controller.messages()[0].contains("ripcomp-definitely-missing-binary"));
}
