use super::*;
use std::time::Duration;
use tempfile::tempdir;
use tokio::sync::mpsc;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

fn shell_launcher(rt: &tokio::runtime::Runtime, script: &str) -> SearchLauncher {
    SearchLauncher::new(
        rt.handle().clone(),
        "sh",
        vec!["-c".to_string(), script.to_string()],
    )
}

/// Receives until the terminal message of `search_id`.
fn collect(
    rt: &tokio::runtime::Runtime,
    rx: &mut mpsc::Receiver<SearchMessage>,
    search_id: u64,
) -> (Vec<String>, SearchMessage) {
    let mut lines = Vec::new();
    loop {
        let msg = rt
            .block_on(async { tokio::time::timeout(Duration::from_secs(5), rx.recv()).await })
            .expect("timeout waiting for search output")
            .expect("channel closed");
        assert_eq!(msg.search_id(), search_id);
        match msg {
            SearchMessage::Line { text, .. } => lines.push(text),
            other => return (lines, other),
        }
    }
}

#[test]
fn build_args_appends_extra_args_and_pattern() {
    let rt = create_runtime();
    let launcher = SearchLauncher::new(
        rt.handle().clone(),
        "rg",
        vec!["--no-heading".to_string()],
    );

    let request = SearchRequest::new("/w", "needle", "-g *.rs   --context 2");
    assert_eq!(
        launcher.build_args(&request),
        ["--no-heading", "-g", "*.rs", "--context", "2", "needle"]
    );

    let dashed = SearchRequest::new("/w", "-foo", "");
    assert_eq!(launcher.build_args(&dashed), ["--no-heading", "-e", "-foo"]);

    let empty = SearchRequest::new("/w", "", "--files");
    assert_eq!(launcher.build_args(&empty), ["--no-heading", "--files"]);
}

#[test]
fn missing_tool_is_reported_as_not_found() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = SearchLauncher::new(
        rt.handle().clone(),
        "grepnav-definitely-missing-tool",
        Vec::new(),
    );
    let (tx, _rx) = mpsc::channel(16);

    let err = launcher
        .launch(SearchRequest::new(dir.path(), "x", ""), tx)
        .err()
        .expect("launch should fail");
    assert!(matches!(
        err,
        SearchError::Launch(LaunchFailure::ToolNotFound { .. })
    ));
}

#[test]
fn invalid_work_dir_is_rejected() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = SearchLauncher::new(rt.handle().clone(), "rg", Vec::new());
    let (tx, _rx) = mpsc::channel(16);

    let err = launcher
        .launch(SearchRequest::new(dir.path().join("nope"), "x", ""), tx)
        .err()
        .expect("launch should fail");
    assert!(matches!(
        err,
        SearchError::Launch(LaunchFailure::InvalidWorkDir(_))
    ));
}

#[cfg(unix)]
#[test]
fn streams_lines_then_completes() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = shell_launcher(&rt, r"printf 'a.txt:3:foo\n--\nb.txt:10:foo bar\n'");
    let (tx, mut rx) = mpsc::channel(16);

    let session = launcher
        .launch(SearchRequest::new(dir.path(), "foo", ""), tx)
        .unwrap();
    let (lines, end) = collect(&rt, &mut rx, session.id());

    assert_eq!(lines, ["a.txt:3:foo", "--", "b.txt:10:foo bar"]);
    assert_eq!(
        end,
        SearchMessage::Complete {
            search_id: session.id(),
            exit_code: Some(0)
        }
    );
    assert_eq!(session.status(), SessionStatus::Completed);
}

#[cfg(unix)]
#[test]
fn no_matches_exit_code_is_success() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = shell_launcher(&rt, "exit 1");
    let (tx, mut rx) = mpsc::channel(16);

    let session = launcher
        .launch(SearchRequest::new(dir.path(), "foo", ""), tx)
        .unwrap();
    let (lines, end) = collect(&rt, &mut rx, session.id());

    assert!(lines.is_empty());
    assert!(matches!(end, SearchMessage::Complete { exit_code: Some(1), .. }));
    assert_eq!(session.status(), SessionStatus::Completed);
}

#[cfg(unix)]
#[test]
fn error_exit_fails_with_stderr_detail() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = shell_launcher(&rt, "echo 'regex parse error' >&2; exit 2");
    let (tx, mut rx) = mpsc::channel(16);

    let session = launcher
        .launch(SearchRequest::new(dir.path(), "(", ""), tx)
        .unwrap();
    let (lines, end) = collect(&rt, &mut rx, session.id());

    assert_eq!(lines, ["regex parse error"]);
    match end {
        SearchMessage::Failed { message, .. } => {
            assert!(message.contains("code 2"), "{message}");
            assert!(message.contains("regex parse error"), "{message}");
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(session.status(), SessionStatus::Failed);
}

#[cfg(unix)]
#[test]
fn abort_kills_long_running_process() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = shell_launcher(&rt, "exec sleep 30");
    let (tx, mut rx) = mpsc::channel(16);

    let session = launcher
        .launch(SearchRequest::new(dir.path(), "x", ""), tx)
        .unwrap();
    assert!(session.abort());
    assert_eq!(session.status(), SessionStatus::Cancelled);

    let (lines, end) = collect(&rt, &mut rx, session.id());
    assert!(lines.is_empty());
    assert_eq!(
        end,
        SearchMessage::Cancelled {
            search_id: session.id()
        }
    );

    assert!(!session.abort());
    assert_eq!(session.status(), SessionStatus::Cancelled);
}

#[cfg(unix)]
#[test]
fn abort_after_completion_is_noop() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = shell_launcher(&rt, "true");
    let (tx, mut rx) = mpsc::channel(16);

    let session = launcher
        .launch(SearchRequest::new(dir.path(), "x", ""), tx)
        .unwrap();
    let (_, end) = collect(&rt, &mut rx, session.id());
    assert!(matches!(end, SearchMessage::Complete { .. }));

    assert!(!session.abort());
    assert_eq!(session.status(), SessionStatus::Completed);
}

#[cfg(unix)]
#[test]
fn session_ids_increase() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let launcher = shell_launcher(&rt, "true");
    let (tx, _rx) = mpsc::channel(16);

    let first = launcher
        .launch(SearchRequest::new(dir.path(), "x", ""), tx.clone())
        .unwrap();
    let second = launcher
        .launch(SearchRequest::new(dir.path(), "x", ""), tx)
        .unwrap();
    assert!(second.id() > first.id());
    assert_eq!(second.request().pattern, "x");
}
