use super::*;
use crate::kernel::services::adapters::storage::load_history_from;
use crate::kernel::services::ports::SessionStatus;
use tempfile::tempdir;

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

/// Settings whose "search tool" is a shell script; the pattern arrives as `$0`.
fn shell_settings(script: &str) -> Settings {
    Settings {
        tool: "sh".to_string(),
        base_args: vec!["-c".to_string(), script.to_string()],
        editor: "true".to_string(),
        ..Settings::default()
    }
}

const TWO_HITS: &str = "printf '%s\\n' \"$PWD/a.txt:2:foo\" '--' \"$PWD/sub/b.txt:1:Foo bar\"";

fn fixture() -> tempfile::TempDir {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("a.txt"), "zero\nsome foo here\n").unwrap();
    std::fs::create_dir_all(dir.path().join("sub")).unwrap();
    std::fs::write(dir.path().join("sub").join("b.txt"), "Foo bar\n").unwrap();
    dir
}

#[test]
fn snapshot_captures_current_inputs() {
    let rt = create_runtime();
    let mut wb = Workbench::new(
        rt.handle().clone(),
        Settings::default(),
        History::default(),
        "/w",
    );
    wb.set_pattern("needle");
    wb.set_extra_args("-w");

    let request = wb.snapshot();
    wb.set_pattern("changed");
    assert_eq!(request, SearchRequest::new("/w", "needle", "-w"));
    assert_eq!(wb.presets().len(), 6);
}

#[test]
fn successful_submit_records_and_persists_history() {
    let rt = create_runtime();
    let dir = fixture();
    let history_path = dir.path().join("state").join("history.json");
    let mut wb = Workbench::new(
        rt.handle().clone(),
        shell_settings(TWO_HITS),
        History::default(),
        dir.path(),
    )
    .with_history_path(&history_path);
    wb.set_pattern("foo");

    wb.submit().unwrap();
    assert!(wb.wait_for_search(Duration::from_secs(5)));
    assert_eq!(wb.state().status, Some(SessionStatus::Completed));
    assert_eq!(wb.state().line_count(), 3);

    let saved = load_history_from(&history_path, 50).unwrap();
    assert_eq!(saved.all(HistoryKind::Pattern), ["foo"]);
    assert_eq!(
        saved.all(HistoryKind::Directory),
        [dir.path().display().to_string().as_str()]
    );
}

#[test]
fn failed_submit_leaves_history_alone() {
    let rt = create_runtime();
    let dir = tempdir().unwrap();
    let history_path = dir.path().join("history.json");
    let mut wb = Workbench::new(
        rt.handle().clone(),
        shell_settings("echo x"),
        History::default(),
        dir.path().join("missing"),
    )
    .with_history_path(&history_path);
    wb.set_pattern("foo");

    assert!(wb.submit().is_err());
    assert!(wb.history().list(HistoryKind::Pattern).is_empty());
    assert!(!history_path.exists());
    assert!(wb.state().status_text().starts_with("Failed: "));
}

#[test]
fn navigation_resolves_lines_through_the_index() {
    let rt = create_runtime();
    let dir = fixture();
    std::fs::write(dir.path().join("package.json"), "{}").unwrap();
    let mut wb = Workbench::new(
        rt.handle().clone(),
        shell_settings(TWO_HITS),
        History::default(),
        dir.path(),
    );
    wb.set_pattern("foo");
    wb.submit().unwrap();
    assert!(wb.wait_for_search(Duration::from_secs(5)));

    match wb.navigate(NavigationAction::Edit, 1).unwrap() {
        NavigationOutcome::Skipped(Lookup::Unbound) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }
    match wb.navigate(NavigationAction::Preview, 9).unwrap() {
        NavigationOutcome::Skipped(Lookup::NotYetAvailable) => {}
        other => panic!("unexpected outcome: {other:?}"),
    }

    match wb.navigate(NavigationAction::Preview, 0).unwrap() {
        NavigationOutcome::Previewed(preview) => {
            assert_eq!(preview.line, 2);
            assert_eq!(preview.highlight.map(|m| m.line), Some(1));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(wb.status_line().to_string(), "a.txt +2");

    match wb.navigate(NavigationAction::Edit, 2).unwrap() {
        NavigationOutcome::Edited(location) => {
            assert_eq!(location, Location::new(dir.path().join("sub/b.txt"), 1));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    match wb.navigate(NavigationAction::OpenProject, 2).unwrap() {
        NavigationOutcome::OpenedProject { root, .. } => assert_eq!(root, dir.path()),
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[test]
fn buffer_find_wraps_and_moves_cursor() {
    let rt = create_runtime();
    let dir = fixture();
    let mut wb = Workbench::new(
        rt.handle().clone(),
        shell_settings(TWO_HITS),
        History::default(),
        dir.path(),
    );
    wb.set_pattern("foo");
    wb.set_extra_args("-i");
    wb.submit().unwrap();
    assert!(wb.wait_for_search(Duration::from_secs(5)));

    let first = wb.find_in_buffer("FOO", SearchDirection::Forward).unwrap();
    assert_eq!((first.found.line, first.wrapped), (0, false));
    let second = wb.find_in_buffer("foo", SearchDirection::Forward).unwrap();
    assert_eq!((second.found.line, second.wrapped), (2, false));
    let third = wb.find_in_buffer("foo", SearchDirection::Forward).unwrap();
    assert_eq!((third.found.line, third.wrapped), (0, true));

    let back = wb.find_in_buffer("foo", SearchDirection::Backward).unwrap();
    assert!(back.found.overlaps(&third.found));

    assert_eq!(wb.cursor_line(), 0);
    assert_eq!(wb.status_line().to_string(), "a.txt +2  [-i]");
    assert!(wb.find_in_buffer("absent", SearchDirection::Forward).is_none());
}
