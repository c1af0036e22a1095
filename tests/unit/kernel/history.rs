use super::*;

#[test]
fn remember_puts_newest_first() {
    let mut list = HistoryList::new(10);
    assert!(list.remember("a"));
    assert!(list.remember("b"));
    assert!(list.remember("c"));
    assert_eq!(list.as_slice(), ["c", "b", "a"]);
}

#[test]
fn remember_existing_moves_without_duplicating() {
    let mut list = HistoryList::new(10);
    list.remember("a");
    list.remember("b");
    list.remember("c");

    assert!(list.remember("a"));
    assert_eq!(list.len(), 3);
    assert_eq!(list.as_slice(), ["a", "c", "b"]);

    assert!(!list.remember("a"));
    assert_eq!(list.len(), 3);
}

#[test]
fn overflow_evicts_least_recently_used() {
    let mut list = HistoryList::new(3);
    list.remember("a");
    list.remember("b");
    list.remember("c");
    // 触碰 a，使 b 成为最久未用
    list.remember("a");
    list.remember("d");

    assert_eq!(list.len(), 3);
    assert_eq!(list.as_slice(), ["d", "a", "c"]);
}

#[test]
fn eviction_keeps_whole_entries() {
    let long = "x".repeat(4096);
    let mut list = HistoryList::new(2);
    list.remember(&long);
    list.remember("short");
    list.remember("other");
    assert_eq!(list.as_slice(), ["other", "short"]);

    list.remember(&long);
    assert_eq!(list.most_recent(), Some(long.as_str()));
}

#[test]
fn empty_values_are_ignored() {
    let mut list = HistoryList::new(3);
    assert!(!list.remember(""));
    assert!(list.is_empty());
}

#[test]
fn zero_limit_still_keeps_latest() {
    let mut list = HistoryList::new(0);
    list.remember("a");
    list.remember("b");
    assert_eq!(list.as_slice(), ["b"]);
}

#[test]
fn from_entries_dedups_and_bounds() {
    let list = HistoryList::from_entries(["a", "b", "a", "", "c", "d"], 3);
    assert_eq!(list.as_slice(), ["a", "b", "c"]);
}

#[test]
fn kinds_are_independent() {
    let mut history = History::new(5);
    history.remember(HistoryKind::Directory, "/src");
    history.remember(HistoryKind::Pattern, "todo");
    history.remember(HistoryKind::Pattern, "fixme");

    assert_eq!(history.all(HistoryKind::Directory), vec!["/src"]);
    assert_eq!(history.all(HistoryKind::Pattern), vec!["fixme", "todo"]);
}

#[test]
fn file_roundtrip_preserves_order_and_uniqueness() {
    let mut history = History::new(50);
    for dir in ["/a", "/b", "/a", "/c"] {
        history.remember(HistoryKind::Directory, dir);
    }
    for pat in ["x", "y"] {
        history.remember(HistoryKind::Pattern, pat);
    }

    let json = serde_json::to_string(&history.to_file()).unwrap();
    let decoded: HistoryFile = serde_json::from_str(&json).unwrap();
    let restored = History::from_file(decoded, 50);

    assert_eq!(restored, history);
    assert_eq!(restored.all(HistoryKind::Directory), vec!["/c", "/a", "/b"]);
}

#[test]
fn history_file_tolerates_missing_lists() {
    let decoded: HistoryFile = serde_json::from_str("{}").unwrap();
    assert_eq!(decoded, HistoryFile::default());
}
