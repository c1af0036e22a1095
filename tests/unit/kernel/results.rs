use super::*;

fn index_from(output: &str, work_dir: &str) -> ResultIndex {
    let mut index = ResultIndex::new(1, work_dir);
    for raw in output.lines() {
        index.append(&parse_line(raw));
    }
    index
}

#[test]
fn parse_match_line() {
    let line = parse_line("src/main.rs:42:fn main() {");
    assert_eq!(line.location, Some(Location::new("src/main.rs", 42)));
    assert_eq!(line.text, "src/main.rs:42:fn main() {");
}

#[test]
fn parse_keeps_colons_in_matched_text() {
    let line = parse_line("a.txt:3:key: value:7:x");
    assert_eq!(line.location, Some(Location::new("a.txt", 3)));
}

#[test]
fn parse_path_containing_separator() {
    let line = parse_line("dir:with:colons/file.txt:12:hit");
    assert_eq!(
        line.location,
        Some(Location::new("dir:with:colons/file.txt", 12))
    );

    let line = parse_line(r"C:\work\a.cs:5:class A");
    assert_eq!(line.location, Some(Location::new(r"C:\work\a.cs", 5)));
}

#[test]
fn parse_decoration_lines_are_unbound() {
    for raw in [
        "--",
        "a.txt-2-context line",
        "",
        "rg: missing.txt: No such file or directory (os error 2)",
        "summary: 3 matches",
    ] {
        assert!(!parse_line(raw).is_match(), "{raw:?} should be unbound");
    }
}

#[test]
fn parse_malformed_numbers_are_unbound() {
    assert!(!parse_line("a.txt:0:zero is not a line").is_match());
    assert!(!parse_line("a.txt:99999999999999999999999999:overflow").is_match());
    assert!(!parse_line(":5:no path").is_match());
    assert!(!parse_line("a.txt:12").is_match());
}

#[test]
fn parse_strips_line_terminators() {
    let line = parse_line("a.txt:1:foo\r\n");
    assert_eq!(line.text, "a.txt:1:foo");
    assert!(line.is_match());
}

#[test]
fn append_assigns_consecutive_line_numbers() {
    let mut index = ResultIndex::new(7, "/w");
    assert_eq!(index.append(&parse_line("a:1:x")), Some(0));
    assert_eq!(index.append(&ResultLine::unbound("--")), Some(1));
    assert_eq!(index.append(&parse_line("b:2:y")), Some(2));
    assert_eq!(index.len(), 3);
    assert_eq!(index.match_count(), 2);
    assert_eq!(index.search_id(), Some(7));
}

#[test]
fn lookup_returns_binding_recorded_at_append() {
    let raws: Vec<String> = (0..200)
        .map(|i| {
            if i % 3 == 0 {
                "--".to_string()
            } else {
                format!("f{}.rs:{}:text", i, i + 1)
            }
        })
        .collect();

    let mut index = ResultIndex::new(1, "/w");
    for (n, raw) in raws.iter().enumerate() {
        index.append(&parse_line(raw));
        // 已追加的行在后续追加过程中保持不变
        for (m, earlier) in raws.iter().enumerate().take(n + 1).step_by(17) {
            let expected = match parse_line(earlier).location {
                Some(loc) => Lookup::Bound(Location::new(Path::new("/w").join(loc.path), loc.line)),
                None => Lookup::Unbound,
            };
            assert_eq!(index.lookup(m, false), expected);
        }
    }
}

#[test]
fn lookup_past_end_is_not_yet_available() {
    let index = index_from("a.txt:1:x\n--\n", "/w");
    assert_eq!(index.lookup(1, false), Lookup::Unbound);
    assert_eq!(index.lookup(2, false), Lookup::NotYetAvailable);
    assert_eq!(index.lookup(usize::MAX, true), Lookup::NotYetAvailable);

    let empty = ResultIndex::new(2, "/w");
    assert_eq!(empty.lookup(0, false), Lookup::NotYetAvailable);
}

#[test]
fn end_to_end_mock_output() {
    let index = index_from("a.txt:3:foo\n--\nb.txt:10:foo bar\n", "/proj");

    assert_eq!(
        index.lookup(0, false),
        Lookup::Bound(Location::new("/proj/a.txt", 3))
    );
    assert_eq!(index.lookup(1, false), Lookup::Unbound);
    assert_eq!(
        index.lookup(2, false),
        Lookup::Bound(Location::new("/proj/b.txt", 10))
    );

    assert_eq!(
        index.lookup(0, true),
        Lookup::Bound(Location::new("a.txt", 3))
    );
    assert_eq!(
        index.lookup(2, true),
        Lookup::Bound(Location::new("b.txt", 10))
    );
}

#[test]
fn relative_lookup_falls_back_outside_work_dir() {
    let index = index_from("/elsewhere/c.txt:4:x\n./sub/d.txt:5:y\n", "/proj");
    assert_eq!(
        index.lookup(0, true),
        Lookup::Bound(Location::new("/elsewhere/c.txt", 4))
    );
    assert_eq!(
        index.lookup(1, true),
        Lookup::Bound(Location::new("sub/d.txt", 5))
    );
    assert_eq!(
        index.lookup(1, false),
        Lookup::Bound(Location::new("/proj/sub/d.txt", 5))
    );
}

#[test]
fn frozen_index_rejects_appends_but_answers_lookups() {
    let mut index = index_from("a.txt:1:x\n", "/w");
    index.freeze();
    assert!(index.is_frozen());
    assert_eq!(index.append(&parse_line("b.txt:2:y")), None);
    assert_eq!(index.len(), 1);
    assert_eq!(
        index.lookup(0, true),
        Lookup::Bound(Location::new("a.txt", 1))
    );
    assert_eq!(index.lookup(1, true), Lookup::NotYetAvailable);
}

#[test]
fn locator_formats_path_and_line() {
    assert_eq!(Location::new("src/lib.rs", 9).locator(), "src/lib.rs:9");
}
