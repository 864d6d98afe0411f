use pretty_assertions::assert_eq;

use super::*;

fn snapshot(kind: SnapshotKind, source: &str, expected: &str) -> Snapshot {
    Snapshot {
        description: "test".to_owned(),
        kind,
        source: source.to_owned(),
        expected: expected.to_owned(),
    }
}

#[test]
fn parse_round_trips_through_regenerate() {
    let snap = snapshot(SnapshotKind::Expr, "1 + 2\n", "NIL");
    let text = regenerate(&snap);
    let reparsed = match parse_snapshot(&text) {
        Ok(s) => s,
        Err(e) => panic!("regenerated snapshot failed to parse: {e}"),
    };
    assert_eq!(reparsed.source, snap.source);
    assert_eq!(reparsed.expected, snap.expected);
    assert_eq!(reparsed.kind, SnapshotKind::Expr);
    // Regeneration is a fixpoint: generated sections are deterministic.
    assert_eq!(regenerate(&reparsed), text);
}

#[test]
fn generated_sections_are_present_in_order() {
    let snap = snapshot(SnapshotKind::Expr, "(|x| x + 1)(41)\n", "NIL");
    let text = regenerate(&snap);
    let positions: Vec<usize> = [
        "# META",
        "# SOURCE",
        "# EXPECTED",
        "# TOKENS",
        "# PARSE",
        "# FORMATTED",
        "# CANONICALIZE",
        "# TYPES",
        "# PROBLEMS",
    ]
    .iter()
    .map(|header| text.find(header).unwrap_or(usize::MAX))
    .collect();
    let mut sorted = positions.clone();
    sorted.sort_unstable();
    assert_eq!(positions, sorted, "sections out of order in:\n{text}");
    assert!(positions.iter().all(|&p| p != usize::MAX));
}

#[test]
fn canonicalize_section_shows_captures() {
    let snap = snapshot(SnapshotKind::Expr, "(|x| |y| x + y)(1)\n", "NIL");
    let text = regenerate(&snap);
    assert!(text.contains("(captures (capture \"x\""), "missing captures in:\n{text}");
}

#[test]
fn expected_nil_fails_when_problems_exist() {
    let snap = snapshot(SnapshotKind::Expr, "nope\n", "NIL");
    assert!(check_expected(&snap).is_err());
}

#[test]
fn expected_diagnostic_matches_by_prefix() {
    let snap = snapshot(SnapshotKind::Expr, "nope\n", "ident_not_in_scope@0..4");
    assert!(check_expected(&snap).is_ok());
}

#[test]
fn repl_expected_checks_line_outputs() {
    let snap = snapshot(
        SnapshotKind::Repl,
        "x = 5\ny = x + 1\nx = 6\ny\n",
        "5 : Int\n---\n6 : Int\n---\n6 : Int\n---\n7 : Int",
    );
    if let Err(e) = check_expected(&snap) {
        panic!("repl snapshot failed: {e}");
    }
}

#[test]
fn runner_is_self_consistent_after_update() {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("tempdir: {e}"),
    };
    // Write a skeleton with empty generated sections; update fills them.
    let skeleton = "# META\ndescription=adds\ntype=expr\n# SOURCE\n~~~\n40 + 2\n~~~\n# EXPECTED\nNIL\n";
    let path = dir.path().join("adds.snap");
    if let Err(e) = std::fs::write(&path, skeleton) {
        panic!("write: {e}");
    }

    let first = run_snapshots(dir.path(), true, None);
    assert!(first.is_success(), "update run failed: {:?}", first.failed);
    assert_eq!(first.updated.len(), 1);

    // A second run without update must now pass byte-for-byte.
    let second = run_snapshots(dir.path(), false, None);
    assert!(second.is_success(), "check run failed: {:?}", second.failed);
    assert!(second.updated.is_empty());
    assert_eq!(second.passed, 1);
}

#[test]
fn stale_generated_sections_fail_without_update() {
    let dir = match tempfile::tempdir() {
        Ok(dir) => dir,
        Err(e) => panic!("tempdir: {e}"),
    };
    let skeleton =
        "# META\ndescription=stale\ntype=expr\n# SOURCE\n~~~\n1 + 1\n~~~\n# EXPECTED\nNIL\n# TOKENS\nwrong\n";
    let path = dir.path().join("stale.snap");
    if let Err(e) = std::fs::write(&path, skeleton) {
        panic!("write: {e}");
    }
    let summary = run_snapshots(dir.path(), false, None);
    assert_eq!(summary.failed.len(), 1);
}
