use std::collections::HashSet;
use std::path::PathBuf;

use football_docs::selection::{SelectionPolicy, select_rows, team_has_prefix};
use football_docs::source::{SourceRow, load_csv};

fn fixture_rows() -> Vec<SourceRow> {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push("players_sample.csv");
    load_csv(&path).expect("fixture csv should load")
}

fn ids(rows: &[&SourceRow]) -> Vec<String> {
    rows.iter()
        .map(|row| row.get("Player_id").unwrap_or_default().to_string())
        .collect()
}

fn team_row(line: u64, id: &str, team: &str) -> SourceRow {
    SourceRow::new(line).with("Player_id", id).with("Squad", team)
}

#[test]
fn default_policy_prioritizes_five_manchester_rows() {
    let rows = fixture_rows();
    let selection = select_rows(&rows, &SelectionPolicy::default());

    assert_eq!(selection.priority, 5);
    assert_eq!(
        ids(&selection.rows),
        vec!["p01", "p03", "p05", "p06", "p07", "p02", "p04", "p09", "p10"]
    );
    // p08 is the sixth Manchester row and is never used as filler.
    assert!(!ids(&selection.rows).contains(&"p08".to_string()));
}

#[test]
fn target_caps_the_total() {
    let rows = fixture_rows();
    let policy = SelectionPolicy {
        target: 7,
        ..SelectionPolicy::default()
    };
    let selection = select_rows(&rows, &policy);
    assert_eq!(selection.len(), 7);
    assert_eq!(
        ids(&selection.rows),
        vec!["p01", "p03", "p05", "p06", "p07", "p02", "p04"]
    );
}

#[test]
fn quota_is_clamped_to_target() {
    let rows = fixture_rows();
    let policy = SelectionPolicy {
        target: 3,
        ..SelectionPolicy::default()
    };
    let selection = select_rows(&rows, &policy);
    assert_eq!(selection.priority, 3);
    assert_eq!(ids(&selection.rows), vec!["p01", "p03", "p05"]);
}

#[test]
fn few_priority_rows_are_topped_up_with_others() {
    let rows = vec![
        team_row(2, "a", "Chelsea"),
        team_row(3, "b", "Manchester City"),
        team_row(4, "c", "Arsenal"),
        SourceRow::new(5).with("Player_id", "d"),
    ];
    let selection = select_rows(&rows, &SelectionPolicy::default());
    assert_eq!(selection.priority, 1);
    // Rows without a team name count as non-matching filler.
    assert_eq!(ids(&selection.rows), vec!["b", "a", "c", "d"]);
}

#[test]
fn selection_never_repeats_rows_or_exceeds_limits() {
    let mut rows = Vec::new();
    for idx in 0..150u64 {
        let team = if idx % 3 == 0 {
            "Manchester United"
        } else {
            "Everton"
        };
        rows.push(team_row(idx + 2, &format!("r{idx}"), team));
    }
    let selection = select_rows(&rows, &SelectionPolicy::default());
    assert_eq!(selection.len(), 100);

    let manchester = selection
        .rows
        .iter()
        .filter(|row| team_has_prefix(row, "Manchester"))
        .count();
    assert_eq!(manchester, 5);

    let unique: HashSet<u64> = selection.rows.iter().map(|row| row.line()).collect();
    assert_eq!(unique.len(), selection.len());
}

#[test]
fn prefix_match_is_case_sensitive() {
    let row = team_row(2, "a", "manchester united");
    assert!(!team_has_prefix(&row, "Manchester"));
}
