use std::fs;
use std::path::PathBuf;

use nba_sheets::standings::{PlayoffBands, STANDINGS_HEADER, parse_standings_html};
use nba_sheets::teams::Conference;
use nba_sheets::writer::standings_rows;

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_both_conferences_western_first() {
    let raw = read_fixture("standings.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    assert_eq!(rows.len(), 30);
    assert!(rows[..15].iter().all(|r| r.conference == Conference::Western));
    assert!(rows[15..].iter().all(|r| r.conference == Conference::Eastern));

    let thunder = &rows[0];
    assert_eq!(thunder.rank, 1);
    assert_eq!(thunder.team, "Oklahoma City Thunder");
    assert_eq!(thunder.record, "64-18");
    assert_eq!(thunder.games_back, 0.0);
    assert_eq!(thunder.playoff_points, 8);

    let celtics = &rows[15];
    assert_eq!(celtics.team, "Boston Celtics");
    assert_eq!(celtics.pct, 0.78);
}

#[test]
fn ranks_are_contiguous_per_conference() {
    let raw = read_fixture("standings.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    for conference in Conference::ALL {
        let mut ranks = rows
            .iter()
            .filter(|r| r.conference == conference)
            .map(|r| r.rank)
            .collect::<Vec<_>>();
        ranks.sort_unstable();
        assert_eq!(ranks, (1..=15).collect::<Vec<_>>());
    }
}

#[test]
fn seeding_markers_are_stripped() {
    let raw = read_fixture("standings.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    let east = rows
        .iter()
        .filter(|r| r.conference == Conference::Eastern)
        .map(|r| r.team.as_str())
        .collect::<Vec<_>>();
    assert_eq!(east[0], "Boston Celtics");
    assert_eq!(east[1], "New York Knicks");
    assert_eq!(east[5], "Indiana Pacers");
}

#[test]
fn dash_values_normalize_to_zero() {
    let raw = read_fixture("standings.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    let last_west = rows
        .iter()
        .find(|r| r.conference == Conference::Western && r.rank == 15)
        .expect("rank 15 should exist");
    assert_eq!(last_west.team, "Portland Trail Blazers");
    assert_eq!(last_west.pct, 0.0);
    assert_eq!(last_west.games_back, 42.0);
    assert!(rows.iter().filter(|r| r.rank == 1).all(|r| r.games_back == 0.0));
}

#[test]
fn playoff_points_follow_bands() {
    let raw = read_fixture("standings.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    for row in &rows {
        let expected = match row.rank {
            1..=6 => 8,
            7..=8 => 4,
            _ => 0,
        };
        assert_eq!(row.playoff_points, expected, "rank {}", row.rank);
    }
}

#[test]
fn missing_gb_column_defaults_to_zero() {
    let raw = read_fixture("standings_no_gb.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    assert_eq!(rows.len(), 30);
    assert!(rows.iter().all(|r| r.games_back == 0.0));
    assert_eq!(rows[1].record, "61-21");
}

#[test]
fn unknown_team_label_fails_extraction() {
    let raw = read_fixture("standings.html").replace("Nuggets", "Sonics");
    assert!(parse_standings_html(&raw, &PlayoffBands::default()).is_err());
}

#[test]
fn wrong_table_count_fails_extraction() {
    let raw = read_fixture("standings.html");
    let first_table_end = raw.find("</table>").expect("fixture has a table") + "</table>".len();
    let truncated = format!("{}</body></html>", &raw[..first_table_end]);
    assert!(parse_standings_html(&truncated, &PlayoffBands::default()).is_err());
}

#[test]
fn duplicate_rank_fails_extraction() {
    let raw = read_fixture("standings.html").replacen("\n  2\n", "\n  1\n", 1);
    assert!(parse_standings_html(&raw, &PlayoffBands::default()).is_err());
}

#[test]
fn formatted_rows_keep_numeric_values() {
    let raw = read_fixture("standings.html");
    let rows = parse_standings_html(&raw, &PlayoffBands::default()).expect("fixture should parse");
    let cells = standings_rows(&rows);
    assert_eq!(cells[0].len(), STANDINGS_HEADER.len());
    for (row, cells) in rows.iter().zip(&cells) {
        let pct: f64 = cells[4].display().parse().expect("pct should reparse");
        let gb: f64 = cells[5].display().parse().expect("gb should reparse");
        assert_eq!(pct, row.pct);
        assert_eq!(gb, row.games_back);
    }
}
