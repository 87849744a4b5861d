use std::fs;
use std::path::PathBuf;

use anyhow::{Result, anyhow};
use nba_sheets::http_client::PageFetcher;
use nba_sheets::player_stats::{default_tiebreakers, extract_stat, fetch_tiebreaker_value};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

struct FixturePage(String);

impl PageFetcher for FixturePage {
    fn fetch(&self, _url: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

struct DownPage;

impl PageFetcher for DownPage {
    fn fetch(&self, url: &str) -> Result<String> {
        Err(anyhow!("connection refused: {url}"))
    }
}

#[test]
fn extracts_current_season_totals() {
    let raw = read_fixture("player_totals.html");
    let assists: i64 = extract_stat(&raw, "totals_stats", "totals_stats.2026", "ast")
        .expect("assists should parse");
    let games: i64 = extract_stat(&raw, "totals_stats", "totals_stats.2026", "games")
        .expect("games should parse");
    assert_eq!(assists, 61);
    assert_eq!(games, 6);
}

#[test]
fn picks_the_requested_season_row() {
    let raw = read_fixture("player_totals.html");
    let assists: i64 = extract_stat(&raw, "totals_stats", "totals_stats.2025", "ast")
        .expect("assists should parse");
    assert_eq!(assists, 716);
}

#[test]
fn empty_cell_is_an_error() {
    let raw = read_fixture("player_totals.html");
    let result = extract_stat::<i64>(&raw, "totals_stats", "totals_stats.2026", "tech_fouls");
    assert!(result.is_err());
}

#[test]
fn missing_table_row_or_stat_is_an_error() {
    let raw = read_fixture("player_totals.html");
    assert!(extract_stat::<i64>(&raw, "per_game", "totals_stats.2026", "ast").is_err());
    assert!(extract_stat::<i64>(&raw, "totals_stats", "totals_stats.2027", "ast").is_err());
    assert!(extract_stat::<i64>(&raw, "totals_stats", "totals_stats.2026", "blk").is_err());
}

#[test]
fn default_sources_read_from_fixture_page() {
    let fetcher = FixturePage(read_fixture("player_totals.html"));
    let values = default_tiebreakers()
        .iter()
        .map(|source| fetch_tiebreaker_value(&fetcher, source).expect("value should parse"))
        .collect::<Vec<_>>();
    assert_eq!(values, vec![61, 6]);
}

#[test]
fn fetch_failure_propagates() {
    let source = &default_tiebreakers()[0];
    assert!(fetch_tiebreaker_value(&DownPage, source).is_err());
}
