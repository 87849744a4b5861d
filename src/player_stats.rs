use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

use crate::http_client::PageFetcher;

pub const TIEBREAKERS_HEADER: [&str; 3] = ["Tiebreaker #", "Description", "Value"];

/// Where a tiebreaker's actual value lives: a totals table on a player page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiebreakerSource {
    pub index: u8,
    pub description: String,
    pub url: String,
    pub table_id: String,
    pub row_id: String,
    pub stat: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiebreakerDefinition {
    pub index: u8,
    pub description: String,
    pub value: Option<i64>,
}

pub fn default_tiebreakers() -> Vec<TiebreakerSource> {
    vec![
        TiebreakerSource {
            index: 1,
            description: "Nikola Jokic total assists".to_string(),
            url: "https://www.basketball-reference.com/players/j/jokicni01.html".to_string(),
            table_id: "totals_stats".to_string(),
            row_id: "totals_stats.2026".to_string(),
            stat: "ast".to_string(),
        },
        TiebreakerSource {
            index: 2,
            description: "Victor Wembanyama games played".to_string(),
            url: "https://www.basketball-reference.com/players/w/wembavi01.html".to_string(),
            table_id: "totals_stats".to_string(),
            row_id: "totals_stats.2026".to_string(),
            stat: "games".to_string(),
        },
    ]
}

pub fn fetch_tiebreaker_value(fetcher: &dyn PageFetcher, source: &TiebreakerSource) -> Result<i64> {
    let html = fetcher
        .fetch(&source.url)
        .with_context(|| format!("tiebreaker {} request failed", source.index))?;
    extract_stat(&html, &source.table_id, &source.row_id, &source.stat)
}

/// Reads one cell from a totals table: the `<tr id=row_id>` inside
/// `<table id=table_id>`, column picked by its `data-stat` attribute.
pub fn extract_stat<T>(html: &str, table_id: &str, row_id: &str, stat: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("td, th")?;

    let table = document
        .select(&table_sel)
        .find(|t| t.value().id() == Some(table_id))
        .ok_or_else(|| anyhow!("table #{table_id} not found"))?;
    let row = table
        .select(&row_sel)
        .find(|r| r.value().id() == Some(row_id))
        .ok_or_else(|| anyhow!("row #{row_id} not found in #{table_id}"))?;
    let cell = row
        .select(&cell_sel)
        .find(|c| c.value().attr("data-stat") == Some(stat))
        .ok_or_else(|| anyhow!("stat {stat:?} not found in row #{row_id}"))?;

    let raw = cell_text(cell);
    let cleaned = raw.trim().replace(',', "");
    cleaned
        .parse::<T>()
        .with_context(|| format!("stat {stat:?} has unparseable value {cleaned:?}"))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>()
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid selector {raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><body>
        <table id="totals_stats">
          <tr><th data-stat="year_id">Season</th><th data-stat="games">G</th><th data-stat="ast">AST</th></tr>
          <tr id="totals_stats.2025"><th data-stat="year_id">2024-25</th><td data-stat="games">70</td><td data-stat="ast">716</td></tr>
          <tr id="totals_stats.2026"><th data-stat="year_id">2025-26</th><td data-stat="games"> 12 </td><td data-stat="ast">1,104</td></tr>
        </table>
    </body></html>"#;

    #[test]
    fn reads_integer_stat_from_row() {
        let games: i64 = extract_stat(PAGE, "totals_stats", "totals_stats.2026", "games").unwrap();
        assert_eq!(games, 12);
        let ast: i64 = extract_stat(PAGE, "totals_stats", "totals_stats.2026", "ast").unwrap();
        assert_eq!(ast, 1104);
    }

    #[test]
    fn reads_float_when_asked() {
        let games: f64 = extract_stat(PAGE, "totals_stats", "totals_stats.2025", "games").unwrap();
        assert_eq!(games, 70.0);
    }

    #[test]
    fn missing_row_or_column_fails() {
        assert!(extract_stat::<i64>(PAGE, "totals_stats", "totals_stats.2027", "games").is_err());
        assert!(extract_stat::<i64>(PAGE, "totals_stats", "totals_stats.2026", "tov").is_err());
        assert!(extract_stat::<i64>(PAGE, "per_game", "totals_stats.2026", "games").is_err());
    }

    #[test]
    fn non_numeric_cell_fails() {
        assert!(extract_stat::<i64>(PAGE, "totals_stats", "totals_stats.2026", "year_id").is_err());
    }
}
