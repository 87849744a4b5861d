use anyhow::{Context, Result, anyhow, bail};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::http_client::PageFetcher;
use crate::teams::{Conference, canonical_team_name};

pub const STANDINGS_HEADER: [&str; 7] = [
    "Conference",
    "Rank",
    "Team",
    "W-L",
    "PCT",
    "GB",
    "Playoff Points",
];

const SEEDING_MARKERS: [char; 3] = ['X', 'Y', 'Z'];

#[derive(Debug, Clone, PartialEq)]
pub struct StandingsRow {
    pub conference: Conference,
    pub rank: u32,
    pub team: String,
    pub record: String,
    pub pct: f64,
    pub games_back: f64,
    pub playoff_points: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoffBand {
    pub through_rank: u32,
    pub points: i64,
}

/// Rank bands checked in order; ranks past the last band earn nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayoffBands {
    pub bands: Vec<PlayoffBand>,
}

impl Default for PlayoffBands {
    fn default() -> Self {
        Self {
            bands: vec![
                PlayoffBand {
                    through_rank: 6,
                    points: 8,
                },
                PlayoffBand {
                    through_rank: 8,
                    points: 4,
                },
            ],
        }
    }
}

impl PlayoffBands {
    pub fn points(&self, rank: u32) -> i64 {
        self.bands
            .iter()
            .find(|band| rank <= band.through_rank)
            .map(|band| band.points)
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnOffsets {
    pub rank: usize,
    pub team: usize,
    pub record: Option<usize>,
    pub pct: Option<usize>,
    pub games_back: Option<usize>,
}

impl ColumnOffsets {
    fn max_offset(&self) -> usize {
        [
            Some(self.rank),
            Some(self.team),
            self.record,
            self.pct,
            self.games_back,
        ]
        .into_iter()
        .flatten()
        .max()
        .unwrap_or(0)
    }
}

pub fn fetch_standings(
    fetcher: &dyn PageFetcher,
    url: &str,
    bands: &PlayoffBands,
) -> Result<Vec<StandingsRow>> {
    let html = fetcher.fetch(url).context("standings request failed")?;
    let rows = parse_standings_html(&html, bands)?;
    info!(rows = rows.len(), "parsed standings");
    Ok(rows)
}

/// Parses the two conference tables (Eastern first on the page) into one
/// table, Western rows first.
pub fn parse_standings_html(html: &str, bands: &PlayoffBands) -> Result<Vec<StandingsRow>> {
    let document = Html::parse_document(html);
    let table_sel = selector("table.data-table")?;
    let tables = document.select(&table_sel).collect::<Vec<_>>();
    let [eastern, western] = tables.as_slice() else {
        bail!("expected 2 standings tables, found {}", tables.len());
    };

    let west = parse_conference_table(*western, Conference::Western, bands)
        .context("western standings")?;
    let east = parse_conference_table(*eastern, Conference::Eastern, bands)
        .context("eastern standings")?;
    validate_ranks(&west, Conference::Western)?;
    validate_ranks(&east, Conference::Eastern)?;
    if west.len() != east.len() {
        bail!(
            "conference sizes differ: western {} vs eastern {}",
            west.len(),
            east.len()
        );
    }

    let mut out = west;
    out.extend(east);
    Ok(out)
}

pub fn parse_conference_table(
    table: ElementRef<'_>,
    conference: Conference,
    bands: &PlayoffBands,
) -> Result<Vec<StandingsRow>> {
    let offsets = locate_columns(table)?;
    for (label, found) in [
        ("W-L", offsets.record),
        ("PCT", offsets.pct),
        ("GB", offsets.games_back),
    ] {
        if found.is_none() {
            warn!(%conference, column = label, "standings column missing, defaulting to 0");
        }
    }

    let row_sel = selector("tr")?;
    let cell_sel = selector("td")?;
    let mut out = Vec::new();
    for (idx, row) in table.select(&row_sel).enumerate() {
        let cells = row.select(&cell_sel).collect::<Vec<_>>();
        if cells.is_empty() {
            continue;
        }
        if cells.len() <= offsets.max_offset() {
            bail!(
                "row {idx} has {} cells, need {}",
                cells.len(),
                offsets.max_offset() + 1
            );
        }
        let text_at = |offset: usize| clean_cell(&cell_text(cells[offset]));

        let rank_raw = text_at(offsets.rank);
        let rank = rank_raw
            .parse::<u32>()
            .with_context(|| format!("row {idx}: invalid rank {rank_raw:?}"))?;
        let team = canonical_team_name(&text_at(offsets.team))
            .with_context(|| format!("row {idx}"))?
            .to_string();
        let record = offsets
            .record
            .map(text_at)
            .unwrap_or_else(|| "0".to_string());
        let pct = match offsets.pct {
            Some(offset) => parse_dash_float(&text_at(offset))
                .with_context(|| format!("row {idx}: invalid PCT"))?,
            None => 0.0,
        };
        let games_back = match offsets.games_back {
            Some(offset) => parse_dash_float(&text_at(offset))
                .with_context(|| format!("row {idx}: invalid GB"))?,
            None => 0.0,
        };

        out.push(StandingsRow {
            conference,
            rank,
            team,
            record,
            pct,
            games_back,
            playoff_points: bands.points(rank),
        });
    }

    if out.is_empty() {
        bail!("no standings rows for {conference}");
    }
    Ok(out)
}

/// Walks the header cells left to right, summing colspans into 0-based
/// offsets. Rank and team fall back to the first two columns.
pub fn locate_columns(table: ElementRef<'_>) -> Result<ColumnOffsets> {
    let row_sel = selector("tr")?;
    let th_sel = selector("th")?;
    let header = table
        .select(&row_sel)
        .find(|row| row.select(&th_sel).next().is_some())
        .ok_or_else(|| anyhow!("standings table has no header row"))?;

    let mut offsets = ColumnOffsets {
        rank: 0,
        team: 1,
        record: None,
        pct: None,
        games_back: None,
    };
    let mut position = 0usize;
    for cell in header.select(&th_sel) {
        let span = cell
            .value()
            .attr("colspan")
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(1)
            .max(1);
        position += span;
        let offset = position - 1;
        match cell_text(cell).trim().to_ascii_uppercase().as_str() {
            "RANK" | "RK" | "#" => offsets.rank = offset,
            "TEAM" => offsets.team = offset,
            "W-L" => offsets.record = Some(offset),
            "PCT" => offsets.pct = Some(offset),
            "GB" => offsets.games_back = Some(offset),
            _ => {}
        }
    }
    Ok(offsets)
}

fn validate_ranks(rows: &[StandingsRow], conference: Conference) -> Result<()> {
    let mut ranks = rows.iter().map(|r| r.rank).collect::<Vec<_>>();
    ranks.sort_unstable();
    for (expected, rank) in (1u32..).zip(&ranks) {
        if *rank != expected {
            bail!("{conference} ranks are not 1..{}: {ranks:?}", rows.len());
        }
    }
    Ok(())
}

pub fn clean_cell(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(SEEDING_MARKERS)
        .trim_end()
        .to_string()
}

pub fn parse_dash_float(raw: &str) -> Result<f64> {
    let trimmed = raw.trim();
    if trimmed == "-" || trimmed == "—" {
        return Ok(0.0);
    }
    trimmed
        .parse::<f64>()
        .with_context(|| format!("not a number: {trimmed:?}"))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>()
}

fn selector(raw: &str) -> Result<Selector> {
    Selector::parse(raw).map_err(|e| anyhow!("invalid selector {raw:?}: {e}"))
}
