use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::picks::{STANDINGS_PICKS_HEADER, StandingsPick, TIEBREAKER_PICKS_HEADER, TiebreakerPick};
use crate::player_stats::{TIEBREAKERS_HEADER, TiebreakerDefinition};
use crate::scoring::{PICKS_SUMMARY_HEADER, PicksSummaryRow, RANK_POINTS};
use crate::sheets::{Cell, CellRef, SheetStore, ValueInput, quote_sheet};
use crate::standings::{STANDINGS_HEADER, StandingsRow};

/// Rows the standings lookups span: both conferences, every team.
pub const LEAGUE_TEAMS: u32 = 30;

pub const SCORED_PICKS_COLUMNS: [&str; 4] =
    ["Standings Rank", "Rank Points", "Playoff Points", "Total Points"];
pub const SCORED_TIEBREAKER_COLUMNS: [&str; 2] = ["Actual Value", "Difference"];

// Column positions in the standings sheet.
const STANDINGS_RANK_COL: u32 = 1;
const STANDINGS_TEAM_COL: u32 = 2;
const STANDINGS_POINTS_COL: u32 = 6;

/// A table as written: header row first.
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenTable {
    pub sheet: String,
    pub grid: Vec<Vec<Cell>>,
}

/// Creates the sheet sized to the table, or overwrites its used range.
///
/// The header is only rewritten when row 1 differs from it. Rows and columns
/// left over from a larger previous table are blanked. When any cell is a
/// formula the block is user-entered, so literal text that the store would
/// evaluate is escaped first.
pub fn upsert_table(
    store: &mut dyn SheetStore,
    sheet: &str,
    header: &[String],
    rows: Vec<Vec<Cell>>,
) -> Result<WrittenTable> {
    let input = if rows.iter().flatten().any(Cell::is_formula) {
        ValueInput::UserEntered
    } else {
        ValueInput::Raw
    };
    let header_cells = header.iter().map(|h| Cell::text(h.as_str())).collect::<Vec<_>>();
    let table = WrittenTable {
        sheet: sheet.to_string(),
        grid: std::iter::once(header_cells.clone())
            .chain(rows.iter().cloned())
            .collect(),
    };
    let prepare = |row: &[Cell], width: usize| {
        let mut out = row
            .iter()
            .map(|cell| match input {
                ValueInput::UserEntered => cell.escaped_for_input(),
                ValueInput::Raw => cell.clone(),
            })
            .collect::<Vec<_>>();
        out.resize(width.max(out.len()), Cell::Empty);
        out
    };

    if !store.has_sheet(sheet)? {
        info!(sheet, "creating sheet");
        store
            .add_sheet(sheet, rows.len() as u32 + 1, header.len() as u32)
            .with_context(|| format!("create sheet {sheet:?}"))?;
        let grid = table
            .grid
            .iter()
            .map(|row| prepare(row, 0))
            .collect::<Vec<_>>();
        store
            .write_range(sheet, CellRef::ORIGIN, &grid, input)
            .with_context(|| format!("write {sheet:?}"))?;
        return Ok(table);
    }

    let existing = store
        .read_rows(sheet, 0, None)
        .with_context(|| format!("read used range of {sheet:?}"))?;
    let header_matches = existing.first().is_some_and(|first| {
        first.len() == header.len() && first.iter().zip(header).all(|(a, b)| a.trim() == b)
    });
    let used_rows = existing.len();
    let width = existing
        .iter()
        .map(Vec::len)
        .chain([header.len()])
        .max()
        .unwrap_or(0);

    let data_rows = rows.len();
    let stale = used_rows.saturating_sub(data_rows + 1);
    let mut body = rows
        .iter()
        .map(|row| prepare(row, width))
        .collect::<Vec<_>>();
    body.extend((0..stale).map(|_| vec![Cell::Empty; width]));
    debug!(sheet, header_matches, data_rows, stale, width, "overwriting sheet");

    if header_matches {
        if !body.is_empty() {
            store
                .write_range(sheet, CellRef::new(1, 0), &body, input)
                .with_context(|| format!("write {sheet:?}"))?;
        }
    } else {
        let mut grid = Vec::with_capacity(body.len() + 1);
        grid.push(prepare(&header_cells, width));
        grid.extend(body);
        store
            .write_range(sheet, CellRef::ORIGIN, &grid, input)
            .with_context(|| format!("write {sheet:?}"))?;
    }
    Ok(table)
}

pub fn header(base: &[&str], extra: &[&str]) -> Vec<String> {
    base.iter().chain(extra).map(|s| s.to_string()).collect()
}

pub fn standings_rows(rows: &[StandingsRow]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| {
            vec![
                Cell::text(row.conference.label()),
                Cell::from(row.rank),
                Cell::text(row.team.as_str()),
                Cell::text(row.record.as_str()),
                Cell::from(row.pct),
                Cell::from(row.games_back),
                Cell::from(row.playoff_points),
            ]
        })
        .collect()
}

pub fn write_standings(
    store: &mut dyn SheetStore,
    sheet: &str,
    rows: &[StandingsRow],
) -> Result<WrittenTable> {
    upsert_table(store, sheet, &header(&STANDINGS_HEADER, &[]), standings_rows(rows))
}

pub fn write_tiebreakers(
    store: &mut dyn SheetStore,
    sheet: &str,
    definitions: &[TiebreakerDefinition],
) -> Result<WrittenTable> {
    let rows = definitions
        .iter()
        .map(|d| {
            vec![
                Cell::from(d.index),
                Cell::text(d.description.as_str()),
                Cell::from(d.value),
            ]
        })
        .collect();
    upsert_table(store, sheet, &header(&TIEBREAKERS_HEADER, &[]), rows)
}

/// Absolute references into the standings sheet for live lookups.
#[derive(Debug, Clone)]
pub struct StandingsLookup {
    sheet: String,
    teams: u32,
}

impl StandingsLookup {
    pub fn new(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            teams: LEAGUE_TEAMS,
        }
    }

    fn column(&self, col: u32) -> String {
        let top = CellRef::new(1, col).absolute();
        let bottom = CellRef::new(self.teams, col).absolute();
        format!("{}!{top}:{bottom}", quote_sheet(&self.sheet))
    }

    fn lookup(&self, key_cell: &str, value_col: u32) -> String {
        format!(
            "INDEX({}, MATCH({key_cell}, {}, 0))",
            self.column(value_col),
            self.column(STANDINGS_TEAM_COL)
        )
    }
}

/// Sheet version of [`crate::scoring::rank_points`], built from the same
/// [`RANK_POINTS`] table. Blank actual rank scores 0.
pub fn rank_points_formula(picked: &str, actual: &str) -> String {
    let points = RANK_POINTS
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    format!("=IF({actual}=\"\", 0, IFERROR(CHOOSE(ABS({picked}-{actual})+1, {points}), 0))")
}

pub fn standings_pick_rows(picks: &[StandingsPick], lookup: &StandingsLookup) -> Vec<Vec<Cell>> {
    picks
        .iter()
        .enumerate()
        .map(|(idx, pick)| {
            let r = idx + 2;
            let team = format!("F{r}");
            let picked = format!("E{r}");
            let actual = format!("G{r}");
            vec![
                Cell::text(pick.participant.email.as_str()),
                Cell::text(pick.participant.name.as_str()),
                Cell::text(pick.participant.source.as_str()),
                Cell::text(pick.conference.label()),
                Cell::from(pick.picks_rank),
                Cell::text(pick.team.as_str()),
                Cell::formula(format!(
                    "IFERROR({}, \"\")",
                    lookup.lookup(&team, STANDINGS_RANK_COL)
                )),
                Cell::formula(rank_points_formula(&picked, &actual)),
                Cell::formula(format!(
                    "IFERROR({}, 0)",
                    lookup.lookup(&team, STANDINGS_POINTS_COL)
                )),
                Cell::formula(format!("H{r}+I{r}")),
            ]
        })
        .collect()
}

pub fn write_standings_picks(
    store: &mut dyn SheetStore,
    sheet: &str,
    standings_sheet: &str,
    picks: &[StandingsPick],
) -> Result<WrittenTable> {
    let lookup = StandingsLookup::new(standings_sheet);
    upsert_table(
        store,
        sheet,
        &header(&STANDINGS_PICKS_HEADER, &SCORED_PICKS_COLUMNS),
        standings_pick_rows(picks, &lookup),
    )
}

pub fn tiebreaker_pick_rows(
    picks: &[TiebreakerPick],
    tiebreakers_sheet: &str,
    tiebreakers: u32,
) -> Vec<Vec<Cell>> {
    let column = |col: u32| {
        format!(
            "{}!{}:{}",
            quote_sheet(tiebreakers_sheet),
            CellRef::new(1, col).absolute(),
            CellRef::new(tiebreakers.max(1), col).absolute()
        )
    };
    let (index_range, value_range) = (column(0), column(2));

    picks
        .iter()
        .enumerate()
        .map(|(idx, pick)| {
            let r = idx + 2;
            vec![
                Cell::text(pick.participant.email.as_str()),
                Cell::text(pick.participant.name.as_str()),
                Cell::text(pick.participant.source.as_str()),
                Cell::from(pick.index),
                Cell::from(pick.value),
                Cell::formula(format!(
                    "IFERROR(INDEX({value_range}, MATCH(D{r}, {index_range}, 0)), \"\")"
                )),
                Cell::formula(format!(
                    "IF(OR(E{r}=\"\", F{r}=\"\"), \"\", ABS(E{r}-F{r}))"
                )),
            ]
        })
        .collect()
}

pub fn write_tiebreaker_picks(
    store: &mut dyn SheetStore,
    sheet: &str,
    tiebreakers_sheet: &str,
    tiebreakers: u32,
    picks: &[TiebreakerPick],
) -> Result<WrittenTable> {
    upsert_table(
        store,
        sheet,
        &header(&TIEBREAKER_PICKS_HEADER, &SCORED_TIEBREAKER_COLUMNS),
        tiebreaker_pick_rows(picks, tiebreakers_sheet, tiebreakers),
    )
}

pub fn summary_rows(rows: &[PicksSummaryRow]) -> Vec<Vec<Cell>> {
    rows.iter()
        .map(|row| {
            vec![
                Cell::text(row.conference.label()),
                Cell::text(row.team.as_str()),
                Cell::from(row.highest),
                Cell::from(row.lowest),
                Cell::from(row.median),
                Cell::from(row.most_common),
                Cell::from(row.ranked_share),
            ]
        })
        .collect()
}

pub fn write_picks_summary(
    store: &mut dyn SheetStore,
    sheet: &str,
    rows: &[PicksSummaryRow],
) -> Result<WrittenTable> {
    upsert_table(store, sheet, &header(&PICKS_SUMMARY_HEADER, &[]), summary_rows(rows))
}
