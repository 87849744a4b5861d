use anyhow::{Context, Result, bail};
use chrono::Utc;
use tracing::{error, info};

use crate::config::Config;
use crate::http_client::PageFetcher;
use crate::ledger::{UpdateLedger, write_ledger};
use crate::picks::{ColumnMap, ParsedPicks, parse_responses};
use crate::player_stats::{TiebreakerDefinition, fetch_tiebreaker_value};
use crate::scoring::{PicksSummaryRow, summarize_standings_picks};
use crate::sheets::SheetStore;
use crate::standings::{StandingsRow, fetch_standings};
use crate::writer::{
    WrittenTable, write_picks_summary, write_standings, write_standings_picks,
    write_tiebreaker_picks, write_tiebreakers,
};

pub const STANDINGS: &str = "Standings";
pub const STANDINGS_PICKS: &str = "Standings Picks";
pub const TIEBREAKER_PICKS: &str = "Tiebreaker Picks";
pub const PICKS_SUMMARY: &str = "Picks Summary";

pub fn tiebreaker_dataset(index: u8) -> String {
    format!("Tiebreaker {index}")
}

/// Every dataset name a run reports on, in ledger order.
pub fn dataset_names(config: &Config) -> Vec<String> {
    let mut out = vec![STANDINGS.to_string()];
    out.extend(config.tiebreakers.iter().map(|t| tiebreaker_dataset(t.index)));
    out.extend([
        STANDINGS_PICKS.to_string(),
        TIEBREAKER_PICKS.to_string(),
        PICKS_SUMMARY.to_string(),
    ]);
    out
}

#[derive(Debug)]
pub struct RunReport {
    pub ledger: UpdateLedger,
    pub ledger_written: bool,
    pub standings: Option<Vec<StandingsRow>>,
    pub tiebreakers: Vec<TiebreakerDefinition>,
    pub picks: Option<ParsedPicks>,
    pub summary: Option<Vec<PicksSummaryRow>>,
    pub tables: Vec<WrittenTable>,
}

impl RunReport {
    /// Fails unless every dataset has a timestamp and the ledger was saved.
    pub fn ensure_complete(&self) -> Result<()> {
        let failed = self.ledger.failed();
        if !failed.is_empty() {
            bail!("run incomplete, failed datasets: {}", failed.join(", "));
        }
        if !self.ledger_written {
            bail!("run incomplete, ledger was not written");
        }
        Ok(())
    }
}

/// Runs every dataset in its own failure boundary, then writes the ledger.
pub fn run(config: &Config, fetcher: &dyn PageFetcher, store: &mut dyn SheetStore) -> RunReport {
    let mut ledger = UpdateLedger::new(dataset_names(config));
    let mut tables = Vec::new();
    let sheets = &config.sheets;

    let standings = attempt(&mut ledger, STANDINGS, || {
        let rows = fetch_standings(fetcher, &config.standings_url, &config.playoff_bands)?;
        tables.push(write_standings(store, &sheets.standings, &rows)?);
        Ok(rows)
    });

    let tiebreakers = run_tiebreakers(config, fetcher, store, &mut ledger, &mut tables);

    let picks = read_picks(config, store);
    let picks = match picks {
        Ok(picks) => {
            info!(
                standings_picks = picks.standings.len(),
                tiebreaker_picks = picks.tiebreakers.len(),
                "parsed responses"
            );
            Some(picks)
        }
        Err(err) => {
            error!(sheet = %config.responses_sheet, "reading responses failed: {err:#}");
            None
        }
    };

    attempt(&mut ledger, STANDINGS_PICKS, || {
        let picks = picks.as_ref().context("responses unavailable")?;
        tables.push(write_standings_picks(
            store,
            &sheets.standings_picks,
            &sheets.standings,
            &picks.standings,
        )?);
        Ok(())
    });

    attempt(&mut ledger, TIEBREAKER_PICKS, || {
        let picks = picks.as_ref().context("responses unavailable")?;
        tables.push(write_tiebreaker_picks(
            store,
            &sheets.tiebreaker_picks,
            &sheets.tiebreakers,
            config.tiebreakers.len() as u32,
            &picks.tiebreakers,
        )?);
        Ok(())
    });

    let summary = attempt(&mut ledger, PICKS_SUMMARY, || {
        let standings = standings.as_ref().context("standings unavailable")?;
        let picks = picks.as_ref().context("responses unavailable")?;
        let rows =
            summarize_standings_picks(standings, &picks.participants, &picks.standings);
        tables.push(write_picks_summary(store, &sheets.picks_summary, &rows)?);
        Ok(rows)
    });

    let ledger_written = match write_ledger(store, &sheets.ledger, &ledger) {
        Ok(()) => true,
        Err(err) => {
            error!(sheet = %sheets.ledger, "writing ledger failed: {err:#}");
            false
        }
    };

    for (dataset, at) in ledger.entries() {
        match at {
            Some(_) => info!(dataset = %dataset, "updated"),
            None => error!(dataset = %dataset, "not updated"),
        }
    }

    RunReport {
        ledger,
        ledger_written,
        standings,
        tiebreakers,
        picks,
        summary,
        tables,
    }
}

// A failed fetch nulls that tiebreaker only; a failed sheet write fails them all.
fn run_tiebreakers(
    config: &Config,
    fetcher: &dyn PageFetcher,
    store: &mut dyn SheetStore,
    ledger: &mut UpdateLedger,
    tables: &mut Vec<WrittenTable>,
) -> Vec<TiebreakerDefinition> {
    let mut definitions = Vec::with_capacity(config.tiebreakers.len());
    let mut fetched = Vec::with_capacity(config.tiebreakers.len());
    for source in &config.tiebreakers {
        let value = match fetch_tiebreaker_value(fetcher, source) {
            Ok(value) => {
                info!(tiebreaker = source.index, value, "fetched tiebreaker");
                Some(value)
            }
            Err(err) => {
                error!(
                    dataset = %tiebreaker_dataset(source.index),
                    "update failed: {err:#}"
                );
                None
            }
        };
        fetched.push((source.index, value.is_some()));
        definitions.push(TiebreakerDefinition {
            index: source.index,
            description: source.description.clone(),
            value,
        });
    }

    let write = write_tiebreakers(store, &config.sheets.tiebreakers, &definitions);
    let written = match write {
        Ok(table) => {
            tables.push(table);
            true
        }
        Err(err) => {
            error!(sheet = %config.sheets.tiebreakers, "writing tiebreakers failed: {err:#}");
            false
        }
    };

    let now = Utc::now();
    for (index, ok) in fetched {
        let dataset = tiebreaker_dataset(index);
        if ok && written {
            ledger.record_success(&dataset, now);
        } else {
            ledger.record_failure(&dataset);
        }
    }
    definitions
}

fn read_picks(config: &Config, store: &mut dyn SheetStore) -> Result<ParsedPicks> {
    let map = ColumnMap::new(&config.response_columns).context("response column map")?;
    let grid = store
        .read_rows(&config.responses_sheet, 0, None)
        .with_context(|| format!("read {:?}", config.responses_sheet))?;
    parse_responses(&grid, &map)
}

fn attempt<T>(
    ledger: &mut UpdateLedger,
    dataset: &str,
    f: impl FnOnce() -> Result<T>,
) -> Option<T> {
    match f() {
        Ok(value) => {
            ledger.record_success(dataset, Utc::now());
            Some(value)
        }
        Err(err) => {
            error!(dataset, "update failed: {err:#}");
            ledger.record_failure(dataset);
            None
        }
    }
}
