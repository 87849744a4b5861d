use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::sheets::{Cell, CellRef, SheetStore, ValueInput};

pub const LEDGER_HEADER: [&str; 2] = ["Dataset", "Last Updated"];
pub const FAILED: &str = "failed";

/// Last successful update per dataset; `None` means the last attempt failed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateLedger {
    entries: Vec<(String, Option<DateTime<Utc>>)>,
}

impl UpdateLedger {
    pub fn new<I, S>(datasets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: datasets.into_iter().map(|d| (d.into(), None)).collect(),
        }
    }

    pub fn record_success(&mut self, dataset: &str, at: DateTime<Utc>) {
        self.set(dataset, Some(at));
    }

    pub fn record_failure(&mut self, dataset: &str) {
        self.set(dataset, None);
    }

    fn set(&mut self, dataset: &str, value: Option<DateTime<Utc>>) {
        match self.entries.iter_mut().find(|(name, _)| name == dataset) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((dataset.to_string(), value)),
        }
    }

    pub fn get(&self, dataset: &str) -> Option<Option<DateTime<Utc>>> {
        self.entries
            .iter()
            .find(|(name, _)| name == dataset)
            .map(|(_, at)| *at)
    }

    pub fn entries(&self) -> &[(String, Option<DateTime<Utc>>)] {
        &self.entries
    }

    pub fn failed(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, at)| at.is_none())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.entries.iter().all(|(_, at)| at.is_some())
    }
}

/// `Mon Oct 19 10:14:00 2026 UTC`
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%a %b %e %H:%M:%S %Y UTC").to_string()
}

fn ledger_cell(at: Option<DateTime<Utc>>) -> Cell {
    match at {
        Some(at) => Cell::Text(format_timestamp(at)),
        None => Cell::text(FAILED),
    }
}

/// Seeds the ledger sheet on first use; afterwards patches known rows in
/// place, appends datasets the sheet has never seen, and leaves unknown
/// rows alone.
pub fn write_ledger(store: &mut dyn SheetStore, sheet: &str, ledger: &UpdateLedger) -> Result<()> {
    if !store.has_sheet(sheet)? {
        info!(sheet, "creating ledger sheet");
        store
            .add_sheet(sheet, ledger.entries.len() as u32 + 1, LEDGER_HEADER.len() as u32)
            .with_context(|| format!("create ledger {sheet:?}"))?;
        let mut grid = vec![LEDGER_HEADER.iter().map(|h| Cell::text(*h)).collect::<Vec<_>>()];
        grid.extend(
            ledger
                .entries
                .iter()
                .map(|(name, at)| vec![Cell::text(name.as_str()), ledger_cell(*at)]),
        );
        return store
            .write_range(sheet, CellRef::ORIGIN, &grid, ValueInput::Raw)
            .with_context(|| format!("write ledger {sheet:?}"));
    }

    let names = store
        .read_column(sheet, 0)
        .with_context(|| format!("read ledger {sheet:?}"))?;
    if names.is_empty() {
        let header = LEDGER_HEADER.iter().map(|h| Cell::text(*h)).collect::<Vec<_>>();
        store
            .write_range(sheet, CellRef::ORIGIN, &[header], ValueInput::Raw)
            .with_context(|| format!("write ledger header {sheet:?}"))?;
    }

    let mut seen = Vec::new();
    for (row, name) in names.iter().enumerate().skip(1) {
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let Some(at) = ledger.get(name) else {
            warn!(sheet, row = row + 1, dataset = name, "unknown ledger row left untouched");
            continue;
        };
        store
            .write_range(
                sheet,
                CellRef::new(row as u32, 1),
                &[vec![ledger_cell(at)]],
                ValueInput::Raw,
            )
            .with_context(|| format!("patch ledger row for {name}"))?;
        seen.push(name.to_string());
    }

    let missing = ledger
        .entries
        .iter()
        .filter(|(name, _)| !seen.contains(name))
        .map(|(name, at)| vec![Cell::text(name.as_str()), ledger_cell(*at)])
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        let next_row = names.len().max(1) as u32;
        store
            .write_range(sheet, CellRef::new(next_row, 0), &missing, ValueInput::Raw)
            .with_context(|| format!("append ledger rows to {sheet:?}"))?;
    }
    Ok(())
}
