use std::collections::HashSet;

use anyhow::{Result, anyhow, bail};

use crate::sheets::{Cell, CellRef, SheetStore, ValueInput};

#[derive(Debug, Clone)]
pub struct MemorySheet {
    pub name: String,
    pub rows: u32,
    pub cols: u32,
    pub cells: Vec<Vec<Cell>>,
    pub last_input: Option<ValueInput>,
}

impl MemorySheet {
    pub fn cell(&self, row: u32, col: u32) -> &Cell {
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .unwrap_or(&Cell::Empty)
    }

    /// Display grid with trailing blank cells and rows trimmed.
    pub fn values(&self) -> Vec<Vec<String>> {
        let mut out = self
            .cells
            .iter()
            .map(|row| {
                let mut values = row.iter().map(Cell::display).collect::<Vec<_>>();
                while values.last().is_some_and(|v| v.is_empty()) {
                    values.pop();
                }
                values
            })
            .collect::<Vec<_>>();
        while out.last().is_some_and(|r| r.is_empty()) {
            out.pop();
        }
        out
    }
}

/// In-process grid store. Formulas are kept as text, never evaluated.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: Vec<MemorySheet>,
    failing: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sheet(mut self, name: &str, values: Vec<Vec<String>>) -> Self {
        let cells = values
            .into_iter()
            .map(|row| row.into_iter().map(Cell::Text).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let rows = cells.len() as u32;
        let cols = cells.iter().map(Vec::len).max().unwrap_or(0) as u32;
        self.sheets.retain(|s| s.name != name);
        self.sheets.push(MemorySheet {
            name: name.to_string(),
            rows: rows.max(1),
            cols: cols.max(1),
            cells,
            last_input: None,
        });
        self
    }

    /// Makes every write to `name` fail.
    pub fn fail_writes_to(&mut self, name: &str) {
        self.failing.insert(name.to_string());
    }

    pub fn sheet(&self, name: &str) -> Option<&MemorySheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheets(&self) -> &[MemorySheet] {
        &self.sheets
    }

    fn sheet_mut(&mut self, name: &str) -> Result<&mut MemorySheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| anyhow!("sheet {name:?} not found"))
    }

    fn sheet_ref(&self, name: &str) -> Result<&MemorySheet> {
        self.sheet(name)
            .ok_or_else(|| anyhow!("sheet {name:?} not found"))
    }
}

impl SheetStore for MemoryStore {
    fn sheet_names(&mut self) -> Result<Vec<String>> {
        Ok(self.sheets.iter().map(|s| s.name.clone()).collect())
    }

    fn add_sheet(&mut self, name: &str, rows: u32, cols: u32) -> Result<()> {
        if self.sheet(name).is_some() {
            bail!("sheet {name:?} already exists");
        }
        self.sheets.push(MemorySheet {
            name: name.to_string(),
            rows: rows.max(1),
            cols: cols.max(1),
            cells: Vec::new(),
            last_input: None,
        });
        Ok(())
    }

    fn read_rows(&mut self, sheet: &str, first: u32, last: Option<u32>) -> Result<Vec<Vec<String>>> {
        let values = self.sheet_ref(sheet)?.values();
        let first = first as usize;
        let end = last
            .map(|l| (l as usize + 1).min(values.len()))
            .unwrap_or(values.len());
        if first >= end {
            return Ok(Vec::new());
        }
        Ok(values[first..end].to_vec())
    }

    fn read_column(&mut self, sheet: &str, col: u32) -> Result<Vec<String>> {
        let mut out = self
            .sheet_ref(sheet)?
            .cells
            .iter()
            .map(|row| {
                row.get(col as usize)
                    .map(Cell::display)
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        while out.last().is_some_and(|v| v.is_empty()) {
            out.pop();
        }
        Ok(out)
    }

    fn write_range(
        &mut self,
        sheet: &str,
        start: CellRef,
        rows: &[Vec<Cell>],
        input: ValueInput,
    ) -> Result<()> {
        if self.failing.contains(sheet) {
            bail!("write to {sheet:?} rejected");
        }
        let target = self.sheet_mut(sheet)?;
        for (r, row) in rows.iter().enumerate() {
            let row_idx = start.row as usize + r;
            if target.cells.len() <= row_idx {
                target.cells.resize_with(row_idx + 1, Vec::new);
            }
            let dest = &mut target.cells[row_idx];
            for (c, cell) in row.iter().enumerate() {
                let col_idx = start.col as usize + c;
                if dest.len() <= col_idx {
                    dest.resize(col_idx + 1, Cell::Empty);
                }
                dest[col_idx] = cell.clone();
            }
        }
        let max_cols = rows.iter().map(Vec::len).max().unwrap_or(0) as u32;
        target.rows = target.rows.max(start.row + rows.len() as u32);
        target.cols = target.cols.max(start.col + max_cols);
        target.last_input = Some(input);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_then_read_trims_trailing_blanks() {
        let mut store = MemoryStore::new();
        store.add_sheet("S", 5, 3).unwrap();
        store
            .write_range(
                "S",
                CellRef::new(1, 1),
                &[vec![Cell::from("a"), Cell::Empty], vec![Cell::Int(2)]],
                ValueInput::Raw,
            )
            .unwrap();
        let rows = store.read_rows("S", 0, None).unwrap();
        assert_eq!(
            rows,
            vec![vec![], vec!["".to_string(), "a".to_string()], vec!["".to_string(), "2".to_string()]]
        );
        assert_eq!(store.read_column("S", 1).unwrap(), vec!["", "a", "2"]);
        assert_eq!(store.read_column("S", 0).unwrap(), Vec::<String>::new());
    }

    #[test]
    fn duplicate_sheet_and_missing_sheet_fail() {
        let mut store = MemoryStore::new().with_sheet("S", vec![]);
        assert!(store.add_sheet("S", 1, 1).is_err());
        assert!(store.read_rows("T", 0, None).is_err());
    }

    #[test]
    fn failing_sheet_rejects_writes() {
        let mut store = MemoryStore::new().with_sheet("S", vec![]);
        store.fail_writes_to("S");
        assert!(
            store
                .write_range("S", CellRef::ORIGIN, &[vec![Cell::Int(1)]], ValueInput::Raw)
                .is_err()
        );
    }
}
