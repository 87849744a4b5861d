use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};

use crate::sheets::Cell;
use crate::writer::WrittenTable;

/// Writes every table of a run into one local workbook, one worksheet per
/// table, formulas included.
pub fn write_debug_workbook(path: &Path, tables: &[WrittenTable]) -> Result<()> {
    let mut workbook = Workbook::new();
    for table in tables {
        let sheet = workbook.add_worksheet();
        sheet
            .set_name(&table.sheet)
            .with_context(|| format!("invalid worksheet name {:?}", table.sheet))?;
        write_cells(sheet, &table.grid)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("failed writing workbook to {}", path.display()))?;
    Ok(())
}

fn write_cells(worksheet: &mut Worksheet, rows: &[Vec<Cell>]) -> Result<()> {
    for (row_idx, row) in rows.iter().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let (r, c) = (row_idx as u32, col_idx as u16);
            match cell {
                Cell::Empty => continue,
                Cell::Text(s) => worksheet.write_string(r, c, s),
                Cell::Int(v) => worksheet.write_number(r, c, *v as f64),
                Cell::Float(v) => worksheet.write_number(r, c, *v),
                Cell::Formula(f) => worksheet.write_formula(r, c, f.as_str()),
            }
            .with_context(|| format!("write cell ({row_idx},{col_idx})"))?;
        }
    }
    Ok(())
}
