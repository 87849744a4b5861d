use std::fmt;

use anyhow::Result;
use serde_json::Value;

/// How the store should treat written values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueInput {
    /// Stored exactly as sent.
    Raw,
    /// Parsed as if typed by a user, so `=...` strings become formulas.
    UserEntered,
}

impl ValueInput {
    pub fn as_param(self) -> &'static str {
        match self {
            ValueInput::Raw => "RAW",
            ValueInput::UserEntered => "USER_ENTERED",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Formula(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn formula(expr: impl Into<String>) -> Self {
        let expr = expr.into();
        if expr.starts_with('=') {
            Cell::Formula(expr)
        } else {
            Cell::Formula(format!("={expr}"))
        }
    }

    pub fn is_formula(&self) -> bool {
        matches!(self, Cell::Formula(_))
    }

    /// Copy safe to send as user-entered input: text the store would parse
    /// as a formula or number gets a leading `'`.
    pub fn escaped_for_input(&self) -> Cell {
        match self {
            Cell::Text(s) if s.starts_with(['=', '+', '-', '@']) => Cell::Text(format!("'{s}")),
            other => other.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Cell::Empty => Value::String(String::new()),
            Cell::Text(s) | Cell::Formula(s) => Value::String(s.clone()),
            Cell::Int(v) => Value::from(*v),
            Cell::Float(v) => serde_json::Number::from_f64(*v)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(String::new())),
        }
    }

    /// Display text as the store hands it back on read.
    pub fn display(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) | Cell::Formula(s) => s.clone(),
            Cell::Int(v) => v.to_string(),
            Cell::Float(v) => v.to_string(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Int(value)
    }
}

impl From<u32> for Cell {
    fn from(value: u32) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<u8> for Cell {
    fn from(value: u8) -> Self {
        Cell::Int(i64::from(value))
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Float(value)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Cell::Empty)
    }
}

/// 0-based cell coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
}

impl CellRef {
    pub const ORIGIN: CellRef = CellRef { row: 0, col: 0 };

    pub fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    pub fn offset(self, rows: u32, cols: u32) -> Self {
        Self {
            row: self.row + rows,
            col: self.col + cols,
        }
    }

    /// `$B$2` style reference.
    pub fn absolute(self) -> String {
        format!("${}${}", column_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_letters(self.col), self.row + 1)
    }
}

/// 0 -> A, 25 -> Z, 26 -> AA.
pub fn column_letters(col: u32) -> String {
    let mut n = col + 1;
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

pub fn quote_sheet(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

pub fn a1_range(sheet: &str, start: CellRef, end: CellRef) -> String {
    format!("{}!{start}:{end}", quote_sheet(sheet))
}

/// Whole columns, e.g. `'Standings'!A:A`.
pub fn a1_columns(sheet: &str, first: u32, last: u32) -> String {
    format!(
        "{}!{}:{}",
        quote_sheet(sheet),
        column_letters(first),
        column_letters(last)
    )
}

/// Key-value grid store addressed by sheet name and cell.
pub trait SheetStore {
    fn sheet_names(&mut self) -> Result<Vec<String>>;

    fn add_sheet(&mut self, name: &str, rows: u32, cols: u32) -> Result<()>;

    /// Values of rows `first..=last` (0-based), trailing blanks trimmed.
    fn read_rows(&mut self, sheet: &str, first: u32, last: Option<u32>) -> Result<Vec<Vec<String>>>;

    fn read_column(&mut self, sheet: &str, col: u32) -> Result<Vec<String>>;

    fn write_range(
        &mut self,
        sheet: &str,
        start: CellRef,
        rows: &[Vec<Cell>],
        input: ValueInput,
    ) -> Result<()>;

    fn has_sheet(&mut self, name: &str) -> Result<bool> {
        Ok(self.sheet_names()?.iter().any(|n| n == name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters_wrap() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(6), "G");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(701), "ZZ");
        assert_eq!(column_letters(702), "AAA");
    }

    #[test]
    fn ranges_quote_sheet_names() {
        let range = a1_range("Bob's Picks", CellRef::ORIGIN, CellRef::new(30, 6));
        assert_eq!(range, "'Bob''s Picks'!A1:G31");
        assert_eq!(a1_columns("Standings", 0, 0), "'Standings'!A:A");
        assert_eq!(CellRef::new(1, 1).absolute(), "$B$2");
    }

    #[test]
    fn user_entered_text_is_escaped() {
        assert_eq!(
            Cell::text("=IMPORTXML(\"x\")").escaped_for_input(),
            Cell::text("'=IMPORTXML(\"x\")")
        );
        assert_eq!(Cell::text("+1").escaped_for_input(), Cell::text("'+1"));
        assert_eq!(Cell::text("@me").escaped_for_input(), Cell::text("'@me"));
        assert_eq!(Cell::text("Alex").escaped_for_input(), Cell::text("Alex"));
        assert_eq!(Cell::Int(-3).escaped_for_input(), Cell::Int(-3));
        assert_eq!(Cell::formula("H2+I2").escaped_for_input(), Cell::formula("H2+I2"));
    }

    #[test]
    fn formula_cells_gain_equals_sign() {
        assert_eq!(Cell::formula("A1+B1"), Cell::Formula("=A1+B1".to_string()));
        assert_eq!(Cell::formula("=A1"), Cell::Formula("=A1".to_string()));
        assert_eq!(Cell::from(None::<i64>), Cell::Empty);
        assert_eq!(Cell::from(Some(3u8)), Cell::Int(3));
    }
}
