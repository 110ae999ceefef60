//! In-memory tabular data exchanged with the I/O layer.
//!
//! Tables arrive with whatever headers the source spreadsheet had. The engine
//! never mutates a caller's table: every run clones the inputs and returns new,
//! annotated tables.

use std::fmt;
use std::io::{Read, Write};

use serde::Serialize;

use crate::error::Result;

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Text(String),
    Number(f64),
}

static EMPTY: Value = Value::Empty;

impl Value {
    /// True for empty cells and whitespace-only text.
    pub fn is_blank(&self) -> bool {
        match self {
            Value::Empty => true,
            Value::Text(s) => s.trim().is_empty(),
            Value::Number(n) => n.is_nan(),
        }
    }

    /// Trimmed text form, or `None` for blank cells.
    pub fn text(&self) -> Option<String> {
        if self.is_blank() {
            None
        } else {
            Some(self.to_string().trim().to_string())
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) if n.is_nan() => Ok(()),
            Value::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Value::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        if s.is_empty() {
            Value::Empty
        } else {
            Value::Text(s.to_string())
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        if s.is_empty() {
            Value::Empty
        } else {
            Value::Text(s)
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Empty)
    }
}

/// Rectangular table: one header row plus data rows of equal width.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Table {
    pub name: String,
    headers: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(name: impl Into<String>, headers: Vec<String>) -> Self {
        Self {
            name: name.into(),
            headers,
            rows: Vec::new(),
        }
    }

    /// Build a table from string literals. Handy for tests and small fixtures.
    pub fn from_rows(name: &str, headers: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(name, headers.iter().map(|h| h.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|c| Value::from(*c)).collect());
        }
        table
    }

    /// Append a row, padding or truncating it to the header width.
    pub fn push_row(&mut self, mut row: Vec<Value>) {
        row.resize(self.headers.len(), Value::Empty);
        self.rows.push(row);
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the column whose header equals `name` exactly.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn get(&self, row: usize, col: usize) -> &Value {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    pub fn set(&mut self, row: usize, col: usize, value: Value) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *cell = value;
        }
    }

    /// Index of `name`, appending an empty column when it does not exist yet.
    pub fn ensure_column(&mut self, name: &str) -> usize {
        if let Some(idx) = self.column(name) {
            return idx;
        }
        self.headers.push(name.to_string());
        for row in &mut self.rows {
            row.push(Value::Empty);
        }
        self.headers.len() - 1
    }

    /// Column values in row order.
    pub fn column_values(&self, col: usize) -> Vec<&Value> {
        (0..self.rows.len()).map(|r| self.get(r, col)).collect()
    }

    /// Upper-case and trim every header, and drop the filler columns that
    /// spreadsheet exports label `Unnamed: N` (or leave blank).
    pub fn normalize_headers(&mut self) {
        let keep: Vec<bool> = self
            .headers
            .iter()
            .map(|h| {
                let h = h.trim().to_uppercase();
                !h.is_empty() && !h.starts_with("UNNAMED")
            })
            .collect();

        self.headers = self
            .headers
            .iter()
            .zip(&keep)
            .filter(|(_, k)| **k)
            .map(|(h, _)| h.trim().to_uppercase())
            .collect();

        for row in &mut self.rows {
            let mut i = 0;
            row.retain(|_| {
                let k = keep.get(i).copied().unwrap_or(false);
                i += 1;
                k
            });
        }
    }

    /// Reorder rows; `order[i]` is the source index of output row `i`.
    pub fn reorder(&mut self, order: &[usize]) {
        let mut taken: Vec<Option<Vec<Value>>> =
            std::mem::take(&mut self.rows).into_iter().map(Some).collect();
        self.rows = order.iter().filter_map(|&i| taken.get_mut(i).and_then(Option::take)).collect();
    }

    // -----------------------------------------------------------------------
    // CSV
    // -----------------------------------------------------------------------

    /// Read a headed CSV. Every non-empty cell becomes text; typing happens
    /// later in the value normalizer.
    pub fn from_csv_reader<R: Read>(name: &str, reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.to_string()).collect();
        let mut table = Table::new(name, headers);

        for record in rdr.records() {
            let record = record?;
            table.push_row(record.iter().map(Value::from).collect());
        }

        Ok(table)
    }

    pub fn from_csv_str(name: &str, data: &str) -> Result<Self> {
        Self::from_csv_reader(name, data.as_bytes())
    }

    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row.iter().map(|v| v.to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }
}
