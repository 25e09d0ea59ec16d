use std::iter;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Empty,
    Number(f64),
    Text(String),
}

impl Cell {
    pub fn as_text(&self) -> String {
        match self {
            Self::Empty => String::new(),
            Self::Number(value) => render_number(*value),
            Self::Text(value) => value.clone(),
        }
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value.to_string())
        }
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        if value.is_empty() {
            Self::Empty
        } else {
            Self::Text(value)
        }
    }
}

pub fn render_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// A table as handed over by the ingestion side. `labels` is whatever the
/// reader took as the column label row; it may be real labels, a partial
/// header, or the first data row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub labels: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn new(labels: Vec<Cell>, rows: Vec<Vec<Cell>>) -> Self {
        Self { labels, rows }
    }

    pub fn width(&self) -> usize {
        self.labels.len()
    }

    pub fn scan_rows(&self) -> impl Iterator<Item = &[Cell]> {
        iter::once(self.labels.as_slice()).chain(self.rows.iter().map(Vec::as_slice))
    }

    pub fn scan_row(&self, index: usize) -> Option<&[Cell]> {
        if index == 0 {
            Some(self.labels.as_slice())
        } else {
            self.rows.get(index - 1).map(Vec::as_slice)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    pub labels: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub first_source_row: usize,
}

impl NormalizedTable {
    pub fn width(&self) -> usize {
        self.labels.len()
    }

    pub fn source_row(&self, row: usize) -> usize {
        self.first_source_row + row
    }

    pub fn number(&self, row: usize, column: usize) -> f64 {
        match self.rows.get(row).and_then(|cells| cells.get(column)) {
            Some(Cell::Number(value)) => *value,
            _ => 0.0,
        }
    }

    pub fn cell(&self, row: usize, column: usize) -> Cell {
        self.rows
            .get(row)
            .and_then(|cells| cells.get(column))
            .cloned()
            .unwrap_or(Cell::Empty)
    }
}
