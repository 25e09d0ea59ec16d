use serde::Serialize;
use tracing::warn;

use super::schema::{FieldRole, SchemaResolution};
use super::table::{Cell, NormalizedTable, RawTable};

const SAMPLE_ROW_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    Parsed(f64),
    Blank,
    Unparseable,
}

impl Coercion {
    pub fn value(self) -> f64 {
        match self {
            Self::Parsed(value) => value,
            Self::Blank | Self::Unparseable => 0.0,
        }
    }
}

pub fn coerce_cell(cell: &Cell) -> Coercion {
    let text = match cell {
        Cell::Empty => return Coercion::Blank,
        Cell::Number(value) if value.is_finite() => return Coercion::Parsed(*value),
        Cell::Number(_) => return Coercion::Unparseable,
        Cell::Text(text) => text,
    };

    let stripped = text
        .chars()
        .filter(|ch| *ch != ',' && !ch.is_whitespace())
        .collect::<String>();
    if stripped.is_empty() {
        return Coercion::Blank;
    }

    match stripped.parse::<f64>() {
        Ok(value) if value.is_finite() => Coercion::Parsed(value),
        _ => Coercion::Unparseable,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnCoercion {
    pub role: FieldRole,
    pub column: usize,
    pub label: String,
    pub blank_cells: usize,
    pub unparseable_cells: usize,
    pub sample_rows: Vec<usize>,
}

impl ColumnCoercion {
    pub fn failure_count(&self) -> usize {
        self.blank_cells + self.unparseable_cells
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CoercionReport {
    pub columns: Vec<ColumnCoercion>,
}

impl CoercionReport {
    pub fn failure_count(&self) -> usize {
        self.columns.iter().map(ColumnCoercion::failure_count).sum()
    }

    pub fn unparseable_count(&self) -> usize {
        self.columns
            .iter()
            .map(|column| column.unparseable_cells)
            .sum()
    }

    pub fn for_role(&self, role: FieldRole) -> Option<&ColumnCoercion> {
        self.columns.iter().find(|column| column.role == role)
    }
}

pub fn normalize_table(
    table: &RawTable,
    resolution: &SchemaResolution,
) -> (NormalizedTable, CoercionReport) {
    let width = resolution.labels.len();
    let mut rows = table
        .scan_rows()
        .skip(resolution.data_start)
        .map(|cells| {
            let mut row = cells.to_vec();
            if row.len() < width {
                row.resize(width, Cell::Empty);
            }
            row
        })
        .collect::<Vec<Vec<Cell>>>();

    let mut report = CoercionReport::default();

    for (role, column) in resolution.mapping.required.ordered() {
        let mut stats = ColumnCoercion {
            role,
            column,
            label: resolution.labels.get(column).cloned().unwrap_or_default(),
            blank_cells: 0,
            unparseable_cells: 0,
            sample_rows: Vec::new(),
        };

        for (row_index, row) in rows.iter_mut().enumerate() {
            let Some(cell) = row.get_mut(column) else {
                continue;
            };

            let coercion = coerce_cell(cell);
            match coercion {
                Coercion::Parsed(_) => {}
                Coercion::Blank => stats.blank_cells += 1,
                Coercion::Unparseable => {
                    stats.unparseable_cells += 1;
                    if stats.sample_rows.len() < SAMPLE_ROW_LIMIT {
                        stats.sample_rows.push(resolution.data_start + row_index);
                    }
                }
            }
            *cell = Cell::Number(coercion.value());
        }

        if stats.unparseable_cells > 0 {
            warn!(
                role = role.as_str(),
                column,
                label = %stats.label,
                unparseable = stats.unparseable_cells,
                sample_rows = ?stats.sample_rows,
                "unparseable cells read as zero"
            );
        }

        report.columns.push(stats);
    }

    let normalized = NormalizedTable {
        labels: resolution.labels.clone(),
        rows,
        first_source_row: resolution.data_start,
    };

    (normalized, report)
}
