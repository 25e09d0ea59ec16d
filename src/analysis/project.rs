use serde::Serialize;
use tracing::warn;

use super::classify::AnomalyRecord;
use super::schema::{FieldRole, SchemaMapping};
use super::table::{Cell, NormalizedTable};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProjectedTable {
    pub columns: Vec<String>,
    pub source_columns: Vec<usize>,
    pub rows: Vec<Vec<Cell>>,
}

pub fn default_columns(table: &NormalizedTable, mapping: &SchemaMapping) -> Vec<usize> {
    if !mapping.has_optional_columns() {
        let width = table
            .rows
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            .max(table.width());
        return (0..width).collect();
    }

    mapping
        .optional
        .iter()
        .map(|assignment| assignment.index)
        .chain(
            mapping
                .required
                .ordered()
                .into_iter()
                .map(|(_, index)| index),
        )
        .collect()
}

pub fn project(
    table: &NormalizedTable,
    mapping: &SchemaMapping,
    records: &[AnomalyRecord],
) -> ProjectedTable {
    project_columns(table, records, &default_columns(table, mapping))
}

pub fn project_selected(
    table: &NormalizedTable,
    records: &[AnomalyRecord],
    selection: &[String],
) -> (ProjectedTable, Vec<String>) {
    let mut columns = Vec::<usize>::with_capacity(selection.len());
    let mut unknown = Vec::<String>::new();

    for requested in selection {
        match resolve_label(&table.labels, requested, &columns) {
            Some(index) => columns.push(index),
            None => {
                warn!(label = %requested, "requested export column not found");
                unknown.push(requested.clone());
            }
        }
    }

    (project_columns(table, records, &columns), unknown)
}

fn resolve_label(labels: &[String], requested: &str, taken: &[usize]) -> Option<usize> {
    let requested = requested.trim();
    if requested.is_empty() {
        return None;
    }

    let available = |index: &usize| !taken.contains(index);
    let exact = (0..labels.len())
        .filter(available)
        .find(|index| labels[*index] == requested);
    if exact.is_some() {
        return exact;
    }

    let needle = requested.to_lowercase();
    (0..labels.len())
        .filter(available)
        .find(|index| labels[*index].to_lowercase().contains(&needle))
}

fn project_columns(
    table: &NormalizedTable,
    records: &[AnomalyRecord],
    columns: &[usize],
) -> ProjectedTable {
    let rows = records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| table.cell(record.row, *column))
                .collect::<Vec<Cell>>()
        })
        .collect();

    ProjectedTable {
        columns: columns
            .iter()
            .map(|column| table.labels.get(*column).cloned().unwrap_or_default())
            .collect(),
        source_columns: columns.to_vec(),
        rows,
    }
}

pub fn projected_roles(projection: &ProjectedTable, mapping: &SchemaMapping) -> Vec<FieldRole> {
    projection
        .source_columns
        .iter()
        .map(|column| mapping.role_of(*column))
        .collect()
}
