use anyhow::{Context, Result};
use tracing::{info, warn};

use killlist::analysis::{Analyzer, ClassifierThresholds, RawTable};
use killlist::model::InspectionReport;

use super::load_source;
use crate::cli::InspectArgs;

pub fn run(args: InspectArgs) -> Result<()> {
    let (loaded, source) = load_source(&args.input, args.delimiter)?;
    let table = &loaded.table;

    info!(
        path = %args.input.display(),
        columns = table.width(),
        rows = table.rows.len(),
        "inspecting report"
    );

    let preview = preview_rows(table, args.preview_rows);
    for line in table_to_markdown(&preview).lines() {
        info!("{line}");
    }

    let analyzer = Analyzer::new(ClassifierThresholds::default())
        .context("failed to build label vocabulary")?;
    let verdict = analyzer.locate_header(table);
    info!(verdict = %verdict, "header verdict");

    let report = match analyzer.map_schema(table, verdict) {
        Ok(resolution) => {
            for assignment in &resolution.mapping.assignments {
                info!(
                    role = assignment.role.as_str(),
                    column = assignment.index,
                    label = %assignment.label,
                    "column mapping"
                );
            }
            InspectionReport {
                source,
                verdict,
                labels: resolution.labels,
                mapping: Some(resolution.mapping),
                mapping_error: None,
                preview,
            }
        }
        Err(err) => {
            warn!(error = %err, "schema mapping failed");
            InspectionReport {
                source,
                verdict,
                labels: table.labels.iter().map(|cell| cell.as_text()).collect(),
                mapping: None,
                mapping_error: Some(err.to_string()),
                preview,
            }
        }
    };

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&report).context("failed to render inspection json")?;
        println!("{rendered}");
    }

    Ok(())
}

fn preview_rows(table: &RawTable, limit: usize) -> Vec<Vec<String>> {
    table
        .scan_rows()
        .take(limit.saturating_add(1))
        .map(|row| row.iter().map(|cell| cell.as_text()).collect())
        .collect()
}

fn table_to_markdown(rows: &[Vec<String>]) -> String {
    let col_count = rows.iter().map(Vec::len).max().unwrap_or(1).max(1);
    let padded = rows
        .iter()
        .map(|row| {
            let mut current = row
                .iter()
                .map(|cell| cell.replace('|', "\\|"))
                .collect::<Vec<String>>();
            current.resize(col_count, String::new());
            current
        })
        .collect::<Vec<Vec<String>>>();

    let header = padded
        .first()
        .cloned()
        .unwrap_or_else(|| vec![String::new(); col_count]);
    let mut lines = Vec::<String>::new();
    lines.push(format!("| {} |", header.join(" | ")));
    lines.push(format!("| {} |", vec!["---"; col_count].join(" | ")));

    for row in padded.iter().skip(1) {
        lines.push(format!("| {} |", row.join(" | ")));
    }

    lines.join("\n")
}
