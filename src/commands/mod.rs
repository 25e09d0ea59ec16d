pub mod analyze;
pub mod inspect;

use std::path::Path;

use anyhow::{Context, Result};

use killlist::model::SourceEntry;
use killlist::source::{self, Delimiter, LoadedTable};

fn load_source(path: &Path, delimiter: Delimiter) -> Result<(LoadedTable, SourceEntry)> {
    let loaded = source::read_table(path, delimiter)
        .with_context(|| format!("failed to load report {}", path.display()))?;

    let entry = SourceEntry {
        path: path.display().to_string(),
        sha256: loaded.sha256.clone(),
        delimiter: loaded.delimiter.as_str().to_string(),
        label_count: loaded.table.labels.len(),
        row_count: loaded.table.rows.len(),
    };

    Ok((loaded, entry))
}
