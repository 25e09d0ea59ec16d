use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use csv::ReaderBuilder;
use tracing::{debug, info};

use crate::analysis::{Cell, RawTable};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Delimiter {
    Auto,
    Comma,
    Tab,
    Semicolon,
}

impl Delimiter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Comma => "comma",
            Self::Tab => "tab",
            Self::Semicolon => "semicolon",
        }
    }

    fn byte(self) -> Option<u8> {
        match self {
            Self::Auto => None,
            Self::Comma => Some(b','),
            Self::Tab => Some(b'\t'),
            Self::Semicolon => Some(b';'),
        }
    }

    pub fn resolve(self, path: Option<&Path>, text: &str) -> Delimiter {
        if self != Self::Auto {
            return self;
        }

        let tab_extension = path
            .and_then(|path| path.extension())
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("tsv") || ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        let tab_first_line = text.lines().next().map(|line| line.contains('\t')).unwrap_or(false);

        if tab_extension || tab_first_line {
            Self::Tab
        } else {
            Self::Comma
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub table: RawTable,
    pub delimiter: Delimiter,
    pub sha256: String,
}

pub fn read_table(path: &Path, delimiter: Delimiter) -> Result<LoadedTable> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let sha256 = crate::util::sha256_bytes(&bytes);

    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(&bytes[..]);
    let text = String::from_utf8_lossy(body);
    let delimiter = delimiter.resolve(Some(path), &text);

    let table = parse_table(&text, delimiter)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(
        path = %path.display(),
        delimiter = delimiter.as_str(),
        columns = table.width(),
        rows = table.rows.len(),
        "loaded report table"
    );

    Ok(LoadedTable {
        table,
        delimiter,
        sha256,
    })
}

pub fn parse_table(text: &str, delimiter: Delimiter) -> Result<RawTable> {
    let byte = delimiter
        .resolve(None, text)
        .byte()
        .unwrap_or(b',');

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(byte)
        .from_reader(text.as_bytes());

    let mut records = Vec::<Vec<Cell>>::new();
    let mut skipped_blank = 0usize;

    for (index, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("malformed record #{}", index + 1))?;

        if record.iter().all(|field| field.trim().is_empty()) {
            skipped_blank += 1;
            continue;
        }

        records.push(record.iter().map(Cell::from).collect());
    }

    if skipped_blank > 0 {
        debug!(skipped_blank, "skipped blank records");
    }

    let mut records = records.into_iter();
    let Some(labels) = records.next() else {
        bail!("no records found");
    };

    Ok(RawTable::new(labels, records.collect()))
}
