use std::fmt;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::table::RawTable;
use super::vocabulary::{HEADER_MIN_SCORE, HEADER_SCAN_ROWS, LabelVocabulary, known_template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderVerdict {
    HeaderAtRow(usize),
    HeaderlessKnownWidth(usize),
    HeaderlessUnknownWidth(usize),
}

impl HeaderVerdict {
    pub fn is_headerless(self) -> bool {
        !matches!(self, Self::HeaderAtRow(_))
    }
}

impl fmt::Display for HeaderVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HeaderAtRow(index) => write!(f, "header at row {index}"),
            Self::HeaderlessKnownWidth(columns) => {
                write!(f, "headerless table of known width {columns}")
            }
            Self::HeaderlessUnknownWidth(columns) => {
                write!(f, "headerless table of unknown width {columns}")
            }
        }
    }
}

pub fn locate_header(table: &RawTable, vocabulary: &LabelVocabulary) -> HeaderVerdict {
    let mut best: Option<(usize, usize)> = None;

    for (index, cells) in table.scan_rows().take(HEADER_SCAN_ROWS).enumerate() {
        let score = vocabulary.header_score(cells);
        debug!(row = index, score, "scored header candidate");

        if best.map(|(_, top)| score > top).unwrap_or(true) {
            best = Some((index, score));
        }
    }

    if let Some((index, score)) = best
        && score >= HEADER_MIN_SCORE
    {
        info!(row = index, score, "header row located");
        return HeaderVerdict::HeaderAtRow(index);
    }

    let width = table.width();
    let first_label = table
        .labels
        .first()
        .map(|cell| cell.as_text())
        .unwrap_or_default();

    if !vocabulary.is_date_stamp(&first_label) {
        debug!(
            best_score = best.map(|(_, score)| score).unwrap_or(0),
            "no header candidate scored; keeping supplied label row"
        );
        return HeaderVerdict::HeaderAtRow(0);
    }

    warn!(
        first_label = %first_label.trim(),
        width,
        "first label looks like a date stamp; header row is missing or shifted"
    );

    if known_template(width).is_some() {
        HeaderVerdict::HeaderlessKnownWidth(width)
    } else {
        HeaderVerdict::HeaderlessUnknownWidth(width)
    }
}
