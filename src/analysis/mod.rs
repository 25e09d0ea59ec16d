pub mod classify;
pub mod error;
pub mod header;
pub mod normalize;
pub mod project;
pub mod schema;
pub mod table;
pub mod vocabulary;

#[cfg(test)]
mod tests;

use tracing::info;

pub use classify::{AnomalyRecord, AnomalyRule, ClassifierThresholds, RuleTotals};
pub use error::AnalysisError;
pub use header::HeaderVerdict;
pub use normalize::CoercionReport;
pub use project::ProjectedTable;
pub use schema::{FieldRole, SchemaMapping, SchemaResolution};
pub use table::{Cell, NormalizedTable, RawTable};

use vocabulary::LabelVocabulary;

#[derive(Debug)]
pub struct Analyzer {
    vocabulary: LabelVocabulary,
    thresholds: ClassifierThresholds,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub resolution: SchemaResolution,
    pub normalized: NormalizedTable,
    pub coercion: CoercionReport,
    pub anomalies: Vec<AnomalyRecord>,
    pub projection: ProjectedTable,
}

impl Analysis {
    pub fn verdict(&self) -> HeaderVerdict {
        self.resolution.verdict
    }

    pub fn mapping(&self) -> &SchemaMapping {
        &self.resolution.mapping
    }

    pub fn totals(&self) -> RuleTotals {
        RuleTotals::tally(&self.anomalies)
    }

    pub fn select_columns(&self, selection: &[String]) -> (ProjectedTable, Vec<String>) {
        project::project_selected(&self.normalized, &self.anomalies, selection)
    }
}

impl Analyzer {
    pub fn new(thresholds: ClassifierThresholds) -> Result<Self, AnalysisError> {
        Ok(Self {
            vocabulary: LabelVocabulary::new()?,
            thresholds,
        })
    }

    pub fn locate_header(&self, table: &RawTable) -> HeaderVerdict {
        header::locate_header(table, &self.vocabulary)
    }

    pub fn map_schema(
        &self,
        table: &RawTable,
        verdict: HeaderVerdict,
    ) -> Result<SchemaResolution, AnalysisError> {
        schema::map_schema(table, verdict, &self.vocabulary)
    }

    pub fn resolve_schema(&self, table: &RawTable) -> Result<SchemaResolution, AnalysisError> {
        let verdict = self.locate_header(table);
        info!(verdict = %verdict, width = table.width(), "header inspection completed");
        self.map_schema(table, verdict)
    }

    pub fn analyze(&self, table: &RawTable) -> Result<Analysis, AnalysisError> {
        let resolution = self.resolve_schema(table)?;

        let (normalized, coercion) = normalize::normalize_table(table, &resolution);
        let anomalies =
            classify::classify(&normalized, &resolution.mapping.required, &self.thresholds);
        let projection = project::project(&normalized, &resolution.mapping, &anomalies);

        Ok(Analysis {
            resolution,
            normalized,
            coercion,
            anomalies,
            projection,
        })
    }
}
