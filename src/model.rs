use serde::Serialize;

use crate::analysis::{
    Analysis, AnomalyRecord, ClassifierThresholds, CoercionReport, FieldRole, HeaderVerdict,
    ProjectedTable, SchemaMapping,
};

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct SourceEntry {
    pub path: String,
    pub sha256: String,
    pub delimiter: String,
    pub label_count: usize,
    pub row_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisCounts {
    pub data_rows: usize,
    pub flagged_rows: usize,
    pub spend_no_return: usize,
    pub exposure_no_engagement: usize,
    pub both_rules: usize,
    pub coercion_failures: usize,
    pub unparseable_cells: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportEntry {
    pub path: String,
    pub columns: Vec<String>,
    pub roles: Vec<FieldRole>,
    pub row_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub failure_reason: Option<String>,
    pub source: SourceEntry,
    pub thresholds: ClassifierThresholds,
    pub verdict: Option<HeaderVerdict>,
    pub mapping: Option<SchemaMapping>,
    pub labels: Vec<String>,
    pub counts: AnalysisCounts,
    pub coercion: Option<CoercionReport>,
    pub flagged: Vec<AnomalyRecord>,
    pub export: Option<ExportEntry>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

impl AnalysisRunManifest {
    pub fn started(
        run_id: String,
        started_at: String,
        command: String,
        source: SourceEntry,
        thresholds: ClassifierThresholds,
    ) -> Self {
        Self {
            manifest_version: MANIFEST_VERSION,
            run_id,
            status: "running".to_string(),
            updated_at: started_at.clone(),
            started_at,
            command,
            failure_reason: None,
            source,
            thresholds,
            verdict: None,
            mapping: None,
            labels: Vec::new(),
            counts: AnalysisCounts::default(),
            coercion: None,
            flagged: Vec::new(),
            export: None,
            warnings: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn record_analysis(&mut self, analysis: &Analysis) {
        let totals = analysis.totals();

        self.verdict = Some(analysis.verdict());
        self.mapping = Some(analysis.mapping().clone());
        self.labels = analysis.resolution.labels.clone();
        self.counts = AnalysisCounts {
            data_rows: analysis.normalized.rows.len(),
            flagged_rows: totals.flagged_rows,
            spend_no_return: totals.spend_no_return,
            exposure_no_engagement: totals.exposure_no_engagement,
            both_rules: totals.both_rules,
            coercion_failures: analysis.coercion.failure_count(),
            unparseable_cells: analysis.coercion.unparseable_count(),
        };
        self.coercion = Some(analysis.coercion.clone());
        self.flagged = analysis.anomalies.clone();

        if analysis.verdict().is_headerless() {
            self.notes.push(format!(
                "Columns were assigned by position ({}); check the mapping before trusting flagged rows.",
                analysis.verdict()
            ));
        }
        if self.counts.unparseable_cells > 0 {
            self.warnings.push(format!(
                "{} metric cells could not be parsed and were read as zero.",
                self.counts.unparseable_cells
            ));
        }
    }

    pub fn record_export(
        &mut self,
        path: String,
        projection: &ProjectedTable,
        roles: Vec<FieldRole>,
    ) {
        self.export = Some(ExportEntry {
            path,
            columns: projection.columns.clone(),
            roles,
            row_count: projection.rows.len(),
        });
    }

    pub fn complete(&mut self, updated_at: String) {
        self.status = "completed".to_string();
        self.updated_at = updated_at;
    }

    pub fn fail(&mut self, updated_at: String, reason: String) {
        self.status = "failed".to_string();
        self.updated_at = updated_at;
        self.failure_reason = Some(reason);
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct InspectionReport {
    pub source: SourceEntry,
    pub verdict: HeaderVerdict,
    pub labels: Vec<String>,
    pub mapping: Option<SchemaMapping>,
    pub mapping_error: Option<String>,
    pub preview: Vec<Vec<String>>,
}
