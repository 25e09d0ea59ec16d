use serde::Serialize;
use tracing::info;

use super::schema::RequiredColumns;
use super::table::NormalizedTable;

pub const SPEND_NO_RETURN_MIN_COST: f64 = 5000.0;
pub const EXPOSURE_NO_ENGAGEMENT_MIN_IMPRESSIONS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ClassifierThresholds {
    pub min_cost: f64,
    pub min_impressions: f64,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            min_cost: SPEND_NO_RETURN_MIN_COST,
            min_impressions: EXPOSURE_NO_ENGAGEMENT_MIN_IMPRESSIONS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyRule {
    SpendNoReturn,
    ExposureNoEngagement,
}

impl AnomalyRule {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SpendNoReturn => "spend_no_return",
            Self::ExposureNoEngagement => "exposure_no_engagement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RowMetrics {
    pub cost: f64,
    pub revenue: f64,
    pub impressions: f64,
    pub clicks: f64,
}

impl RowMetrics {
    pub fn read(table: &NormalizedTable, row: usize, columns: &RequiredColumns) -> Self {
        Self {
            cost: table.number(row, columns.cost),
            revenue: table.number(row, columns.revenue),
            impressions: table.number(row, columns.impressions),
            clicks: table.number(row, columns.clicks),
        }
    }

    pub fn evaluate(&self, thresholds: &ClassifierThresholds) -> Vec<AnomalyRule> {
        let mut rules = Vec::with_capacity(2);
        if self.cost >= thresholds.min_cost && self.revenue == 0.0 {
            rules.push(AnomalyRule::SpendNoReturn);
        }
        if self.impressions >= thresholds.min_impressions && self.clicks == 0.0 {
            rules.push(AnomalyRule::ExposureNoEngagement);
        }
        rules
    }
}

/// One flagged row. `rules` is never empty; a row that trips both rules is
/// still a single record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub row: usize,
    pub source_row: usize,
    pub rules: Vec<AnomalyRule>,
}

impl AnomalyRecord {
    pub fn matches(&self, rule: AnomalyRule) -> bool {
        self.rules.contains(&rule)
    }

    pub fn rule_tags(&self) -> String {
        self.rules
            .iter()
            .map(|rule| rule.as_str())
            .collect::<Vec<&str>>()
            .join("+")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RuleTotals {
    pub flagged_rows: usize,
    pub spend_no_return: usize,
    pub exposure_no_engagement: usize,
    pub both_rules: usize,
}

impl RuleTotals {
    pub fn tally(records: &[AnomalyRecord]) -> Self {
        let mut totals = Self {
            flagged_rows: records.len(),
            ..Self::default()
        };

        for record in records {
            let spend = record.matches(AnomalyRule::SpendNoReturn);
            let exposure = record.matches(AnomalyRule::ExposureNoEngagement);
            if spend {
                totals.spend_no_return += 1;
            }
            if exposure {
                totals.exposure_no_engagement += 1;
            }
            if spend && exposure {
                totals.both_rules += 1;
            }
        }

        totals
    }
}

pub fn classify(
    table: &NormalizedTable,
    columns: &RequiredColumns,
    thresholds: &ClassifierThresholds,
) -> Vec<AnomalyRecord> {
    let records = (0..table.rows.len())
        .filter_map(|row| {
            let rules = RowMetrics::read(table, row, columns).evaluate(thresholds);
            (!rules.is_empty()).then(|| AnomalyRecord {
                row,
                source_row: table.source_row(row),
                rules,
            })
        })
        .collect::<Vec<AnomalyRecord>>();

    let totals = RuleTotals::tally(&records);
    info!(
        rows = table.rows.len(),
        flagged = totals.flagged_rows,
        spend_no_return = totals.spend_no_return,
        exposure_no_engagement = totals.exposure_no_engagement,
        both = totals.both_rules,
        "classification completed"
    );

    records
}
