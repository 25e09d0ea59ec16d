use serde::Serialize;
use tracing::info;

use super::error::AnalysisError;
use super::header::HeaderVerdict;
use super::table::RawTable;
use super::vocabulary::{LabelVocabulary, POSITIONAL_MIN_WIDTH, known_template};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRole {
    Date,
    Cost,
    Revenue,
    Impressions,
    Clicks,
    Identifier,
    Name,
    Other,
}

impl FieldRole {
    /// Resolution order; earlier roles claim contested columns first.
    pub const REQUIRED: [FieldRole; 4] = [
        FieldRole::Cost,
        FieldRole::Revenue,
        FieldRole::Impressions,
        FieldRole::Clicks,
    ];

    pub fn is_required(self) -> bool {
        Self::REQUIRED.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Cost => "cost",
            Self::Revenue => "revenue",
            Self::Impressions => "impressions",
            Self::Clicks => "clicks",
            Self::Identifier => "identifier",
            Self::Name => "name",
            Self::Other => "other",
        }
    }

    pub fn synthesized_label(self) -> &'static str {
        match self {
            Self::Date => "날짜",
            Self::Cost => "광고비(원)",
            Self::Revenue => "전환매출액(원)",
            Self::Impressions => "노출수",
            Self::Clicks => "클릭수",
            Self::Identifier => "ID",
            Self::Name => "이름",
            Self::Other => "",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RequiredColumns {
    pub cost: usize,
    pub revenue: usize,
    pub impressions: usize,
    pub clicks: usize,
}

impl RequiredColumns {
    pub fn index_of(&self, role: FieldRole) -> Option<usize> {
        match role {
            FieldRole::Cost => Some(self.cost),
            FieldRole::Revenue => Some(self.revenue),
            FieldRole::Impressions => Some(self.impressions),
            FieldRole::Clicks => Some(self.clicks),
            _ => None,
        }
    }

    pub fn ordered(&self) -> [(FieldRole, usize); 4] {
        [
            (FieldRole::Cost, self.cost),
            (FieldRole::Revenue, self.revenue),
            (FieldRole::Impressions, self.impressions),
            (FieldRole::Clicks, self.clicks),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnAssignment {
    pub role: FieldRole,
    pub index: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaMapping {
    pub required: RequiredColumns,
    pub optional: Vec<ColumnAssignment>,
    pub assignments: Vec<ColumnAssignment>,
}

impl SchemaMapping {
    pub fn index_of(&self, role: FieldRole) -> Option<usize> {
        self.required.index_of(role).or_else(|| {
            self.optional
                .iter()
                .find(|assignment| assignment.role == role)
                .map(|assignment| assignment.index)
        })
    }

    pub fn role_of(&self, index: usize) -> FieldRole {
        self.assignments
            .iter()
            .find(|assignment| assignment.index == index)
            .map(|assignment| assignment.role)
            .unwrap_or(FieldRole::Other)
    }

    pub fn has_optional_columns(&self) -> bool {
        !self.optional.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaResolution {
    pub verdict: HeaderVerdict,
    pub mapping: SchemaMapping,
    pub labels: Vec<String>,
    pub data_start: usize,
}

#[derive(Debug, Default)]
struct MappingDraft {
    assignments: Vec<ColumnAssignment>,
}

impl MappingDraft {
    fn is_claimed(&self, index: usize) -> bool {
        self.assignments
            .iter()
            .any(|assignment| assignment.index == index)
    }

    fn has_role(&self, role: FieldRole) -> bool {
        self.assignments
            .iter()
            .any(|assignment| assignment.role == role)
    }

    fn claimed(&self) -> Vec<usize> {
        self.assignments
            .iter()
            .map(|assignment| assignment.index)
            .collect()
    }

    fn assign(&mut self, role: FieldRole, index: usize, labels: &[String]) {
        if self.is_claimed(index) {
            return;
        }

        self.assignments.push(ColumnAssignment {
            role,
            index,
            label: labels.get(index).cloned().unwrap_or_default(),
        });
    }

    fn resolved_required(&self) -> Vec<(FieldRole, usize)> {
        FieldRole::REQUIRED
            .iter()
            .filter_map(|role| self.required_index(*role).map(|index| (*role, index)))
            .collect()
    }

    fn required_index(&self, role: FieldRole) -> Option<usize> {
        self.assignments
            .iter()
            .find(|assignment| assignment.role == role)
            .map(|assignment| assignment.index)
    }

    fn check_complete(
        &self,
        verdict: HeaderVerdict,
        labels: &[String],
    ) -> Result<RequiredColumns, AnalysisError> {
        let cost = self.required_index(FieldRole::Cost);
        let revenue = self.required_index(FieldRole::Revenue);
        let impressions = self.required_index(FieldRole::Impressions);
        let clicks = self.required_index(FieldRole::Clicks);

        let (Some(cost), Some(revenue), Some(impressions), Some(clicks)) =
            (cost, revenue, impressions, clicks)
        else {
            let missing = FieldRole::REQUIRED
                .iter()
                .copied()
                .filter(|role| !self.has_role(*role))
                .collect();
            return Err(AnalysisError::SchemaMapping {
                verdict,
                width: labels.len(),
                labels: labels.to_vec(),
                resolved: self.resolved_required(),
                missing,
            });
        };

        Ok(RequiredColumns {
            cost,
            revenue,
            impressions,
            clicks,
        })
    }

    fn finish(
        self,
        verdict: HeaderVerdict,
        labels: &[String],
    ) -> Result<SchemaMapping, AnalysisError> {
        let required = self.check_complete(verdict, labels)?;

        let mut optional = self
            .assignments
            .iter()
            .filter(|assignment| !assignment.role.is_required())
            .cloned()
            .collect::<Vec<ColumnAssignment>>();
        optional.sort_by_key(|assignment| assignment.role != FieldRole::Date);

        Ok(SchemaMapping {
            required,
            optional,
            assignments: self.assignments,
        })
    }
}

pub fn map_schema(
    table: &RawTable,
    verdict: HeaderVerdict,
    vocabulary: &LabelVocabulary,
) -> Result<SchemaResolution, AnalysisError> {
    let resolution = match verdict {
        HeaderVerdict::HeaderAtRow(index) => map_labelled(table, index, vocabulary)?,
        HeaderVerdict::HeaderlessKnownWidth(width) => map_known_width(width)?,
        HeaderVerdict::HeaderlessUnknownWidth(width) => map_tail_positions(width)?,
    };

    for assignment in &resolution.mapping.assignments {
        info!(
            role = assignment.role.as_str(),
            column = assignment.index,
            label = %assignment.label,
            "column mapped"
        );
    }

    Ok(resolution)
}

fn map_labelled(
    table: &RawTable,
    header_row: usize,
    vocabulary: &LabelVocabulary,
) -> Result<SchemaResolution, AnalysisError> {
    let verdict = HeaderVerdict::HeaderAtRow(header_row);
    let labels = table
        .scan_row(header_row)
        .unwrap_or_default()
        .iter()
        .map(|cell| cell.as_text().trim().to_string())
        .collect::<Vec<String>>();

    let mut draft = MappingDraft::default();

    for role in FieldRole::REQUIRED {
        if let Some(index) = vocabulary.find_role(role, &labels, &draft.claimed()) {
            draft.assign(role, index, &labels);
        }
    }

    draft.check_complete(verdict, &labels)?;

    if let Some(index) = vocabulary.find_role(FieldRole::Date, &labels, &draft.claimed()) {
        draft.assign(FieldRole::Date, index, &labels);
    }

    for index in 0..labels.len() {
        if draft.is_claimed(index) || labels[index].is_empty() {
            continue;
        }

        if vocabulary.is_identifier(&labels[index]) {
            draft.assign(FieldRole::Identifier, index, &labels);
        } else if vocabulary.matches_role(FieldRole::Name, &labels[index]) {
            draft.assign(FieldRole::Name, index, &labels);
        }
    }

    Ok(SchemaResolution {
        verdict,
        mapping: draft.finish(verdict, &labels)?,
        labels,
        data_start: header_row + 1,
    })
}

fn map_known_width(width: usize) -> Result<SchemaResolution, AnalysisError> {
    let verdict = HeaderVerdict::HeaderlessKnownWidth(width);
    let Some(template) = known_template(width) else {
        return Err(AnalysisError::SchemaMapping {
            verdict,
            width,
            labels: Vec::new(),
            resolved: Vec::new(),
            missing: FieldRole::REQUIRED.to_vec(),
        });
    };

    map_positions(verdict, width, template.positions)
}

fn map_tail_positions(width: usize) -> Result<SchemaResolution, AnalysisError> {
    if width < POSITIONAL_MIN_WIDTH {
        return Err(AnalysisError::InsufficientWidth {
            width,
            minimum: POSITIONAL_MIN_WIDTH,
        });
    }

    let positions = [
        (FieldRole::Date, 0),
        (FieldRole::Impressions, width - 5),
        (FieldRole::Clicks, width - 4),
        (FieldRole::Cost, width - 3),
        (FieldRole::Revenue, width - 1),
    ];

    map_positions(
        HeaderVerdict::HeaderlessUnknownWidth(width),
        width,
        &positions,
    )
}

fn map_positions(
    verdict: HeaderVerdict,
    width: usize,
    positions: &[(FieldRole, usize)],
) -> Result<SchemaResolution, AnalysisError> {
    let labels = synthesize_labels(width, positions);

    let mut draft = MappingDraft::default();
    for (role, index) in positions {
        draft.assign(*role, *index, &labels);
    }

    Ok(SchemaResolution {
        verdict,
        mapping: draft.finish(verdict, &labels)?,
        labels,
        data_start: 0,
    })
}

fn synthesize_labels(width: usize, positions: &[(FieldRole, usize)]) -> Vec<String> {
    (0..width)
        .map(|index| {
            positions
                .iter()
                .find(|(_, position)| *position == index)
                .map(|(role, _)| role.synthesized_label().to_string())
                .unwrap_or_else(|| format!("col_{index}"))
        })
        .collect()
}
