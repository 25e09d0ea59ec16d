use regex::Regex;

use super::error::AnalysisError;
use super::schema::FieldRole;
use super::table::Cell;

pub const HEADER_SCAN_ROWS: usize = 15;
pub const HEADER_MIN_SCORE: usize = 2;
pub const POSITIONAL_MIN_WIDTH: usize = 10;

const COST_KEYWORDS: &[&str] = &["광고비", "비용", "cost", "salesAmt", "지출", "spend"];
const REVENUE_KEYWORDS: &[&str] = &["전환매출", "매출", "sales", "convAmt", "수익", "revenue"];
const IMPRESSION_KEYWORDS: &[&str] = &["노출", "imp", "view"];
const CLICK_KEYWORDS: &[&str] = &["클릭", "clk", "click"];
const DATE_KEYWORDS: &[&str] = &["날짜", "일자", "statDt", "date"];
const NAME_KEYWORDS: &[&str] = &[
    "키워드", "캠페인", "광고그룹", "소재", "상품", "keyword", "campaign", "name",
];

#[derive(Debug)]
pub struct FixedTemplate {
    pub width: usize,
    pub positions: &'static [(FieldRole, usize)],
}

pub const KNOWN_TEMPLATES: &[FixedTemplate] = &[
    FixedTemplate {
        width: 14,
        positions: &[
            (FieldRole::Date, 0),
            (FieldRole::Impressions, 9),
            (FieldRole::Clicks, 10),
            (FieldRole::Cost, 11),
            (FieldRole::Revenue, 13),
        ],
    },
    FixedTemplate {
        width: 12,
        positions: &[
            (FieldRole::Date, 0),
            (FieldRole::Impressions, 6),
            (FieldRole::Clicks, 7),
            (FieldRole::Cost, 10),
            (FieldRole::Revenue, 11),
        ],
    },
];

pub fn known_template(width: usize) -> Option<&'static FixedTemplate> {
    KNOWN_TEMPLATES
        .iter()
        .find(|template| template.width == width)
}

pub fn role_keywords(role: FieldRole) -> &'static [&'static str] {
    match role {
        FieldRole::Cost => COST_KEYWORDS,
        FieldRole::Revenue => REVENUE_KEYWORDS,
        FieldRole::Impressions => IMPRESSION_KEYWORDS,
        FieldRole::Clicks => CLICK_KEYWORDS,
        FieldRole::Date => DATE_KEYWORDS,
        FieldRole::Name => NAME_KEYWORDS,
        FieldRole::Identifier | FieldRole::Other => &[],
    }
}

#[derive(Debug)]
pub struct LabelVocabulary {
    date_stamp: Regex,
    identifier: Regex,
}

impl LabelVocabulary {
    pub fn new() -> Result<Self, AnalysisError> {
        Ok(Self {
            date_stamp: Regex::new(r"^[0-9]{8}$")?,
            identifier: Regex::new(r"(?:^|[^A-Z])ID(?:$|[^A-Z])|[a-z]Id$")?,
        })
    }

    pub fn matches_role(&self, role: FieldRole, label: &str) -> bool {
        let label = label.to_lowercase();
        role_keywords(role)
            .iter()
            .any(|keyword| label.contains(&keyword.to_lowercase()))
    }

    pub fn find_role(
        &self,
        role: FieldRole,
        labels: &[String],
        claimed: &[usize],
    ) -> Option<usize> {
        labels.iter().enumerate().find_map(|(index, label)| {
            (!claimed.contains(&index) && self.matches_role(role, label)).then_some(index)
        })
    }

    pub fn is_date_stamp(&self, text: &str) -> bool {
        self.date_stamp.is_match(text.trim())
    }

    pub fn is_identifier(&self, label: &str) -> bool {
        self.identifier.is_match(label.trim())
    }

    /// Number of distinct required roles a row's cells point at. A single cell
    /// credits at most one role, so `salesAmt` alone cannot look like a header.
    pub fn header_score(&self, cells: &[Cell]) -> usize {
        let mut credited = Vec::<FieldRole>::with_capacity(FieldRole::REQUIRED.len());

        for cell in cells {
            let text = cell.as_text();
            if text.trim().is_empty() {
                continue;
            }

            let hit = FieldRole::REQUIRED
                .iter()
                .copied()
                .find(|role| !credited.contains(role) && self.matches_role(*role, &text));
            if let Some(role) = hit {
                credited.push(role);
            }
        }

        credited.len()
    }
}
