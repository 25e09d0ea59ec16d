use super::classify::RowMetrics;
use super::normalize::{Coercion, coerce_cell};
use super::vocabulary::LabelVocabulary;
use super::*;

fn cells(values: &[&str]) -> Vec<Cell> {
    values.iter().map(|value| Cell::from(*value)).collect()
}

fn table(labels: &[&str], rows: &[&[&str]]) -> RawTable {
    RawTable::new(cells(labels), rows.iter().map(|row| cells(row)).collect())
}

fn analyzer() -> Analyzer {
    Analyzer::new(ClassifierThresholds::default()).expect("vocabulary should compile")
}

fn metrics(cost: f64, revenue: f64, impressions: f64, clicks: f64) -> RowMetrics {
    RowMetrics {
        cost,
        revenue,
        impressions,
        clicks,
    }
}

fn headerless_row(first: &str, width: usize, values: &[(usize, &str)]) -> Vec<String> {
    let mut row = (0..width).map(|_| "x".to_string()).collect::<Vec<String>>();
    row[0] = first.to_string();
    for (index, value) in values {
        row[*index] = value.to_string();
    }
    row
}

fn owned_table(labels: Vec<String>, rows: Vec<Vec<String>>) -> RawTable {
    RawTable::new(
        labels.into_iter().map(Cell::from).collect(),
        rows.into_iter()
            .map(|row| row.into_iter().map(Cell::from).collect())
            .collect(),
    )
}

#[test]
fn korean_report_flags_spend_and_exposure_rows_in_order() {
    let raw = table(
        &["날짜", "키워드명", "광고비", "전환매출", "노출수", "클릭수"],
        &[
            &["2024-01-01", "A", "6000", "0", "50", "2"],
            &["2024-01-01", "B", "1000", "0", "150", "0"],
            &["2024-01-01", "C", "6000", "500", "150", "5"],
        ],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");

    assert_eq!(analysis.verdict(), HeaderVerdict::HeaderAtRow(0));
    assert_eq!(analysis.anomalies.len(), 2);
    assert_eq!(analysis.anomalies[0].row, 0);
    assert_eq!(analysis.anomalies[0].rules, vec![AnomalyRule::SpendNoReturn]);
    assert_eq!(analysis.anomalies[1].row, 1);
    assert_eq!(
        analysis.anomalies[1].rules,
        vec![AnomalyRule::ExposureNoEngagement]
    );

    assert_eq!(
        analysis.projection.columns,
        vec!["날짜", "키워드명", "광고비", "전환매출", "노출수", "클릭수"]
    );
    assert_eq!(analysis.projection.rows[0][1], Cell::Text("A".to_string()));
    assert_eq!(analysis.projection.rows[0][2], Cell::Number(6000.0));
    assert_eq!(analysis.projection.rows[1][1], Cell::Text("B".to_string()));
}

#[test]
fn labelled_header_resolves_to_label_positions() {
    let raw = table(
        &["Clicks", "Campaign", "Impressions", "Revenue (sales)", "Cost"],
        &[&["1", "spring", "10", "0", "10"]],
    );

    let resolution = analyzer().resolve_schema(&raw).expect("mapping should resolve");
    let required = resolution.mapping.required;

    assert_eq!(resolution.verdict, HeaderVerdict::HeaderAtRow(0));
    assert_eq!(required.cost, 4);
    assert_eq!(required.revenue, 3);
    assert_eq!(required.impressions, 2);
    assert_eq!(required.clicks, 0);
    assert_eq!(resolution.mapping.index_of(FieldRole::Name), Some(1));
    assert_eq!(resolution.data_start, 1);
}

#[test]
fn vendor_field_names_do_not_share_a_column() {
    let raw = table(
        &["statDt", "nccKeywordId", "salesAmt", "convAmt", "impCnt", "clkCnt"],
        &[&["20240101", "nkw-1", "5000", "0", "0", "0"]],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");
    let mapping = analysis.mapping();

    assert_eq!(mapping.required.cost, 2);
    assert_eq!(mapping.required.revenue, 3);
    assert_eq!(mapping.required.impressions, 4);
    assert_eq!(mapping.required.clicks, 5);
    assert_eq!(mapping.index_of(FieldRole::Date), Some(0));
    assert_eq!(mapping.index_of(FieldRole::Identifier), Some(1));
    assert_eq!(analysis.anomalies.len(), 1);
    assert_eq!(
        analysis.projection.columns,
        vec!["statDt", "nccKeywordId", "salesAmt", "convAmt", "impCnt", "clkCnt"]
    );
}

#[test]
fn leftmost_label_matching_any_role_keyword_wins() {
    let raw = table(
        &["비용", "광고비", "매출", "노출", "클릭"],
        &[&["1", "7000", "0", "1", "1"]],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");
    let required = analysis.mapping().required;

    assert_eq!(required.cost, 0);
    assert_eq!(required.revenue, 2);
    assert_eq!(required.impressions, 3);
    assert_eq!(required.clicks, 4);
    assert!(analysis.anomalies.is_empty());
}

#[test]
fn header_below_title_rows_is_promoted() {
    let raw = table(
        &["Weekly report", "", "", "", ""],
        &[
            &["account: shop-1", "", "", "", ""],
            &["날짜", "광고비", "매출", "노출수", "클릭수"],
            &["2024-01-01", "7,000", "0", "10", "1"],
            &["2024-01-02", "100", "0", "500", "0"],
            &["2024-01-03", "100", "100", "10", "1"],
        ],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");

    assert_eq!(analysis.verdict(), HeaderVerdict::HeaderAtRow(2));
    assert_eq!(analysis.resolution.data_start, 3);
    assert_eq!(analysis.normalized.rows.len(), 3);
    assert_eq!(analysis.anomalies.len(), 2);
    assert_eq!(analysis.anomalies[0].source_row, 3);
    assert!(analysis.anomalies[0].matches(AnomalyRule::SpendNoReturn));
    assert_eq!(analysis.anomalies[1].source_row, 4);
    assert!(analysis.anomalies[1].matches(AnomalyRule::ExposureNoEngagement));
}

#[test]
fn earliest_row_wins_a_header_score_tie() {
    let raw = table(
        &["광고비", "매출", "노출", "클릭"],
        &[
            &["1", "1", "1", "1"],
            &["광고비", "매출", "노출", "클릭"],
        ],
    );

    assert_eq!(analyzer().locate_header(&raw), HeaderVerdict::HeaderAtRow(0));
}

#[test]
fn header_scan_stops_after_fifteen_rows() {
    let header = ["광고비", "매출", "노출", "클릭"];
    let filler = ["a", "b", "c", "d"];

    let mut within = vec![filler.to_vec(); 13];
    within.push(header.to_vec());
    let within = table(&filler, &within.iter().map(Vec::as_slice).collect::<Vec<_>>());
    assert_eq!(
        analyzer().locate_header(&within),
        HeaderVerdict::HeaderAtRow(14)
    );

    let mut beyond = vec![filler.to_vec(); 14];
    beyond.push(header.to_vec());
    let beyond = table(&filler, &beyond.iter().map(Vec::as_slice).collect::<Vec<_>>());
    assert_eq!(
        analyzer().locate_header(&beyond),
        HeaderVerdict::HeaderAtRow(0)
    );
}

#[test]
fn fourteen_column_date_stamped_export_uses_fixed_template() {
    let first = headerless_row(
        "20250101",
        14,
        &[(9, "150"), (10, "0"), (11, "6,000"), (13, "0")],
    );
    let second = headerless_row(
        "20250101",
        14,
        &[(9, "10"), (10, "1"), (11, "100"), (13, "0")],
    );
    let raw = owned_table(first, vec![second]);

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");
    let required = analysis.mapping().required;

    assert_eq!(analysis.verdict(), HeaderVerdict::HeaderlessKnownWidth(14));
    assert_eq!(required.cost, 11);
    assert_eq!(required.revenue, 13);
    assert_eq!(required.impressions, 9);
    assert_eq!(required.clicks, 10);

    assert_eq!(analysis.normalized.rows.len(), 2);
    assert_eq!(analysis.normalized.first_source_row, 0);
    assert_eq!(analysis.anomalies.len(), 1);
    assert_eq!(
        analysis.anomalies[0].rules,
        vec![
            AnomalyRule::SpendNoReturn,
            AnomalyRule::ExposureNoEngagement
        ]
    );
    assert_eq!(
        analysis.projection.columns,
        vec!["날짜", "광고비(원)", "전환매출액(원)", "노출수", "클릭수"]
    );
    assert_eq!(analysis.projection.rows[0][1], Cell::Number(6000.0));
}

#[test]
fn numeric_date_stamp_label_is_recognized() {
    let mut labels = vec![Cell::Number(20250101.0)];
    labels.extend((1..12).map(|_| Cell::from("x")));
    let raw = RawTable::new(labels, Vec::new());

    let resolution = analyzer().resolve_schema(&raw).expect("mapping should resolve");
    let required = resolution.mapping.required;

    assert_eq!(resolution.verdict, HeaderVerdict::HeaderlessKnownWidth(12));
    assert_eq!(required.impressions, 6);
    assert_eq!(required.clicks, 7);
    assert_eq!(required.cost, 10);
    assert_eq!(required.revenue, 11);
}

#[test]
fn single_keyword_does_not_make_a_header() {
    let labels = headerless_row("20250101", 14, &[(3, "cost center")]);
    let raw = owned_table(labels, Vec::new());

    assert_eq!(
        analyzer().locate_header(&raw),
        HeaderVerdict::HeaderlessKnownWidth(14)
    );
}

#[test]
fn unknown_width_falls_back_to_tail_positions() {
    let labels = headerless_row("20250101", 11, &[]);
    let raw = owned_table(labels, Vec::new());

    let resolution = analyzer().resolve_schema(&raw).expect("mapping should resolve");
    let required = resolution.mapping.required;

    assert_eq!(resolution.verdict, HeaderVerdict::HeaderlessUnknownWidth(11));
    assert_eq!(required.revenue, 10);
    assert_eq!(required.cost, 8);
    assert_eq!(required.clicks, 7);
    assert_eq!(required.impressions, 6);
    assert_eq!(resolution.mapping.index_of(FieldRole::Date), Some(0));
    assert_eq!(resolution.labels[1], "col_1");
}

#[test]
fn narrow_headerless_table_is_rejected() {
    let labels = headerless_row("20250101", 8, &[]);
    let raw = owned_table(labels, Vec::new());

    let err = analyzer()
        .analyze(&raw)
        .expect_err("narrow headerless table should fail");

    assert!(matches!(
        err,
        AnalysisError::InsufficientWidth {
            width: 8,
            minimum: 10
        }
    ));
}

#[test]
fn ten_columns_is_the_narrowest_positional_fallback() {
    let raw = owned_table(headerless_row("20250101", 10, &[]), Vec::new());

    let resolution = analyzer().resolve_schema(&raw).expect("mapping should resolve");
    let required = resolution.mapping.required;

    assert_eq!(resolution.verdict, HeaderVerdict::HeaderlessUnknownWidth(10));
    assert_eq!(required.impressions, 5);
    assert_eq!(required.clicks, 6);
    assert_eq!(required.cost, 7);
    assert_eq!(required.revenue, 9);
}

#[test]
fn nine_columns_is_too_narrow_for_positional_fallback() {
    let raw = owned_table(headerless_row("20250101", 9, &[]), Vec::new());

    let err = analyzer()
        .resolve_schema(&raw)
        .expect_err("nine headerless columns should fail");

    assert!(matches!(
        err,
        AnalysisError::InsufficientWidth {
            width: 9,
            minimum: 10
        }
    ));
}

#[test]
fn map_schema_reuses_a_located_verdict() {
    let raw = table(
        &["날짜", "광고비", "매출", "노출수", "클릭수"],
        &[&["2024-01-01", "7000", "0", "10", "1"]],
    );
    let analyzer = analyzer();

    let verdict = analyzer.locate_header(&raw);
    let mapped = analyzer
        .map_schema(&raw, verdict)
        .expect("mapping should resolve");

    assert_eq!(verdict, HeaderVerdict::HeaderAtRow(0));
    assert_eq!(
        mapped,
        analyzer.resolve_schema(&raw).expect("mapping should resolve")
    );
}

#[test]
fn six_columns_without_keywords_fail_schema_mapping() {
    let raw = table(
        &["a", "b", "c", "d", "e", "f"],
        &[&["1", "2", "3", "4", "5", "6"]],
    );

    let err = analyzer()
        .analyze(&raw)
        .expect_err("unlabelled table should fail");

    match err {
        AnalysisError::SchemaMapping {
            verdict,
            width,
            labels,
            resolved,
            missing,
        } => {
            assert_eq!(verdict, HeaderVerdict::HeaderAtRow(0));
            assert_eq!(width, 6);
            assert_eq!(labels, vec!["a", "b", "c", "d", "e", "f"]);
            assert!(resolved.is_empty());
            assert_eq!(missing, FieldRole::REQUIRED.to_vec());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn partial_header_reports_resolved_and_missing_roles() {
    let raw = table(&["date", "cost", "memo"], &[&["2024-01-01", "1", "x"]]);

    let err = analyzer()
        .analyze(&raw)
        .expect_err("partial header should fail");
    let message = err.to_string();

    assert!(message.contains("header at row 0"));
    assert!(message.contains("resolved [cost=1]"));
    assert!(message.contains("missing [revenue, impressions, clicks]"));
}

#[test]
fn rule_thresholds_are_inclusive() {
    let thresholds = ClassifierThresholds::default();

    assert_eq!(
        metrics(5000.0, 0.0, 0.0, 0.0).evaluate(&thresholds),
        vec![AnomalyRule::SpendNoReturn]
    );
    assert!(metrics(4999.0, 0.0, 0.0, 0.0).evaluate(&thresholds).is_empty());
    assert_eq!(
        metrics(0.0, 0.0, 100.0, 0.0).evaluate(&thresholds),
        vec![AnomalyRule::ExposureNoEngagement]
    );
    assert!(metrics(0.0, 0.0, 99.0, 0.0).evaluate(&thresholds).is_empty());
}

#[test]
fn healthy_row_is_never_flagged() {
    let thresholds = ClassifierThresholds::default();
    assert!(
        metrics(6000.0, 500.0, 150.0, 5.0)
            .evaluate(&thresholds)
            .is_empty()
    );
}

#[test]
fn custom_thresholds_apply() {
    let analyzer = Analyzer::new(ClassifierThresholds {
        min_cost: 1000.0,
        min_impressions: 1000.0,
    })
    .expect("vocabulary should compile");
    let raw = table(
        &["광고비", "매출", "노출", "클릭"],
        &[&["1000", "0", "500", "0"]],
    );

    let analysis = analyzer.analyze(&raw).expect("analysis should succeed");
    assert_eq!(analysis.anomalies.len(), 1);
    assert_eq!(analysis.anomalies[0].rules, vec![AnomalyRule::SpendNoReturn]);
}

#[test]
fn flagged_rows_are_a_subset_satisfying_a_rule() {
    let raw = table(
        &["광고비", "매출", "노출", "클릭", "메모"],
        &[
            &["6000", "0", "0", "0", "a"],
            &["10", "0", "0", "0", "b"],
            &["10", "0", "300", "0", "c"],
            &["9000", "1", "300", "3", "d"],
            &["5000", "0", "100", "0", "e"],
            &["", "", "", "", "f"],
        ],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");
    let thresholds = ClassifierThresholds::default();
    let required = analysis.mapping().required;

    assert_eq!(
        analysis
            .anomalies
            .iter()
            .map(|record| record.row)
            .collect::<Vec<usize>>(),
        vec![0, 2, 4]
    );
    for record in &analysis.anomalies {
        assert!(record.row < analysis.normalized.rows.len());
        let rules = RowMetrics::read(&analysis.normalized, record.row, &required)
            .evaluate(&thresholds);
        assert!(!rules.is_empty());
        assert_eq!(rules, record.rules);
    }

    let totals = analysis.totals();
    assert_eq!(totals.flagged_rows, 3);
    assert_eq!(totals.spend_no_return, 2);
    assert_eq!(totals.exposure_no_engagement, 2);
    assert_eq!(totals.both_rules, 1);
}

#[test]
fn projection_keeps_full_row_without_optional_columns() {
    let raw = table(
        &["cost", "revenue", "impressions", "clicks", "memo"],
        &[&["7000", "0", "0", "0", "check landing page"]],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");

    assert_eq!(
        analysis.projection.columns,
        vec!["cost", "revenue", "impressions", "clicks", "memo"]
    );
    assert_eq!(
        analysis.projection.rows[0][4],
        Cell::Text("check landing page".to_string())
    );
}

#[test]
fn explicit_selection_keeps_requested_order() {
    let raw = table(
        &["날짜", "키워드명", "광고비", "전환매출", "노출수", "클릭수"],
        &[&["2024-01-01", "A", "6000", "0", "50", "2"]],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");
    let (projection, unknown) = analysis.select_columns(&[
        "광고".to_string(),
        "키워드명".to_string(),
        "ROAS".to_string(),
    ]);

    assert_eq!(projection.columns, vec!["광고비", "키워드명"]);
    assert_eq!(projection.source_columns, vec![2, 1]);
    assert_eq!(unknown, vec!["ROAS"]);
    assert_eq!(
        projection.rows,
        vec![vec![Cell::Number(6000.0), Cell::Text("A".to_string())]]
    );
}

#[test]
fn short_rows_read_missing_metrics_as_blank() {
    let raw = table(
        &["광고비", "매출", "노출", "클릭"],
        &[&["0", "0", "200"]],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");

    assert_eq!(analysis.anomalies.len(), 1);
    assert!(analysis.anomalies[0].matches(AnomalyRule::ExposureNoEngagement));
    let clicks = analysis
        .coercion
        .for_role(FieldRole::Clicks)
        .expect("clicks column should be reported");
    assert_eq!(clicks.blank_cells, 1);
    assert_eq!(clicks.unparseable_cells, 0);
}

#[test]
fn unparseable_revenue_is_counted_while_reading_as_zero() {
    let raw = table(
        &["광고비", "매출", "노출", "클릭"],
        &[&["6,000", "n/a", "10", "1"], &["6,000", "1,200", "10", "1"]],
    );

    let analysis = analyzer().analyze(&raw).expect("analysis should succeed");

    assert_eq!(analysis.anomalies.len(), 1);
    assert_eq!(analysis.anomalies[0].source_row, 1);
    let revenue = analysis
        .coercion
        .for_role(FieldRole::Revenue)
        .expect("revenue column should be reported");
    assert_eq!(revenue.unparseable_cells, 1);
    assert_eq!(revenue.sample_rows, vec![1]);
    assert_eq!(analysis.coercion.failure_count(), 1);
    assert_eq!(analysis.normalized.number(1, 1), 1200.0);
}

#[test]
fn coerce_cell_strips_separators_and_whitespace() {
    assert_eq!(coerce_cell(&Cell::from("1,234")), Coercion::Parsed(1234.0));
    assert_eq!(coerce_cell(&Cell::from(" 5 000 ")), Coercion::Parsed(5000.0));
    assert_eq!(coerce_cell(&Cell::from("12.5")), Coercion::Parsed(12.5));
    assert_eq!(coerce_cell(&Cell::Number(3.0)), Coercion::Parsed(3.0));
    assert_eq!(coerce_cell(&Cell::from("")), Coercion::Blank);
    assert_eq!(coerce_cell(&Cell::from("  ")), Coercion::Blank);
    assert_eq!(coerce_cell(&Cell::from("abc")), Coercion::Unparseable);
    assert_eq!(coerce_cell(&Cell::from("nan")), Coercion::Unparseable);
    assert_eq!(coerce_cell(&Cell::Number(f64::NAN)), Coercion::Unparseable);
    assert_eq!(Coercion::Unparseable.value(), 0.0);
}

#[test]
fn identifier_labels_are_detected() {
    let vocabulary = LabelVocabulary::new().expect("vocabulary should compile");

    assert!(vocabulary.is_identifier("광고ID"));
    assert!(vocabulary.is_identifier("Keyword ID"));
    assert!(vocabulary.is_identifier("nccKeywordId"));
    assert!(!vocabulary.is_identifier("VIDEO"));
    assert!(!vocabulary.is_identifier("CID"));
    assert!(!vocabulary.is_identifier("Idea"));
}

#[test]
fn analysis_leaves_the_raw_table_untouched() {
    let raw = table(
        &["광고비", "매출", "노출", "클릭"],
        &[&["6,000", "0", "10", "1"]],
    );
    let before = raw.clone();

    analyzer().analyze(&raw).expect("analysis should succeed");

    assert_eq!(raw, before);
}
