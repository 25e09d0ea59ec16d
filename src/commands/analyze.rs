use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::{Local, Utc};
use tracing::{info, warn};

use killlist::analysis::project::projected_roles;
use killlist::analysis::{Analyzer, ClassifierThresholds};
use killlist::model::AnalysisRunManifest;
use killlist::util::{
    ensure_directory, kill_list_filename, now_utc_string, utc_compact_string, write_json_pretty,
    write_projection_csv,
};

use super::load_source;
use crate::cli::AnalyzeArgs;

pub fn run(args: AnalyzeArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let thresholds = thresholds_from_args(&args)?;

    let manifest_path = match args.manifest_path.clone() {
        Some(path) => path,
        None => {
            let manifest_dir = args.out_dir.join("manifests");
            ensure_directory(&manifest_dir)?;
            manifest_dir.join(format!(
                "analysis_run_{}.json",
                utc_compact_string(started_ts)
            ))
        }
    };
    let output_path = args.output.clone().unwrap_or_else(|| {
        args.out_dir
            .join(kill_list_filename(Local::now().date_naive()))
    });

    info!(input = %args.input.display(), run_id = %run_id, "starting analysis");

    let (loaded, source) = load_source(&args.input, args.delimiter)?;
    let mut manifest = AnalysisRunManifest::started(
        run_id,
        started_at,
        render_analyze_command(&args),
        source,
        thresholds,
    );

    let analyzer = Analyzer::new(thresholds).context("failed to build label vocabulary")?;
    let analysis = match analyzer.analyze(&loaded.table) {
        Ok(analysis) => analysis,
        Err(err) => {
            manifest.fail(now_utc_string(), err.to_string());
            write_json_pretty(&manifest_path, &manifest)?;
            warn!(manifest = %manifest_path.display(), "wrote failed analysis manifest");
            return Err(err)
                .with_context(|| format!("failed to analyze {}", args.input.display()));
        }
    };
    manifest.record_analysis(&analysis);

    let projection = if args.columns.is_empty() {
        analysis.projection.clone()
    } else {
        let (projection, unknown) = analysis.select_columns(&args.columns);
        for label in unknown {
            manifest
                .warnings
                .push(format!("requested column `{label}` matched no label"));
        }
        if projection.columns.is_empty() {
            let reason = format!(
                "none of the requested columns matched a label: {}",
                args.columns.join(", ")
            );
            manifest.fail(now_utc_string(), reason.clone());
            write_json_pretty(&manifest_path, &manifest)?;
            bail!(reason);
        }
        projection
    };
    let roles = projected_roles(&projection, analysis.mapping());

    write_projection_csv(&output_path, &projection)?;
    manifest.record_export(output_path.display().to_string(), &projection, roles);
    manifest.complete(now_utc_string());
    write_json_pretty(&manifest_path, &manifest)?;

    let totals = analysis.totals();
    if totals.flagged_rows == 0 {
        info!(
            data_rows = manifest.counts.data_rows,
            "no zombie rows found; every row with spend or exposure shows some return"
        );
    }
    for warning in &manifest.warnings {
        warn!(warning = %warning, "analysis warning");
    }

    info!(
        verdict = %analysis.verdict(),
        data_rows = manifest.counts.data_rows,
        flagged_rows = totals.flagged_rows,
        spend_no_return = totals.spend_no_return,
        exposure_no_engagement = totals.exposure_no_engagement,
        output = %output_path.display(),
        manifest = %manifest_path.display(),
        "analysis completed"
    );

    if args.json {
        let rendered =
            serde_json::to_string_pretty(&manifest).context("failed to render manifest json")?;
        println!("{rendered}");
    }

    Ok(())
}

fn thresholds_from_args(args: &AnalyzeArgs) -> Result<ClassifierThresholds> {
    for (flag, value) in [
        ("--min-cost", args.min_cost),
        ("--min-impressions", args.min_impressions),
    ] {
        if !value.is_finite() || value < 0.0 {
            bail!("{flag} must be a finite, non-negative number (got {value})");
        }
    }

    Ok(ClassifierThresholds {
        min_cost: args.min_cost,
        min_impressions: args.min_impressions,
    })
}

fn render_analyze_command(args: &AnalyzeArgs) -> String {
    let mut command = vec![
        "killlist".to_string(),
        "analyze".to_string(),
        args.input.display().to_string(),
        "--delimiter".to_string(),
        args.delimiter.as_str().to_string(),
        "--out-dir".to_string(),
        args.out_dir.display().to_string(),
        "--min-cost".to_string(),
        args.min_cost.to_string(),
        "--min-impressions".to_string(),
        args.min_impressions.to_string(),
    ];

    push_path_flag(&mut command, "--output", args.output.as_ref());
    push_path_flag(&mut command, "--manifest-path", args.manifest_path.as_ref());

    for column in &args.columns {
        command.push("--column".to_string());
        command.push(column.clone());
    }

    if args.json {
        command.push("--json".to_string());
    }

    command.join(" ")
}

fn push_path_flag(command: &mut Vec<String>, flag: &str, path: Option<&PathBuf>) {
    if let Some(path) = path {
        command.push(flag.to_string());
        command.push(path.display().to_string());
    }
}
