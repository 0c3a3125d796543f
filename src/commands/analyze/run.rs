use std::path::Path;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use super::*;
use crate::cli::AnalyzeArgs;
use crate::commands::Outcome;
use crate::model::{AnalysisCounts, AnalysisPolicy, AnalysisRunManifest};
use crate::util::{rfc3339_utc, run_stamp, write_json_pretty};

/// Every stage's output for one results directory.
#[derive(Debug)]
pub struct Analysis {
    pub discovery: Discovery,
    pub normalized: NormalizedTable,
    pub cleaned: CleanedTable,
    pub report: SummaryReport,
}

impl Analysis {
    pub fn counts(&self) -> AnalysisCounts {
        AnalysisCounts {
            source_count: self.discovery.tables.len(),
            skipped_source_count: self.discovery.skipped.len(),
            raw_rows: self.discovery.row_count(),
            normalized_rows: self.normalized.records.len(),
            skipped_rows: self.normalized.skipped_rows,
            cleaned_rows: self.cleaned.records.len(),
            performance_groups: self.report.performance.records.len(),
            hardware_groups: self
                .report
                .hardware
                .as_ref()
                .map(|hardware| hardware.records.len())
                .unwrap_or(0),
            cleaning: self.cleaned.counts.clone(),
        }
    }
}

/// Runs every stage up to aggregation. `Ok(None)` means there was nothing to
/// summarize; that is not an error.
pub fn analyze_directory(
    results_dir: &Path,
    excluded_dir: Option<&Path>,
    policy: &CleaningPolicy,
) -> Result<Option<Analysis>> {
    let resolver = SourceResolver::new(excluded_dir)?;
    let discovery = resolver.discover(results_dir)?;
    if discovery.is_empty() {
        warn!(
            root = %results_dir.display(),
            skipped = discovery.skipped.len(),
            "no benchmark result files found"
        );
        return Ok(None);
    }

    let normalized = normalize(&discovery.tables);
    let cleaned = clean(&normalized, policy);
    if cleaned.is_empty() {
        warn!("no valid benchmark rows after cleaning");
        return Ok(None);
    }

    let report = aggregate(&cleaned);
    if report.is_empty() {
        warn!("aggregation produced no summary rows");
        return Ok(None);
    }

    Ok(Some(Analysis {
        discovery,
        normalized,
        cleaned,
        report,
    }))
}

pub fn run(args: AnalyzeArgs) -> Result<Outcome> {
    let started_ts = Utc::now();
    let started_at = rfc3339_utc(started_ts);
    let run_id = format!("run-{}", run_stamp(started_ts));

    if !args.results_dir.is_dir() {
        bail!("results directory not found: {}", args.results_dir.display());
    }
    let policy = CleaningPolicy::new(args.magnitude_limit, args.rate_scale)?;

    info!(
        results_dir = %args.results_dir.display(),
        output_dir = %args.output_dir.display(),
        run_id = %run_id,
        "starting analysis"
    );

    let Some(analysis) = analyze_directory(&args.results_dir, Some(&args.output_dir), &policy)?
    else {
        return Ok(Outcome::NoData);
    };

    let configs = distinct(analysis.cleaned.records.iter().map(|record| record.config.as_str()));
    let test_types = distinct(
        analysis
            .cleaned
            .records
            .iter()
            .map(|record| record.test_type.as_str()),
    );
    info!(
        configs = %configs.join(", "),
        test_types = %test_types.join(", "),
        records = analysis.cleaned.records.len(),
        "data summary"
    );

    let renderers = if args.no_render {
        Vec::new()
    } else {
        default_renderers()
    };
    let exported = export(&analysis.report, &args.output_dir, &renderers)?;

    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir
            .join(format!("analysis_run_{}.json", run_stamp(started_ts)))
    });

    let manifest = AnalysisRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        status: "completed".to_string(),
        started_at,
        updated_at: rfc3339_utc(Utc::now()),
        command: render_analyze_command(&args),
        results_directory: args.results_dir.display().to_string(),
        output_directory: args.output_dir.display().to_string(),
        layout: analysis.discovery.layout,
        policy: AnalysisPolicy {
            magnitude_limit: policy.magnitude_limit,
            rate_scale: policy.rate_scale,
        },
        schema: analysis.normalized.columns.clone(),
        counts: analysis.counts(),
        sources: analysis.discovery.source_entries()?,
        skipped: analysis.discovery.skipped.clone(),
        artifacts: exported
            .artifacts
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        warnings: exported.warnings,
    };

    write_json_pretty(&manifest_path, &manifest)?;

    info!(path = %manifest_path.display(), "wrote analysis run manifest");
    info!(
        run_id = %run_id,
        groups = analysis.report.performance.records.len(),
        artifacts = manifest.artifacts.len(),
        "analysis completed"
    );

    Ok(Outcome::Completed)
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen
}

fn render_analyze_command(args: &AnalyzeArgs) -> String {
    let mut command = vec![
        "lob-bench-analyzer".to_string(),
        "analyze".to_string(),
        args.results_dir.display().to_string(),
        "--output-dir".to_string(),
        args.output_dir.display().to_string(),
    ];

    if args.magnitude_limit != DEFAULT_MAGNITUDE_LIMIT {
        command.push("--magnitude-limit".to_string());
        command.push(args.magnitude_limit.to_string());
    }
    if args.rate_scale != DEFAULT_RATE_SCALE {
        command.push("--rate-scale".to_string());
        command.push(args.rate_scale.to_string());
    }
    if args.no_render {
        command.push("--no-render".to_string());
    }
    if let Some(path) = &args.manifest_path {
        command.push("--manifest-path".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
