use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};

use super::aggregate::{SummaryReport, SummaryTable};
use super::render::ReportRenderer;
use super::resolve::{CONFIG_COLUMN, TEST_TYPE_COLUMN};
use crate::util::ensure_directory;

pub const PERFORMANCE_SUMMARY_FILE: &str = "performance_summary.csv";
pub const HARDWARE_SUMMARY_FILE: &str = "hardware_summary.csv";

#[derive(Debug, Default)]
pub struct ExportOutcome {
    pub artifacts: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Group keys first, then one column per metric; missing means are empty cells.
pub fn write_summary_csv(path: &Path, summary: &SummaryTable) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;

    let mut header = vec![CONFIG_COLUMN, TEST_TYPE_COLUMN];
    header.extend(summary.metrics.iter().map(|metric| metric.column()));
    writer
        .write_record(&header)
        .with_context(|| format!("failed to write header to {}", path.display()))?;

    for record in &summary.records {
        let mut row = vec![record.config.clone(), record.test_type.to_string()];
        row.extend(summary.metrics.iter().map(|metric| {
            record
                .get(*metric)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        writer
            .write_record(&row)
            .with_context(|| format!("failed to write row to {}", path.display()))?;
    }

    writer
        .flush()
        .with_context(|| format!("failed to flush {}", path.display()))?;

    Ok(())
}

pub fn write_summaries(report: &SummaryReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
    ensure_directory(output_dir)?;

    let mut written = Vec::new();

    let performance_path = output_dir.join(PERFORMANCE_SUMMARY_FILE);
    write_summary_csv(&performance_path, &report.performance)?;
    info!(
        path = %performance_path.display(),
        groups = report.performance.records.len(),
        "wrote performance summary"
    );
    written.push(performance_path);

    match &report.hardware {
        Some(hardware) => {
            let hardware_path = output_dir.join(HARDWARE_SUMMARY_FILE);
            write_summary_csv(&hardware_path, hardware)?;
            info!(
                path = %hardware_path.display(),
                metrics = hardware.metrics.len(),
                "wrote hardware summary"
            );
            written.push(hardware_path);
        }
        None => info!("no hardware metrics available for hardware summary"),
    }

    Ok(written)
}

/// Summary files must be written; a failing renderer is reported and the
/// remaining renderers still run.
pub fn export(
    report: &SummaryReport,
    output_dir: &Path,
    renderers: &[Box<dyn ReportRenderer>],
) -> Result<ExportOutcome> {
    let mut outcome = ExportOutcome {
        artifacts: write_summaries(report, output_dir)?,
        warnings: Vec::new(),
    };

    for renderer in renderers {
        match renderer.render(report, output_dir) {
            Ok(paths) => {
                for path in &paths {
                    info!(renderer = renderer.name(), path = %path.display(), "rendered artifact");
                }
                outcome.artifacts.extend(paths);
            }
            Err(err) => {
                let message = format!("renderer {} failed: {err:#}", renderer.name());
                warn!(renderer = renderer.name(), error = %format!("{err:#}"), "renderer failed");
                outcome.warnings.push(message);
            }
        }
    }

    Ok(outcome)
}
