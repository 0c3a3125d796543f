use std::path::Path;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::InventoryArgs;
use crate::commands::Outcome;
use crate::commands::analyze::SourceResolver;
use crate::model::SourceInventoryManifest;
use crate::util::{rfc3339_utc, write_json_pretty};

const DEFAULT_MANIFEST_PATH: &str = "visualizations/source_inventory.json";

pub fn run(args: InventoryArgs) -> Result<Outcome> {
    if !args.results_dir.is_dir() {
        bail!("results directory not found: {}", args.results_dir.display());
    }

    let manifest_path = args
        .manifest_path
        .clone()
        .unwrap_or_else(|| DEFAULT_MANIFEST_PATH.into());
    let excluded_dir = manifest_path.parent().filter(|dir| !dir.as_os_str().is_empty());

    let manifest = build_manifest(&args.results_dir, excluded_dir)?;
    for source in &manifest.sources {
        info!(
            path = %source.path,
            layout = source.layout.as_str(),
            rows = source.row_count,
            sha256 = %source.sha256,
            "result file"
        );
    }

    if manifest.source_count == 0 {
        warn!(
            results_dir = %manifest.results_directory,
            skipped = manifest.skipped.len(),
            "no benchmark result files found"
        );
        return Ok(Outcome::NoData);
    }

    if args.dry_run {
        info!(
            source_count = manifest.source_count,
            results_dir = %manifest.results_directory,
            "inventory dry-run complete"
        );
        return Ok(Outcome::Completed);
    }

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote source inventory manifest");
    info!(source_count = manifest.source_count, "inventory completed");

    Ok(Outcome::Completed)
}

pub fn build_manifest(
    results_dir: &Path,
    excluded_dir: Option<&Path>,
) -> Result<SourceInventoryManifest> {
    let discovery = SourceResolver::new(excluded_dir)?.discover(results_dir)?;
    let sources = discovery.source_entries()?;

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: rfc3339_utc(Utc::now()),
        results_directory: results_dir.display().to_string(),
        layout: discovery.layout,
        source_count: sources.len(),
        sources,
        skipped: discovery.skipped,
    })
}
