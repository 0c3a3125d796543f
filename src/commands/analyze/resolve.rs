use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::model::{Layout, Provenance, SkippedSource, SourceEntry};
use crate::util::{file_name_string, sha256_file};

pub const CONFIG_COLUMN: &str = "config";
pub const TEST_TYPE_COLUMN: &str = "test_type";
pub const LEGACY_SUMMARY_SUFFIX: &str = "_summary.csv";

/// Text rows of one result file, exactly as read.
#[derive(Debug, Clone)]
pub struct SourceTable {
    pub path: PathBuf,
    pub layout: Layout,
    pub provenance: Provenance,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Default)]
pub struct Discovery {
    pub layout: Option<Layout>,
    pub tables: Vec<SourceTable>,
    pub skipped: Vec<SkippedSource>,
}

impl Discovery {
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.tables.iter().map(|table| table.rows.len()).sum()
    }

    pub fn source_entries(&self) -> Result<Vec<SourceEntry>> {
        self.tables
            .iter()
            .map(|table| {
                Ok(SourceEntry {
                    path: table.path.display().to_string(),
                    layout: table.layout,
                    provenance: table.provenance.clone(),
                    row_count: table.rows.len(),
                    sha256: sha256_file(&table.path)?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
struct SourceCandidate {
    path: PathBuf,
    provenance: Provenance,
}

pub struct SourceResolver {
    flat_pattern: Regex,
    excluded_dir: Option<PathBuf>,
}

impl SourceResolver {
    /// `excluded_dir` is never scanned by the legacy layout; pass the output
    /// directory so earlier summaries are not read back as input.
    pub fn new(excluded_dir: Option<&Path>) -> Result<Self> {
        let flat_pattern = Regex::new(r"^([^_]+)_([^_]+)_(.+)\.csv$")
            .context("failed to compile result filename regex")?;

        Ok(Self {
            flat_pattern,
            excluded_dir: excluded_dir.and_then(|dir| fs::canonicalize(dir).ok()),
        })
    }

    /// Tries the flat layout, then the legacy one. The first layout that
    /// yields at least one readable table wins; an empty result means no data.
    pub fn discover(&self, root: &Path) -> Result<Discovery> {
        let mut skipped = Vec::new();

        for layout in [Layout::Flat, Layout::Legacy] {
            let candidates = match layout {
                Layout::Flat => self.flat_candidates(root)?,
                Layout::Legacy => self.legacy_candidates(root, &mut skipped)?,
            };
            info!(
                layout = layout.as_str(),
                files = candidates.len(),
                root = %root.display(),
                "scanned results directory"
            );

            let mut tables = Vec::with_capacity(candidates.len());
            for candidate in candidates {
                debug!(path = %candidate.path.display(), "loading result file");
                match load_source_table(&candidate.path, layout, candidate.provenance) {
                    Ok(table) => tables.push(table),
                    Err(err) => {
                        warn!(
                            path = %candidate.path.display(),
                            error = %format!("{err:#}"),
                            "skipping unreadable result file"
                        );
                        skipped.push(SkippedSource {
                            path: candidate.path.display().to_string(),
                            reason: format!("{err:#}"),
                        });
                    }
                }
            }

            if !tables.is_empty() {
                info!(
                    layout = layout.as_str(),
                    loaded = tables.len(),
                    skipped = skipped.len(),
                    "discovered result files"
                );
                return Ok(Discovery {
                    layout: Some(layout),
                    tables,
                    skipped,
                });
            }
        }

        Ok(Discovery {
            layout: None,
            tables: Vec::new(),
            skipped,
        })
    }

    fn flat_candidates(&self, root: &Path) -> Result<Vec<SourceCandidate>> {
        let mut candidates = Vec::new();

        for path in sorted_entries(root)? {
            if !path.is_file() {
                continue;
            }
            let Ok(filename) = file_name_string(&path) else {
                continue;
            };
            if let Some(provenance) = self.parse_flat_filename(&filename) {
                candidates.push(SourceCandidate { path, provenance });
            }
        }

        Ok(candidates)
    }

    fn legacy_candidates(
        &self,
        root: &Path,
        skipped: &mut Vec<SkippedSource>,
    ) -> Result<Vec<SourceCandidate>> {
        let mut candidates = Vec::new();

        for dir in sorted_entries(root)? {
            if !dir.is_dir() || self.is_excluded(&dir) {
                continue;
            }
            let Ok(dir_name) = file_name_string(&dir) else {
                continue;
            };

            let entries = match sorted_entries(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(
                        path = %dir.display(),
                        error = %format!("{err:#}"),
                        "skipping unreadable results subdirectory"
                    );
                    skipped.push(SkippedSource {
                        path: dir.display().to_string(),
                        reason: format!("{err:#}"),
                    });
                    continue;
                }
            };

            for path in entries {
                if !path.is_file() {
                    continue;
                }
                let Ok(filename) = file_name_string(&path) else {
                    continue;
                };
                if !filename.ends_with(LEGACY_SUMMARY_SUFFIX) {
                    continue;
                }
                candidates.push(SourceCandidate {
                    path,
                    provenance: Provenance {
                        source_file: filename,
                        source_dir: Some(dir_name.clone()),
                        ..Provenance::default()
                    },
                });
            }
        }

        Ok(candidates)
    }

    /// `<config>_<events>_<datafile>.csv`; the data file keeps any further
    /// underscores.
    pub fn parse_flat_filename(&self, filename: &str) -> Option<Provenance> {
        let captures = self.flat_pattern.captures(filename)?;
        Some(Provenance {
            source_file: filename.to_string(),
            source_dir: None,
            config: Some(captures.get(1)?.as_str().to_string()),
            events_count: Some(captures.get(2)?.as_str().to_string()),
            data_file: Some(captures.get(3)?.as_str().to_string()),
        })
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        match (&self.excluded_dir, fs::canonicalize(dir)) {
            (Some(excluded), Ok(candidate)) => *excluded == candidate,
            _ => false,
        }
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries =
        fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        paths.push(entry.path());
    }
    paths.sort();

    Ok(paths)
}

pub fn load_source_table(
    path: &Path,
    layout: Layout,
    provenance: Provenance,
) -> Result<SourceTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let columns: Vec<String> = reader
        .headers()
        .with_context(|| format!("failed to read header row of {}", path.display()))?
        .iter()
        .map(ToOwned::to_owned)
        .collect();

    if columns.iter().all(|column| column.is_empty()) {
        bail!("no header row in {}", path.display());
    }
    if let Some(duplicate) = columns
        .iter()
        .enumerate()
        .find(|(index, column)| columns[..*index].contains(*column))
        .map(|(_, column)| column)
    {
        bail!("duplicate column `{duplicate}` in {}", path.display());
    }

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record =
            record.with_context(|| format!("malformed row {} in {}", index + 1, path.display()))?;
        if record.len() > columns.len() {
            bail!(
                "row {} in {} has {} fields, header has {}",
                index + 1,
                path.display(),
                record.len(),
                columns.len()
            );
        }
        rows.push(record.iter().map(ToOwned::to_owned).collect());
    }

    Ok(SourceTable {
        path: path.to_path_buf(),
        layout,
        provenance,
        columns,
        rows,
    })
}
