use tracing::{info, warn};

use super::resolve::{CONFIG_COLUMN, SourceTable, TEST_TYPE_COLUMN};
use crate::model::{Metric, MetricRow, Provenance, TestType};

const PROVENANCE_COLUMNS: [&str; 4] = ["source_file", "source_dir", "events_count", "data_file"];

/// A row keyed by configuration and test type, with one text cell per
/// recognized metric. `source` indexes [`NormalizedTable::sources`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    pub config: String,
    pub test_type: TestType,
    pub source: usize,
    pub cells: MetricRow<String>,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedTable {
    /// Union of every input header plus provenance columns, first appearance first.
    pub columns: Vec<String>,
    /// Recognized metrics present in at least one input, in canonical order.
    pub schema: Vec<Metric>,
    pub sources: Vec<Provenance>,
    pub records: Vec<NormalizedRecord>,
    pub skipped_rows: usize,
}

pub fn normalize(tables: &[SourceTable]) -> NormalizedTable {
    let mut normalized = NormalizedTable::default();
    let mut seen = [false; Metric::COUNT];

    for table in tables {
        for column in &table.columns {
            push_unique(&mut normalized.columns, column);
        }
        for column in provenance_columns(&table.provenance) {
            push_unique(&mut normalized.columns, column);
        }

        let metric_columns: Vec<(usize, Metric)> = table
            .columns
            .iter()
            .enumerate()
            .filter_map(|(index, column)| Metric::from_column(column).map(|metric| (index, metric)))
            .collect();
        for (_, metric) in &metric_columns {
            seen[metric.index()] = true;
        }

        let config_index = column_index(&table.columns, CONFIG_COLUMN);
        let test_type_index = column_index(&table.columns, TEST_TYPE_COLUMN);

        let source = normalized.sources.len();
        normalized.sources.push(table.provenance.clone());

        let mut skipped = 0_usize;
        for row in &table.rows {
            let Some(test_type) = test_type_index
                .and_then(|index| cell(row, index))
                .and_then(TestType::parse)
            else {
                skipped += 1;
                continue;
            };

            let Some(config) = config_index
                .and_then(|index| cell(row, index))
                .or(table.provenance.config.as_deref())
            else {
                skipped += 1;
                continue;
            };

            let mut cells = MetricRow::default();
            for (index, metric) in &metric_columns {
                cells.set(*metric, cell(row, *index).map(ToOwned::to_owned));
            }

            normalized.records.push(NormalizedRecord {
                config: config.to_string(),
                test_type,
                source,
                cells,
            });
        }

        if skipped > 0 {
            warn!(
                path = %table.path.display(),
                rows = skipped,
                "skipped rows without a recognizable config or test_type"
            );
        }
        normalized.skipped_rows += skipped;
    }

    normalized.schema = Metric::ALL
        .into_iter()
        .filter(|metric| seen[metric.index()])
        .collect();

    info!(
        records = normalized.records.len(),
        columns = normalized.columns.len(),
        metrics = normalized.schema.len(),
        skipped_rows = normalized.skipped_rows,
        "normalized result rows"
    );

    normalized
}

fn provenance_columns(provenance: &Provenance) -> impl Iterator<Item = &'static str> + '_ {
    PROVENANCE_COLUMNS.into_iter().filter(move |column| match *column {
        "source_file" => true,
        "source_dir" => provenance.source_dir.is_some(),
        "events_count" => provenance.events_count.is_some(),
        "data_file" => provenance.data_file.is_some(),
        _ => false,
    })
}

fn push_unique(columns: &mut Vec<String>, column: &str) {
    if !columns.iter().any(|existing| existing == column) {
        columns.push(column.to_string());
    }
}

fn column_index(columns: &[String], name: &str) -> Option<usize> {
    columns.iter().position(|column| column == name)
}

/// Empty and short-row cells are missing.
fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index)
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
}
