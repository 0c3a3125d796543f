use anyhow::{Result, bail};
use tracing::info;

use super::normalize::NormalizedTable;
use crate::model::{CleaningCounts, Metric, MetricRow, TestType};

pub const DEFAULT_MAGNITUDE_LIMIT: f64 = 1e10;
pub const DEFAULT_RATE_SCALE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CleaningPolicy {
    /// Values with a larger magnitude are counter overflow or corruption.
    pub magnitude_limit: f64,
    /// Fraction-of-one to percentage.
    pub rate_scale: f64,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        Self {
            magnitude_limit: DEFAULT_MAGNITUDE_LIMIT,
            rate_scale: DEFAULT_RATE_SCALE,
        }
    }
}

impl CleaningPolicy {
    pub fn new(magnitude_limit: f64, rate_scale: f64) -> Result<Self> {
        if !magnitude_limit.is_finite() || magnitude_limit <= 0.0 {
            bail!("magnitude limit must be a positive finite number, got {magnitude_limit}");
        }
        if !rate_scale.is_finite() || rate_scale == 0.0 {
            bail!("rate scale must be a non-zero finite number, got {rate_scale}");
        }

        Ok(Self {
            magnitude_limit,
            rate_scale,
        })
    }
}

/// The harness writes a placeholder zero for metrics a test type does not
/// measure.
struct ZeroSuppression {
    test_type: TestType,
    metrics: &'static [Metric],
}

const ZERO_SUPPRESSION_RULES: [ZeroSuppression; 2] = [
    ZeroSuppression {
        test_type: TestType::Throughput,
        metrics: &Metric::LATENCY,
    },
    ZeroSuppression {
        test_type: TestType::Latency,
        metrics: &[Metric::ThroughputOpsPerSec],
    },
];

#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub config: String,
    pub test_type: TestType,
    pub metrics: MetricRow<f64>,
}

#[derive(Debug, Clone, Default)]
pub struct CleanedTable {
    pub schema: Vec<Metric>,
    pub records: Vec<CleanedRecord>,
    pub counts: CleaningCounts,
}

impl CleanedTable {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_metric(&self, metric: Metric) -> bool {
        self.schema.contains(&metric)
    }

    /// Present in the schema and non-missing in at least one record.
    pub fn has_values(&self, metric: Metric) -> bool {
        self.has_metric(metric)
            && self
                .records
                .iter()
                .any(|record| record.metrics.value(metric).is_some())
    }
}

enum Coerced {
    Value(f64),
    Unparsable,
    NonFinite,
    OutOfRange,
}

fn coerce(text: &str, magnitude_limit: f64) -> Coerced {
    match text.trim().parse::<f64>() {
        Err(_) => Coerced::Unparsable,
        Ok(value) if !value.is_finite() => Coerced::NonFinite,
        Ok(value) if value.abs() > magnitude_limit => Coerced::OutOfRange,
        Ok(value) => Coerced::Value(value),
    }
}

/// Builds the cleaned table from normalized rows. Rates are rescaled here and
/// nowhere else, so a cleaned table is never rescaled twice.
pub fn clean(table: &NormalizedTable, policy: &CleaningPolicy) -> CleanedTable {
    let mut counts = CleaningCounts::default();
    let mut records = Vec::with_capacity(table.records.len());

    for record in &table.records {
        let mut metrics = MetricRow::default();

        for &metric in &table.schema {
            let Some(text) = record.cells.get(metric) else {
                continue;
            };
            let value = match coerce(text, policy.magnitude_limit) {
                Coerced::Value(value) => Some(value),
                Coerced::Unparsable => {
                    counts.unparsable_cells += 1;
                    None
                }
                Coerced::NonFinite => {
                    counts.non_finite_cells += 1;
                    None
                }
                Coerced::OutOfRange => {
                    counts.out_of_range_cells += 1;
                    None
                }
            };
            metrics.set(metric, value);
        }

        for rule in &ZERO_SUPPRESSION_RULES {
            if rule.test_type != record.test_type {
                continue;
            }
            for &metric in rule.metrics {
                if metrics.value(metric) == Some(0.0) {
                    metrics.set(metric, None);
                    match rule.test_type {
                        TestType::Throughput => counts.throughput_latency_zeros += 1,
                        TestType::Latency => counts.latency_throughput_zeros += 1,
                    }
                }
            }
        }

        for metric in Metric::RATES {
            if let Some(value) = metrics.take(metric) {
                metrics.set(metric, Some(value * policy.rate_scale));
                counts.rescaled_rate_cells += 1;
            }
        }

        records.push(CleanedRecord {
            config: record.config.clone(),
            test_type: record.test_type,
            metrics,
        });
    }

    info!(
        records = records.len(),
        unparsable = counts.unparsable_cells,
        non_finite = counts.non_finite_cells,
        out_of_range = counts.out_of_range_cells,
        throughput_latency_zeros = counts.throughput_latency_zeros,
        latency_throughput_zeros = counts.latency_throughput_zeros,
        rescaled_rates = counts.rescaled_rate_cells,
        "cleaned result rows"
    );

    CleanedTable {
        schema: table.schema.clone(),
        records,
        counts,
    }
}
