use std::collections::HashMap;

use tracing::info;

use super::clean::CleanedTable;
use crate::model::{Metric, TestType};

pub const PERFORMANCE_PRECISION: u32 = 2;
pub const HARDWARE_PRECISION: u32 = 3;

/// Welford-style running mean; avoids summing large magnitudes before dividing.
#[derive(Debug, Clone, Copy, Default)]
struct RunningMean {
    count: u64,
    mean: f64,
}

impl RunningMean {
    fn push(&mut self, value: f64) {
        self.count += 1;
        self.mean += (value - self.mean) / self.count as f64;
    }

    fn value(&self) -> Option<f64> {
        (self.count > 0).then_some(self.mean)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryRecord {
    pub config: String,
    pub test_type: TestType,
    /// Only metrics with at least one contributing value, in table column order.
    pub values: Vec<(Metric, f64)>,
}

impl SummaryRecord {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values
            .iter()
            .find(|(candidate, _)| *candidate == metric)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryTable {
    pub metrics: Vec<Metric>,
    pub precision: u32,
    pub records: Vec<SummaryRecord>,
}

impl SummaryTable {
    pub fn records_for(&self, test_type: TestType) -> impl Iterator<Item = &SummaryRecord> {
        self.records
            .iter()
            .filter(move |record| record.test_type == test_type)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryReport {
    pub performance: SummaryTable,
    /// `None` when no hardware metric has a value anywhere in the dataset.
    pub hardware: Option<SummaryTable>,
}

impl SummaryReport {
    pub fn is_empty(&self) -> bool {
        self.performance.records.is_empty()
    }
}

pub fn available_hardware_metrics(table: &CleanedTable) -> Vec<Metric> {
    Metric::HARDWARE
        .into_iter()
        .filter(|metric| table.has_values(*metric))
        .collect()
}

/// Means per (config, test_type) group, groups in order of first appearance.
pub fn summarize(table: &CleanedTable, metrics: &[Metric], precision: u32) -> SummaryTable {
    let mut index: HashMap<(&str, TestType), usize> = HashMap::new();
    let mut groups: Vec<(&str, TestType, Vec<RunningMean>)> = Vec::new();

    for record in &table.records {
        let key = (record.config.as_str(), record.test_type);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.0, key.1, vec![RunningMean::default(); metrics.len()]));
            groups.len() - 1
        });

        let accumulators = &mut groups[slot].2;
        for (accumulator, metric) in accumulators.iter_mut().zip(metrics) {
            if let Some(value) = record.metrics.value(*metric) {
                accumulator.push(value);
            }
        }
    }

    let records = groups
        .into_iter()
        .map(|(config, test_type, accumulators)| SummaryRecord {
            config: config.to_string(),
            test_type,
            values: metrics
                .iter()
                .zip(&accumulators)
                .filter_map(|(metric, accumulator)| {
                    accumulator
                        .value()
                        .map(|mean| (*metric, round_to(mean, precision)))
                })
                .collect(),
        })
        .collect();

    SummaryTable {
        metrics: metrics.to_vec(),
        precision,
        records,
    }
}

pub fn aggregate(table: &CleanedTable) -> SummaryReport {
    let hardware_metrics = available_hardware_metrics(table);

    let mut performance_metrics = Metric::PERFORMANCE_SUMMARY.to_vec();
    performance_metrics.extend(&hardware_metrics);

    let performance = summarize(table, &performance_metrics, PERFORMANCE_PRECISION);
    let hardware = (!hardware_metrics.is_empty())
        .then(|| summarize(table, &hardware_metrics, HARDWARE_PRECISION));

    info!(
        groups = performance.records.len(),
        performance_metrics = performance.metrics.len(),
        hardware_metrics = hardware_metrics.len(),
        "aggregated summaries"
    );

    SummaryReport {
        performance,
        hardware,
    }
}

/// Ties round to even, so `10.125` becomes `10.12`.
pub fn round_to(value: f64, places: u32) -> f64 {
    let factor = 10_f64.powi(places as i32);
    let rounded = (value * factor).round_ties_even() / factor;
    if rounded.is_finite() { rounded } else { value }
}
