use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestType {
    Latency,
    Throughput,
}

impl TestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latency => "latency",
            Self::Throughput => "throughput",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "latency" => Some(Self::Latency),
            "throughput" => Some(Self::Throughput),
            _ => None,
        }
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recognized metric columns, in the order the harness writes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    TotalOps,
    TotalTimeSec,
    ThroughputOpsPerSec,
    MeanLatencyNs,
    P50LatencyNs,
    P95LatencyNs,
    P99LatencyNs,
    P999LatencyNs,
    PeakMemoryKb,
    CpuCyclesPerOp,
    InstructionsPerCycle,
    L1CacheMissRate,
    L2CacheMissRate,
    L3CacheMissRate,
    MemoryBandwidthGbPerSec,
    BranchMispredictionRate,
}

impl Metric {
    pub const COUNT: usize = 16;

    pub const ALL: [Metric; Self::COUNT] = [
        Self::TotalOps,
        Self::TotalTimeSec,
        Self::ThroughputOpsPerSec,
        Self::MeanLatencyNs,
        Self::P50LatencyNs,
        Self::P95LatencyNs,
        Self::P99LatencyNs,
        Self::P999LatencyNs,
        Self::PeakMemoryKb,
        Self::CpuCyclesPerOp,
        Self::InstructionsPerCycle,
        Self::L1CacheMissRate,
        Self::L2CacheMissRate,
        Self::L3CacheMissRate,
        Self::MemoryBandwidthGbPerSec,
        Self::BranchMispredictionRate,
    ];

    pub const LATENCY: [Metric; 5] = [
        Self::MeanLatencyNs,
        Self::P50LatencyNs,
        Self::P95LatencyNs,
        Self::P99LatencyNs,
        Self::P999LatencyNs,
    ];

    pub const HARDWARE: [Metric; 7] = [
        Self::CpuCyclesPerOp,
        Self::InstructionsPerCycle,
        Self::L1CacheMissRate,
        Self::L2CacheMissRate,
        Self::L3CacheMissRate,
        Self::MemoryBandwidthGbPerSec,
        Self::BranchMispredictionRate,
    ];

    /// Columns reported as a fraction of one by the harness.
    pub const RATES: [Metric; 4] = [
        Self::L1CacheMissRate,
        Self::L2CacheMissRate,
        Self::L3CacheMissRate,
        Self::BranchMispredictionRate,
    ];

    /// Always present in the performance summary, in this order.
    pub const PERFORMANCE_SUMMARY: [Metric; 4] = [
        Self::TotalOps,
        Self::ThroughputOpsPerSec,
        Self::MeanLatencyNs,
        Self::P99LatencyNs,
    ];

    pub fn column(self) -> &'static str {
        match self {
            Self::TotalOps => "total_ops",
            Self::TotalTimeSec => "total_time_sec",
            Self::ThroughputOpsPerSec => "throughput_ops_per_sec",
            Self::MeanLatencyNs => "mean_latency_ns",
            Self::P50LatencyNs => "p50_latency_ns",
            Self::P95LatencyNs => "p95_latency_ns",
            Self::P99LatencyNs => "p99_latency_ns",
            Self::P999LatencyNs => "p99_9_latency_ns",
            Self::PeakMemoryKb => "peak_memory_kb",
            Self::CpuCyclesPerOp => "cpu_cycles_per_op",
            Self::InstructionsPerCycle => "instructions_per_cycle",
            Self::L1CacheMissRate => "l1_cache_miss_rate",
            Self::L2CacheMissRate => "l2_cache_miss_rate",
            Self::L3CacheMissRate => "l3_cache_miss_rate",
            Self::MemoryBandwidthGbPerSec => "memory_bandwidth_gb_per_sec",
            Self::BranchMispredictionRate => "branch_misprediction_rate",
        }
    }

    pub fn from_column(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL.into_iter().find(|metric| metric.column() == name)
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// One cell per recognized metric; `None` is the missing marker.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricRow<T> {
    cells: [Option<T>; Metric::COUNT],
}

impl<T> Default for MetricRow<T> {
    fn default() -> Self {
        Self {
            cells: std::array::from_fn(|_| None),
        }
    }
}

impl<T> MetricRow<T> {
    pub fn get(&self, metric: Metric) -> Option<&T> {
        self.cells[metric.index()].as_ref()
    }

    pub fn set(&mut self, metric: Metric, value: Option<T>) {
        self.cells[metric.index()] = value;
    }

    pub fn take(&mut self, metric: Metric) -> Option<T> {
        self.cells[metric.index()].take()
    }
}

impl MetricRow<f64> {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.get(metric).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layout {
    /// `<config>_<events>_<datafile>.csv` directly under the results root.
    Flat,
    /// `<subdir>/*_summary.csv`.
    Legacy,
}

impl Layout {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "flat",
            Self::Legacy => "legacy",
        }
    }
}

/// Where a row came from. Flat-layout files carry the file-name metadata,
/// legacy files only their directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub source_file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_count: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    pub layout: Layout,
    pub provenance: Provenance,
    pub row_count: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedSource {
    pub path: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    pub results_directory: String,
    pub layout: Option<Layout>,
    pub source_count: usize,
    pub sources: Vec<SourceEntry>,
    pub skipped: Vec<SkippedSource>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningCounts {
    pub unparsable_cells: usize,
    pub non_finite_cells: usize,
    pub out_of_range_cells: usize,
    pub throughput_latency_zeros: usize,
    pub latency_throughput_zeros: usize,
    pub rescaled_rate_cells: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisCounts {
    pub source_count: usize,
    pub skipped_source_count: usize,
    pub raw_rows: usize,
    pub normalized_rows: usize,
    pub skipped_rows: usize,
    pub cleaned_rows: usize,
    pub performance_groups: usize,
    pub hardware_groups: usize,
    pub cleaning: CleaningCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisPolicy {
    pub magnitude_limit: f64,
    pub rate_scale: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub results_directory: String,
    pub output_directory: String,
    pub layout: Option<Layout>,
    pub policy: AnalysisPolicy,
    pub schema: Vec<String>,
    pub counts: AnalysisCounts,
    pub sources: Vec<SourceEntry>,
    pub skipped: Vec<SkippedSource>,
    pub artifacts: Vec<String>,
    pub warnings: Vec<String>,
}
