use std::path::{Path, PathBuf};

use anyhow::Result;
use prettytable::{Cell, Row, Table};
use serde::Serialize;
use tracing::info;

use super::aggregate::{SummaryRecord, SummaryReport, SummaryTable};
use crate::model::{Metric, TestType};
use crate::util::write_json_pretty;

/// Consumer of the aggregated summaries. Renderers only ever see summaries,
/// never raw result files.
pub trait ReportRenderer {
    fn name(&self) -> &'static str;

    /// Returns the files written, if any.
    fn render(&self, report: &SummaryReport, output_dir: &Path) -> Result<Vec<PathBuf>>;
}

pub fn default_renderers() -> Vec<Box<dyn ReportRenderer>> {
    vec![Box::new(ConsoleTableRenderer), Box::new(ChartDataRenderer)]
}

pub fn metric_label(metric: Metric) -> &'static str {
    match metric {
        Metric::TotalOps => "Total Ops",
        Metric::TotalTimeSec => "Total Time (s)",
        Metric::ThroughputOpsPerSec => "Throughput (ops/s)",
        Metric::MeanLatencyNs => "Mean Latency (ns)",
        Metric::P50LatencyNs => "P50 Latency (ns)",
        Metric::P95LatencyNs => "P95 Latency (ns)",
        Metric::P99LatencyNs => "P99 Latency (ns)",
        Metric::P999LatencyNs => "P99.9 Latency (ns)",
        Metric::PeakMemoryKb => "Peak Memory (KB)",
        Metric::CpuCyclesPerOp => "CPU Cycles/Op",
        Metric::InstructionsPerCycle => "IPC",
        Metric::L1CacheMissRate => "L1 Miss %",
        Metric::L2CacheMissRate => "L2 Miss %",
        Metric::L3CacheMissRate => "L3 Miss %",
        Metric::MemoryBandwidthGbPerSec => "Memory BW",
        Metric::BranchMispredictionRate => "Branch Miss %",
    }
}

pub fn format_cell(metric: Metric, value: Option<f64>) -> String {
    let Some(value) = value else {
        return "N/A".to_string();
    };

    match metric {
        Metric::CpuCyclesPerOp => format!("{value:.1}"),
        Metric::InstructionsPerCycle => format!("{value:.3}"),
        Metric::L1CacheMissRate | Metric::L2CacheMissRate | Metric::L3CacheMissRate => {
            format!("{value:.2}%")
        }
        Metric::BranchMispredictionRate => format!("{value:.3}%"),
        Metric::MemoryBandwidthGbPerSec => format!("{value:.1} GB/s"),
        Metric::TotalTimeSec => format!("{value:.3}"),
        _ => format!("{value:.0}"),
    }
}

pub struct ConsoleTableRenderer;

impl ConsoleTableRenderer {
    pub fn build_table(summary: &SummaryTable) -> Table {
        Self::table_of(summary, summary.records.iter())
    }

    /// Only the rows of one test type, labelled in that test type's colour.
    pub fn build_table_for(summary: &SummaryTable, test_type: TestType) -> Table {
        Self::table_of(summary, summary.records_for(test_type))
    }

    fn table_of<'a>(
        summary: &SummaryTable,
        records: impl Iterator<Item = &'a SummaryRecord>,
    ) -> Table {
        let mut table = Table::new();

        let mut titles = vec![
            Cell::new("Config").style_spec("b"),
            Cell::new("Test Type").style_spec("b"),
        ];
        titles.extend(
            summary
                .metrics
                .iter()
                .map(|metric| Cell::new(metric_label(*metric)).style_spec("b")),
        );
        table.set_titles(Row::new(titles));

        for record in records {
            let test_type = Cell::new(record.test_type.as_str())
                .style_spec(test_type_style(record.test_type));
            let mut cells = vec![Cell::new(&record.config), test_type];
            cells.extend(
                summary
                    .metrics
                    .iter()
                    .map(|metric| Cell::new(&format_cell(*metric, record.get(*metric)))),
            );
            table.add_row(Row::new(cells));
        }

        table
    }
}

fn test_type_style(test_type: TestType) -> &'static str {
    match test_type {
        TestType::Latency => "Fc",
        TestType::Throughput => "Fm",
    }
}

impl ReportRenderer for ConsoleTableRenderer {
    fn name(&self) -> &'static str {
        "console-table"
    }

    fn render(&self, report: &SummaryReport, _output_dir: &Path) -> Result<Vec<PathBuf>> {
        println!("Benchmark Performance Summary");
        Self::build_table(&report.performance).printstd();

        if let Some(hardware) = &report.hardware {
            println!();
            println!("Hardware Performance Metrics Summary");
            for test_type in [TestType::Latency, TestType::Throughput] {
                if hardware.records_for(test_type).next().is_none() {
                    continue;
                }
                println!("{test_type} test");
                Self::build_table_for(hardware, test_type).printstd();
            }
        }

        Ok(Vec::new())
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScatterPoint {
    pub config: String,
    pub mean_latency_ns: f64,
    pub throughput_ops_per_sec: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Bar {
    pub config: String,
    pub value: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ScatterChart {
    pub kind: &'static str,
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<ScatterPoint>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BarChart {
    pub kind: &'static str,
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub metric: String,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GroupedBarChart {
    pub kind: &'static str,
    pub title: String,
    pub test_type: TestType,
    pub panels: Vec<BarChart>,
}

/// Hardware panels, one per metric, in display order.
const HARDWARE_PANELS: [(Metric, &str, &str); 4] = [
    (Metric::CpuCyclesPerOp, "CPU Cycles per Operation", "Cycles/Operation"),
    (Metric::InstructionsPerCycle, "Instructions per Cycle (IPC)", "Instructions/Cycle"),
    (Metric::MemoryBandwidthGbPerSec, "Memory Bandwidth Utilization", "Bandwidth (GB/s)"),
    (Metric::BranchMispredictionRate, "Branch Misprediction Rate", "Misprediction Rate (%)"),
];

/// Writes plot-ready JSON series for an external plotting tool.
pub struct ChartDataRenderer;

impl ChartDataRenderer {
    /// Configs with a latency mean from the latency test and a throughput
    /// mean from the throughput test.
    pub fn throughput_vs_latency(performance: &SummaryTable) -> ScatterChart {
        let points = performance
            .records_for(TestType::Latency)
            .filter_map(|latency| {
                let mean_latency_ns = latency.get(Metric::MeanLatencyNs)?;
                let throughput_ops_per_sec = performance
                    .records_for(TestType::Throughput)
                    .find(|throughput| throughput.config == latency.config)?
                    .get(Metric::ThroughputOpsPerSec)?;
                Some(ScatterPoint {
                    config: latency.config.clone(),
                    mean_latency_ns,
                    throughput_ops_per_sec,
                })
            })
            .collect();

        ScatterChart {
            kind: "scatter",
            title: "Latency vs Throughput Trade-off",
            x_label: "Mean Latency (ns) - from Latency Test",
            y_label: "Sustained Throughput (ops/sec) - from Throughput Test",
            points,
        }
    }

    pub fn bar_chart(
        summary: &SummaryTable,
        test_type: TestType,
        metric: Metric,
        title: &str,
        y_label: &'static str,
    ) -> BarChart {
        BarChart {
            kind: "bar",
            title: title.to_string(),
            x_label: "Configuration",
            y_label,
            metric: metric.column().to_string(),
            bars: bars_for(summary.records_for(test_type), metric),
        }
    }

    pub fn hardware_chart(hardware: &SummaryTable, test_type: TestType) -> GroupedBarChart {
        let test_name = match test_type {
            TestType::Latency => "Latency Test",
            TestType::Throughput => "Throughput Test",
        };

        let panels = HARDWARE_PANELS
            .into_iter()
            .filter(|(metric, _, _)| hardware.metrics.contains(metric))
            .map(|(metric, title, y_label)| {
                Self::bar_chart(hardware, test_type, metric, title, y_label)
            })
            .filter(|panel| !panel.bars.is_empty())
            .collect();

        GroupedBarChart {
            kind: "grouped_bar",
            title: format!("Hardware Performance Metrics - {test_name}"),
            test_type,
            panels,
        }
    }
}

fn bars_for<'a>(records: impl Iterator<Item = &'a SummaryRecord>, metric: Metric) -> Vec<Bar> {
    records
        .filter_map(|record| {
            record.get(metric).map(|value| Bar {
                config: record.config.clone(),
                value,
            })
        })
        .collect()
}

impl ReportRenderer for ChartDataRenderer {
    fn name(&self) -> &'static str {
        "chart-data"
    }

    fn render(&self, report: &SummaryReport, output_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();

        let scatter = Self::throughput_vs_latency(&report.performance);
        if !scatter.points.is_empty() {
            let path = output_dir.join("throughput_vs_latency.json");
            write_json_pretty(&path, &scatter)?;
            written.push(path);
        }

        let latency = Self::bar_chart(
            &report.performance,
            TestType::Latency,
            Metric::MeanLatencyNs,
            "Mean Latency by Configuration",
            "Mean Latency (ns)",
        );
        if !latency.bars.is_empty() {
            let path = output_dir.join("latency_bar_plot.json");
            write_json_pretty(&path, &latency)?;
            written.push(path);
        }

        let throughput = Self::bar_chart(
            &report.performance,
            TestType::Throughput,
            Metric::ThroughputOpsPerSec,
            "Sustained Throughput by Configuration",
            "Throughput (ops/sec)",
        );
        if !throughput.bars.is_empty() {
            let path = output_dir.join("throughput_bar_plot.json");
            write_json_pretty(&path, &throughput)?;
            written.push(path);
        }

        if let Some(hardware) = &report.hardware {
            for test_type in [TestType::Latency, TestType::Throughput] {
                let chart = Self::hardware_chart(hardware, test_type);
                if chart.panels.is_empty() {
                    continue;
                }
                let path = output_dir.join(format!("{test_type}_test_hardware_metrics.json"));
                write_json_pretty(&path, &chart)?;
                written.push(path);
            }
        } else {
            info!("no hardware metrics available for charts");
        }

        Ok(written)
    }
}
