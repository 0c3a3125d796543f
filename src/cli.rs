use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "lob-bench-analyzer",
    version,
    about = "Normalize, clean and summarize order-book benchmark results"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full pipeline and export summaries.
    Analyze(AnalyzeArgs),
    /// List and hash the result files the analyzer would read.
    Inventory(InventoryArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Benchmark results root directory.
    pub results_dir: PathBuf,

    #[arg(long, default_value = "visualizations")]
    pub output_dir: PathBuf,

    /// Cells whose absolute value exceeds this are treated as corrupt.
    #[arg(long, default_value_t = 1e10)]
    pub magnitude_limit: f64,

    /// Factor applied to cache-miss and branch-misprediction rates.
    #[arg(long, default_value_t = 100.0)]
    pub rate_scale: f64,

    #[arg(long, default_value_t = false)]
    pub no_render: bool,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    /// Benchmark results root directory.
    pub results_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}
