//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Monthly battery charge/discharge planner.
///
/// Builds a mixed-integer model of one representative day per month, solves it
/// for a weighted cost/GHG objective and writes the schedule.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// TOML configuration file.
    #[clap(long, env = "BESS_PLAN_CONFIG", conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset (`default`, `islanded`).
    #[clap(long)]
    pub preset: Option<String>,

    /// CSV with `Month` and `avg_GHGIntensity` columns.
    #[clap(long, env = "BESS_PLAN_INTENSITY", conflicts_with = "synthetic_intensity")]
    pub intensity: Option<PathBuf>,

    /// Generate a seeded synthetic intensity table instead of reading one.
    #[clap(long, value_name = "SEED")]
    pub synthetic_intensity: Option<u64>,

    /// Directory for `costs.csv`, `ghg.csv` and `schedule.csv`.
    #[clap(long, default_value = "out")]
    pub out_dir: PathBuf,

    /// Also write `plan.json`.
    #[clap(long)]
    pub json: bool,

    #[clap(long, value_enum, default_value_t = LogFormat::Text, env = "BESS_PLAN_LOG_FORMAT")]
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}
