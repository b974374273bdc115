//! bess-plan entry point: CLI wiring, configuration and export.

use std::process;

use clap::Parser;
use tracing::{error, info};

use bess_plan::cli::Args;
use bess_plan::config::PlanConfig;
use bess_plan::error::{PlanError, Result};
use bess_plan::extract::Plan;
use bess_plan::io::export_all;
use bess_plan::params::IntensityTable;
use bess_plan::planner::run_plan;
use bess_plan::solver::MicrolpBackend;
use bess_plan::telemetry::init_tracing;

/// Seed used when neither an intensity file nor a seed is given.
const DEFAULT_SYNTHETIC_SEED: u64 = 42;

fn main() {
    let args = Args::parse();
    init_tracing(args.log_format);

    match run(&args) {
        Ok(plan) => println!("{plan}"),
        Err(e) => {
            error!(error = %e, "planning failed");
            eprintln!("error: {e}");
            let code = if matches!(e, PlanError::Solver(_)) { 2 } else { 1 };
            process::exit(code);
        }
    }
}

fn run(args: &Args) -> Result<Plan> {
    let config = load_config(args)?;
    let mut errors = config.validate().into_iter();
    if let Some(first) = errors.next() {
        for e in errors {
            eprintln!("{e}");
        }
        return Err(first.into());
    }

    let intensity = match (&args.intensity, args.synthetic_intensity) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading intensity table");
            IntensityTable::from_csv_path(path)?
        }
        (None, seed) => {
            let seed = seed.unwrap_or(DEFAULT_SYNTHETIC_SEED);
            info!(seed, "using synthetic intensity table");
            IntensityTable::synthetic(seed)
        }
    };

    let params = config.to_parameters(intensity)?;
    info!(
        baseline_cost = params.baseline_cost(),
        daily_usage_kwh = params.usage.daily_total(),
        "parameters derived"
    );

    let plan = run_plan(&MicrolpBackend, &params, config.time_limit())?;
    let files = export_all(&plan, &args.out_dir, args.json)?;
    info!(
        costs = %files.costs.display(),
        ghg = %files.ghg.display(),
        schedule = %files.schedule.display(),
        "outputs written"
    );
    Ok(plan)
}

fn load_config(args: &Args) -> Result<PlanConfig> {
    let config = match (&args.config, &args.preset) {
        (Some(path), _) => {
            info!(path = %path.display(), "loading config");
            PlanConfig::from_toml_file(path)?
        }
        (None, Some(name)) => {
            info!(preset = %name, "loading preset");
            PlanConfig::from_preset(name)?
        }
        (None, None) => PlanConfig::default(),
    };
    Ok(config)
}
