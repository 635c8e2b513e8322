use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use super::ConfigArgs;

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of workers, overriding the configuration
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Output directory, overriding the configuration
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: &RunArgs) -> Result<()> {
    let config = args.config.load()?;
    let workers = args.workers.unwrap_or(config.parallel.workers);
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| config.application.output_dir.clone());

    info!(
        name = %config.application.name,
        workers,
        output = %output.display(),
        "starting simulation"
    );
    let started = Instant::now();

    let report = venturi::run(&config, workers, &output).context("simulation failed")?;

    info!(
        steps = report.solution.steps,
        status = ?report.solution.status,
        reports = report.records.len(),
        elapsed = ?started.elapsed(),
        "simulation finished"
    );
    Ok(())
}
