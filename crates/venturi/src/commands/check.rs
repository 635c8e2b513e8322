use anyhow::{Context, Result};
use clap::Args;
use tracing::info;
use venturi_core::Material;

use super::ConfigArgs;

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Number of workers, overriding the configuration
    #[arg(short, long)]
    pub workers: Option<usize>,
}

pub fn execute(args: &CheckArgs) -> Result<()> {
    let config = args.config.load()?;
    let workers = args.workers.unwrap_or(config.parallel.workers);

    let report = venturi::check(&config, workers).context("geometry check failed")?;

    info!(cuboids = report.cuboids, loads = ?report.loads, "partition");
    info!(
        renamed = ?report.classification.renamed,
        cleaned = report.classification.cleaned,
        inner_cleaned = report.classification.inner_cleaned,
        "classification"
    );
    for material in Material::KNOWN {
        if let Some(stats) = report.statistics.material(material) {
            println!("{:<10} {:>10}", material.label(), stats.voxels);
        }
    }
    Ok(())
}
