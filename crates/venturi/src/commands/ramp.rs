use anyhow::{Context, Result};
use clap::Args;

use super::ConfigArgs;

#[derive(Args)]
pub struct RampArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

/// Prints every step at which the inflow is refreshed, with its scaling factor.
pub fn execute(args: &RampArgs) -> Result<()> {
    let config = args.config.load()?;
    let converter = config.converter().context("invalid physical parameters")?;
    let scheduler = config.scheduler(&converter);

    println!("{:>10} {:>12}", "step", "scaling");
    for (step, factor) in scheduler.schedule() {
        println!("{step:>10} {factor:>12.6}");
    }
    Ok(())
}
