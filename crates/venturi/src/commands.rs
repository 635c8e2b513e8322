pub mod check;
pub mod ramp;
pub mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use venturi::Config;

/// Arguments shared by every command.
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration file
    #[arg(short, long, default_value = "venturi.toml")]
    pub config: PathBuf,
}

impl ConfigArgs {
    pub fn load(&self) -> Result<Config> {
        Config::load(&self.config)
            .with_context(|| format!("cannot use configuration {}", self.config.display()))
    }
}
