//! Command line front end of the venturi duct simulation.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Start-up flow through a venturi duct.
#[derive(Parser)]
#[command(name = "venturi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Distributed start-up flow through a venturi duct", long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the simulation
    Run(commands::run::RunArgs),
    /// Prepare and validate the geometry without running the lattice
    Check(commands::check::CheckArgs),
    /// Print the inflow ramp schedule
    Ramp(commands::ramp::RampArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Run(args) => commands::run::execute(&args),
        Commands::Check(args) => commands::check::execute(&args),
        Commands::Ramp(args) => commands::ramp::execute(&args),
    }
}
