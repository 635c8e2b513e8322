//! Distributed start-up of a flow through a venturi duct.
//!
//! A run goes through four phases on every worker:
//!
//! 1. **Geometry**: the duct is discretized, split into cuboids, balanced
//!    across workers and classified into fluid, wall and openings.
//! 2. **Lattice**: every material receives its dynamics or boundary
//!    condition and the lattice is initialized.
//! 3. **Loop**: the inflow is ramped up while the lattice advances.
//! 4. **Results**: geometry, fields, heatmaps and statistics are reported.
//!
//! [`check`] runs the first phase only; [`run`] runs all of them.

pub mod config;
mod simulation;

pub use config::Config;
pub use simulation::{
    CheckReport, PreparedGeometry, RunError, RunReport, check, prepare_geometry, run,
};
