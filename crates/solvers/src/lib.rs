//! Time stepping of the duct flow.
//!
//! - [`ramp`] decides when the inflow is refreshed and by how much it is scaled.
//! - [`PoiseuilleProfile`] shapes the inflow over the inflow opening.
//! - [`RelaxationLattice`] is a small reference implementation of the
//!   [`Lattice`](venturi_core::Lattice) collaborator.
//! - [`transient`] prepares a lattice and runs the step loop.

#[cfg(test)]
mod fixtures;
mod inflow;
pub mod ramp;
mod relaxation;
pub mod transient;

pub use inflow::PoiseuilleProfile;
pub use ramp::{PolynomialStartScale, RampScheduler, SinusStartScale, StartScale};
pub use relaxation::{LatticeError, RelaxationLattice};
