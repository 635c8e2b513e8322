//! Core types shared by the Venturi simulation crates.
//!
//! This crate defines the abstractions that the geometry pipeline, the
//! time-stepping orchestrator, and the result reporter build on:
//!
//! - [`Material`]: the classification stamped on every voxel
//! - [`RuntimeContext`]: rank, worker count, and output directory of a worker
//! - [`Communicator`] and [`launch`]: message passing between workers
//! - [`Lattice`]: the interface of the flow solver that advances the state
//! - [`Observer`]: receives orchestrator events and optionally returns actions
//! - [`units::UnitConverter`]: conversion between physical and lattice units

mod comm;
mod context;
mod lattice;
mod material;
mod observer;
pub mod units;

pub use comm::{CommError, Communicator, Payload, Wire, launch};
pub use context::RuntimeContext;
pub use lattice::{
    Axis, BoundaryCondition, CellSample, Dynamics, Lattice, LatticeStatistics, Plane,
    VelocityProfile,
};
pub use material::Material;
pub use observer::Observer;
