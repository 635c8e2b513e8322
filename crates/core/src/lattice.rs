//! The interface of the flow solver.
//!
//! The lattice holds the per-voxel physical state, distributed like the
//! geometry it was built from. The orchestrator only assigns behavior per
//! material, pushes boundary values, and advances time; the numerics behind
//! [`Lattice::advance`] are the implementor's business.

use glam::DVec3;

use crate::Material;

/// Bulk dynamics assigned to a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dynamics {
    /// Regular fluid dynamics relaxing at the lattice relaxation frequency.
    Bulk,

    /// Cells that take no part in the flow.
    None,
}

/// Boundary operator assigned to a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundaryCondition {
    /// No-slip wall.
    BounceBack,

    /// Prescribed velocity, set through [`Lattice::set_velocity`].
    Velocity,

    /// Prescribed pressure, expressed as a lattice density.
    Pressure { density: f64 },
}

/// A velocity field evaluated at physical positions, in lattice units.
pub trait VelocityProfile {
    fn velocity(&self, position: DVec3) -> DVec3;
}

impl<F> VelocityProfile for F
where
    F: Fn(DVec3) -> DVec3,
{
    fn velocity(&self, position: DVec3) -> DVec3 {
        self(position)
    }
}

/// Aggregate statistics over all fluid cells of all workers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LatticeStatistics {
    /// Number of cells with bulk dynamics.
    pub cells: u64,

    /// Mean kinetic energy per cell, `|u|² / 2`, in lattice units.
    pub average_energy: f64,

    /// Mean density in lattice units.
    pub average_density: f64,

    /// Largest velocity magnitude in lattice units.
    pub max_velocity: f64,
}

/// The state of one locally owned cell, in lattice units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellSample {
    pub position: DVec3,
    pub material: Material,
    pub cuboid: usize,
    pub velocity: DVec3,
    pub density: f64,
}

/// Coordinate axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    /// Returns the axis index (0, 1, or 2).
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
            Self::Z => 2,
        }
    }
}

/// A 2D cut through the domain, stored row by row.
///
/// Cells without fluid hold `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pub width: usize,
    pub height: usize,
    pub values: Vec<Option<f64>>,
}

impl Plane {
    /// Returns the value at column `i`, row `j`.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<f64> {
        self.values.get(j * self.width + i).copied().flatten()
    }

    /// Returns the smallest and largest defined values, if any.
    #[must_use]
    pub fn range(&self) -> Option<(f64, f64)> {
        self.values.iter().flatten().fold(None, |range, &value| match range {
            None => Some((value, value)),
            Some((lo, hi)) => Some((f64::min(lo, value), f64::max(hi, value))),
        })
    }
}

/// The distributed flow state advanced by the orchestrator.
///
/// Methods documented as collective must be called by every worker in the
/// same order.
pub trait Lattice {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Assigns bulk dynamics to every cell of `material`.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment is not supported.
    fn assign_dynamics(&mut self, material: Material, dynamics: Dynamics)
    -> Result<(), Self::Error>;

    /// Assigns a boundary operator to every cell of `material`.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment is not supported.
    fn assign_boundary(
        &mut self,
        material: Material,
        boundary: BoundaryCondition,
    ) -> Result<(), Self::Error>;

    /// Sets the velocity of every cell of `material` from `profile`.
    ///
    /// # Errors
    ///
    /// Returns an error if `material` carries no velocity boundary.
    fn set_velocity(
        &mut self,
        material: Material,
        profile: &dyn VelocityProfile,
    ) -> Result<(), Self::Error>;

    /// Brings every cell to its initial equilibrium state.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Advances the state by one time step (collective).
    ///
    /// # Errors
    ///
    /// Returns an error if the step or the exchange between workers fails.
    fn advance(&mut self) -> Result<(), Self::Error>;

    /// Reduces statistics over all workers (collective).
    ///
    /// # Errors
    ///
    /// Returns an error if the reduction fails.
    fn statistics(&self) -> Result<LatticeStatistics, Self::Error>;

    /// Returns the state of the locally owned cells.
    fn samples(&self) -> Vec<CellSample>;

    /// Gathers the velocity magnitude on the mid-plane normal to `normal`
    /// (collective). Only the main worker receives `Some`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gather fails.
    fn plane(&self, normal: Axis) -> Result<Option<Plane>, Self::Error>;
}
