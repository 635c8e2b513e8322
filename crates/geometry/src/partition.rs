use tracing::{debug, info};

use crate::{
    balancer::{LoadBalancingStrategy, RankAssignment},
    cuboid::{Cuboid, CuboidGeometry},
    error::ConfigurationError,
    grid::VoxelGrid,
    indicator::Indicator,
};

/// Settings that control how an indicator is split across workers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PartitionSettings {
    /// Physical edge length of a voxel.
    pub spacing: f64,

    /// Number of workers that will share the domain.
    pub workers: usize,

    /// Target number of cuboids per worker.
    pub cuboids_per_worker: usize,

    /// Cost factor applied to every voxel when weighting cuboids.
    pub resolution_factor: u64,
}

impl PartitionSettings {
    /// Creates settings with one cuboid per worker and unit voxel cost.
    #[must_use]
    pub fn new(spacing: f64, workers: usize) -> Self {
        Self {
            spacing,
            workers,
            cuboids_per_worker: 1,
            resolution_factor: 1,
        }
    }

    #[must_use]
    pub fn with_cuboids_per_worker(mut self, cuboids_per_worker: usize) -> Self {
        self.cuboids_per_worker = cuboids_per_worker;
        self
    }

    #[must_use]
    pub fn with_resolution_factor(mut self, resolution_factor: u64) -> Self {
        self.resolution_factor = resolution_factor;
        self
    }

    fn validate(&self) -> Result<usize, ConfigurationError> {
        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ConfigurationError::InvalidSpacing(self.spacing));
        }
        if self.workers == 0 {
            return Err(ConfigurationError::NoWorkers);
        }
        if self.cuboids_per_worker == 0 {
            return Err(ConfigurationError::CuboidsPerWorker);
        }
        if self.resolution_factor == 0 {
            return Err(ConfigurationError::ResolutionFactor);
        }
        self.workers
            .checked_mul(self.cuboids_per_worker)
            .ok_or(ConfigurationError::CuboidsPerWorker)
    }
}

/// Cuboids of a discretized indicator together with their owners.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    geometry: CuboidGeometry,
    assignment: RankAssignment,
}

impl Partition {
    #[must_use]
    pub fn grid(&self) -> &VoxelGrid {
        self.geometry.grid()
    }

    #[must_use]
    pub fn cuboid_geometry(&self) -> &CuboidGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn cuboids(&self) -> &[Cuboid] {
        self.geometry.cuboids()
    }

    #[must_use]
    pub fn assignment(&self) -> &RankAssignment {
        &self.assignment
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.assignment.workers()
    }
}

/// Discretizes `indicator` and distributes its cuboids over the workers.
///
/// The result is a pure function of its inputs, so every worker can compute it
/// independently.
///
/// # Errors
///
/// Returns a [`ConfigurationError`] if the settings are invalid, the indicator
/// has no voxels at the given spacing, or there are more workers than
/// non-empty cuboids.
pub fn partition(
    indicator: &dyn Indicator,
    settings: &PartitionSettings,
    strategy: &dyn LoadBalancingStrategy,
) -> Result<Partition, ConfigurationError> {
    let parts = settings.validate()?;

    let geometry = CuboidGeometry::new(
        indicator,
        settings.spacing,
        parts,
        settings.resolution_factor,
    )?;

    if settings.workers > geometry.len() {
        return Err(ConfigurationError::TooManyWorkers {
            workers: settings.workers,
            cuboids: geometry.len(),
        });
    }

    let assignment = strategy.assign(geometry.cuboids(), settings.workers)?;
    let loads = assignment.loads(geometry.cuboids());

    info!(
        cuboids = geometry.len(),
        workers = settings.workers,
        balancer = strategy.name(),
        "partitioned geometry"
    );
    debug!(?loads, extent = ?geometry.grid().extent(), "partition loads");

    Ok(Partition {
        geometry,
        assignment,
    })
}
