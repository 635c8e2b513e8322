use thiserror::Error;
use venturi_core::CommError;

/// Errors detected while discretizing and partitioning the domain.
///
/// All of them are raised before any classification or lattice work begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("voxel spacing must be finite and positive, got {0}")]
    InvalidSpacing(f64),

    #[error("the indicator has empty support at the given resolution")]
    EmptySupport,

    #[error("at least one worker is required")]
    NoWorkers,

    #[error("cuboids per worker must be at least 1")]
    CuboidsPerWorker,

    #[error("resolution factor must be at least 1")]
    ResolutionFactor,

    #[error("{workers} worker(s) exceed the {cuboids} non-empty cuboid(s)")]
    TooManyWorkers { workers: usize, cuboids: usize },

    #[error("cuboid {cuboid} was assigned to rank {owner} but there are {workers} worker(s)")]
    InvalidOwner {
        cuboid: usize,
        owner: usize,
        workers: usize,
    },

    #[error("partition was balanced for {partition} worker(s) but the run has {runtime}")]
    WorkerMismatch { partition: usize, runtime: usize },

    #[error("ghost layer overlap must be at least 1")]
    Overlap,
}

/// Errors detected while classifying or exchanging the distributed geometry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error(
        "{isolated} voxel(s) have no bulk-fluid neighbour and {exposed} fluid voxel(s) touch the exterior"
    )]
    Inconsistent { isolated: u64, exposed: u64 },

    #[error("{0} voxel(s) carry an unknown material id")]
    UnknownMaterial(u64),

    #[error("the classified domain contains no bulk fluid")]
    NoFluid,

    #[error("neighbourhood radius {radius} exceeds the ghost layer overlap {overlap}")]
    RadiusExceedsOverlap { radius: usize, overlap: usize },

    #[error(transparent)]
    Comm(#[from] CommError),
}
