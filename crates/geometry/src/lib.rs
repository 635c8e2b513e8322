//! Discretization, partitioning, and classification of the duct geometry.
//!
//! The pipeline turns a continuous [`Indicator`] into a distributed voxel
//! domain:
//!
//! 1. [`partition`] samples the indicator on a [`VoxelGrid`], splits the
//!    occupied voxels into weighted [`Cuboid`]s, and assigns each cuboid to a
//!    worker with a [`LoadBalancingStrategy`].
//! 2. [`SuperGeometry`] stores the material ids of the cuboids a worker owns,
//!    with a ghost layer refreshed through a [`CommunicationPlan`].
//! 3. [`classify`] applies an ordered list of [`RenameRule`]s, cleans
//!    superfluous boundary voxels, and validates the result.
//! 4. [`GeometryStatistics`] summarizes the classified domain.

pub mod balancer;
mod block;
pub mod classify;
mod cuboid;
mod error;
mod grid;
pub mod indicator;
mod partition;
mod plan;
mod region;
mod statistics;
mod super_geometry;

pub use balancer::{BlockBalance, HeuristicBalance, LoadBalancingStrategy, RankAssignment};
pub use block::Block;
pub use classify::{Neighbourhood, RenameRule};
pub use cuboid::{Cuboid, CuboidGeometry};
pub use error::{ConfigurationError, GeometryError};
pub use grid::{Index, VoxelGrid};
pub use indicator::{Bounds, Indicator};
pub use partition::{Partition, PartitionSettings, partition};
pub use plan::{CommunicationPlan, Transfer};
pub use region::Region;
pub use statistics::{GeometryStatistics, MaterialStatistics};
pub use super_geometry::SuperGeometry;
