use glam::DVec3;
use tracing::debug;
use venturi_core::{Communicator, Material, RuntimeContext};

use crate::{
    block::Block,
    cuboid::Cuboid,
    error::{ConfigurationError, GeometryError},
    grid::{Index, VoxelGrid},
    partition::Partition,
    plan::CommunicationPlan,
};

/// The material ids of the cuboids owned by one worker.
///
/// Every worker holds the full [`Partition`] but only the blocks of the
/// cuboids assigned to its rank. Ghost layers are made consistent with
/// [`SuperGeometry::communicate`].
#[derive(Debug, Clone)]
pub struct SuperGeometry {
    context: RuntimeContext,
    partition: Partition,
    overlap: usize,
    blocks: Vec<Block<Material>>,
    plan: CommunicationPlan,
}

impl SuperGeometry {
    /// Creates the geometry of `context`'s rank with every voxel marked
    /// [`Material::EXTERIOR`].
    ///
    /// # Errors
    ///
    /// Returns an error if the partition was balanced for a different number of
    /// workers or the overlap is zero.
    pub fn new(
        partition: Partition,
        context: RuntimeContext,
        overlap: usize,
    ) -> Result<Self, ConfigurationError> {
        if partition.workers() != context.workers() {
            return Err(ConfigurationError::WorkerMismatch {
                partition: partition.workers(),
                runtime: context.workers(),
            });
        }
        let layers = i64::try_from(overlap)
            .ok()
            .filter(|&layers| layers >= 1)
            .ok_or(ConfigurationError::Overlap)?;

        let blocks: Vec<_> = partition
            .assignment()
            .owned_by(context.rank())
            .map(|id| Block::new(id, partition.cuboids()[id].region(), layers, Material::EXTERIOR))
            .collect();
        let plan = CommunicationPlan::new(&partition, context.rank(), layers);

        debug!(
            rank = context.rank(),
            blocks = blocks.len(),
            peers = plan.sends().len(),
            "created super geometry"
        );

        Ok(Self {
            context,
            partition,
            overlap,
            blocks,
            plan,
        })
    }

    #[must_use]
    pub fn context(&self) -> &RuntimeContext {
        &self.context
    }

    #[must_use]
    pub fn partition(&self) -> &Partition {
        &self.partition
    }

    #[must_use]
    pub fn grid(&self) -> &VoxelGrid {
        self.partition.grid()
    }

    #[must_use]
    pub fn cuboids(&self) -> &[Cuboid] {
        self.partition.cuboids()
    }

    /// Depth of the ghost layer in voxels.
    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    #[must_use]
    pub fn plan(&self) -> &CommunicationPlan {
        &self.plan
    }

    /// Blocks owned by this worker, sorted by cuboid id.
    #[must_use]
    pub fn blocks(&self) -> &[Block<Material>] {
        &self.blocks
    }

    pub(crate) fn blocks_mut(&mut self) -> &mut [Block<Material>] {
        &mut self.blocks
    }

    /// Physical position of a voxel center.
    #[must_use]
    pub fn position(&self, index: Index) -> DVec3 {
        self.grid().position(index)
    }

    /// Material at `index` if it lies in an owned interior.
    #[must_use]
    pub fn material(&self, index: Index) -> Option<Material> {
        self.blocks
            .iter()
            .find(|block| block.interior().contains(index))
            .and_then(|block| block.get(index))
    }

    /// Every owned voxel as `(cuboid, index, material)`.
    pub fn voxels(&self) -> impl Iterator<Item = (usize, Index, Material)> + '_ {
        self.blocks.iter().flat_map(|block| {
            block
                .interior_values()
                .map(move |(index, material)| (block.cuboid(), index, material))
        })
    }

    /// Number of owned voxels carrying `material`.
    #[must_use]
    pub fn local_count(&self, material: Material) -> u64 {
        self.voxels().filter(|&(_, _, m)| m == material).count() as u64
    }

    /// Refreshes the ghost layers from the owning workers.
    ///
    /// This is a collective operation.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange with a peer fails.
    pub fn communicate(&mut self, comm: &Communicator) -> Result<(), GeometryError> {
        self.plan.exchange(comm, &mut self.blocks)?;
        Ok(())
    }
}
