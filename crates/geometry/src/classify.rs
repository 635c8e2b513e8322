//! Boundary classification of a voxelized duct.
//!
//! Classification is a sequence of passes over the owned voxels. Each pass
//! reads the state from before the pass (including ghost layers) and writes
//! a new state, so the result does not depend on visiting order or on how the
//! domain is partitioned. Ghost layers are refreshed after every pass.

mod check;
mod clean;
mod rule;

use glam::DVec3;
use tracing::{debug, info};
use venturi_core::{Communicator, Material};

pub use check::check_for_errors;
pub use clean::{clean, inner_clean};
pub use rule::{Neighbourhood, RenameRule, rename};

use crate::{
    block::Block, error::GeometryError, grid::Index, indicator::Indicator, region::Region,
    super_geometry::SuperGeometry,
};

/// Voxel counts changed by each stage of [`classify`], summed over all workers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    pub renamed: Vec<u64>,
    pub cleaned: u64,
    pub inner_cleaned: u64,
}

/// The rename sequence of a duct with one inflow and two outflows.
///
/// 1. Voxels inside `duct` become [`Material::WALL`].
/// 2. Wall voxels whose full 3x3x3 neighbourhood is wall become
///    [`Material::FLUID`], leaving a one-voxel shell.
/// 3. Shell voxels inside `inflow` that touch fluid become [`Material::INFLOW`].
/// 4. Likewise for `outflow0` and [`Material::OUTFLOW_0`].
/// 5. Likewise for `outflow1` and [`Material::OUTFLOW_1`].
#[must_use]
pub fn duct_rules<'a>(
    duct: &'a dyn Indicator,
    inflow: &'a dyn Indicator,
    outflow0: &'a dyn Indicator,
    outflow1: &'a dyn Indicator,
) -> Vec<RenameRule<'a>> {
    let opening = |indicator: &'a dyn Indicator, material: Material| {
        RenameRule::new(Material::WALL, material)
            .inside(indicator)
            .adjacent_to(Material::FLUID, 1)
    };

    vec![
        RenameRule::new(Material::EXTERIOR, Material::WALL).inside(duct),
        RenameRule::new(Material::WALL, Material::FLUID).interior([1, 1, 1]),
        opening(inflow, Material::INFLOW),
        opening(outflow0, Material::OUTFLOW_0),
        opening(outflow1, Material::OUTFLOW_1),
    ]
}

/// Applies `rules` in order, cleans superfluous boundary voxels, validates
/// the result, and leaves the ghost layers consistent.
///
/// This is a collective operation.
///
/// # Errors
///
/// Returns an error if a rule reaches beyond the ghost layer, the classified
/// geometry is inconsistent, or an exchange with a peer fails.
pub fn classify(
    geometry: &mut SuperGeometry,
    rules: &[RenameRule<'_>],
    comm: &Communicator,
) -> Result<Classification, GeometryError> {
    let mut classification = Classification::default();

    for rule in rules {
        let renamed = rename(geometry, rule, comm)?;
        debug!(from = %rule.from(), to = %rule.to(), renamed, "applied rename rule");
        classification.renamed.push(renamed);
    }

    classification.cleaned = clean(geometry, comm)?;
    classification.inner_cleaned = inner_clean(geometry, comm)?;
    if comm.is_main() {
        info!(
            cleaned = classification.cleaned,
            inner_cleaned = classification.inner_cleaned,
            "cleaned boundary voxels"
        );
    }

    check_for_errors(geometry, comm)?;
    geometry.communicate(comm)?;

    Ok(classification)
}

/// An owned voxel as seen during a pass.
pub(crate) struct Voxel<'b> {
    block: &'b Block<Material>,
    pub(crate) index: Index,
    pub(crate) material: Material,
    pub(crate) position: DVec3,
}

impl Voxel<'_> {
    /// Materials within `radius` voxels per axis, excluding the voxel itself.
    ///
    /// Neighbours beyond the ghost layer read as [`Material::EXTERIOR`].
    pub(crate) fn neighbours(&self, radius: [usize; 3]) -> impl Iterator<Item = Material> + '_ {
        let [i, j, k] = self.index;
        #[allow(clippy::cast_possible_wrap)]
        let [rx, ry, rz] = radius.map(|r| r as i64);
        Region::new([i - rx, j - ry, k - rz], [i + rx + 1, j + ry + 1, k + rz + 1])
            .iter()
            .filter(move |&neighbour| neighbour != self.index)
            .map(move |neighbour| self.material_at(neighbour))
    }

    /// Material at `index`, reading [`Material::EXTERIOR`] beyond the ghost layer.
    pub(crate) fn material_at(&self, index: Index) -> Material {
        self.block.get(index).unwrap_or(Material::EXTERIOR)
    }

    /// The 26 surrounding voxels.
    pub(crate) fn surroundings(&self) -> impl Iterator<Item = Material> + '_ {
        self.neighbours([1, 1, 1])
    }
}

/// Calls `visit` on every owned voxel of `geometry`.
pub(crate) fn for_each_voxel(geometry: &SuperGeometry, mut visit: impl FnMut(&Voxel<'_>)) {
    let grid = geometry.grid();
    for block in geometry.blocks() {
        for (index, material) in block.interior_values() {
            visit(&Voxel {
                block,
                index,
                material,
                position: grid.position(index),
            });
        }
    }
}

/// Rewrites every owned voxel with `rewrite` and refreshes the ghost layers.
///
/// `rewrite` sees the state from before the pass. Returns the number of
/// voxels changed on all workers.
pub(crate) fn transform(
    geometry: &mut SuperGeometry,
    comm: &Communicator,
    rewrite: impl Fn(&Voxel<'_>) -> Material,
) -> Result<u64, GeometryError> {
    let grid = *geometry.grid();
    let mut changed = 0_u64;

    for block in geometry.blocks_mut() {
        let snapshot = block.clone();
        for (index, material) in snapshot.interior_values() {
            let voxel = Voxel {
                block: &snapshot,
                index,
                material,
                position: grid.position(index),
            };
            let next = rewrite(&voxel);
            if next != material {
                block.set(index, next);
                changed += 1;
            }
        }
    }

    geometry.communicate(comm)?;
    Ok(comm.all_gather(vec![changed])?.into_iter().flatten().sum())
}
