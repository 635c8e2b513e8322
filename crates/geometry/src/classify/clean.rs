use venturi_core::{Communicator, Material};

use super::transform;
use crate::{error::GeometryError, super_geometry::SuperGeometry};

/// Resets boundary voxels that have no bulk-fluid neighbour to
/// [`Material::EXTERIOR`].
///
/// Returns the number of reset voxels on all workers. This is a collective
/// operation.
///
/// # Errors
///
/// Returns an error if an exchange with a peer fails.
pub fn clean(geometry: &mut SuperGeometry, comm: &Communicator) -> Result<u64, GeometryError> {
    transform(geometry, comm, |voxel| {
        if voxel.material.is_boundary() && !voxel.surroundings().any(|m| m == Material::FLUID) {
            Material::EXTERIOR
        } else {
            voxel.material
        }
    })
}

/// Resets wall voxels enclosed entirely by other boundary voxels to
/// [`Material::EXTERIOR`].
///
/// Returns the number of reset voxels on all workers. This is a collective
/// operation.
///
/// # Errors
///
/// Returns an error if an exchange with a peer fails.
pub fn inner_clean(
    geometry: &mut SuperGeometry,
    comm: &Communicator,
) -> Result<u64, GeometryError> {
    transform(geometry, comm, |voxel| {
        if voxel.material == Material::WALL && voxel.surroundings().all(Material::is_boundary) {
            Material::EXTERIOR
        } else {
            voxel.material
        }
    })
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use venturi_core::RuntimeContext;

    use super::*;
    use crate::{
        balancer::BlockBalance,
        classify::{RenameRule, rename},
        indicator::AxisAlignedBox,
        partition::{PartitionSettings, partition},
    };

    // --- Test fixtures ---

    fn slab(comm: &Communicator, thickness: f64) -> SuperGeometry {
        let slab = AxisAlignedBox::new(DVec3::ZERO, DVec3::new(0.6, 0.6, thickness));
        let partition = partition(&slab, &PartitionSettings::new(0.1, 1), &BlockBalance).unwrap();
        let mut geometry = SuperGeometry::new(partition, RuntimeContext::single("out"), 1).unwrap();
        let rule = RenameRule::new(Material::EXTERIOR, Material::WALL).inside(&slab);
        rename(&mut geometry, &rule, comm).unwrap();
        geometry
    }

    #[test]
    fn clean_removes_walls_without_fluid() {
        let comm = Communicator::solo();
        let mut geometry = slab(&comm, 0.2);
        let core = AxisAlignedBox::new(DVec3::new(0.25, 0.25, 0.05), DVec3::splat(0.1));
        let seed = RenameRule::new(Material::WALL, Material::FLUID).inside(&core);
        assert_eq!(rename(&mut geometry, &seed, &comm).unwrap(), 1);

        // A single fluid voxel in a 7x7x3 slab keeps only its 26 neighbours.
        let removed = clean(&mut geometry, &comm).unwrap();

        assert_eq!(removed, 147 - 27);
        assert_eq!(geometry.material([0, 0, 0]), Some(Material::EXTERIOR));
        assert_eq!(geometry.material([2, 2, 0]), Some(Material::WALL));
        assert_eq!(geometry.material([3, 3, 1]), Some(Material::FLUID));
    }

    #[test]
    fn clean_without_fluid_empties_the_domain() {
        let comm = Communicator::solo();
        let mut geometry = slab(&comm, 0.0);

        assert_eq!(clean(&mut geometry, &comm).unwrap(), 49);
        assert_eq!(geometry.local_count(Material::WALL), 0);
    }

    #[test]
    fn inner_clean_removes_enclosed_walls() {
        let comm = Communicator::solo();
        let mut geometry = slab(&comm, 0.2);

        // Every voxel is wall, so only those whose neighbours all lie inside
        // the slab are enclosed: the 5x5x1 core.
        assert_eq!(inner_clean(&mut geometry, &comm).unwrap(), 25);
        assert_eq!(geometry.material([3, 3, 1]), Some(Material::EXTERIOR));
        assert_eq!(geometry.material([0, 3, 1]), Some(Material::WALL));
    }

    #[test]
    fn inner_clean_after_clean_removes_walls_sealed_off_by_a_later_rename() {
        let comm = Communicator::solo();
        let mut geometry = slab(&comm, 0.6);
        let erode = RenameRule::new(Material::WALL, Material::FLUID).interior([1, 1, 1]);
        assert_eq!(rename(&mut geometry, &erode, &comm).unwrap(), 125);
        assert_eq!(clean(&mut geometry, &comm).unwrap(), 0);
        assert_eq!(inner_clean(&mut geometry, &comm).unwrap(), 0);

        // Walling in the 3x3x3 middle of the fluid core leaves its center
        // without fluid contact.
        let middle = AxisAlignedBox::new(DVec3::splat(0.15), DVec3::splat(0.3));
        let seal = RenameRule::new(Material::FLUID, Material::WALL).inside(&middle);
        assert_eq!(rename(&mut geometry, &seal, &comm).unwrap(), 27);

        assert_eq!(inner_clean(&mut geometry, &comm).unwrap(), 1);
        assert_eq!(geometry.material([3, 3, 3]), Some(Material::EXTERIOR));
        assert_eq!(geometry.material([2, 3, 3]), Some(Material::WALL));
        assert_eq!(geometry.material([1, 1, 1]), Some(Material::FLUID));
    }
}
