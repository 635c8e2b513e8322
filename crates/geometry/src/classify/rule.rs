use std::fmt;

use venturi_core::{Communicator, Material};

use super::{Voxel, transform};
use crate::{error::GeometryError, indicator::Indicator, super_geometry::SuperGeometry};

/// A constraint on the surroundings of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Neighbourhood {
    /// No constraint.
    Any,

    /// Every voxel within `radius` (per axis) carries the rule's source material.
    Interior { radius: [usize; 3] },

    /// At least one voxel within `radius` on every axis carries `material`.
    Adjacent { material: Material, radius: usize },
}

impl Neighbourhood {
    /// The largest reach along any axis.
    #[must_use]
    pub fn radius(&self) -> usize {
        match self {
            Self::Any => 0,
            Self::Interior { radius } => radius.iter().copied().max().unwrap_or(0),
            Self::Adjacent { radius, .. } => *radius,
        }
    }

    fn admits(&self, voxel: &Voxel<'_>, from: Material) -> bool {
        match *self {
            Self::Any => true,
            Self::Interior { radius } => voxel.neighbours(radius).all(|m| m == from),
            Self::Adjacent { material, radius } => {
                voxel.neighbours([radius; 3]).any(|m| m == material)
            }
        }
    }
}

/// Changes `from` to `to` for voxels that satisfy a region and a
/// neighbourhood constraint.
#[derive(Clone, Copy)]
pub struct RenameRule<'a> {
    from: Material,
    to: Material,
    region: Option<&'a dyn Indicator>,
    neighbourhood: Neighbourhood,
}

impl<'a> RenameRule<'a> {
    /// A rule that renames every `from` voxel.
    #[must_use]
    pub fn new(from: Material, to: Material) -> Self {
        Self {
            from,
            to,
            region: None,
            neighbourhood: Neighbourhood::Any,
        }
    }

    /// Restricts the rule to voxels whose center lies inside `indicator`.
    #[must_use]
    pub fn inside(mut self, indicator: &'a dyn Indicator) -> Self {
        self.region = Some(indicator);
        self
    }

    /// Restricts the rule to voxels surrounded by `from` up to `radius`.
    #[must_use]
    pub fn interior(mut self, radius: [usize; 3]) -> Self {
        self.neighbourhood = Neighbourhood::Interior { radius };
        self
    }

    /// Restricts the rule to voxels with a `material` neighbour within `radius`.
    #[must_use]
    pub fn adjacent_to(mut self, material: Material, radius: usize) -> Self {
        self.neighbourhood = Neighbourhood::Adjacent { material, radius };
        self
    }

    #[must_use]
    pub fn from(&self) -> Material {
        self.from
    }

    #[must_use]
    pub fn to(&self) -> Material {
        self.to
    }

    #[must_use]
    pub fn neighbourhood(&self) -> Neighbourhood {
        self.neighbourhood
    }

    fn matches(&self, voxel: &Voxel<'_>) -> bool {
        voxel.material == self.from
            && self
                .region
                .is_none_or(|region| region.contains(voxel.position))
            && self.neighbourhood.admits(voxel, self.from)
    }
}

impl fmt::Debug for RenameRule<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenameRule")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("restricted", &self.region.is_some())
            .field("neighbourhood", &self.neighbourhood)
            .finish()
    }
}

/// Applies one rename rule to every owned voxel.
///
/// All voxels are tested against the state from before the rule, so a voxel
/// renamed by this rule never influences another voxel in the same pass.
/// Returns the number of renamed voxels on all workers.
///
/// This is a collective operation.
///
/// # Errors
///
/// Returns an error if the rule's neighbourhood reaches beyond the ghost
/// layer or an exchange with a peer fails.
pub fn rename(
    geometry: &mut SuperGeometry,
    rule: &RenameRule<'_>,
    comm: &Communicator,
) -> Result<u64, GeometryError> {
    let radius = rule.neighbourhood.radius();
    if radius > geometry.overlap() {
        return Err(GeometryError::RadiusExceedsOverlap {
            radius,
            overlap: geometry.overlap(),
        });
    }

    transform(geometry, comm, |voxel| {
        if rule.matches(voxel) {
            rule.to
        } else {
            voxel.material
        }
    })
}

#[cfg(test)]
mod tests {
    use glam::DVec3;
    use venturi_core::{Communicator, RuntimeContext};

    use super::*;
    use crate::{
        balancer::BlockBalance,
        indicator::{AxisAlignedBox, Sphere},
        partition::{PartitionSettings, partition},
    };

    // --- Test fixtures ---

    /// A 5x5x5 cube of wall voxels on one worker.
    fn walled_cube(comm: &Communicator) -> (AxisAlignedBox, SuperGeometry) {
        let cube = AxisAlignedBox::new(DVec3::ZERO, DVec3::splat(0.4));
        let partition = partition(&cube, &PartitionSettings::new(0.1, 1), &BlockBalance).unwrap();
        let mut geometry = SuperGeometry::new(partition, RuntimeContext::single("out"), 1).unwrap();
        let rule = RenameRule::new(Material::EXTERIOR, Material::WALL).inside(&cube);
        assert_eq!(rename(&mut geometry, &rule, comm).unwrap(), 125);
        (cube, geometry)
    }

    #[test]
    fn interior_rule_keeps_a_one_voxel_shell() {
        let comm = Communicator::solo();
        let (_, mut geometry) = walled_cube(&comm);

        let rule = RenameRule::new(Material::WALL, Material::FLUID).interior([1, 1, 1]);
        let renamed = rename(&mut geometry, &rule, &comm).unwrap();

        assert_eq!(renamed, 27);
        assert_eq!(geometry.material([2, 2, 2]), Some(Material::FLUID));
        assert_eq!(geometry.material([0, 2, 2]), Some(Material::WALL));
    }

    #[test]
    fn interior_rule_reads_the_state_before_the_pass() {
        let comm = Communicator::solo();
        let (_, mut geometry) = walled_cube(&comm);

        // Only the center of the fluid core is surrounded by fluid.
        let first = RenameRule::new(Material::WALL, Material::FLUID).interior([1, 1, 1]);
        rename(&mut geometry, &first, &comm).unwrap();
        let second = RenameRule::new(Material::FLUID, Material::INFLOW).interior([1, 1, 1]);

        assert_eq!(rename(&mut geometry, &second, &comm).unwrap(), 1);
        assert_eq!(geometry.material([2, 2, 2]), Some(Material::INFLOW));
        assert_eq!(geometry.material([1, 2, 2]), Some(Material::FLUID));
    }

    #[test]
    fn adjacency_and_region_constraints() {
        let comm = Communicator::solo();
        let (_, mut geometry) = walled_cube(&comm);
        let interior = RenameRule::new(Material::WALL, Material::FLUID).interior([1, 1, 1]);
        rename(&mut geometry, &interior, &comm).unwrap();

        let corner = Sphere::new(DVec3::ZERO, 0.25);
        let missing = RenameRule::new(Material::WALL, Material::OUTFLOW_0)
            .inside(&corner)
            .adjacent_to(Material::INFLOW, 1);
        assert_eq!(rename(&mut geometry, &missing, &comm).unwrap(), 0);

        let rule = RenameRule::new(Material::WALL, Material::OUTFLOW_0)
            .inside(&corner)
            .adjacent_to(Material::FLUID, 1);
        let renamed = rename(&mut geometry, &rule, &comm).unwrap();

        // Shell voxels with i*i + j*j + k*k <= 6.25, all of which touch the core.
        assert_eq!(renamed, 16);
        assert_eq!(geometry.material([0, 0, 0]), Some(Material::OUTFLOW_0));
        assert_eq!(geometry.material([2, 1, 0]), Some(Material::OUTFLOW_0));
        assert_eq!(geometry.material([2, 2, 0]), Some(Material::WALL));
    }

    #[test]
    fn debug_output_hides_the_indicator() {
        let sphere = Sphere::new(DVec3::ZERO, 1.0);
        let rule = RenameRule::new(Material::WALL, Material::INFLOW).inside(&sphere);
        let debug = format!("{rule:?}");
        assert!(debug.contains("restricted: true"));
    }
}
