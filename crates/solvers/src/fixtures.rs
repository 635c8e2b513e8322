//! Geometry shared by the lattice and step-loop tests.

use glam::DVec3;
use venturi_core::{Communicator, RuntimeContext};
use venturi_geometry::{
    BlockBalance, PartitionSettings, SuperGeometry,
    classify::{classify, duct_rules},
    indicator::Cylinder,
    partition,
};

/// A classified duct of radius 0.5 along x from 0 to 2, voxel spacing 0.1.
///
/// The inflow cap sits at x = 0 and the first outflow cap at x = 2.
pub(crate) fn duct(comm: &Communicator) -> SuperGeometry {
    let radius = 0.5;
    let cap = |x: f64| {
        Cylinder::new(
            DVec3::new(x - 0.05, 0.0, 0.0),
            DVec3::new(x + 0.05, 0.0, 0.0),
            radius,
        )
    };
    let duct = Cylinder::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), radius);
    let (inflow, outflow0, outflow1) = (cap(0.0), cap(2.0), cap(2.0));

    let settings = PartitionSettings::new(0.1, comm.size()).with_cuboids_per_worker(2);
    let partition = partition(&duct, &settings, &BlockBalance).unwrap();
    let context = RuntimeContext::for_worker(comm, "out");
    let mut geometry = SuperGeometry::new(partition, context, 1).unwrap();

    let rules = duct_rules(&duct, &inflow, &outflow0, &outflow1);
    classify(&mut geometry, &rules, comm).unwrap();
    geometry
}
