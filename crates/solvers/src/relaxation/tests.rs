use approx::assert_relative_eq;
use glam::DVec3;
use venturi_core::{
    Axis, BoundaryCondition, Communicator, Dynamics, Lattice, LatticeStatistics, Material, launch,
};

use super::*;
use crate::fixtures;

// --- Test fixtures ---

const OMEGA: f64 = 1.2;
const INFLOW: f64 = 0.05;

fn configure(lattice: &mut RelaxationLattice<'_>) {
    lattice.assign_dynamics(Material::EXTERIOR, Dynamics::None).unwrap();
    lattice.assign_dynamics(Material::FLUID, Dynamics::Bulk).unwrap();
    lattice
        .assign_boundary(Material::WALL, BoundaryCondition::BounceBack)
        .unwrap();
    lattice
        .assign_boundary(Material::INFLOW, BoundaryCondition::Velocity)
        .unwrap();
    for outflow in [Material::OUTFLOW_0, Material::OUTFLOW_1] {
        lattice
            .assign_boundary(outflow, BoundaryCondition::Pressure { density: 1.0 })
            .unwrap();
    }
    lattice.initialize().unwrap();
}

fn uniform_inflow(_: DVec3) -> DVec3 {
    DVec3::new(INFLOW, 0.0, 0.0)
}

fn run(comm: &Communicator, steps: usize) -> Result<LatticeStatistics, LatticeError> {
    let geometry = fixtures::duct(comm);
    let mut lattice = RelaxationLattice::new(&geometry, comm, OMEGA);
    configure(&mut lattice);
    lattice.set_velocity(Material::INFLOW, &uniform_inflow)?;
    for _ in 0..steps {
        lattice.advance()?;
    }
    lattice.statistics()
}

// --- Tests ---

#[test]
fn advancing_before_initialize_fails() {
    let comm = Communicator::solo();
    let geometry = fixtures::duct(&comm);
    let mut lattice = RelaxationLattice::new(&geometry, &comm, OMEGA);

    assert!(matches!(lattice.advance(), Err(LatticeError::Uninitialized)));
}

#[test]
fn velocity_requires_a_velocity_boundary() {
    let comm = Communicator::solo();
    let geometry = fixtures::duct(&comm);
    let mut lattice = RelaxationLattice::new(&geometry, &comm, OMEGA);
    configure(&mut lattice);

    let result = lattice.set_velocity(Material::WALL, &uniform_inflow);

    assert!(matches!(
        result,
        Err(LatticeError::NotVelocityBoundary(Material::WALL))
    ));
}

#[test]
fn fresh_lattice_is_at_rest() {
    let statistics = run(&Communicator::solo(), 0).unwrap();

    assert!(statistics.cells > 0);
    assert_relative_eq!(statistics.average_energy, 0.0);
    assert_relative_eq!(statistics.average_density, 1.0);
}

#[test]
fn inflow_spreads_into_the_bulk_and_stays_bounded() {
    let statistics = run(&Communicator::solo(), 40).unwrap();

    assert!(statistics.average_energy > 0.0);
    assert!(statistics.max_velocity > 0.0);
    assert!(statistics.max_velocity <= INFLOW + 1e-12);
    assert_relative_eq!(statistics.average_density, 1.0, epsilon = 1e-12);
}

#[test]
fn worker_count_does_not_change_the_flow() {
    let solo = run(&Communicator::solo(), 15).unwrap();
    let split = launch(2, |comm| run(comm, 15)).unwrap();

    for statistics in split {
        assert_eq!(statistics.cells, solo.cells);
        assert_relative_eq!(statistics.average_energy, solo.average_energy, epsilon = 1e-12);
        assert_relative_eq!(statistics.max_velocity, solo.max_velocity, epsilon = 1e-12);
    }
}

#[test]
fn only_the_main_worker_receives_the_plane() {
    let planes = launch(2, |comm| -> Result<_, LatticeError> {
        let geometry = fixtures::duct(comm);
        let mut lattice = RelaxationLattice::new(&geometry, comm, OMEGA);
        configure(&mut lattice);
        lattice.set_velocity(Material::INFLOW, &uniform_inflow)?;
        lattice.advance()?;
        lattice.plane(Axis::X)
    })
    .unwrap();

    assert!(planes[1].is_none());
    let plane = planes[0].as_ref().unwrap();
    assert_eq!((plane.width, plane.height), (11, 11));
    assert!(plane.get(5, 5).is_some());
    assert!(plane.get(0, 0).is_none());
}

#[test]
fn plane_leaves_walls_and_exterior_empty() {
    let comm = Communicator::solo();
    let geometry = fixtures::duct(&comm);
    let mut lattice = RelaxationLattice::new(&geometry, &comm, OMEGA);
    configure(&mut lattice);

    let plane = lattice.plane(Axis::X).unwrap().unwrap();

    let middle = geometry.grid().extent()[0] / 2;
    let mut walls = 0;
    for (i, j) in (0..11).flat_map(|i| (0..11).map(move |j| (i, j))) {
        let material = geometry.material([middle, i as i64, j as i64]);
        walls += usize::from(material == Some(Material::WALL));
        assert_eq!(
            plane.get(i, j).is_some(),
            material == Some(Material::FLUID),
            "cell ({i}, {j}) holds {material:?}"
        );
    }
    assert!(walls > 0);
}

#[test]
fn samples_cover_the_classified_voxels() {
    let comm = Communicator::solo();
    let geometry = fixtures::duct(&comm);
    let mut lattice = RelaxationLattice::new(&geometry, &comm, OMEGA);
    configure(&mut lattice);
    lattice.set_velocity(Material::INFLOW, &uniform_inflow).unwrap();

    let samples = lattice.samples();

    let classified: u64 = Material::KNOWN[1..]
        .iter()
        .map(|&material| geometry.local_count(material))
        .sum();
    assert_eq!(samples.len() as u64, classified);
    assert!(
        samples
            .iter()
            .filter(|sample| sample.material == Material::INFLOW)
            .all(|sample| sample.velocity.x == INFLOW)
    );
}
