use std::{convert::Infallible, fs, path::PathBuf};

use glam::DVec3;
use venturi_core::{
    BoundaryCondition, CellSample, Dynamics, Material, VelocityProfile,
    units::PhysicalParameters,
};
use venturi_solvers::{
    RampScheduler,
    transient::{self, Action, Status},
};

use super::*;
use crate::heatmap::duct_heatmaps;

// --- Test fixtures ---

/// A lattice with a fixed state on a 4 x 3 plane.
struct Still;

impl Lattice for Still {
    type Error = Infallible;

    fn assign_dynamics(&mut self, _: Material, _: Dynamics) -> Result<(), Infallible> {
        Ok(())
    }

    fn assign_boundary(&mut self, _: Material, _: BoundaryCondition) -> Result<(), Infallible> {
        Ok(())
    }

    fn set_velocity(&mut self, _: Material, _: &dyn VelocityProfile) -> Result<(), Infallible> {
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn advance(&mut self) -> Result<(), Infallible> {
        Ok(())
    }

    fn statistics(&self) -> Result<LatticeStatistics, Infallible> {
        Ok(LatticeStatistics {
            cells: 12,
            average_energy: 1e-4,
            average_density: 1.0,
            max_velocity: 0.02,
        })
    }

    fn samples(&self) -> Vec<CellSample> {
        vec![CellSample {
            position: DVec3::ZERO,
            material: Material::FLUID,
            cuboid: 0,
            velocity: DVec3::new(0.02, 0.0, 0.0),
            density: 1.0,
        }]
    }

    #[allow(clippy::cast_precision_loss)]
    fn plane(&self, _: Axis) -> Result<Option<Plane>, Infallible> {
        Ok(Some(Plane {
            width: 4,
            height: 3,
            values: (0..12).map(|k| Some(k as f64 * 1e-3)).collect(),
        }))
    }
}

/// dx = 0.1 m and dt = 0.1 s, so one second is ten steps.
fn converter() -> UnitConverter {
    UnitConverter::from_resolution_and_relaxation_time(
        10,
        0.8,
        PhysicalParameters::from_si(1.0, 0.1, 0.01, 1000.0),
    )
    .unwrap()
}

fn scratch(test: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("venturi-reporter-{}-{test}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn no_inflow(_: DVec3) -> DVec3 {
    DVec3::ZERO
}

// --- Tests ---

#[test]
fn reports_once_per_simulated_second() {
    let dir = scratch("cadence");
    let context = RuntimeContext::single(&dir);
    let converter = converter();
    let mut reporter = Reporter::new("duct", &context, &converter, 26);
    assert_eq!(reporter.cadence(), 10);

    let solution = transient::run(
        &mut Still,
        &RampScheduler::polynomial(20),
        &no_inflow,
        25,
        &mut reporter,
    )
    .unwrap();

    assert_eq!(solution.status, Status::Complete);
    let history = reporter.finish().unwrap();
    let steps: Vec<_> = history.iter().map(|record| record.step).collect();
    assert_eq!(steps, vec![0, 10, 20]);
    approx::assert_relative_eq!(history[1].time, 1.0, epsilon = 1e-12);
    assert_eq!(history[2].statistics.cells, 12);
}

#[test]
fn writes_geometry_fields_and_heatmaps() {
    let dir = scratch("files");
    let context = RuntimeContext::single(&dir);
    let converter = converter();
    let reporter = Reporter::new("duct", &context, &converter, 11).with_heatmaps(duct_heatmaps("duct"));

    transient::run(&mut Still, &RampScheduler::polynomial(0), &no_inflow, 10, reporter).unwrap();

    for file in [
        "duct_geometry_r0.csv",
        "duct_index.csv",
        "duct_iT0000000_r0.csv",
        "duct_iT0000010_r0.csv",
        "duct_iT0000000.png",
        "duct_outflow_iT0000010.png",
    ] {
        assert!(dir.join(file).is_file(), "missing {file}");
    }
    assert!(!dir.join("duct_iT0000005_r0.csv").exists());
}

#[test]
fn failed_write_stops_the_run() {
    let dir = scratch("failure").join("missing");
    let context = RuntimeContext::single(&dir);
    let converter = converter();
    let mut reporter = Reporter::new("duct", &context, &converter, 101);

    let solution = transient::run(
        &mut Still,
        &RampScheduler::polynomial(0),
        &no_inflow,
        100,
        &mut reporter,
    )
    .unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.steps, 0);
    assert!(matches!(reporter.finish(), Err(ReportError::Io { .. })));
}

#[test]
fn only_the_main_worker_writes_the_index() {
    let dir = scratch("index");
    let context = RuntimeContext::new(1, 2, &dir).unwrap();
    let converter = converter();
    let mut reporter = Reporter::new("duct", &context, &converter, 1);

    let action: Option<Action> = reporter.observe(&Event::Initialized { lattice: &Still });

    assert_eq!(action, None);
    assert!(dir.join("duct_geometry_r1.csv").is_file());
    assert!(!dir.join("duct_index.csv").exists());
}
