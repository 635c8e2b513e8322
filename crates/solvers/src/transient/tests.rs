use glam::DVec3;
use venturi_core::{
    Axis, BoundaryCondition, CellSample, Dynamics, Lattice, LatticeStatistics, Material, Plane,
    VelocityProfile,
};

use super::*;
use crate::ramp::{PolynomialStartScale, RampScheduler, StartScale};

// --- Test fixtures ---

#[derive(Debug, thiserror::Error)]
#[error("advance {0} failed")]
struct AdvanceFailed(usize);

/// What the mock lattice was asked to do, in order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Call {
    Dynamics(Material, Dynamics),
    Boundary(Material, BoundaryCondition),
    Velocity(f64),
    Initialize,
    Advance,
}

/// Records calls and holds the inflow value last pushed.
#[derive(Debug, Default)]
struct Recorder {
    calls: Vec<Call>,
    inflow: Option<f64>,
    advances: usize,
    fail_at: Option<usize>,
}

impl Recorder {
    fn failing_at(advance: usize) -> Self {
        Self {
            fail_at: Some(advance),
            ..Self::default()
        }
    }

    fn pushes(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, Call::Velocity(_)))
            .count()
    }
}

impl Lattice for Recorder {
    type Error = AdvanceFailed;

    fn assign_dynamics(&mut self, material: Material, dynamics: Dynamics) -> Result<(), Self::Error> {
        self.calls.push(Call::Dynamics(material, dynamics));
        Ok(())
    }

    fn assign_boundary(
        &mut self,
        material: Material,
        boundary: BoundaryCondition,
    ) -> Result<(), Self::Error> {
        self.calls.push(Call::Boundary(material, boundary));
        Ok(())
    }

    fn set_velocity(
        &mut self,
        _material: Material,
        profile: &dyn VelocityProfile,
    ) -> Result<(), Self::Error> {
        let value = profile.velocity(DVec3::ZERO).x;
        self.inflow = Some(value);
        self.calls.push(Call::Velocity(value));
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), Self::Error> {
        self.calls.push(Call::Initialize);
        Ok(())
    }

    fn advance(&mut self) -> Result<(), Self::Error> {
        if self.fail_at == Some(self.advances) {
            return Err(AdvanceFailed(self.advances));
        }
        self.advances += 1;
        self.calls.push(Call::Advance);
        Ok(())
    }

    fn statistics(&self) -> Result<LatticeStatistics, Self::Error> {
        Ok(LatticeStatistics::default())
    }

    fn samples(&self) -> Vec<CellSample> {
        Vec::new()
    }

    fn plane(&self, _normal: Axis) -> Result<Option<Plane>, Self::Error> {
        Ok(None)
    }
}

/// A ramp whose first refresh pushes a recognizable value.
struct Sentinel;

const SENTINEL: f64 = 0.123;

impl StartScale for Sentinel {
    fn steps(&self) -> usize {
        100
    }

    #[allow(clippy::cast_precision_loss)]
    fn scale(&self, step: usize) -> f64 {
        if step == 0 { SENTINEL } else { step as f64 / 100.0 }
    }
}

fn unit_inflow(_: DVec3) -> DVec3 {
    DVec3::X
}

// --- Tests ---

#[test]
fn prepare_assigns_every_material_then_initializes() {
    let mut lattice = Recorder::default();

    prepare(&mut lattice).unwrap();

    let pressure = BoundaryCondition::Pressure {
        density: OUTFLOW_DENSITY,
    };
    assert_eq!(
        lattice.calls,
        vec![
            Call::Dynamics(Material::EXTERIOR, Dynamics::None),
            Call::Dynamics(Material::FLUID, Dynamics::Bulk),
            Call::Boundary(Material::WALL, BoundaryCondition::BounceBack),
            Call::Boundary(Material::INFLOW, BoundaryCondition::Velocity),
            Call::Boundary(Material::OUTFLOW_0, pressure),
            Call::Boundary(Material::OUTFLOW_1, pressure),
            Call::Initialize,
        ]
    );
}

#[test]
fn boundary_values_are_set_before_the_advance_that_uses_them() {
    let mut lattice = Recorder::default();
    let scheduler = RampScheduler::polynomial(100);

    let solution = run_unobserved(&mut lattice, &scheduler, &unit_inflow, 100).unwrap();

    assert_eq!(solution.status, Status::Complete);
    assert_eq!(solution.steps, 101);
    assert_eq!(lattice.calls[0], Call::Velocity(0.0));
    assert_eq!(lattice.calls[1], Call::Advance);
    assert_eq!(lattice.calls[51], Call::Velocity(0.5));
    assert_eq!(lattice.calls[52], Call::Advance);
    assert_eq!(lattice.calls.last(), Some(&Call::Advance));
    assert_eq!(lattice.pushes(), 3);
    assert_eq!(lattice.inflow, Some(1.0));
}

#[test]
fn observer_sees_the_state_after_each_advance() {
    let mut lattice = Recorder::default();
    let scheduler = RampScheduler::polynomial(10);
    let mut seen = Vec::new();

    run(&mut lattice, &scheduler, &unit_inflow, 4, |event: &Event<'_, Recorder>| {
        let advances = event.lattice().advances;
        seen.push((event.step(), advances));
        None
    })
    .unwrap();

    assert_eq!(
        seen,
        vec![
            (None, 0),
            (Some(0), 1),
            (Some(1), 2),
            (Some(2), 3),
            (Some(3), 4),
            (Some(4), 5),
            (None, 5),
        ]
    );
}

#[test]
fn sentinel_inflow_survives_until_the_next_refresh() {
    let mut lattice = Recorder::default();
    let scheduler = RampScheduler::new(Sentinel, 50);
    let mut inflow_by_step = Vec::new();

    run(&mut lattice, &scheduler, &unit_inflow, 60, |event: &Event<'_, Recorder>| {
        if let Event::Stepped { step, scaling, lattice } = event {
            inflow_by_step.push((*step, *scaling, lattice.inflow));
        }
        None
    })
    .unwrap();

    assert_eq!(inflow_by_step[0], (0, Some(SENTINEL), Some(SENTINEL)));
    for &(step, scaling, inflow) in &inflow_by_step[1..50] {
        assert!(step < 50);
        assert_eq!(scaling, None);
        assert_eq!(inflow, Some(SENTINEL), "inflow changed at step {step}");
    }
    assert_eq!(inflow_by_step[50], (50, Some(0.5), Some(0.5)));
    assert_eq!(inflow_by_step[60].2, Some(0.5));
}

#[test]
fn zero_length_ramp_pushes_full_inflow_once() {
    let mut lattice = Recorder::default();
    let scheduler = RampScheduler::new(PolynomialStartScale::new(0, 1.0), 50);

    run_unobserved(&mut lattice, &scheduler, &unit_inflow, 120).unwrap();

    assert_eq!(lattice.pushes(), 1);
    assert_eq!(lattice.inflow, Some(1.0));
}

#[test]
fn observer_can_stop_early() {
    let mut lattice = Recorder::default();
    let scheduler = RampScheduler::polynomial(100);
    let mut finished = None;

    let observer = |event: &Event<'_, Recorder>| match *event {
        Event::Stepped { step, .. } if step >= 5 => Some(Action::StopEarly),
        Event::Finished { steps, .. } => {
            finished = Some(steps);
            None
        }
        _ => None,
    };
    let solution = run(&mut lattice, &scheduler, &unit_inflow, 100, observer).unwrap();

    assert_eq!(solution.status, Status::StoppedByObserver);
    assert_eq!(solution.steps, 6);
    assert_eq!(lattice.advances, 6);
    assert_eq!(finished, Some(6));
}

#[test]
fn stopping_at_initialization_skips_every_step() {
    let mut lattice = Recorder::default();
    let scheduler = RampScheduler::polynomial(100);

    let observer = |event: &Event<'_, Recorder>| {
        matches!(event, Event::Initialized { .. }).then_some(Action::StopEarly)
    };
    let solution = run(&mut lattice, &scheduler, &unit_inflow, 100, observer).unwrap();

    assert_eq!(solution.steps, 0);
    assert!(lattice.calls.is_empty());
}

#[test]
fn lattice_failures_propagate() {
    let mut lattice = Recorder::failing_at(3);
    let scheduler = RampScheduler::polynomial(100);

    let error = run_unobserved(&mut lattice, &scheduler, &unit_inflow, 100).unwrap_err();

    assert!(matches!(error, Error::Lattice(_)));
    assert_eq!(error.to_string(), "lattice error: advance 3 failed");
    assert_eq!(lattice.advances, 3);
}
