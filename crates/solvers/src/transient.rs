//! The time-stepping loop of a duct flow run.
//!
//! [`prepare`] assigns the per-material behaviour to a lattice and brings it
//! to its initial state. [`run`] then steps it from `iT = 0` to the final step
//! inclusive. Each step performs, strictly in this order:
//!
//! 1. the inflow refresh, when the ramp scheduler says one is due,
//! 2. one lattice advance,
//! 3. an [`Event::Stepped`] for the observer, which sees the post-advance state.
//!
//! # Example
//!
//! ```ignore
//! use venturi_solvers::{RampScheduler, transient};
//!
//! transient::prepare(&mut lattice)?;
//! let solution = transient::run(&mut lattice, &RampScheduler::polynomial(800), &inflow, 1000, &mut reporter)?;
//! ```

mod action;
mod error;
mod event;
mod solution;

pub use action::Action;
pub use error::Error;
pub use event::Event;
pub use solution::{Solution, Status};

use glam::DVec3;
use tracing::{debug, debug_span};
use venturi_core::{BoundaryCondition, Dynamics, Lattice, Material, Observer, VelocityProfile};

use crate::ramp::{RampScheduler, StartScale};

/// Lattice density held by the outflow pressure boundaries.
pub const OUTFLOW_DENSITY: f64 = 1.0;

/// Assigns per-material behaviour and initializes the lattice.
///
/// | Material    | Behaviour                                   |
/// |-------------|---------------------------------------------|
/// | exterior    | no dynamics                                 |
/// | fluid       | bulk dynamics                               |
/// | wall        | bounce-back                                 |
/// | inflow      | velocity boundary                           |
/// | outflow 0/1 | pressure boundary at [`OUTFLOW_DENSITY`]    |
///
/// # Errors
///
/// Returns an error if the lattice rejects an assignment or fails to
/// initialize.
pub fn prepare<L: Lattice>(lattice: &mut L) -> Result<(), Error> {
    let _span = debug_span!("prepare_lattice").entered();

    let outflow = BoundaryCondition::Pressure {
        density: OUTFLOW_DENSITY,
    };
    let assignments = [
        (Material::WALL, BoundaryCondition::BounceBack),
        (Material::INFLOW, BoundaryCondition::Velocity),
        (Material::OUTFLOW_0, outflow),
        (Material::OUTFLOW_1, outflow),
    ];

    lattice
        .assign_dynamics(Material::EXTERIOR, Dynamics::None)
        .map_err(Error::lattice)?;
    lattice
        .assign_dynamics(Material::FLUID, Dynamics::Bulk)
        .map_err(Error::lattice)?;
    for (material, boundary) in assignments {
        lattice
            .assign_boundary(material, boundary)
            .map_err(Error::lattice)?;
    }
    lattice.initialize().map_err(Error::lattice)?;

    debug!("prepared lattice");
    Ok(())
}

/// Steps `lattice` from `iT = 0` through `steps` inclusive.
///
/// Whenever `scheduler` reports a refresh, the inflow material receives
/// `inflow` scaled by the ramp factor of that step. Between refreshes the last
/// pushed values stay in effect.
///
/// # Observer
///
/// The observer receives [`Event::Initialized`] before the first step, an
/// [`Event::Stepped`] after every advance and [`Event::Finished`] once the
/// loop ends. Returning [`Action::StopEarly`] from the first two ends the run
/// after the current step.
///
/// # Errors
///
/// Returns an error as soon as the lattice fails. Lattice failures are not
/// retried.
pub fn run<L, S, O>(
    lattice: &mut L,
    scheduler: &RampScheduler<S>,
    inflow: &dyn VelocityProfile,
    steps: usize,
    mut observer: O,
) -> Result<Solution, Error>
where
    L: Lattice,
    S: StartScale,
    O: for<'a> Observer<Event<'a, L>, Action>,
{
    let event = Event::Initialized { lattice: &*lattice };
    if let Some(Action::StopEarly) = observer.observe(&event) {
        return Ok(stop(&mut observer, lattice, 0));
    }

    for step in 0..=steps {
        let scaling = scheduler.refresh(step);
        if let Some(factor) = scaling {
            let _span = debug_span!("set_boundary_values", step, factor).entered();
            let scaled = |position: DVec3| inflow.velocity(position) * factor;
            lattice
                .set_velocity(Material::INFLOW, &scaled)
                .map_err(Error::lattice)?;
        }

        lattice.advance().map_err(Error::lattice)?;

        let event = Event::Stepped {
            step,
            scaling,
            lattice: &*lattice,
        };
        if let Some(Action::StopEarly) = observer.observe(&event) {
            return Ok(stop(&mut observer, lattice, step + 1));
        }
    }

    observer.observe(&Event::Finished {
        steps: steps + 1,
        lattice: &*lattice,
    });
    Ok(Solution {
        status: Status::Complete,
        steps: steps + 1,
    })
}

/// Reports the end of a run the observer cut short.
fn stop<L, O>(observer: &mut O, lattice: &L, steps: usize) -> Solution
where
    O: for<'a> Observer<Event<'a, L>, Action>,
{
    observer.observe(&Event::Finished { steps, lattice });
    Solution {
        status: Status::StoppedByObserver,
        steps,
    }
}

/// Runs the step loop without observation.
///
/// # Errors
///
/// Returns an error as soon as the lattice fails.
pub fn run_unobserved<L, S>(
    lattice: &mut L,
    scheduler: &RampScheduler<S>,
    inflow: &dyn VelocityProfile,
    steps: usize,
) -> Result<Solution, Error>
where
    L: Lattice,
    S: StartScale,
{
    run(lattice, scheduler, inflow, steps, ())
}

#[cfg(test)]
mod tests;
