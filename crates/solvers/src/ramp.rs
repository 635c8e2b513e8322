//! Smooth start-up of the inflow.
//!
//! The inflow velocity is scaled from zero to its full value over the first
//! part of the run. The scale is refreshed every [`BOUNDARY_PERIOD`] steps
//! while the ramp lasts; between refreshes the last pushed value stays in
//! effect.

mod scale;

pub use scale::{PolynomialStartScale, SinusStartScale, StartScale};

use uom::si::f64::Time;
use venturi_core::units::UnitConverter;

/// Number of steps between two inflow refreshes.
pub const BOUNDARY_PERIOD: usize = 50;

/// Fraction of the run spent ramping up the inflow.
pub const RAMP_FRACTION: f64 = 0.8;

/// Decides at which steps the inflow is refreshed and with which factor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampScheduler<S = PolynomialStartScale> {
    scale: S,
    period: usize,
}

impl RampScheduler {
    /// A polynomial ramp over `ramp_steps` refreshed every [`BOUNDARY_PERIOD`] steps.
    #[must_use]
    pub fn polynomial(ramp_steps: usize) -> Self {
        Self::new(PolynomialStartScale::new(ramp_steps, 1.0), BOUNDARY_PERIOD)
    }
}

impl<S: StartScale> RampScheduler<S> {
    /// Creates a scheduler; a zero `period` is treated as one.
    #[must_use]
    pub fn new(scale: S, period: usize) -> Self {
        Self {
            scale,
            period: period.max(1),
        }
    }

    #[must_use]
    pub fn scale(&self) -> &S {
        &self.scale
    }

    #[must_use]
    pub fn period(&self) -> usize {
        self.period
    }

    /// Last step of the ramp.
    #[must_use]
    pub fn ramp_steps(&self) -> usize {
        self.scale.steps()
    }

    /// Returns `true` if the inflow must be refreshed at `step`.
    #[must_use]
    pub fn is_refresh_due(&self, step: usize) -> bool {
        step % self.period == 0 && step <= self.ramp_steps()
    }

    /// The scaling factor at `step`.
    #[must_use]
    pub fn factor(&self, step: usize) -> f64 {
        self.scale.scale(step)
    }

    /// The scaling factor to push at `step`, or `None` if no refresh is due.
    #[must_use]
    pub fn refresh(&self, step: usize) -> Option<f64> {
        self.is_refresh_due(step).then(|| self.factor(step))
    }

    /// Every refresh step of the ramp paired with its factor.
    pub fn schedule(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..=self.ramp_steps())
            .step_by(self.period)
            .map(|step| (step, self.factor(step)))
    }
}

/// Number of steps in the ramp of a run lasting `max_phys_time`.
#[must_use]
pub fn ramp_steps(converter: &UnitConverter, max_phys_time: Time, fraction: f64) -> usize {
    converter.lattice_time(max_phys_time * fraction)
}
