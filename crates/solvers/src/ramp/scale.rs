use std::f64::consts::PI;

/// A start-up profile rising from zero to a maximum over a number of steps.
pub trait StartScale {
    /// Number of steps until the maximum is reached.
    fn steps(&self) -> usize;

    /// The scale at `step`, constant at the maximum from [`StartScale::steps`] on.
    fn scale(&self, step: usize) -> f64;
}

impl<T: StartScale + ?Sized> StartScale for &T {
    fn steps(&self) -> usize {
        (**self).steps()
    }

    fn scale(&self, step: usize) -> f64 {
        (**self).scale(step)
    }
}

impl<T: StartScale + ?Sized> StartScale for Box<T> {
    fn steps(&self) -> usize {
        (**self).steps()
    }

    fn scale(&self, step: usize) -> f64 {
        (**self).scale(step)
    }
}

/// Position of `step` within a ramp of `steps`, or `None` once the ramp is over.
#[allow(clippy::cast_precision_loss)]
fn progress(step: usize, steps: usize) -> Option<f64> {
    (step < steps).then(|| step as f64 / steps as f64)
}

/// Cubic smoothstep, `max * (3s² - 2s³)`.
///
/// Both ends of the ramp have zero slope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolynomialStartScale {
    steps: usize,
    max: f64,
}

impl PolynomialStartScale {
    #[must_use]
    pub fn new(steps: usize, max: f64) -> Self {
        Self { steps, max }
    }
}

impl StartScale for PolynomialStartScale {
    fn steps(&self) -> usize {
        self.steps
    }

    fn scale(&self, step: usize) -> f64 {
        match progress(step, self.steps) {
            Some(s) => self.max * s * s * (3.0 - 2.0 * s),
            None => self.max,
        }
    }
}

/// Half a sine period, `max * (sin(-π/2 + sπ) + 1) / 2`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinusStartScale {
    steps: usize,
    max: f64,
}

impl SinusStartScale {
    #[must_use]
    pub fn new(steps: usize, max: f64) -> Self {
        Self { steps, max }
    }
}

impl StartScale for SinusStartScale {
    fn steps(&self) -> usize {
        self.steps
    }

    fn scale(&self, step: usize) -> f64 {
        match progress(step, self.steps) {
            Some(s) => self.max * ((-PI / 2.0 + s * PI).sin() + 1.0) / 2.0,
            None => self.max,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn polynomial_is_monotone_from_zero_to_max() {
        let scale = PolynomialStartScale::new(400, 1.0);

        assert_eq!(scale.scale(0), 0.0);
        assert_eq!(scale.scale(400), 1.0);
        assert_eq!(scale.scale(10_000), 1.0);
        assert_relative_eq!(scale.scale(100), 0.15625);

        let values: Vec<f64> = (0..=400).map(|step| scale.scale(step)).collect();
        assert!(values.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn sinus_is_symmetric_about_the_midpoint() {
        let scale = SinusStartScale::new(100, 1.0);

        assert_relative_eq!(scale.scale(0), 0.0);
        assert_relative_eq!(scale.scale(50), 0.5, epsilon = 1e-12);
        assert_relative_eq!(scale.scale(25) + scale.scale(75), 1.0, epsilon = 1e-12);
        assert_eq!(scale.scale(100), 1.0);
    }

    #[test]
    fn boxed_scales_delegate() {
        let scale: Box<dyn StartScale> = Box::new(PolynomialStartScale::new(10, 2.0));
        assert_eq!(scale.steps(), 10);
        assert_eq!(scale.scale(10), 2.0);
    }
}
