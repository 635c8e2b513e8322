use glam::DVec3;

use super::{
    Bounds, Indicator, SURFACE_TOLERANCE,
    cylinder::{axial_position, swept_bounds},
};

/// A truncated cone whose radius varies linearly between two end caps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cone {
    start: DVec3,
    end: DVec3,
    start_radius: f64,
    end_radius: f64,
}

impl Cone {
    #[must_use]
    pub fn new(start: DVec3, end: DVec3, start_radius: f64, end_radius: f64) -> Self {
        Self {
            start,
            end,
            start_radius,
            end_radius,
        }
    }

    /// Radius of the cross-section at normalized axial position `t`.
    fn radius_at(&self, t: f64) -> f64 {
        self.start_radius + (self.end_radius - self.start_radius) * t
    }
}

impl Indicator for Cone {
    fn contains(&self, point: DVec3) -> bool {
        match axial_position(self.start, self.end, point) {
            Some((t, distance)) => distance <= self.radius_at(t) + SURFACE_TOLERANCE,
            None => false,
        }
    }

    fn bounds(&self) -> Bounds {
        swept_bounds(
            self.start,
            self.end,
            self.start_radius.max(self.end_radius),
        )
    }
}
