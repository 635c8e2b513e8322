use glam::DVec3;

use super::{Bounds, Indicator, SURFACE_TOLERANCE};

/// A solid ball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: DVec3,
    radius: f64,
}

impl Sphere {
    #[must_use]
    pub fn new(center: DVec3, radius: f64) -> Self {
        Self { center, radius }
    }
}

impl Indicator for Sphere {
    fn contains(&self, point: DVec3) -> bool {
        point.distance(self.center) <= self.radius + SURFACE_TOLERANCE
    }

    fn bounds(&self) -> Bounds {
        Bounds::new(
            self.center - DVec3::splat(self.radius),
            self.center + DVec3::splat(self.radius),
        )
    }
}
