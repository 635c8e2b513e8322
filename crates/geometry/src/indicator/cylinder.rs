use glam::DVec3;

use super::{Bounds, Indicator, SURFACE_TOLERANCE};

/// A solid circular cylinder between two end-cap centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cylinder {
    start: DVec3,
    end: DVec3,
    radius: f64,
}

impl Cylinder {
    #[must_use]
    pub fn new(start: DVec3, end: DVec3, radius: f64) -> Self {
        Self { start, end, radius }
    }

    #[must_use]
    pub fn start(&self) -> DVec3 {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DVec3 {
        self.end
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Unit vector from `start` to `end`, or zero for a degenerate cylinder.
    #[must_use]
    pub fn axis(&self) -> DVec3 {
        (self.end - self.start).normalize_or_zero()
    }
}

impl Indicator for Cylinder {
    fn contains(&self, point: DVec3) -> bool {
        match axial_position(self.start, self.end, point) {
            Some((_, distance)) => distance <= self.radius + SURFACE_TOLERANCE,
            None => false,
        }
    }

    fn bounds(&self) -> Bounds {
        swept_bounds(self.start, self.end, self.radius)
    }
}

/// Locates `point` relative to the segment from `start` to `end`.
///
/// Returns the normalized axial coordinate in `[0, 1]` and the distance from
/// the axis, or `None` if the point lies beyond either end cap.
pub(super) fn axial_position(start: DVec3, end: DVec3, point: DVec3) -> Option<(f64, f64)> {
    let axis = end - start;
    let length = axis.length();
    if length <= 0.0 {
        return None;
    }

    let t = (point - start).dot(axis) / (length * length);
    let slack = SURFACE_TOLERANCE / length;
    if t < -slack || t > 1.0 + slack {
        return None;
    }

    let t = t.clamp(0.0, 1.0);
    let distance = (point - (start + axis * t)).length();
    Some((t, distance))
}

/// Bounds of a disc of `radius` swept from `start` to `end`.
pub(super) fn swept_bounds(start: DVec3, end: DVec3, radius: f64) -> Bounds {
    let axis = (end - start).normalize_or_zero();
    let reach = (DVec3::ONE - axis * axis).max(DVec3::ZERO);
    let reach = DVec3::new(reach.x.sqrt(), reach.y.sqrt(), reach.z.sqrt()) * radius;
    Bounds {
        min: start.min(end) - reach,
        max: start.max(end) + reach,
    }
}
