use glam::DVec3;

use super::{Bounds, Indicator, SURFACE_TOLERANCE};

/// A solid box aligned with the coordinate axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAlignedBox {
    bounds: Bounds,
}

impl AxisAlignedBox {
    /// Creates a box from its lower corner and its edge lengths.
    #[must_use]
    pub fn new(origin: DVec3, extent: DVec3) -> Self {
        Self {
            bounds: Bounds::new(origin, origin + extent),
        }
    }
}

impl Indicator for AxisAlignedBox {
    fn contains(&self, point: DVec3) -> bool {
        let slack = DVec3::splat(SURFACE_TOLERANCE);
        point.cmpge(self.bounds.min - slack).all() && point.cmple(self.bounds.max + slack).all()
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }
}
