//! Continuous shapes that decide whether a point belongs to the domain.

mod cone;
mod cuboid;
mod cylinder;
mod sphere;
mod union;

use glam::DVec3;

pub use cone::Cone;
pub use cuboid::AxisAlignedBox;
pub use cylinder::Cylinder;
pub use sphere::Sphere;
pub use union::Union;

/// Absolute tolerance applied to shape surfaces.
///
/// Voxel centers that land on a surface up to rounding are treated as inside.
pub(crate) const SURFACE_TOLERANCE: f64 = 1e-9;

/// A region of space with a bounding box.
pub trait Indicator {
    /// Returns `true` if `point` lies inside the region or on its surface.
    fn contains(&self, point: DVec3) -> bool;

    /// Returns an axis-aligned box that encloses the region.
    fn bounds(&self) -> Bounds;
}

impl<T: Indicator + ?Sized> Indicator for &T {
    fn contains(&self, point: DVec3) -> bool {
        (**self).contains(point)
    }

    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }
}

impl<T: Indicator + ?Sized> Indicator for Box<T> {
    fn contains(&self, point: DVec3) -> bool {
        (**self).contains(point)
    }

    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec3,
    pub max: DVec3,
}

impl Bounds {
    /// The bounds of a region that contains nothing.
    pub const EMPTY: Self = Self {
        min: DVec3::INFINITY,
        max: DVec3::NEG_INFINITY,
    };

    /// Creates bounds spanning two corners given in any order.
    #[must_use]
    pub fn new(a: DVec3, b: DVec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Returns `true` if the bounds are finite and enclose at least one point.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min.cmple(self.max).all()
    }

    /// Returns the smallest bounds enclosing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    #[must_use]
    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn center(&self) -> DVec3 {
        0.5 * (self.min + self.max)
    }

    #[must_use]
    pub fn contains(&self, point: DVec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bounds_are_invalid_and_absorbed_by_union() {
        assert!(!Bounds::EMPTY.is_valid());

        let unit = Bounds::new(DVec3::ONE, DVec3::ZERO);
        assert_eq!(unit.min, DVec3::ZERO);
        assert_eq!(Bounds::EMPTY.union(&unit), unit);
        assert!(unit.is_valid());
        assert!(unit.contains(DVec3::splat(0.5)));
        assert!(!unit.contains(DVec3::new(0.5, 1.5, 0.5)));
    }
}
