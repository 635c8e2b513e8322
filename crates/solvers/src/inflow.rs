use glam::DVec3;
use venturi_core::VelocityProfile;
use venturi_geometry::MaterialStatistics;

/// Parabolic velocity profile over a circular opening.
///
/// The velocity points along `normal`, peaks at `max_velocity` on the axis
/// through `center`, and vanishes at `radius` and beyond.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoiseuilleProfile {
    center: DVec3,
    normal: DVec3,
    radius: f64,
    max_velocity: f64,
}

impl PoiseuilleProfile {
    /// Creates a profile; `normal` is normalized.
    #[must_use]
    pub fn new(center: DVec3, normal: DVec3, radius: f64, max_velocity: f64) -> Self {
        Self {
            center,
            normal: normal.normalize_or_zero(),
            radius,
            max_velocity,
        }
    }

    /// Fits a profile to the voxels of an opening.
    ///
    /// The profile is centered at the opening's center and oriented along its
    /// discrete normal. The radius is half the largest extent perpendicular to
    /// the normal. Returns `None` if the opening has no fluid-facing normal.
    #[must_use]
    pub fn from_statistics(opening: &MaterialStatistics, max_velocity: f64) -> Option<Self> {
        let normal = opening.normal;
        if normal == DVec3::ZERO {
            return None;
        }

        let extent = opening.extent();
        let across = (DVec3::ONE - normal * normal).max(DVec3::ZERO);
        let spans = extent * DVec3::new(across.x.sqrt(), across.y.sqrt(), across.z.sqrt());
        let radius = 0.5 * spans.max_element();

        Some(Self::new(opening.center, normal, radius, max_velocity))
    }

    /// The same profile with another peak velocity.
    #[must_use]
    pub fn with_max_velocity(self, max_velocity: f64) -> Self {
        Self {
            max_velocity,
            ..self
        }
    }

    #[must_use]
    pub fn center(&self) -> DVec3 {
        self.center
    }

    #[must_use]
    pub fn normal(&self) -> DVec3 {
        self.normal
    }

    #[must_use]
    pub fn radius(&self) -> f64 {
        self.radius
    }

    #[must_use]
    pub fn max_velocity(&self) -> f64 {
        self.max_velocity
    }
}

impl VelocityProfile for PoiseuilleProfile {
    fn velocity(&self, position: DVec3) -> DVec3 {
        if self.radius <= 0.0 {
            return DVec3::ZERO;
        }
        let offset = position - self.center;
        let radial = offset - self.normal * offset.dot(self.normal);
        let ratio = radial.length_squared() / (self.radius * self.radius);
        if ratio >= 1.0 {
            DVec3::ZERO
        } else {
            self.normal * (self.max_velocity * (1.0 - ratio))
        }
    }
}
