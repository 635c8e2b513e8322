use std::fmt;

use glam::DVec3;

use super::{Bounds, Indicator};

/// The union of several shapes.
#[derive(Default)]
pub struct Union {
    members: Vec<Box<dyn Indicator>>,
}

impl Union {
    #[must_use]
    pub fn new(members: Vec<Box<dyn Indicator>>) -> Self {
        Self { members }
    }

    /// Adds a shape to the union.
    #[must_use]
    pub fn with(mut self, member: impl Indicator + 'static) -> Self {
        self.members.push(Box::new(member));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl fmt::Debug for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Union")
            .field("members", &self.members.len())
            .finish()
    }
}

impl Indicator for Union {
    fn contains(&self, point: DVec3) -> bool {
        self.members.iter().any(|member| member.contains(point))
    }

    fn bounds(&self) -> Bounds {
        self.members
            .iter()
            .fold(Bounds::EMPTY, |bounds, member| bounds.union(&member.bounds()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicator::{Cylinder, Sphere};

    #[test]
    fn contains_points_of_any_member() {
        let union = Union::default()
            .with(Sphere::new(DVec3::ZERO, 1.0))
            .with(Cylinder::new(
                DVec3::new(2.0, 0.0, 0.0),
                DVec3::new(4.0, 0.0, 0.0),
                0.5,
            ));

        assert_eq!(union.len(), 2);
        assert!(union.contains(DVec3::new(0.5, 0.0, 0.0)));
        assert!(union.contains(DVec3::new(3.0, 0.5, 0.0)));
        assert!(!union.contains(DVec3::new(1.5, 0.0, 0.0)));

        let bounds = union.bounds();
        assert_eq!(bounds.min, DVec3::new(-1.0, -1.0, -1.0));
        assert_eq!(bounds.max, DVec3::new(4.0, 1.0, 1.0));
    }

    #[test]
    fn empty_union_has_invalid_bounds() {
        let union = Union::default();
        assert!(union.is_empty());
        assert!(!union.bounds().is_valid());
        assert!(!union.contains(DVec3::ZERO));
    }
}
