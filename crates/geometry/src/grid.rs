use glam::DVec3;

use crate::{error::ConfigurationError, indicator::Bounds, region::Region};

/// Integer coordinates of a voxel in the global grid.
pub type Index = [i64; 3];

/// A uniform grid of voxels covering a bounding box.
///
/// Voxel `[0, 0, 0]` is centered on the lower corner of the box, and the grid
/// extends far enough for the upper corner to be covered as well.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelGrid {
    origin: DVec3,
    spacing: f64,
    extent: [i64; 3],
}

impl VoxelGrid {
    /// Creates the grid that covers `bounds` at the given voxel spacing.
    ///
    /// # Errors
    ///
    /// Returns an error if the spacing is not finite and positive, or if the
    /// bounds do not enclose any point.
    pub fn around(bounds: &Bounds, spacing: f64) -> Result<Self, ConfigurationError> {
        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(ConfigurationError::InvalidSpacing(spacing));
        }
        if !bounds.is_valid() {
            return Err(ConfigurationError::EmptySupport);
        }

        let cells = (bounds.extent() / spacing + 1.5).floor();
        // Truncation is intended, counts are small positive integers.
        #[allow(clippy::cast_possible_truncation)]
        let extent = [cells.x as i64, cells.y as i64, cells.z as i64];

        Ok(Self {
            origin: bounds.min,
            spacing,
            extent,
        })
    }

    #[must_use]
    pub fn origin(&self) -> DVec3 {
        self.origin
    }

    #[must_use]
    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    /// Number of voxels along each axis.
    #[must_use]
    pub fn extent(&self) -> [i64; 3] {
        self.extent
    }

    /// The region holding every voxel of the grid.
    #[must_use]
    pub fn region(&self) -> Region {
        Region::new([0, 0, 0], self.extent)
    }

    #[must_use]
    pub fn contains(&self, index: Index) -> bool {
        self.region().contains(index)
    }

    /// Physical position of a voxel center.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn position(&self, index: Index) -> DVec3 {
        self.origin + self.spacing * DVec3::new(index[0] as f64, index[1] as f64, index[2] as f64)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn extent_covers_both_faces() {
        let bounds = Bounds::new(DVec3::ZERO, DVec3::new(1.0, 0.5, 0.0));
        let grid = VoxelGrid::around(&bounds, 0.1).unwrap();

        assert_eq!(grid.extent(), [11, 6, 1]);
        assert_eq!(grid.region().volume(), 66);
        assert_relative_eq!(grid.position([10, 5, 0]).x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(grid.position([10, 5, 0]).y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn rejects_bad_spacing_and_empty_bounds() {
        let bounds = Bounds::new(DVec3::ZERO, DVec3::ONE);
        assert_eq!(
            VoxelGrid::around(&bounds, 0.0),
            Err(ConfigurationError::InvalidSpacing(0.0))
        );
        assert_eq!(
            VoxelGrid::around(&Bounds::EMPTY, 0.1),
            Err(ConfigurationError::EmptySupport)
        );
    }
}
