//! Splitting the occupied voxels of an indicator into weighted cuboids.

use tracing::debug;

use crate::{
    error::ConfigurationError,
    grid::{Index, VoxelGrid},
    indicator::Indicator,
    region::Region,
};

/// An axis-aligned block of voxels that forms the unit of work distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cuboid {
    region: Region,
    weight: u64,
}

impl Cuboid {
    #[must_use]
    pub fn new(region: Region, weight: u64) -> Self {
        Self { region, weight }
    }

    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// The estimated cost of the cuboid, used by load balancers.
    #[must_use]
    pub fn weight(&self) -> u64 {
        self.weight
    }
}

/// The cuboid decomposition of an indicator's support.
///
/// Cuboids are pairwise disjoint, tightly bounded, and together cover every
/// voxel whose center lies inside the indicator.
#[derive(Debug, Clone, PartialEq)]
pub struct CuboidGeometry {
    grid: VoxelGrid,
    cuboids: Vec<Cuboid>,
}

impl CuboidGeometry {
    /// Discretizes `indicator` and splits its support into up to `parts` cuboids.
    ///
    /// The bounding region of the support is first divided into a regular
    /// `px * py * pz` arrangement with the smallest interface area. Each part
    /// is shrunk to the voxels it actually holds and empty parts are dropped.
    /// While fewer than `parts` cuboids remain, the heaviest divisible cuboid
    /// is halved along its longest axis.
    ///
    /// Each cuboid is weighted by its occupied voxel count times
    /// `resolution_factor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spacing is invalid or no voxel center lies
    /// inside the indicator.
    pub fn new(
        indicator: &dyn Indicator,
        spacing: f64,
        parts: usize,
        resolution_factor: u64,
    ) -> Result<Self, ConfigurationError> {
        let grid = VoxelGrid::around(&indicator.bounds(), spacing)?;
        let occupancy = Occupancy::sample(&grid, indicator);
        let support = occupancy
            .shrink(grid.region())
            .ok_or(ConfigurationError::EmptySupport)?;

        let mut regions: Vec<Region> = divide(support, parts)
            .into_iter()
            .filter_map(|region| occupancy.shrink(region))
            .collect();

        while regions.len() < parts {
            let Some(heaviest) = regions
                .iter()
                .enumerate()
                .filter(|(_, region)| region.volume() > 1)
                .max_by_key(|&(i, region)| (occupancy.count(*region), std::cmp::Reverse(i)))
                .map(|(i, _)| i)
            else {
                break;
            };

            let (lower, upper) = bisect(regions.remove(heaviest));
            for half in [upper, lower].into_iter().filter_map(|half| occupancy.shrink(half)) {
                regions.insert(heaviest, half);
            }
        }

        let cuboids: Vec<Cuboid> = regions
            .into_iter()
            .map(|region| Cuboid::new(region, occupancy.count(region) * resolution_factor))
            .collect();

        debug!(
            requested = parts,
            cuboids = cuboids.len(),
            voxels = occupancy.total(),
            "divided indicator support into cuboids"
        );

        Ok(Self { grid, cuboids })
    }

    #[must_use]
    pub fn grid(&self) -> &VoxelGrid {
        &self.grid
    }

    #[must_use]
    pub fn cuboids(&self) -> &[Cuboid] {
        &self.cuboids
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cuboids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cuboids.is_empty()
    }

    /// Returns the id of the cuboid holding `index`, if any.
    #[must_use]
    pub fn cuboid_of(&self, index: Index) -> Option<usize> {
        self.cuboids
            .iter()
            .position(|cuboid| cuboid.region.contains(index))
    }

    /// Sum of all cuboid weights.
    #[must_use]
    pub fn total_weight(&self) -> u64 {
        self.cuboids.iter().map(Cuboid::weight).sum()
    }
}

/// Which voxels of a grid have their center inside an indicator.
struct Occupancy<'g> {
    grid: &'g VoxelGrid,
    cells: Vec<bool>,
}

impl<'g> Occupancy<'g> {
    fn sample(grid: &'g VoxelGrid, indicator: &dyn Indicator) -> Self {
        let cells = grid
            .region()
            .iter()
            .map(|index| indicator.contains(grid.position(index)))
            .collect();
        Self { grid, cells }
    }

    fn is_occupied(&self, index: Index) -> bool {
        let [_, ny, nz] = self.grid.extent();
        let offset = (index[0] * ny + index[1]) * nz + index[2];
        usize::try_from(offset)
            .ok()
            .and_then(|offset| self.cells.get(offset).copied())
            .unwrap_or(false)
    }

    fn total(&self) -> usize {
        self.cells.iter().filter(|&&cell| cell).count()
    }

    fn count(&self, region: Region) -> u64 {
        region.iter().filter(|&index| self.is_occupied(index)).count() as u64
    }

    /// Tight bounding region of the occupied voxels in `region`.
    fn shrink(&self, region: Region) -> Option<Region> {
        let mut occupied = region.iter().filter(|&index| self.is_occupied(index));
        let first = occupied.next()?;
        let (lo, hi) = occupied.fold((first, first), |(mut lo, mut hi), index| {
            for axis in 0..3 {
                lo[axis] = lo[axis].min(index[axis]);
                hi[axis] = hi[axis].max(index[axis]);
            }
            (lo, hi)
        });
        Some(Region::new(lo, [hi[0] + 1, hi[1] + 1, hi[2] + 1]))
    }
}

/// Splits `region` into a regular arrangement of at most `parts` pieces.
fn divide(region: Region, parts: usize) -> Vec<Region> {
    let extent = region.extent();
    (1..=parts.max(1))
        .rev()
        .find_map(|n| best_factorization(extent, n))
        .map_or_else(|| vec![region], |factors| split(region, factors))
}

/// The `[px, py, pz]` with `px * py * pz == n` that fits `extent` with the
/// smallest total interface area.
fn best_factorization(extent: [i64; 3], n: usize) -> Option<[i64; 3]> {
    let n = i64::try_from(n).ok()?;
    let [ex, ey, ez] = extent;
    let mut best: Option<([i64; 3], i64)> = None;

    for px in (1..=n).filter(|px| n % px == 0) {
        let rest = n / px;
        for py in (1..=rest).filter(|py| rest % py == 0) {
            let pz = rest / py;
            if px > ex || py > ey || pz > ez {
                continue;
            }
            let area = (px - 1) * ey * ez + (py - 1) * ex * ez + (pz - 1) * ex * ey;
            if best.is_none_or(|(_, smallest)| area < smallest) {
                best = Some(([px, py, pz], area));
            }
        }
    }

    best.map(|(factors, _)| factors)
}

/// Cuts `region` into `factors[axis]` near-equal slabs along each axis.
fn split(region: Region, factors: [i64; 3]) -> Vec<Region> {
    let cuts: Vec<Vec<i64>> = (0..3)
        .map(|axis| {
            let lo = region.lo()[axis];
            let extent = region.extent()[axis];
            (0..=factors[axis])
                .map(|k| lo + extent * k / factors[axis])
                .collect()
        })
        .collect();

    let mut parts = Vec::new();
    for x in cuts[0].windows(2) {
        for y in cuts[1].windows(2) {
            for z in cuts[2].windows(2) {
                parts.push(Region::new([x[0], y[0], z[0]], [x[1], y[1], z[1]]));
            }
        }
    }
    parts
}

/// Halves a region along its longest axis.
fn bisect(region: Region) -> (Region, Region) {
    let axis = region.longest_axis();
    let (lo, hi) = (region.lo(), region.hi());
    let mid = lo[axis] + region.extent()[axis] / 2;

    let mut lower_hi = hi;
    lower_hi[axis] = mid;
    let mut upper_lo = lo;
    upper_lo[axis] = mid;

    (Region::new(lo, lower_hi), Region::new(upper_lo, hi))
}

#[cfg(test)]
mod tests {
    use glam::DVec3;

    use super::*;
    use crate::indicator::{AxisAlignedBox, Cylinder, Sphere};

    #[test]
    fn single_part_is_the_tight_support() {
        let cylinder = Cylinder::new(DVec3::ZERO, DVec3::new(2.0, 0.0, 0.0), 0.5);
        let geometry = CuboidGeometry::new(&cylinder, 0.1, 1, 1).unwrap();

        assert_eq!(geometry.len(), 1);
        let cuboid = geometry.cuboids()[0];
        assert_eq!(cuboid.region().extent(), [21, 11, 11]);
        assert!(cuboid.weight() < cuboid.region().volume());
    }

    #[test]
    fn box_splits_along_its_long_axis() {
        let long_box = AxisAlignedBox::new(DVec3::ZERO, DVec3::new(3.0, 0.5, 0.5));
        let geometry = CuboidGeometry::new(&long_box, 0.1, 4, 2).unwrap();

        assert_eq!(geometry.len(), 4);
        for cuboid in geometry.cuboids() {
            let extent = cuboid.region().extent();
            assert_eq!(&extent[1..], &[6, 6]);
            assert_eq!(cuboid.weight(), cuboid.region().volume() * 2);
        }
        assert_eq!(geometry.total_weight(), 31 * 6 * 6 * 2);
    }

    #[test]
    fn cuboids_tile_the_support() {
        let sphere = Sphere::new(DVec3::ZERO, 1.0);
        let geometry = CuboidGeometry::new(&sphere, 0.2, 6, 1).unwrap();

        assert_eq!(geometry.len(), 6);
        let grid = geometry.grid();
        for index in grid.region().iter() {
            let owners = geometry
                .cuboids()
                .iter()
                .filter(|cuboid| cuboid.region().contains(index))
                .count();
            if sphere.contains(grid.position(index)) {
                assert_eq!(owners, 1, "voxel {index:?} must have exactly one cuboid");
            } else {
                assert!(owners <= 1);
            }
        }
    }

    #[test]
    fn more_parts_than_voxels_stops_at_single_voxels() {
        let tiny = AxisAlignedBox::new(DVec3::ZERO, DVec3::new(0.1, 0.0, 0.0));
        let geometry = CuboidGeometry::new(&tiny, 0.1, 8, 1).unwrap();

        assert_eq!(geometry.len(), 2);
        assert!(geometry.cuboids().iter().all(|c| c.region().volume() == 1));
    }

    #[test]
    fn empty_support_is_rejected() {
        let outside = Sphere::new(DVec3::ZERO, -1.0);
        assert_eq!(
            CuboidGeometry::new(&outside, 0.1, 1, 1),
            Err(ConfigurationError::EmptySupport)
        );
    }

    #[test]
    fn factorization_minimizes_interface_area() {
        assert_eq!(best_factorization([100, 10, 10], 4), Some([4, 1, 1]));
        assert_eq!(best_factorization([20, 20, 1], 4), Some([2, 2, 1]));
        assert_eq!(best_factorization([2, 1, 1], 3), None);
        assert_eq!(divide(Region::new([0, 0, 0], [2, 1, 1]), 3).len(), 2);
    }
}
