use crate::grid::Index;

/// A half-open box of voxel indices, `lo <= index < hi` on every axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Region {
    lo: Index,
    hi: Index,
}

impl Region {
    /// Creates a region; an upper corner below the lower one yields an empty region.
    #[must_use]
    pub fn new(lo: Index, hi: Index) -> Self {
        Self {
            lo,
            hi: [hi[0].max(lo[0]), hi[1].max(lo[1]), hi[2].max(lo[2])],
        }
    }

    #[must_use]
    pub fn lo(&self) -> Index {
        self.lo
    }

    #[must_use]
    pub fn hi(&self) -> Index {
        self.hi
    }

    /// Number of voxels along each axis.
    #[must_use]
    pub fn extent(&self) -> [i64; 3] {
        [
            self.hi[0] - self.lo[0],
            self.hi[1] - self.lo[1],
            self.hi[2] - self.lo[2],
        ]
    }

    /// Number of voxels in the region.
    #[must_use]
    pub fn volume(&self) -> u64 {
        self.extent()
            .iter()
            .map(|&n| u64::try_from(n).unwrap_or(0))
            .product()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    #[must_use]
    pub fn contains(&self, index: Index) -> bool {
        (0..3).all(|axis| self.lo[axis] <= index[axis] && index[axis] < self.hi[axis])
    }

    /// Returns the shared voxels of two regions, or `None` if they are disjoint.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let region = Self::new(
            [
                self.lo[0].max(other.lo[0]),
                self.lo[1].max(other.lo[1]),
                self.lo[2].max(other.lo[2]),
            ],
            [
                self.hi[0].min(other.hi[0]),
                self.hi[1].min(other.hi[1]),
                self.hi[2].min(other.hi[2]),
            ],
        );
        (!region.is_empty()).then_some(region)
    }

    /// Returns the region widened by `layers` voxels on every side.
    #[must_use]
    pub fn grow(&self, layers: i64) -> Self {
        Self::new(
            [self.lo[0] - layers, self.lo[1] - layers, self.lo[2] - layers],
            [self.hi[0] + layers, self.hi[1] + layers, self.hi[2] + layers],
        )
    }

    /// Returns the axis along which the region is longest, preferring lower axes on ties.
    #[must_use]
    pub fn longest_axis(&self) -> usize {
        let extent = self.extent();
        (0..3).fold(0, |best, axis| {
            if extent[axis] > extent[best] {
                axis
            } else {
                best
            }
        })
    }

    /// Iterates over all indices with the x index outermost and z innermost.
    ///
    /// This is also the storage order of [`Block`](crate::Block) data and the
    /// order in which regions are packed for exchange.
    pub fn iter(&self) -> impl Iterator<Item = Index> + use<> {
        let Self { lo, hi } = *self;
        (lo[0]..hi[0]).flat_map(move |x| {
            (lo[1]..hi[1]).flat_map(move |y| (lo[2]..hi[2]).map(move |z| [x, y, z]))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inverted_corners_make_an_empty_region() {
        let region = Region::new([2, 0, 0], [1, 3, 3]);
        assert!(region.is_empty());
        assert_eq!(region.volume(), 0);
        assert_eq!(region.iter().count(), 0);
    }

    #[test]
    fn intersection_and_growth() {
        let a = Region::new([0, 0, 0], [4, 4, 4]);
        let b = Region::new([3, 1, -2], [6, 2, 9]);

        let shared = a.intersection(&b).unwrap();
        assert_eq!(shared, Region::new([3, 1, 0], [4, 2, 4]));
        assert_eq!(shared.volume(), 4);

        let c = Region::new([4, 0, 0], [5, 4, 4]);
        assert!(a.intersection(&c).is_none());
        assert_eq!(a.grow(1).intersection(&c).unwrap().volume(), 16);
    }

    #[test]
    fn iteration_is_z_fastest() {
        let region = Region::new([0, 0, 0], [2, 1, 2]);
        let indices: Vec<_> = region.iter().collect();
        assert_eq!(indices, vec![[0, 0, 0], [0, 0, 1], [1, 0, 0], [1, 0, 1]]);
        assert!(indices.iter().all(|&index| region.contains(index)));
    }

    #[test]
    fn longest_axis_prefers_lower_axes() {
        assert_eq!(Region::new([0, 0, 0], [2, 5, 5]).longest_axis(), 1);
        assert_eq!(Region::new([0, 0, 0], [3, 3, 3]).longest_axis(), 0);
    }
}
