use crate::{grid::Index, region::Region};

/// Per-voxel data of one cuboid, padded with a ghost layer.
///
/// The interior is owned by this block. The ghost layer mirrors the interior
/// of neighbouring cuboids and is refreshed by a
/// [`CommunicationPlan`](crate::CommunicationPlan) exchange. Values are stored
/// in [`Region::iter`] order over the extended region.
#[derive(Debug, Clone, PartialEq)]
pub struct Block<T> {
    cuboid: usize,
    interior: Region,
    extended: Region,
    data: Vec<T>,
}

impl<T: Copy> Block<T> {
    /// Creates a block for `cuboid` with every voxel set to `fill`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new(cuboid: usize, interior: Region, overlap: i64, fill: T) -> Self {
        let extended = interior.grow(overlap);
        let len = extended.volume() as usize;
        Self {
            cuboid,
            interior,
            extended,
            data: vec![fill; len],
        }
    }

    /// Id of the cuboid this block stores.
    #[must_use]
    pub fn cuboid(&self) -> usize {
        self.cuboid
    }

    #[must_use]
    pub fn interior(&self) -> Region {
        self.interior
    }

    /// The interior together with its ghost layer.
    #[must_use]
    pub fn extended(&self) -> Region {
        self.extended
    }

    fn offset(&self, index: Index) -> Option<usize> {
        if !self.extended.contains(index) {
            return None;
        }
        let lo = self.extended.lo();
        let [_, ny, nz] = self.extended.extent();
        let offset = ((index[0] - lo[0]) * ny + (index[1] - lo[1])) * nz + (index[2] - lo[2]);
        usize::try_from(offset).ok()
    }

    /// Value at `index`, or `None` outside the extended region.
    #[must_use]
    pub fn get(&self, index: Index) -> Option<T> {
        self.offset(index).map(|offset| self.data[offset])
    }

    /// Stores `value` at `index` and returns `false` outside the extended region.
    pub fn set(&mut self, index: Index, value: T) -> bool {
        match self.offset(index) {
            Some(offset) => {
                self.data[offset] = value;
                true
            }
            None => false,
        }
    }

    /// Interior indices paired with their values.
    pub fn interior_values(&self) -> impl Iterator<Item = (Index, T)> + '_ {
        self.interior
            .iter()
            .filter_map(|index| self.get(index).map(|value| (index, value)))
    }

    /// Copies out the values of `region`, which must lie inside the extended region.
    #[must_use]
    pub fn read(&self, region: &Region) -> Vec<T> {
        region.iter().filter_map(|index| self.get(index)).collect()
    }

    /// Overwrites `region` with `values` given in [`Region::iter`] order.
    pub fn write(&mut self, region: &Region, values: &[T]) {
        for (index, &value) in region.iter().zip(values) {
            self.set(index, value);
        }
    }
}
