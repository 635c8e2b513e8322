use std::collections::BTreeMap;

use glam::DVec3;
use tracing::info;
use venturi_core::{Communicator, Material};

use crate::{
    classify::for_each_voxel, error::GeometryError, grid::Index, super_geometry::SuperGeometry,
};

/// Face-adjacent offsets, used for discrete normals.
const FACES: [Index; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

/// Floats packed per material when reducing statistics across workers:
/// count, min, max, position sum, normal sum.
const PACKED: usize = 13;

/// Summary of the voxels carrying one material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialStatistics {
    pub voxels: u64,

    /// Smallest voxel center coordinates.
    pub min: DVec3,

    /// Largest voxel center coordinates.
    pub max: DVec3,

    /// Mean voxel center.
    pub center: DVec3,

    /// Unit vector from the material towards face-adjacent bulk fluid, or
    /// zero if the material has no fluid neighbours.
    pub normal: DVec3,
}

impl MaterialStatistics {
    #[must_use]
    pub fn extent(&self) -> DVec3 {
        self.max - self.min
    }
}

/// Voxel statistics of a classified geometry, reduced over all workers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeometryStatistics {
    materials: BTreeMap<Material, MaterialStatistics>,
    per_worker: Vec<BTreeMap<Material, u64>>,
}

impl GeometryStatistics {
    /// Collects statistics for every known material.
    ///
    /// This is a collective operation and every worker receives the same result.
    ///
    /// # Errors
    ///
    /// Returns an error if an exchange with a peer fails.
    pub fn collect(geometry: &SuperGeometry, comm: &Communicator) -> Result<Self, GeometryError> {
        let mut local = [Accumulator::default(); Material::KNOWN.len()];

        for_each_voxel(geometry, |voxel| {
            let Some(slot) = local.get_mut(usize::from(voxel.material.id())) else {
                return;
            };
            let fluid_side: DVec3 = FACES
                .iter()
                .filter(|offset| {
                    let [i, j, k] = voxel.index;
                    let neighbour = [i + offset[0], j + offset[1], k + offset[2]];
                    voxel.material_at(neighbour) == Material::FLUID
                })
                .map(|offset| as_vector(*offset))
                .sum();
            slot.add(voxel.position, fluid_side);
        });

        let packed: Vec<f64> = local.iter().flat_map(Accumulator::pack).collect();
        let gathered = comm.all_gather(packed)?;

        let mut materials = BTreeMap::new();
        let mut per_worker = vec![BTreeMap::new(); gathered.len()];
        for (slot, &material) in Material::KNOWN.iter().enumerate() {
            let mut total = Accumulator::default();
            for (worker, values) in gathered.iter().enumerate() {
                let part = values
                    .get(slot * PACKED..(slot + 1) * PACKED)
                    .map(Accumulator::unpack)
                    .unwrap_or_default();
                per_worker[worker].insert(material, part.voxels);
                total.merge(&part);
            }
            if let Some(statistics) = total.finish() {
                materials.insert(material, statistics);
            }
        }

        Ok(Self {
            materials,
            per_worker,
        })
    }

    /// Statistics of `material`, or `None` if no voxel carries it.
    #[must_use]
    pub fn material(&self, material: Material) -> Option<&MaterialStatistics> {
        self.materials.get(&material)
    }

    #[must_use]
    pub fn voxels(&self, material: Material) -> u64 {
        self.material(material).map_or(0, |statistics| statistics.voxels)
    }

    /// Per-material voxel counts, indexed by worker rank.
    #[must_use]
    pub fn per_worker(&self) -> &[BTreeMap<Material, u64>] {
        &self.per_worker
    }

    /// Materials present in the geometry, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Material, &MaterialStatistics)> {
        self.materials.iter().map(|(&material, statistics)| (material, statistics))
    }

    /// Logs one line per material and one line per worker.
    pub fn log(&self) {
        for (material, statistics) in self.iter() {
            info!(
                material = %material,
                label = material.label(),
                voxels = statistics.voxels,
                min = ?statistics.min.to_array(),
                max = ?statistics.max.to_array(),
                center = ?statistics.center.to_array(),
                normal = ?statistics.normal.to_array(),
                "material statistics"
            );
        }
        for (rank, counts) in self.per_worker.iter().enumerate() {
            let counts: Vec<_> = counts
                .iter()
                .filter(|&(_, &count)| count > 0)
                .map(|(material, count)| format!("{}={count}", material.label()))
                .collect();
            info!(rank, counts = counts.join(" "), "worker voxels");
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn as_vector(offset: Index) -> DVec3 {
    DVec3::new(offset[0] as f64, offset[1] as f64, offset[2] as f64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Accumulator {
    voxels: u64,
    min: DVec3,
    max: DVec3,
    sum: DVec3,
    normal: DVec3,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            voxels: 0,
            min: DVec3::INFINITY,
            max: DVec3::NEG_INFINITY,
            sum: DVec3::ZERO,
            normal: DVec3::ZERO,
        }
    }
}

impl Accumulator {
    fn add(&mut self, position: DVec3, normal: DVec3) {
        self.voxels += 1;
        self.min = self.min.min(position);
        self.max = self.max.max(position);
        self.sum += position;
        self.normal += normal;
    }

    fn merge(&mut self, other: &Self) {
        self.voxels += other.voxels;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.normal += other.normal;
    }

    #[allow(clippy::cast_precision_loss)]
    fn pack(&self) -> [f64; PACKED] {
        let mut packed = [0.0; PACKED];
        packed[0] = self.voxels as f64;
        for (chunk, vector) in packed[1..]
            .chunks_mut(3)
            .zip([self.min, self.max, self.sum, self.normal])
        {
            chunk.copy_from_slice(&vector.to_array());
        }
        packed
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn unpack(values: &[f64]) -> Self {
        let vector = |at: usize| DVec3::from_slice(&values[at..at + 3]);
        Self {
            voxels: values[0] as u64,
            min: vector(1),
            max: vector(4),
            sum: vector(7),
            normal: vector(10),
        }
    }

    #[allow(clippy::cast_precision_loss)]
    fn finish(&self) -> Option<MaterialStatistics> {
        (self.voxels > 0).then(|| MaterialStatistics {
            voxels: self.voxels,
            min: self.min,
            max: self.max,
            center: self.sum / self.voxels as f64,
            normal: self.normal.normalize_or_zero(),
        })
    }
}
