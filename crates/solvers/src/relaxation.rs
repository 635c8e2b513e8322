//! A reference lattice that smooths the flow state by explicit relaxation.
//!
//! Bulk cells move their velocity and density towards the mean of their
//! active face neighbours every step. Walls hold zero velocity, velocity
//! boundaries hold the last pushed profile, and pressure boundaries hold their
//! density. This is enough to exercise the orchestrator and the reporter with
//! a distributed state; it is not a flow solver.

mod cell;
mod error;

use std::collections::BTreeMap;

use glam::DVec3;
use tracing::debug;
use venturi_core::{
    Axis, BoundaryCondition, CellSample, Communicator, Dynamics, Lattice, LatticeStatistics,
    Material, Plane, VelocityProfile,
};
use venturi_geometry::{Block, Index, SuperGeometry};

use cell::Cell;
pub use error::LatticeError;

/// Face-adjacent offsets.
const FACES: [Index; 6] = [
    [1, 0, 0],
    [-1, 0, 0],
    [0, 1, 0],
    [0, -1, 0],
    [0, 0, 1],
    [0, 0, -1],
];

/// What a cell does during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Behaviour {
    Inactive,
    Bulk,
    BounceBack,
    Velocity,
    Pressure(f64),
}

impl Behaviour {
    fn is_active(self) -> bool {
        self != Self::Inactive
    }

    /// Bulk cells and the openings; walls and inactive cells hold no fluid.
    fn carries_fluid(self) -> bool {
        matches!(self, Self::Bulk | Self::Velocity | Self::Pressure(_))
    }
}

/// The flow state of one worker, laid out like its geometry blocks.
#[derive(Debug)]
pub struct RelaxationLattice<'a> {
    geometry: &'a SuperGeometry,
    comm: &'a Communicator,
    omega: f64,
    behaviours: BTreeMap<Material, Behaviour>,
    cells: Vec<Block<Cell>>,
    initialized: bool,
}

impl<'a> RelaxationLattice<'a> {
    /// Creates a lattice at rest over the blocks of `geometry`.
    ///
    /// Bulk cells relax at half the lattice relaxation frequency `omega`, which
    /// keeps the rate below one for every relaxation time above one half.
    #[must_use]
    pub fn new(geometry: &'a SuperGeometry, comm: &'a Communicator, omega: f64) -> Self {
        let overlap = i64::try_from(geometry.overlap()).unwrap_or(1);
        let cells = geometry
            .blocks()
            .iter()
            .map(|block| Block::new(block.cuboid(), block.interior(), overlap, Cell::REST))
            .collect();

        Self {
            geometry,
            comm,
            omega,
            behaviours: BTreeMap::new(),
            cells,
            initialized: false,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> &'a SuperGeometry {
        self.geometry
    }

    #[must_use]
    pub fn comm(&self) -> &'a Communicator {
        self.comm
    }

    #[must_use]
    pub fn omega(&self) -> f64 {
        self.omega
    }

    fn behaviour(&self, material: Material) -> Behaviour {
        self.behaviours
            .get(&material)
            .copied()
            .unwrap_or(Behaviour::Inactive)
    }

    /// Owned cells as `(cuboid, index, material, cell)`.
    fn owned(&self) -> impl Iterator<Item = (usize, Index, Material, Cell)> + '_ {
        self.geometry
            .blocks()
            .iter()
            .zip(&self.cells)
            .flat_map(|(materials, cells)| {
                materials.interior_values().filter_map(move |(index, material)| {
                    cells
                        .get(index)
                        .map(|cell| (materials.cuboid(), index, material, cell))
                })
            })
    }

    /// Rewrites the owned cells of every material accepted by `select`.
    fn update(&mut self, select: impl Fn(Material) -> bool, rewrite: impl Fn(Index, Cell) -> Cell) {
        for (materials, cells) in self.geometry.blocks().iter().zip(&mut self.cells) {
            for (index, material) in materials.interior_values() {
                if select(material) {
                    if let Some(cell) = cells.get(index) {
                        cells.set(index, rewrite(index, cell));
                    }
                }
            }
        }
    }
}

impl Lattice for RelaxationLattice<'_> {
    type Error = LatticeError;

    fn assign_dynamics(
        &mut self,
        material: Material,
        dynamics: Dynamics,
    ) -> Result<(), Self::Error> {
        let behaviour = match dynamics {
            Dynamics::Bulk => Behaviour::Bulk,
            Dynamics::None => Behaviour::Inactive,
        };
        self.behaviours.insert(material, behaviour);
        Ok(())
    }

    fn assign_boundary(
        &mut self,
        material: Material,
        boundary: BoundaryCondition,
    ) -> Result<(), Self::Error> {
        let behaviour = match boundary {
            BoundaryCondition::BounceBack => Behaviour::BounceBack,
            BoundaryCondition::Velocity => Behaviour::Velocity,
            BoundaryCondition::Pressure { density } => Behaviour::Pressure(density),
        };
        self.behaviours.insert(material, behaviour);
        Ok(())
    }

    fn set_velocity(
        &mut self,
        material: Material,
        profile: &dyn VelocityProfile,
    ) -> Result<(), Self::Error> {
        if self.behaviour(material) != Behaviour::Velocity {
            return Err(LatticeError::NotVelocityBoundary(material));
        }
        let grid = *self.geometry.grid();
        self.update(
            |m| m == material,
            |index, cell| Cell {
                velocity: profile.velocity(grid.position(index)),
                ..cell
            },
        );
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), Self::Error> {
        let behaviours = self.behaviours.clone();
        let behaviour = |material: Material| {
            behaviours
                .get(&material)
                .copied()
                .unwrap_or(Behaviour::Inactive)
        };
        for (materials, cells) in self.geometry.blocks().iter().zip(&mut self.cells) {
            for index in materials.extended().iter() {
                let material = materials.get(index).unwrap_or(Material::EXTERIOR);
                let Some(cell) = cells.get(index) else {
                    continue;
                };
                let initial = match behaviour(material) {
                    Behaviour::Velocity => Cell { density: 1.0, ..cell },
                    Behaviour::Pressure(density) => Cell {
                        density,
                        ..Cell::REST
                    },
                    _ => Cell::REST,
                };
                cells.set(index, initial);
            }
        }
        self.initialized = true;
        debug!(materials = behaviours.len(), "initialized lattice");
        Ok(())
    }

    fn advance(&mut self) -> Result<(), Self::Error> {
        if !self.initialized {
            return Err(LatticeError::Uninitialized);
        }

        self.geometry.plan().exchange(self.comm, &mut self.cells)?;

        let rate = 0.5 * self.omega;
        let behaviours = &self.behaviours;
        let active = |material: Material| {
            behaviours
                .get(&material)
                .is_some_and(|behaviour| behaviour.is_active())
        };

        for (materials, cells) in self.geometry.blocks().iter().zip(&mut self.cells) {
            let snapshot = cells.clone();
            for (index, material) in materials.interior_values() {
                if behaviours.get(&material) != Some(&Behaviour::Bulk) {
                    continue;
                }

                let neighbours: Vec<Cell> = FACES
                    .iter()
                    .map(|offset| [index[0] + offset[0], index[1] + offset[1], index[2] + offset[2]])
                    .filter(|&neighbour| materials.get(neighbour).is_some_and(active))
                    .filter_map(|neighbour| snapshot.get(neighbour))
                    .collect();
                if neighbours.is_empty() {
                    continue;
                }

                #[allow(clippy::cast_precision_loss)]
                let count = neighbours.len() as f64;
                let mean = Cell {
                    velocity: neighbours.iter().map(|cell| cell.velocity).sum::<DVec3>() / count,
                    density: neighbours.iter().map(|cell| cell.density).sum::<f64>() / count,
                };
                if let Some(current) = snapshot.get(index) {
                    cells.set(index, current.relax(mean, rate));
                }
            }
        }

        Ok(())
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn statistics(&self) -> Result<LatticeStatistics, Self::Error> {
        let mut local = [0.0, 0.0, 0.0, 0.0];
        for (_, _, material, cell) in self.owned() {
            if self.behaviour(material) == Behaviour::Bulk {
                local[0] += 1.0;
                local[1] += cell.energy();
                local[2] += cell.density;
                local[3] = f64::max(local[3], cell.velocity.length());
            }
        }

        let gathered = self.comm.all_gather(local.to_vec())?;
        let [cells, energy, density, max_velocity] =
            gathered.iter().fold([0.0; 4], |mut total, part| {
                total[0] += part[0];
                total[1] += part[1];
                total[2] += part[2];
                total[3] = f64::max(total[3], part[3]);
                total
            });

        if cells < 1.0 {
            return Ok(LatticeStatistics::default());
        }
        Ok(LatticeStatistics {
            cells: cells as u64,
            average_energy: energy / cells,
            average_density: density / cells,
            max_velocity,
        })
    }

    fn samples(&self) -> Vec<CellSample> {
        let grid = self.geometry.grid();
        self.owned()
            .filter(|&(_, _, material, _)| material != Material::EXTERIOR)
            .map(|(cuboid, index, material, cell)| CellSample {
                position: grid.position(index),
                material,
                cuboid,
                velocity: cell.velocity,
                density: cell.density,
            })
            .collect()
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn plane(&self, normal: Axis) -> Result<Option<Plane>, Self::Error> {
        let axis = normal.index();
        let (across, up) = match normal {
            Axis::X => (1, 2),
            Axis::Y => (0, 2),
            Axis::Z => (0, 1),
        };
        let extent = self.geometry.grid().extent();
        let middle = extent[axis] / 2;

        let local: Vec<f64> = self
            .owned()
            .filter(|&(_, index, material, _)| {
                index[axis] == middle && self.behaviour(material).carries_fluid()
            })
            .flat_map(|(_, index, _, cell)| {
                [index[across] as f64, index[up] as f64, cell.velocity.length()]
            })
            .collect();

        let gathered = self.comm.all_gather(local)?;
        if !self.comm.is_main() {
            return Ok(None);
        }

        let width = extent[across].max(0) as usize;
        let height = extent[up].max(0) as usize;
        let mut values = vec![None; width * height];
        for triple in gathered.iter().flat_map(|part| part.chunks_exact(3)) {
            let (i, j) = (triple[0] as usize, triple[1] as usize);
            if let Some(value) = values.get_mut(j * width + i) {
                *value = Some(triple[2]);
            }
        }

        Ok(Some(Plane {
            width,
            height,
            values,
        }))
    }
}

#[cfg(test)]
mod tests;
