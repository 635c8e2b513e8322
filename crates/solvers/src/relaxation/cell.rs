use glam::DVec3;
use venturi_core::{Payload, Wire};

/// Velocity and density of one cell, in lattice units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Cell {
    pub(super) velocity: DVec3,
    pub(super) density: f64,
}

impl Cell {
    /// Fluid at rest with unit density.
    pub(super) const REST: Self = Self {
        velocity: DVec3::ZERO,
        density: 1.0,
    };

    /// Moves `self` towards `target` by `rate`.
    pub(super) fn relax(self, target: Self, rate: f64) -> Self {
        Self {
            velocity: self.velocity + (target.velocity - self.velocity) * rate,
            density: self.density + (target.density - self.density) * rate,
        }
    }

    pub(super) fn energy(&self) -> f64 {
        0.5 * self.velocity.length_squared()
    }
}

impl Wire for Cell {
    fn pack(values: Vec<Self>) -> Payload {
        Payload::Floats(
            values
                .into_iter()
                .flat_map(|cell| {
                    let [x, y, z] = cell.velocity.to_array();
                    [x, y, z, cell.density]
                })
                .collect(),
        )
    }

    fn unpack(payload: Payload) -> Option<Vec<Self>> {
        let Payload::Floats(values) = payload else {
            return None;
        };
        if values.len() % 4 != 0 {
            return None;
        }
        Some(
            values
                .chunks_exact(4)
                .map(|chunk| Self {
                    velocity: DVec3::new(chunk[0], chunk[1], chunk[2]),
                    density: chunk[3],
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn relax_moves_part_of_the_way() {
        let target = Cell {
            velocity: DVec3::new(1.0, 0.0, 0.0),
            density: 2.0,
        };
        let relaxed = Cell::REST.relax(target, 0.25);

        assert_relative_eq!(relaxed.velocity.x, 0.25);
        assert_relative_eq!(relaxed.density, 1.25);
    }

    #[test]
    fn packs_four_floats_per_cell() {
        let cells = vec![Cell::REST; 3];
        let payload = Cell::pack(cells.clone());

        assert!(matches!(&payload, Payload::Floats(values) if values.len() == 12));
        assert_eq!(Cell::unpack(payload), Some(cells));
        assert_eq!(Cell::unpack(Payload::Floats(vec![1.0; 5])), None);
    }
}
