use std::fmt;

use crate::comm::{Payload, Wire};

/// The classification stamped on a voxel.
///
/// Material ids are small non-negative integers. The ids used by the duct
/// application are provided as associated constants; a later rename always
/// overwrites an earlier one, so the constants carry no precedence of their own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Material(u8);

impl Material {
    /// Unassigned voxel outside the duct.
    pub const EXTERIOR: Self = Self(0);

    /// Bulk fluid.
    pub const FLUID: Self = Self(1);

    /// Generic wall, or wall candidate during classification.
    pub const WALL: Self = Self(2);

    /// Inflow boundary.
    pub const INFLOW: Self = Self(3);

    /// First outflow boundary.
    pub const OUTFLOW_0: Self = Self(4);

    /// Second outflow boundary.
    pub const OUTFLOW_1: Self = Self(5);

    /// All material ids known to the duct application, in id order.
    pub const KNOWN: [Self; 6] = [
        Self::EXTERIOR,
        Self::FLUID,
        Self::WALL,
        Self::INFLOW,
        Self::OUTFLOW_0,
        Self::OUTFLOW_1,
    ];

    /// Creates a material from its raw id.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Returns `true` if the id is one of [`Material::KNOWN`].
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.0 <= Self::OUTFLOW_1.0
    }

    /// Returns `true` for materials that are neither exterior nor bulk fluid.
    #[must_use]
    pub const fn is_boundary(self) -> bool {
        self.0 != Self::EXTERIOR.0 && self.0 != Self::FLUID.0
    }

    /// A short human-readable name, used in statistics tables.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            0 => "exterior",
            1 => "fluid",
            2 => "wall",
            3 => "inflow",
            4 => "outflow0",
            5 => "outflow1",
            _ => "unknown",
        }
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Wire for Material {
    fn pack(values: Vec<Self>) -> Payload {
        Payload::Bytes(values.into_iter().map(Self::id).collect())
    }

    fn unpack(payload: Payload) -> Option<Vec<Self>> {
        match payload {
            Payload::Bytes(bytes) => Some(bytes.into_iter().map(Self).collect()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_ids_cover_zero_to_five() {
        for (id, material) in Material::KNOWN.iter().enumerate() {
            assert_eq!(usize::from(material.id()), id);
            assert!(material.is_known());
        }
        assert!(!Material::new(6).is_known());
    }

    #[test]
    fn boundary_excludes_exterior_and_fluid() {
        assert!(!Material::EXTERIOR.is_boundary());
        assert!(!Material::FLUID.is_boundary());
        assert!(Material::WALL.is_boundary());
        assert!(Material::INFLOW.is_boundary());
        assert!(Material::OUTFLOW_1.is_boundary());
    }

    #[test]
    fn wire_round_trip_preserves_ids() {
        let values = vec![Material::WALL, Material::FLUID, Material::OUTFLOW_0];
        let unpacked = Material::unpack(Material::pack(values.clone())).unwrap();
        assert_eq!(unpacked, values);
        assert!(Material::unpack(Payload::Floats(vec![1.0])).is_none());
    }
}
