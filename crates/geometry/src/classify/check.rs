use tracing::warn;
use venturi_core::{Communicator, Material};

use super::for_each_voxel;
use crate::{error::GeometryError, super_geometry::SuperGeometry};

/// Offending voxels reported per worker before the rest are only counted.
const REPORTED_VOXELS: u64 = 8;

/// Validates a classified geometry on all workers.
///
/// The geometry is consistent when every material id is known, every fluid
/// or boundary voxel has a bulk-fluid neighbour, no fluid voxel touches the
/// exterior, and at least one fluid voxel exists. Offending voxels are
/// logged as warnings. This is a collective operation and all workers return
/// the same result.
///
/// # Errors
///
/// Returns [`GeometryError::UnknownMaterial`], [`GeometryError::Inconsistent`],
/// or [`GeometryError::NoFluid`] for the first failed condition in that order.
pub fn check_for_errors(geometry: &SuperGeometry, comm: &Communicator) -> Result<(), GeometryError> {
    let mut unknown = 0_u64;
    let mut isolated = 0_u64;
    let mut exposed = 0_u64;
    let mut fluid = 0_u64;

    for_each_voxel(geometry, |voxel| {
        let material = voxel.material;
        if material == Material::EXTERIOR {
            return;
        }
        if !material.is_known() {
            unknown += 1;
            return;
        }
        if material == Material::FLUID {
            fluid += 1;
            if voxel.surroundings().any(|m| m == Material::EXTERIOR) {
                if exposed < REPORTED_VOXELS {
                    warn!(index = ?voxel.index, position = ?voxel.position, "fluid voxel touches the exterior");
                }
                exposed += 1;
            }
        }
        if !voxel.surroundings().any(|m| m == Material::FLUID) {
            if isolated < REPORTED_VOXELS {
                warn!(index = ?voxel.index, %material, "voxel has no fluid neighbour");
            }
            isolated += 1;
        }
    });

    let totals = comm
        .all_gather(vec![unknown, isolated, exposed, fluid])?
        .into_iter()
        .fold([0_u64; 4], |mut totals, counts| {
            for (total, count) in totals.iter_mut().zip(counts) {
                *total += count;
            }
            totals
        });

    match totals {
        [unknown, ..] if unknown > 0 => Err(GeometryError::UnknownMaterial(unknown)),
        [_, isolated, exposed, _] if isolated > 0 || exposed > 0 => {
            Err(GeometryError::Inconsistent { isolated, exposed })
        }
        [.., 0] => Err(GeometryError::NoFluid),
        _ => Ok(()),
    }
}
