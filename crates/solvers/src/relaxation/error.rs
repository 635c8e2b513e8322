use thiserror::Error;
use venturi_core::{CommError, Material};

/// Errors raised by [`RelaxationLattice`](super::RelaxationLattice).
#[derive(Debug, Error)]
pub enum LatticeError {
    #[error("material {0} has no velocity boundary")]
    NotVelocityBoundary(Material),

    #[error("the lattice has not been initialized")]
    Uninitialized,

    #[error(transparent)]
    Comm(#[from] CommError),
}
