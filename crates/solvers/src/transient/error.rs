use std::error::Error as StdError;

/// Errors that can occur while preparing or stepping a lattice.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lattice error: {0}")]
    Lattice(#[source] Box<dyn StdError + Send + Sync>),
}

impl Error {
    pub(crate) fn lattice<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Lattice(Box::new(err))
    }
}
