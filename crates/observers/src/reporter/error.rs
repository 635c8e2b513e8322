use std::{error::Error as StdError, io, path::Path, path::PathBuf};

use image::ImageError;
use thiserror::Error;

/// Errors that stop a run while reporting results.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write image {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: ImageError,
    },

    #[error("lattice error: {0}")]
    Lattice(#[source] Box<dyn StdError + Send + Sync>),
}

impl ReportError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn lattice<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        Self::Lattice(Box::new(err))
    }
}
