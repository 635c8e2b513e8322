use std::path::{Path, PathBuf};

use crate::comm::{CommError, Communicator};

/// Per-worker runtime information.
///
/// Constructed once per worker at process start and passed by reference to
/// every component that needs rank or worker-count information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContext {
    rank: usize,
    workers: usize,
    output_dir: PathBuf,
}

impl RuntimeContext {
    /// Rank of the worker that writes shared output and prints summaries.
    pub const MAIN_RANK: usize = 0;

    /// Creates a context for worker `rank` out of `workers`.
    ///
    /// # Errors
    ///
    /// Returns [`CommError::InvalidRank`] if `rank >= workers`.
    pub fn new(
        rank: usize,
        workers: usize,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, CommError> {
        if rank >= workers {
            return Err(CommError::InvalidRank {
                rank,
                size: workers,
            });
        }
        Ok(Self {
            rank,
            workers,
            output_dir: output_dir.into(),
        })
    }

    /// Creates the context of the worker behind `comm`.
    #[must_use]
    pub fn for_worker(comm: &Communicator, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            rank: comm.rank(),
            workers: comm.size(),
            output_dir: output_dir.into(),
        }
    }

    /// Creates the context of a single-worker run.
    #[must_use]
    pub fn single(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            rank: Self::MAIN_RANK,
            workers: 1,
            output_dir: output_dir.into(),
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns `true` on the worker responsible for shared output.
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.rank == Self::MAIN_RANK
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Returns the path of a file inside the output directory.
    #[must_use]
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_rank_is_zero() {
        assert!(RuntimeContext::new(0, 4, "out").unwrap().is_main());
        assert!(!RuntimeContext::new(3, 4, "out").unwrap().is_main());
    }

    #[test]
    fn output_path_joins_directory() {
        let ctx = RuntimeContext::single("tmp");
        assert_eq!(ctx.output_path("venturi.dat"), PathBuf::from("tmp/venturi.dat"));
    }

    #[test]
    fn rejects_rank_beyond_worker_count() {
        assert_eq!(
            RuntimeContext::new(2, 2, "tmp"),
            Err(CommError::InvalidRank { rank: 2, size: 2 })
        );
    }

    #[test]
    fn worker_context_follows_the_communicator() {
        let contexts = crate::launch(3, |comm| {
            Ok::<_, CommError>(RuntimeContext::for_worker(comm, "out"))
        })
        .unwrap();

        for (rank, context) in contexts.iter().enumerate() {
            assert_eq!(context.rank(), rank);
            assert_eq!(context.workers(), 3);
        }
    }
}
