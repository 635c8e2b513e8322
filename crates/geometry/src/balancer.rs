//! Strategies that assign cuboids to workers.

mod block;
mod heuristic;

pub use block::BlockBalance;
pub use heuristic::HeuristicBalance;

use crate::{cuboid::Cuboid, error::ConfigurationError};

/// Decides which worker owns each cuboid.
///
/// Implementations must be deterministic: every worker computes the
/// assignment independently and all of them must agree.
pub trait LoadBalancingStrategy {
    /// A short name used in logs.
    fn name(&self) -> &'static str;

    /// Assigns every cuboid to a rank in `0..workers`.
    ///
    /// Callers guarantee `workers >= 1` and `cuboids.len() >= workers`.
    ///
    /// # Errors
    ///
    /// Returns an error if the strategy produces an owner outside `0..workers`.
    fn assign(&self, cuboids: &[Cuboid], workers: usize)
    -> Result<RankAssignment, ConfigurationError>;
}

impl<T: LoadBalancingStrategy + ?Sized> LoadBalancingStrategy for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn assign(
        &self,
        cuboids: &[Cuboid],
        workers: usize,
    ) -> Result<RankAssignment, ConfigurationError> {
        (**self).assign(cuboids, workers)
    }
}

impl<T: LoadBalancingStrategy + ?Sized> LoadBalancingStrategy for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn assign(
        &self,
        cuboids: &[Cuboid],
        workers: usize,
    ) -> Result<RankAssignment, ConfigurationError> {
        (**self).assign(cuboids, workers)
    }
}

/// The owning rank of every cuboid, indexed by cuboid id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankAssignment {
    owners: Vec<usize>,
    workers: usize,
}

impl RankAssignment {
    /// Creates an assignment from per-cuboid owners.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidOwner`] for the first owner that
    /// is not a rank in `0..workers`.
    pub fn new(owners: Vec<usize>, workers: usize) -> Result<Self, ConfigurationError> {
        if let Some((cuboid, &owner)) = owners
            .iter()
            .enumerate()
            .find(|&(_, &owner)| owner >= workers)
        {
            return Err(ConfigurationError::InvalidOwner {
                cuboid,
                owner,
                workers,
            });
        }
        Ok(Self { owners, workers })
    }

    /// The rank that owns `cuboid`.
    ///
    /// # Panics
    ///
    /// Panics if `cuboid` is out of range.
    #[must_use]
    pub fn owner(&self, cuboid: usize) -> usize {
        self.owners[cuboid]
    }

    #[must_use]
    pub fn owners(&self) -> &[usize] {
        &self.owners
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Ids of the cuboids owned by `rank`, in ascending order.
    pub fn owned_by(&self, rank: usize) -> impl Iterator<Item = usize> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter(move |&(_, &owner)| owner == rank)
            .map(|(cuboid, _)| cuboid)
    }

    /// Total cuboid weight per rank.
    #[must_use]
    pub fn loads(&self, cuboids: &[Cuboid]) -> Vec<u64> {
        let mut loads = vec![0; self.workers];
        for (cuboid, &owner) in cuboids.iter().zip(&self.owners) {
            loads[owner] += cuboid.weight();
        }
        loads
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::region::Region;

    // --- Test fixtures ---

    pub(crate) fn cuboids(weights: &[u64]) -> Vec<Cuboid> {
        weights
            .iter()
            .zip(0..)
            .map(|(&weight, x)| Cuboid::new(Region::new([x, 0, 0], [x + 1, 1, 1]), weight))
            .collect()
    }

    #[test]
    fn owned_by_and_loads() {
        let assignment = RankAssignment::new(vec![1, 0, 1], 2).unwrap();

        assert_eq!(assignment.owned_by(1).collect::<Vec<_>>(), vec![0, 2]);
        assert_eq!(assignment.loads(&cuboids(&[3, 4, 5])), vec![4, 8]);
    }

    #[test]
    fn rejects_out_of_range_owners() {
        assert_eq!(
            RankAssignment::new(vec![0, 2], 2),
            Err(ConfigurationError::InvalidOwner {
                cuboid: 1,
                owner: 2,
                workers: 2
            })
        );
    }
}
