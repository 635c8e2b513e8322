use crate::{cuboid::Cuboid, error::ConfigurationError};

use super::{LoadBalancingStrategy, RankAssignment};

/// Contiguous chunks of cuboid ids per rank, ignoring weights.
///
/// With `n` cuboids and `p` workers, rank `r` receives `n / p` cuboids plus
/// one more if `r < n % p`, starting where rank `r - 1` stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockBalance;

impl LoadBalancingStrategy for BlockBalance {
    fn name(&self) -> &'static str {
        "block"
    }

    fn assign(
        &self,
        cuboids: &[Cuboid],
        workers: usize,
    ) -> Result<RankAssignment, ConfigurationError> {
        let workers = workers.max(1);
        let chunk = cuboids.len() / workers;
        let remainder = cuboids.len() % workers;

        let owners = (0..workers)
            .flat_map(|rank| {
                let count = chunk + usize::from(rank < remainder);
                std::iter::repeat_n(rank, count)
            })
            .collect();

        RankAssignment::new(owners, workers)
    }
}
