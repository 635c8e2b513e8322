use std::cmp::Reverse;

use crate::{cuboid::Cuboid, error::ConfigurationError};

use super::{LoadBalancingStrategy, RankAssignment};

/// Weight-aware greedy assignment.
///
/// Cuboids are visited from heaviest to lightest and each goes to the rank
/// with the smallest load so far. Ties go to the lower cuboid id and the
/// lower rank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeuristicBalance;

impl LoadBalancingStrategy for HeuristicBalance {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn assign(
        &self,
        cuboids: &[Cuboid],
        workers: usize,
    ) -> Result<RankAssignment, ConfigurationError> {
        let workers = workers.max(1);
        let mut order: Vec<usize> = (0..cuboids.len()).collect();
        order.sort_by_key(|&cuboid| (Reverse(cuboids[cuboid].weight()), cuboid));

        let mut loads = vec![0_u64; workers];
        let mut counts = vec![0_usize; workers];
        let mut owners = vec![0; cuboids.len()];
        for cuboid in order {
            let rank = (0..workers)
                .min_by_key(|&rank| (loads[rank], counts[rank], rank))
                .unwrap_or(0);
            owners[cuboid] = rank;
            loads[rank] += cuboids[cuboid].weight();
            counts[rank] += 1;
        }

        RankAssignment::new(owners, workers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::balancer::tests::cuboids;

    #[test]
    fn balances_uneven_weights() {
        let cuboids = cuboids(&[8, 7, 6, 5, 4]);
        let assignment = HeuristicBalance.assign(&cuboids, 2).unwrap();

        assert_eq!(assignment.owners(), &[0, 1, 1, 0, 0]);
        assert_eq!(assignment.loads(&cuboids), vec![17, 13]);
    }

    #[test]
    fn every_rank_gets_work_when_weights_are_zero() {
        let assignment = HeuristicBalance.assign(&cuboids(&[0, 0, 0]), 3).unwrap();
        assert_eq!(assignment.owners(), &[0, 1, 2]);
    }
}
