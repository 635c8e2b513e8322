use std::collections::BTreeMap;

use venturi_core::{CommError, Communicator, Wire};

use crate::{block::Block, partition::Partition, region::Region};

/// Copy of one region from the interior of `source` into the ghost layer of `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub source: usize,
    pub target: usize,
    pub region: Region,
}

/// The ghost-layer transfers that involve one worker.
///
/// Transfers between two cuboids of the same worker are local copies. The
/// others are grouped by peer, and both sides list them in the same order,
/// so one message per peer carries all of them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommunicationPlan {
    local: Vec<Transfer>,
    sends: BTreeMap<usize, Vec<Transfer>>,
    receives: BTreeMap<usize, Vec<Transfer>>,
}

impl CommunicationPlan {
    /// Builds the plan of `rank` for ghost layers `overlap` voxels deep.
    #[must_use]
    pub fn new(partition: &Partition, rank: usize, overlap: i64) -> Self {
        let cuboids = partition.cuboids();
        let assignment = partition.assignment();
        let mut plan = Self::default();

        for (target, target_cuboid) in cuboids.iter().enumerate() {
            let halo = target_cuboid.region().grow(overlap);
            for (source, source_cuboid) in cuboids.iter().enumerate() {
                if source == target {
                    continue;
                }
                let Some(region) = halo.intersection(&source_cuboid.region()) else {
                    continue;
                };

                let transfer = Transfer {
                    source,
                    target,
                    region,
                };
                match (assignment.owner(source), assignment.owner(target)) {
                    (from, to) if from == rank && to == rank => plan.local.push(transfer),
                    (from, to) if from == rank => plan.sends.entry(to).or_default().push(transfer),
                    (from, to) if to == rank => plan.receives.entry(from).or_default().push(transfer),
                    _ => {}
                }
            }
        }

        plan
    }

    #[must_use]
    pub fn local(&self) -> &[Transfer] {
        &self.local
    }

    /// Transfers sent to each peer.
    #[must_use]
    pub fn sends(&self) -> &BTreeMap<usize, Vec<Transfer>> {
        &self.sends
    }

    /// Transfers received from each peer.
    #[must_use]
    pub fn receives(&self) -> &BTreeMap<usize, Vec<Transfer>> {
        &self.receives
    }

    /// Refreshes the ghost layers of `blocks`.
    ///
    /// `blocks` holds the blocks of this worker sorted by cuboid id. This is a
    /// collective operation: every worker must call it the same number of
    /// times, even if its plan is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a peer cannot be reached or sends malformed data.
    pub fn exchange<T: Wire + Copy>(
        &self,
        comm: &Communicator,
        blocks: &mut [Block<T>],
    ) -> Result<(), CommError> {
        let tag = comm.next_tag();

        for (&peer, transfers) in &self.sends {
            let values: Vec<T> = transfers
                .iter()
                .filter_map(|t| find(blocks, t.source).map(|block| block.read(&t.region)))
                .flatten()
                .collect();
            comm.send(peer, tag, values)?;
        }

        for transfer in &self.local {
            let Some(values) = find(blocks, transfer.source).map(|b| b.read(&transfer.region))
            else {
                continue;
            };
            if let Some(target) = find_mut(blocks, transfer.target) {
                target.write(&transfer.region, &values);
            }
        }

        for (&peer, transfers) in &self.receives {
            let values: Vec<T> = comm.receive(peer, tag)?;
            let expected: u64 = transfers.iter().map(|t| t.region.volume()).sum();
            if values.len() as u64 != expected {
                return Err(CommError::UnexpectedPayload { rank: peer, tag });
            }

            let mut rest = values.as_slice();
            for transfer in transfers {
                #[allow(clippy::cast_possible_truncation)]
                let (chunk, tail) = rest.split_at(transfer.region.volume() as usize);
                if let Some(target) = find_mut(blocks, transfer.target) {
                    target.write(&transfer.region, chunk);
                }
                rest = tail;
            }
        }

        Ok(())
    }
}

fn find<T>(blocks: &[Block<T>], cuboid: usize) -> Option<&Block<T>>
where
    T: Copy,
{
    blocks
        .binary_search_by_key(&cuboid, Block::cuboid)
        .ok()
        .map(|slot| &blocks[slot])
}

fn find_mut<T>(blocks: &mut [Block<T>], cuboid: usize) -> Option<&mut Block<T>>
where
    T: Copy,
{
    blocks
        .binary_search_by_key(&cuboid, Block::cuboid)
        .ok()
        .map(move |slot| &mut blocks[slot])
}
