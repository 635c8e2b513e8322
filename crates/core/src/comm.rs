//! Message passing between workers.
//!
//! Workers run the same program on different parts of the domain and exchange
//! data through a [`Communicator`]. Every worker issues collective operations
//! in the same order, so tags taken from the shared epoch counter match up
//! without negotiation.

use std::{
    cell::{Cell, RefCell},
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread,
};

use thiserror::Error;

/// Tag reserved for abort notifications.
const ABORT_TAG: u64 = u64::MAX;

/// The body of a message.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Bytes(Vec<u8>),
    Floats(Vec<f64>),
    Counts(Vec<u64>),

    /// Sent by a failing worker so that peers stop waiting for it.
    Abort,
}

/// A value type that can travel between workers.
pub trait Wire: Sized {
    /// Packs values into a payload.
    fn pack(values: Vec<Self>) -> Payload;

    /// Unpacks values from a payload, or returns `None` on a type mismatch.
    fn unpack(payload: Payload) -> Option<Vec<Self>>;
}

impl Wire for f64 {
    fn pack(values: Vec<Self>) -> Payload {
        Payload::Floats(values)
    }

    fn unpack(payload: Payload) -> Option<Vec<Self>> {
        match payload {
            Payload::Floats(values) => Some(values),
            _ => None,
        }
    }
}

impl Wire for u64 {
    fn pack(values: Vec<Self>) -> Payload {
        Payload::Counts(values)
    }

    fn unpack(payload: Payload) -> Option<Vec<Self>> {
        match payload {
            Payload::Counts(values) => Some(values),
            _ => None,
        }
    }
}

/// Errors that can occur while exchanging messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommError {
    #[error("at least one worker is required")]
    NoWorkers,

    #[error("rank {rank} out of range for {size} workers")]
    InvalidRank { rank: usize, size: usize },

    #[error("worker {rank} aborted")]
    PeerAborted { rank: usize },

    #[error("worker {rank} is no longer reachable")]
    Disconnected { rank: usize },

    #[error("unexpected payload from worker {rank} (tag {tag})")]
    UnexpectedPayload { rank: usize, tag: u64 },

    #[error("worker {rank} panicked")]
    Panicked { rank: usize },
}

#[derive(Debug)]
struct Envelope {
    from: usize,
    tag: u64,
    payload: Payload,
}

/// The message-passing endpoint of one worker.
///
/// A communicator is owned by exactly one worker thread. Messages are matched
/// by source rank and tag; messages that arrive early are buffered until the
/// matching receive is issued.
#[derive(Debug)]
pub struct Communicator {
    rank: usize,
    size: usize,
    outboxes: Vec<Sender<Envelope>>,
    inbox: Receiver<Envelope>,
    pending: RefCell<Vec<Envelope>>,
    epoch: Cell<u64>,
}

impl Communicator {
    /// Creates the communicator of a single-worker run.
    #[must_use]
    pub fn solo() -> Self {
        let (outbox, inbox) = mpsc::channel();
        Self::with_channels(0, vec![outbox], inbox)
    }

    /// Creates one connected communicator per rank.
    fn group(size: usize) -> Vec<Self> {
        let (outboxes, inboxes): (Vec<_>, Vec<_>) = (0..size).map(|_| mpsc::channel()).unzip();
        inboxes
            .into_iter()
            .enumerate()
            .map(|(rank, inbox)| Self::with_channels(rank, outboxes.clone(), inbox))
            .collect()
    }

    fn with_channels(rank: usize, outboxes: Vec<Sender<Envelope>>, inbox: Receiver<Envelope>) -> Self {
        Self {
            rank,
            size: outboxes.len(),
            outboxes,
            inbox,
            pending: RefCell::new(Vec::new()),
            epoch: Cell::new(0),
        }
    }

    #[must_use]
    pub fn rank(&self) -> usize {
        self.rank
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn is_main(&self) -> bool {
        self.rank == 0
    }

    /// Returns a fresh tag for the next collective operation.
    ///
    /// All workers must call this the same number of times between exchanges.
    pub fn next_tag(&self) -> u64 {
        let tag = self.epoch.get();
        self.epoch.set(tag + 1);
        tag
    }

    /// Sends values to worker `to` under `tag`.
    ///
    /// # Errors
    ///
    /// Returns an error if `to` is out of range or the peer has exited.
    pub fn send<T: Wire>(&self, to: usize, tag: u64, values: Vec<T>) -> Result<(), CommError> {
        let outbox = self.outboxes.get(to).ok_or(CommError::InvalidRank {
            rank: to,
            size: self.size,
        })?;
        outbox
            .send(Envelope {
                from: self.rank,
                tag,
                payload: T::pack(values),
            })
            .map_err(|_| CommError::Disconnected { rank: to })
    }

    /// Blocks until values from worker `from` under `tag` arrive.
    ///
    /// # Errors
    ///
    /// Returns an error if any peer aborts, the peer has exited, or the
    /// payload does not hold values of type `T`.
    pub fn receive<T: Wire>(&self, from: usize, tag: u64) -> Result<Vec<T>, CommError> {
        if from >= self.size {
            return Err(CommError::InvalidRank {
                rank: from,
                size: self.size,
            });
        }

        loop {
            let buffered = {
                let mut pending = self.pending.borrow_mut();
                pending
                    .iter()
                    .position(|envelope| envelope.from == from && envelope.tag == tag)
                    .map(|index| pending.swap_remove(index))
            };
            if let Some(envelope) = buffered {
                return T::unpack(envelope.payload)
                    .ok_or(CommError::UnexpectedPayload { rank: from, tag });
            }

            let envelope = self
                .inbox
                .recv()
                .map_err(|_| CommError::Disconnected { rank: from })?;
            if envelope.payload == Payload::Abort {
                return Err(CommError::PeerAborted {
                    rank: envelope.from,
                });
            }
            self.pending.borrow_mut().push(envelope);
        }
    }

    /// Gathers one vector from every worker, indexed by rank.
    ///
    /// # Errors
    ///
    /// Returns an error if any exchange with a peer fails.
    pub fn all_gather<T: Wire + Clone>(&self, values: Vec<T>) -> Result<Vec<Vec<T>>, CommError> {
        let tag = self.next_tag();
        for peer in (0..self.size).filter(|&peer| peer != self.rank) {
            self.send(peer, tag, values.clone())?;
        }

        let mut own = Some(values);
        (0..self.size)
            .map(|peer| {
                if peer == self.rank {
                    Ok(own.take().unwrap_or_default())
                } else {
                    self.receive(peer, tag)
                }
            })
            .collect()
    }

    /// Sums `values` element-wise across all workers.
    ///
    /// # Errors
    ///
    /// Returns an error if any exchange with a peer fails.
    pub fn all_sum(&self, values: Vec<f64>) -> Result<Vec<f64>, CommError> {
        let len = values.len();
        let gathered = self.all_gather(values)?;
        Ok((0..len)
            .map(|i| gathered.iter().map(|part| part.get(i).copied().unwrap_or(0.0)).sum())
            .collect())
    }

    /// Blocks until every worker reaches the barrier.
    ///
    /// # Errors
    ///
    /// Returns an error if any exchange with a peer fails.
    pub fn barrier(&self) -> Result<(), CommError> {
        self.all_gather::<u64>(Vec::new()).map(|_| ())
    }

    /// Notifies every peer that this worker has failed.
    fn abort(&self) {
        for (peer, outbox) in self.outboxes.iter().enumerate() {
            if peer != self.rank {
                // Peers that already exited have nothing left to wake up.
                let _ = outbox.send(Envelope {
                    from: self.rank,
                    tag: ABORT_TAG,
                    payload: Payload::Abort,
                });
            }
        }
    }
}

/// Runs `worker` on `workers` threads, one per rank, and collects the results.
///
/// Each thread owns its communicator for the whole run and lends it to
/// `worker`, so peers stay reachable until a failure has been broadcast.
///
/// A worker that returns an error or panics broadcasts an abort, so peers that
/// are waiting on it fail with [`CommError::PeerAborted`] instead of hanging.
///
/// # Errors
///
/// Returns the error of the first worker that failed on its own, rather than
/// the follow-up errors of peers that were aborted.
pub fn launch<T, E, F>(workers: usize, worker: F) -> Result<Vec<T>, E>
where
    T: Send,
    E: Send + From<CommError>,
    F: Fn(&Communicator) -> Result<T, E> + Sync,
{
    if workers == 0 {
        return Err(CommError::NoWorkers.into());
    }

    let first_failure = AtomicUsize::new(usize::MAX);

    let outcomes: Vec<Result<T, E>> = thread::scope(|scope| {
        let handles: Vec<_> = Communicator::group(workers)
            .into_iter()
            .map(|comm| {
                let worker = &worker;
                let first_failure = &first_failure;
                scope.spawn(move || {
                    let rank = comm.rank();
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker(&comm)))
                        .unwrap_or_else(|_| Err(CommError::Panicked { rank }.into()));
                    if outcome.is_err() {
                        let _ = first_failure.compare_exchange(
                            usize::MAX,
                            rank,
                            Ordering::SeqCst,
                            Ordering::SeqCst,
                        );
                        comm.abort();
                    }
                    outcome
                })
            })
            .collect();

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| {
                handle
                    .join()
                    .unwrap_or_else(|_| Err(CommError::Panicked { rank }.into()))
            })
            .collect()
    });

    let failed = first_failure.load(Ordering::SeqCst);
    let mut results = Vec::with_capacity(workers);
    let mut errors = Vec::new();
    for (rank, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(value) => results.push(value),
            Err(error) => errors.push((rank, error)),
        }
    }

    if errors.is_empty() {
        return Ok(results);
    }
    let root = errors
        .iter()
        .position(|(rank, _)| *rank == failed)
        .unwrap_or(0);
    Err(errors.swap_remove(root).1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Comm(CommError),
        Broken(usize),
    }

    impl From<CommError> for TestError {
        fn from(error: CommError) -> Self {
            Self::Comm(error)
        }
    }

    #[test]
    fn solo_gather_returns_own_values() {
        let comm = Communicator::solo();
        let gathered = comm.all_gather(vec![1.0, 2.0]).unwrap();
        assert_eq!(gathered, vec![vec![1.0, 2.0]]);
        assert!(comm.is_main());
    }

    #[test]
    fn gather_collects_by_rank() {
        let results = launch(3, |comm| -> Result<_, TestError> {
            let gathered = comm.all_gather(vec![comm.rank() as u64 * 10])?;
            Ok(gathered)
        })
        .unwrap();

        assert_eq!(results.len(), 3);
        for gathered in results {
            assert_eq!(gathered, vec![vec![0], vec![10], vec![20]]);
        }
    }

    #[test]
    fn sum_adds_across_workers() {
        let results = launch(4, |comm| -> Result<_, TestError> {
            Ok(comm.all_sum(vec![1.0, comm.rank() as f64])?)
        })
        .unwrap();

        for sums in results {
            assert_eq!(sums, vec![4.0, 6.0]);
        }
    }

    #[test]
    fn out_of_order_messages_are_buffered() {
        let results = launch(2, |comm| -> Result<_, TestError> {
            if comm.rank() == 0 {
                comm.send(1, 7, vec![7.0])?;
                comm.send(1, 3, vec![3.0])?;
                Ok(Vec::new())
            } else {
                let first = comm.receive::<f64>(0, 3)?;
                let second = comm.receive::<f64>(0, 7)?;
                Ok([first, second].concat())
            }
        })
        .unwrap();

        assert_eq!(results[1], vec![3.0, 7.0]);
    }

    #[test]
    fn failing_worker_aborts_peers() {
        let result: Result<Vec<()>, TestError> = launch(3, |comm| {
            if comm.rank() == 1 {
                return Err(TestError::Broken(1));
            }
            comm.barrier()?;
            Ok(())
        });

        assert_eq!(result.unwrap_err(), TestError::Broken(1));
    }

    #[test]
    fn panicking_worker_is_reported() {
        let result: Result<Vec<()>, TestError> = launch(2, |comm| {
            assert!(comm.rank() != 0, "rank zero gives up");
            comm.barrier()?;
            Ok(())
        });

        assert_eq!(
            result.unwrap_err(),
            TestError::Comm(CommError::Panicked { rank: 0 })
        );
    }

    #[test]
    fn mismatched_payload_is_an_error() {
        let results = launch(2, |comm| -> Result<_, TestError> {
            if comm.rank() == 0 {
                comm.send(1, 0, vec![1_u64])?;
                Ok(None)
            } else {
                Ok(Some(comm.receive::<f64>(0, 0)))
            }
        })
        .unwrap();

        assert_eq!(
            results[1],
            Some(Err(CommError::UnexpectedPayload { rank: 0, tag: 0 }))
        );
    }

    #[test]
    fn zero_workers_is_rejected() {
        let result: Result<Vec<()>, TestError> = launch(0, |_| Ok(()));
        assert_eq!(result.unwrap_err(), TestError::Comm(CommError::NoWorkers));
    }
}
