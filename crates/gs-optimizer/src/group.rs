//! Fixed-size process group with one collective: an all-to-one gather.
//!
//! Every rank contributes its block to the coordinator (rank 0) and then
//! blocks until the coordinator releases the whole group. A fatal error on any
//! rank is turned into a group-wide abort, so nobody is left waiting on the
//! gather forever.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, warn};

use gs_types::{AccuracyMatrix, GroupError, GsResult, TopologyError, GRID_SIZE};

use crate::partition::{block_len, block_offset};

/// Rank of the process that receives the gather.
pub const COORDINATOR: usize = 0;

/// Group-wide cancellation flag carrying the first abort cause.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<CancelState>,
}

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    cause: Mutex<Option<GroupError>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `cause` and raise the flag. Returns `false` if the token was
    /// already cancelled; the first cause is kept.
    pub fn cancel(&self, cause: GroupError) -> bool {
        let mut slot = self.inner.cause.lock();
        if slot.is_some() {
            return false;
        }
        *slot = Some(cause);
        self.inner.cancelled.store(true, Ordering::Release);
        true
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    pub fn cause(&self) -> Option<GroupError> {
        self.inner.cause.lock().clone()
    }

    /// `Err` with the abort cause once cancelled.
    pub fn check(&self) -> Result<(), GroupError> {
        match self.cause() {
            Some(cause) if self.is_cancelled() => Err(cause),
            _ => Ok(()),
        }
    }
}

/// One participant's view of a process group.
///
/// Transports other than in-process channels implement this same contract.
pub trait Collective {
    fn rank(&self) -> usize;

    fn workers(&self) -> usize;

    fn is_coordinator(&self) -> bool {
        self.rank() == COORDINATOR
    }

    /// Contribute `block` and wait until every rank has contributed.
    ///
    /// The coordinator receives the full matrix with blocks placed by
    /// [`block_offset`]; every other rank receives `None`.
    fn gather(&mut self, block: AccuracyMatrix) -> GsResult<Option<AccuracyMatrix>>;

    /// Abort the whole group. Ranks blocked in, or later entering,
    /// [`Collective::gather`] fail with [`GroupError::Aborted`].
    fn abort(&mut self, reason: &str);

    /// Step out of the group without aborting it. Only valid when every
    /// rank leaves for the same reason, as with a topology error.
    fn leave(&mut self);

    fn cancellation(&self) -> &CancellationToken;

    fn is_cancelled(&self) -> bool {
        self.cancellation().is_cancelled()
    }
}

#[derive(Debug)]
enum Envelope {
    Block { rank: usize, values: Vec<f64> },
    Abort { rank: usize, reason: String },
}

#[derive(Debug, Clone)]
enum Release {
    Complete,
    Aborted(GroupError),
}

#[derive(Debug)]
enum Role {
    Coordinator {
        inbox: Receiver<Envelope>,
        releases: Vec<Sender<Release>>,
    },
    Member {
        outbox: Sender<Envelope>,
        release: Receiver<Release>,
    },
}

/// In-process group endpoint connected to its peers by channels.
#[derive(Debug)]
pub struct GroupEndpoint {
    rank: usize,
    workers: usize,
    cancel: CancellationToken,
    role: Role,
    finished: bool,
}

/// Create a connected group of `workers` endpoints, index = rank.
///
/// The size is not checked against the grid here; each rank validates the
/// topology itself once the group exists.
pub fn local_group(workers: usize) -> Result<Vec<GroupEndpoint>, TopologyError> {
    if workers == 0 {
        return Err(TopologyError::NoWorkers);
    }

    let cancel = CancellationToken::new();
    let (outbox, inbox) = unbounded();
    let (releases, receivers): (Vec<_>, Vec<_>) = (1..workers).map(|_| unbounded()).unzip();

    let mut endpoints = Vec::with_capacity(workers);
    endpoints.push(GroupEndpoint {
        rank: COORDINATOR,
        workers,
        cancel: cancel.clone(),
        role: Role::Coordinator { inbox, releases },
        finished: false,
    });
    for (idx, release) in receivers.into_iter().enumerate() {
        endpoints.push(GroupEndpoint {
            rank: idx + 1,
            workers,
            cancel: cancel.clone(),
            role: Role::Member {
                outbox: outbox.clone(),
                release,
            },
            finished: false,
        });
    }
    Ok(endpoints)
}

impl GroupEndpoint {
    fn release_all(releases: &[Sender<Release>], release: Release) {
        for tx in releases {
            // A peer that already left has nothing to release.
            let _ = tx.send(release.clone());
        }
    }

    fn fail(&self, releases: &[Sender<Release>], cause: GroupError) -> GroupError {
        self.cancel.cancel(cause.clone());
        let cause = self.cancel.cause().unwrap_or(cause);
        Self::release_all(releases, Release::Aborted(cause.clone()));
        cause
    }

    fn gather_as_coordinator(
        &self,
        inbox: &Receiver<Envelope>,
        releases: &[Sender<Release>],
        block: AccuracyMatrix,
    ) -> Result<Vec<f64>, GroupError> {
        let expected = block_len(self.workers);
        if let Err(cause) = self.cancel.check() {
            return Err(self.fail(releases, cause));
        }
        if block.as_slice().len() != expected {
            let cause = GroupError::BlockShape {
                rank: self.rank,
                expected,
                actual: block.as_slice().len(),
            };
            return Err(self.fail(releases, cause));
        }

        let mut buffer = vec![0.0; GRID_SIZE * GRID_SIZE];
        let mut arrived = vec![false; self.workers];
        let place = |buffer: &mut [f64], rank: usize, values: &[f64]| {
            let offset = block_offset(rank, self.workers);
            buffer[offset..offset + values.len()].copy_from_slice(values);
        };

        place(&mut buffer, self.rank, block.as_slice());
        arrived[self.rank] = true;
        let mut remaining = self.workers - 1;

        while remaining > 0 {
            match inbox.recv() {
                Ok(Envelope::Block { rank, values }) => {
                    if values.len() != expected {
                        let cause = GroupError::BlockShape {
                            rank,
                            expected,
                            actual: values.len(),
                        };
                        return Err(self.fail(releases, cause));
                    }
                    if arrived[rank] {
                        return Err(self.fail(releases, GroupError::AlreadyGathered { rank }));
                    }
                    debug!(from = rank, "block received");
                    place(&mut buffer, rank, &values);
                    arrived[rank] = true;
                    remaining -= 1;
                }
                Ok(Envelope::Abort { rank, reason }) => {
                    warn!(from = rank, %reason, "group abort received");
                    return Err(self.fail(releases, GroupError::Aborted { rank, reason }));
                }
                Err(_) => return Err(self.fail(releases, GroupError::Disconnected)),
            }
        }

        Self::release_all(releases, Release::Complete);
        Ok(buffer)
    }

    fn gather_as_member(
        &self,
        outbox: &Sender<Envelope>,
        release: &Receiver<Release>,
        block: AccuracyMatrix,
    ) -> Result<(), GroupError> {
        self.cancel.check()?;

        outbox
            .send(Envelope::Block {
                rank: self.rank,
                values: block.into_flat(),
            })
            .map_err(|_| self.disconnected())?;

        match release.recv() {
            Ok(Release::Complete) => Ok(()),
            Ok(Release::Aborted(cause)) => {
                self.cancel.cancel(cause.clone());
                Err(cause)
            }
            Err(_) => Err(self.disconnected()),
        }
    }

    /// A channel closed after an abort reports the abort cause.
    fn disconnected(&self) -> GroupError {
        self.cancel.cause().unwrap_or(GroupError::Disconnected)
    }
}

impl Collective for GroupEndpoint {
    fn rank(&self) -> usize {
        self.rank
    }

    fn workers(&self) -> usize {
        self.workers
    }

    fn gather(&mut self, block: AccuracyMatrix) -> GsResult<Option<AccuracyMatrix>> {
        if self.finished {
            return Err(GroupError::AlreadyGathered { rank: self.rank }.into());
        }
        self.finished = true;

        match &self.role {
            Role::Coordinator { inbox, releases } => {
                let buffer = self.gather_as_coordinator(inbox, releases, block)?;
                Ok(Some(AccuracyMatrix::from_flat(buffer)?))
            }
            Role::Member { outbox, release } => {
                self.gather_as_member(outbox, release, block)?;
                Ok(None)
            }
        }
    }

    fn abort(&mut self, reason: &str) {
        if self.finished {
            return;
        }
        self.finished = true;
        warn!(rank = self.rank, %reason, "aborting process group");

        let cause = GroupError::Aborted {
            rank: self.rank,
            reason: reason.to_string(),
        };
        match &self.role {
            Role::Coordinator { releases, .. } => {
                self.fail(releases, cause);
            }
            Role::Member { outbox, .. } => {
                self.cancel.cancel(cause);
                let _ = outbox.send(Envelope::Abort {
                    rank: self.rank,
                    reason: reason.to_string(),
                });
            }
        }
    }

    fn leave(&mut self) {
        if !self.finished {
            debug!(rank = self.rank, "leaving process group");
            self.finished = true;
        }
    }

    fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl Drop for GroupEndpoint {
    fn drop(&mut self) {
        if !self.finished {
            let reason = format!("rank {} left the group before the gather", self.rank);
            self.abort(&reason);
        }
    }
}
