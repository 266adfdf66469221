//! Static row partitioning of the cost axis.
//!
//! The gather layout depends on this scheme: rank `r` owns one contiguous run
//! of rows, ranks ascend with row index, and every block has the same size.
//! [`block_offset`] is the single place that maps a rank to its position in
//! the gathered buffer.

use serde::{Deserialize, Serialize};

use gs_types::{TopologyError, GRID_SIZE};

/// Reject group sizes the static partition cannot cover exactly.
pub fn validate_topology(workers: usize) -> Result<(), TopologyError> {
    if workers == 0 {
        return Err(TopologyError::NoWorkers);
    }
    if workers > GRID_SIZE {
        return Err(TopologyError::TooManyWorkers {
            workers,
            rows: GRID_SIZE,
        });
    }
    if GRID_SIZE % workers != 0 {
        return Err(TopologyError::UnevenPartition {
            workers,
            rows: GRID_SIZE,
        });
    }
    Ok(())
}

/// Cost rows owned by each worker.
pub fn rows_per_worker(workers: usize) -> usize {
    GRID_SIZE / workers
}

/// Number of values in one worker's block.
pub fn block_len(workers: usize) -> usize {
    rows_per_worker(workers) * GRID_SIZE
}

/// Position of `rank`'s block inside the gathered row-major buffer.
pub fn block_offset(rank: usize, workers: usize) -> usize {
    rank * block_len(workers)
}

/// The half-open cost-row range `[start, end)` owned by one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkAssignment {
    pub rank: usize,
    pub workers: usize,
    pub start: usize,
    pub end: usize,
}

impl WorkAssignment {
    /// Validate the topology and compute `rank`'s rows.
    pub fn for_rank(rank: usize, workers: usize) -> Result<Self, TopologyError> {
        validate_topology(workers)?;
        if rank >= workers {
            return Err(TopologyError::RankOutOfRange { rank, workers });
        }

        let rows = rows_per_worker(workers);
        Ok(Self {
            rank,
            workers,
            start: rank * rows,
            end: (rank + 1) * rows,
        })
    }

    pub fn rows(&self) -> usize {
        self.end - self.start
    }
}
