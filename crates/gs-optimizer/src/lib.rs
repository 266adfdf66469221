//! # gs-optimizer
//!
//! Distributed grid search over the (cost, gamma) plane.
//!
//! Every rank of a fixed-size group rebuilds the same 16x16 grid, evaluates
//! its contiguous block of cost rows by cross-validation, and contributes
//! the block to a single gather at the coordinator. The coordinator writes
//! the accuracy grid, picks the best cell and trains the final model on the
//! full dataset.

pub mod config;
pub mod driver;
pub mod finalize;
pub mod group;
pub mod launcher;
pub mod partition;
pub mod select;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SweepConfig;
pub use driver::{Driver, DriverState, RankOutcome, SweepJob, SweepOutcome};
pub use finalize::{
    format_general, render_accuracy_grid, write_accuracy_grid, FinalReport, Finalizer,
    OutputPaths,
};
pub use group::{local_group, CancellationToken, Collective, GroupEndpoint, COORDINATOR};
pub use launcher::launch;
pub use partition::{block_len, block_offset, rows_per_worker, validate_topology, WorkAssignment};
pub use select::{select_best, Selection};
pub use worker::{Evaluator, WorkerLoop};
