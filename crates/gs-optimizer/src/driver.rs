//! Per-rank SPMD program: every rank runs the same steps up to the gather,
//! then only the coordinator selects and finalizes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, info_span};
use uuid::Uuid;

use gs_types::{
    AccuracyMatrix, GsResult, ModelPersister, ParameterGrid, Problem, Scorer, SvmParameter,
    Trainer,
};

use crate::finalize::{Finalizer, OutputPaths};
use crate::group::Collective;
use crate::partition::WorkAssignment;
use crate::select::Selection;
use crate::worker::{Evaluator, WorkerLoop};

/// Lifecycle of one rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriverState {
    Running,
    Done,
}

/// The coordinator's result of a completed sweep.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepOutcome {
    pub run_id: Uuid,
    pub workers: usize,
    pub selection: Selection,
    pub cost: f64,
    pub gamma: f64,
    pub matrix: AccuracyMatrix,
    pub grid_written: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// What a rank ends with.
#[derive(Debug, Clone, PartialEq)]
pub enum RankOutcome {
    Coordinator(Box<SweepOutcome>),
    Worker { rank: usize },
}

/// Inputs shared by every rank of one sweep.
pub struct SweepJob<'a, E: ?Sized> {
    pub run_id: Uuid,
    pub problem: &'a Problem,
    pub engine: &'a E,
    pub base_params: SvmParameter,
    pub paths: &'a OutputPaths,
    pub parallel_cells: bool,
}

/// Runs the sweep for one rank.
pub struct Driver<'a, E: ?Sized> {
    job: &'a SweepJob<'a, E>,
    state: DriverState,
}

impl<'a, E> Driver<'a, E>
where
    E: Scorer + Trainer + ModelPersister<<E as Trainer>::Model> + ?Sized,
{
    pub fn new(job: &'a SweepJob<'a, E>) -> Self {
        Self {
            job,
            state: DriverState::Running,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Partition, evaluate, gather, and on the coordinator finalize.
    ///
    /// Topology errors are detected identically by every rank, which then
    /// leaves the group without aborting it. Any other failure before the gather aborts
    /// the whole group so no peer blocks on it.
    pub fn run<C: Collective>(&mut self, group: &mut C) -> GsResult<RankOutcome> {
        let rank = group.rank();
        let workers = group.workers();
        let span = info_span!("rank", rank, run_id = %self.job.run_id);
        let _enter = span.enter();
        let started_at = Utc::now();

        let assignment = match WorkAssignment::for_rank(rank, workers) {
            Ok(assignment) => assignment,
            Err(e) => {
                group.leave();
                return Err(e.into());
            }
        };

        if let Err(e) = self.job.base_params.check() {
            group.abort(&e.to_string());
            return Err(e.into());
        }

        let grid = ParameterGrid::build();
        let evaluator = Evaluator::new(
            self.job.engine,
            self.job.problem,
            &grid,
            self.job.base_params,
        );
        let block = WorkerLoop::new(evaluator)
            .with_parallel_cells(self.job.parallel_cells)
            .run(&assignment, group.cancellation());

        let block = match block {
            Ok(block) => block,
            Err(e) => {
                if !group.is_cancelled() {
                    group.abort(&e.to_string());
                }
                return Err(e);
            }
        };

        let gathered = group.gather(block)?;
        let Some(matrix) = gathered else {
            info!("block delivered, worker done");
            self.state = DriverState::Done;
            return Ok(RankOutcome::Worker { rank });
        };

        let report = Finalizer::new(
            self.job.engine,
            self.job.problem,
            self.job.base_params,
            self.job.paths,
        )
        .finalize(&matrix, &grid)?;

        self.state = DriverState::Done;
        info!(
            best = %report.selection.point(),
            accuracy = report.selection.accuracy(),
            "sweep finished"
        );

        Ok(RankOutcome::Coordinator(Box::new(SweepOutcome {
            run_id: self.job.run_id,
            workers,
            selection: report.selection,
            cost: report.cost,
            gamma: report.gamma,
            matrix,
            grid_written: report.grid_written,
            started_at,
            finished_at: Utc::now(),
        })))
    }
}
