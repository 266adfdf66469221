//! Per-rank evaluation of the owned grid rows.

use rayon::prelude::*;
use tracing::{debug, info};

use gs_types::{
    validation_error, AccuracyMatrix, GsResult, ParameterGrid, Problem, Scorer, SvmParameter,
    GRID_SIZE,
};

use crate::group::CancellationToken;
use crate::partition::WorkAssignment;

/// Scores single grid cells against the shared problem.
pub struct Evaluator<'a, S: ?Sized> {
    scorer: &'a S,
    problem: &'a Problem,
    grid: &'a ParameterGrid,
    base: SvmParameter,
}

impl<'a, S: Scorer + ?Sized> Evaluator<'a, S> {
    pub fn new(
        scorer: &'a S,
        problem: &'a Problem,
        grid: &'a ParameterGrid,
        base: SvmParameter,
    ) -> Self {
        Self {
            scorer,
            problem,
            grid,
            base,
        }
    }

    /// Cross-validation accuracy at `(cost[row], gamma[col])`.
    pub fn evaluate(&self, row: usize, col: usize) -> GsResult<f64> {
        let (cost, gamma) = self.grid.point(row, col);
        let params = self.base.with_cost_gamma(cost, gamma);
        debug!(cost, gamma, "evaluating cell");

        let accuracy = self.scorer.cross_validate(self.problem, &params)?;
        if !(0.0..=100.0).contains(&accuracy) {
            return Err(validation_error!(
                "accuracy {accuracy} at cost={cost}, gamma={gamma} is outside [0, 100]"
            ));
        }
        Ok(accuracy)
    }
}

/// Fills one rank's block, row by row, column by column.
pub struct WorkerLoop<'a, S: ?Sized> {
    evaluator: Evaluator<'a, S>,
    parallel_cells: bool,
}

impl<'a, S: Scorer + ?Sized> WorkerLoop<'a, S> {
    pub fn new(evaluator: Evaluator<'a, S>) -> Self {
        Self {
            evaluator,
            parallel_cells: false,
        }
    }

    /// Evaluate the block's cells on the rayon pool instead of in order.
    pub fn with_parallel_cells(mut self, enabled: bool) -> Self {
        self.parallel_cells = enabled;
        self
    }

    /// Evaluate every column of every owned row into a fresh block.
    ///
    /// Local row `k` holds global row `assignment.start + k`. Stops at the
    /// next cell once `cancel` is raised.
    pub fn run(
        &self,
        assignment: &WorkAssignment,
        cancel: &CancellationToken,
    ) -> GsResult<AccuracyMatrix> {
        info!(
            rank = assignment.rank,
            start = assignment.start,
            end = assignment.end,
            parallel = self.parallel_cells,
            "evaluating rows"
        );

        let mut block = AccuracyMatrix::zeros(assignment.rows());
        let cell = |local: usize, col: usize| -> GsResult<f64> {
            cancel.check()?;
            self.evaluator.evaluate(assignment.start + local, col)
        };

        if self.parallel_cells {
            block
                .as_mut_slice()
                .par_iter_mut()
                .enumerate()
                .try_for_each(|(k, slot)| {
                    *slot = cell(k / GRID_SIZE, k % GRID_SIZE)?;
                    Ok::<(), gs_types::GsError>(())
                })?;
        } else {
            for (local, row) in block.rows_mut().enumerate() {
                for (col, slot) in row.iter_mut().enumerate() {
                    *slot = cell(local, col)?;
                }
            }
        }

        Ok(block)
    }
}
