//! Thread-per-rank launcher for an in-process group.

use std::thread;

use tracing::{error, info};
use uuid::Uuid;

use gs_types::{internal_error, GsError, GsResult, ModelPersister, Problem, Scorer, Trainer};

use crate::config::SweepConfig;
use crate::driver::{Driver, RankOutcome, SweepJob, SweepOutcome};
use crate::finalize::OutputPaths;
use crate::group::{local_group, Collective};

/// Run a full sweep with `config.workers` ranks, one thread each.
///
/// Returns the coordinator's outcome. When ranks fail, the error that caused
/// the failure is preferred over the group aborts it triggered on the others.
pub fn launch<E>(
    config: &SweepConfig,
    problem: &Problem,
    engine: &E,
    model_path: &std::path::Path,
) -> GsResult<SweepOutcome>
where
    E: Scorer + Trainer + ModelPersister<<E as Trainer>::Model> + ?Sized,
{
    let run_id = Uuid::new_v4();
    let paths = OutputPaths {
        model: model_path.to_path_buf(),
        accuracy_grid: config.accuracy_grid_path.clone(),
    };
    let job = SweepJob {
        run_id,
        problem,
        engine,
        base_params: config.base_params(),
        paths: &paths,
        parallel_cells: config.parallel_cells,
    };

    let endpoints = local_group(config.workers)?;
    info!(%run_id, workers = config.workers, instances = problem.len(), "launching sweep");

    let results: Vec<GsResult<RankOutcome>> = thread::scope(|scope| {
        let mut handles = Vec::with_capacity(endpoints.len());
        for mut endpoint in endpoints {
            let job = &job;
            let rank = endpoint.rank();
            let handle = thread::Builder::new()
                .name(format!("rank-{rank}"))
                .spawn_scoped(scope, move || Driver::new(job).run(&mut endpoint));
            handles.push(handle);
        }

        handles
            .into_iter()
            .enumerate()
            .map(|(rank, handle)| match handle {
                Ok(handle) => handle
                    .join()
                    .unwrap_or_else(|_| Err(internal_error!("rank {rank} panicked"))),
                Err(e) => Err(internal_error!("failed to spawn rank {rank}: {e}")),
            })
            .collect()
    });

    collect_outcome(results)
}

fn collect_outcome(results: Vec<GsResult<RankOutcome>>) -> GsResult<SweepOutcome> {
    let mut outcome = None;
    let mut root_cause: Option<GsError> = None;

    for (rank, result) in results.into_iter().enumerate() {
        match result {
            Ok(RankOutcome::Coordinator(o)) => outcome = Some(*o),
            Ok(RankOutcome::Worker { .. }) => {}
            Err(e) => {
                error!(rank, error = %e, "rank failed");
                let replace = match &root_cause {
                    None => true,
                    Some(GsError::Group(_)) => !matches!(e, GsError::Group(_)),
                    Some(_) => false,
                };
                if replace {
                    root_cause = Some(e);
                }
            }
        }
    }

    match (root_cause, outcome) {
        (Some(e), _) => Err(e),
        (None, Some(outcome)) => Ok(outcome),
        (None, None) => Err(internal_error!("coordinator finished without an outcome")),
    }
}
