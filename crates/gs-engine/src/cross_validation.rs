//! k-fold cross-validation accuracy.

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use gs_types::{EngineError, GsResult, Problem, SvmParameter};

use crate::model::SvmModel;

/// Fold index for every instance.
///
/// The instance order is shuffled with a generator seeded from
/// `params.seed`, so every worker assigns identical folds. The fold count is
/// capped at the number of instances.
pub fn fold_assignment(len: usize, folds: usize, seed: u64) -> Vec<usize> {
    let folds = folds.min(len).max(1);
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

    let mut assignment = vec![0; len];
    for (position, &instance) in order.iter().enumerate() {
        assignment[instance] = position % folds;
    }
    assignment
}

/// Percentage of instances whose held-out prediction matches their label.
pub fn cross_validate(problem: &Problem, params: &SvmParameter) -> GsResult<f64> {
    let len = problem.len();
    if len == 0 {
        return Err(EngineError::EmptyTrainingSet.into());
    }

    let folds = params.folds.min(len);
    let assignment = fold_assignment(len, folds, params.seed);

    let mut correct = 0usize;
    for fold in 0..folds {
        let (test, train): (Vec<usize>, Vec<usize>) =
            (0..len).partition(|&i| assignment[i] == fold);

        let model = SvmModel::train(&problem.subset(&train), params)?;
        correct += test
            .iter()
            .filter(|&&i| model.predict(&problem.instances[i]) == problem.labels[i])
            .count();
    }

    Ok(100.0 * correct as f64 / len as f64)
}
