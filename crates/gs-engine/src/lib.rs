//! # gs-engine
//!
//! Default learning engine for the grid search: kernel C-SVC training,
//! k-fold cross-validation scoring, and JSON model persistence.
//!
//! [`SvmEngine`] implements the [`Scorer`], [`Trainer`] and
//! [`ModelPersister`] seams the scheduler is written against.

pub mod cross_validation;
pub mod kernel;
pub mod model;
pub mod solver;

use std::path::Path;

use gs_types::{GsResult, ModelPersister, Problem, Scorer, SvmParameter, Trainer};

pub use kernel::Kernel;
pub use model::{PairModel, SvmModel};

/// Stateless engine; all configuration travels in [`SvmParameter`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SvmEngine;

impl SvmEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Scorer for SvmEngine {
    fn cross_validate(&self, problem: &Problem, params: &SvmParameter) -> GsResult<f64> {
        params.check()?;
        cross_validation::cross_validate(problem, params)
    }
}

impl Trainer for SvmEngine {
    type Model = SvmModel;

    fn train(&self, problem: &Problem, params: &SvmParameter) -> GsResult<SvmModel> {
        params.check()?;
        SvmModel::train(problem, params)
    }
}

impl ModelPersister<SvmModel> for SvmEngine {
    fn persist(&self, model: &SvmModel, path: &Path) -> GsResult<()> {
        model.save(path)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use gs_types::{FeatureNode, GsError, SparseVector};

    /// `n` points around (1, 1) labelled +1 interleaved with `n` points
    /// around (-1, -1) labelled -1.
    pub(crate) fn two_clusters(n: usize) -> Problem {
        let mut labels = Vec::new();
        let mut instances = Vec::new();
        for k in 0..n {
            let dx = 0.05 * k as f64;
            let dy = 0.03 * k as f64;
            for (label, sign) in [(1.0, 1.0), (-1.0, -1.0)] {
                labels.push(label);
                instances.push(SparseVector::from_sorted(vec![
                    FeatureNode {
                        index: 1,
                        value: sign * (1.0 + dx),
                    },
                    FeatureNode {
                        index: 2,
                        value: sign * (1.0 - dy),
                    },
                ]));
            }
        }
        Problem::new(labels, instances)
    }

    #[test]
    fn scorer_rejects_invalid_parameters() {
        let engine = SvmEngine::new();
        let params = SvmParameter::default().with_cost_gamma(-1.0, 0.5);
        let err = engine.cross_validate(&two_clusters(4), &params).unwrap_err();
        assert!(matches!(err, GsError::Parameter(_)));
    }

    #[test]
    fn trainer_and_persister_work_together() {
        let engine = SvmEngine::new();
        let params = SvmParameter::default().with_cost_gamma(1.0, 0.5);
        let model = engine.train(&two_clusters(6), &params).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.model");
        engine.persist(&model, &path).unwrap();
        assert!(path.exists());
    }
}
