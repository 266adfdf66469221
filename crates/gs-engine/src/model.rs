//! Trained multi-class models and their on-disk form.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use gs_types::{EngineError, GsResult, Problem, SparseVector, SvmParameter};

use crate::kernel::Kernel;
use crate::solver::{self, SolverConfig};

/// One-vs-one decision function between two classes.
///
/// A positive decision value votes for `positive`, anything else for
/// `negative`. Both are indices into [`SvmModel::classes`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairModel {
    pub positive: usize,
    pub negative: usize,
    pub support_vectors: Vec<SparseVector>,
    /// `alpha_i * y_i` for each support vector.
    pub coefficients: Vec<f64>,
}

impl PairModel {
    fn decision(&self, kernel: &Kernel, x: &SparseVector) -> f64 {
        self.support_vectors
            .iter()
            .zip(&self.coefficients)
            .map(|(sv, coef)| coef * (kernel.eval(sv, x) + 1.0))
            .sum()
    }
}

/// A trained C-SVC model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmModel {
    pub params: SvmParameter,
    /// Class labels in order of first appearance in the training set.
    pub classes: Vec<f64>,
    pub pairs: Vec<PairModel>,
    pub trained_at: DateTime<Utc>,
}

impl SvmModel {
    /// Train one binary machine per class pair.
    pub fn train(problem: &Problem, params: &SvmParameter) -> GsResult<Self> {
        if problem.is_empty() {
            return Err(EngineError::EmptyTrainingSet.into());
        }

        let mut classes: Vec<f64> = Vec::new();
        let mut class_of = Vec::with_capacity(problem.len());
        for &label in &problem.labels {
            let idx = match classes.iter().position(|&c| c == label) {
                Some(idx) => idx,
                None => {
                    classes.push(label);
                    classes.len() - 1
                }
            };
            class_of.push(idx);
        }

        let kernel = Kernel::new(params);
        let config = SolverConfig::from_params(params);

        let mut pairs = Vec::new();
        for positive in 0..classes.len() {
            for negative in positive + 1..classes.len() {
                let members: Vec<usize> = (0..problem.len())
                    .filter(|&i| class_of[i] == positive || class_of[i] == negative)
                    .collect();
                let instances: Vec<&SparseVector> =
                    members.iter().map(|&i| &problem.instances[i]).collect();
                let labels: Vec<f64> = members
                    .iter()
                    .map(|&i| if class_of[i] == positive { 1.0 } else { -1.0 })
                    .collect();

                let solution = solver::solve(&instances, &labels, &kernel, config);

                let mut support_vectors = Vec::new();
                let mut coefficients = Vec::new();
                for (k, &alpha) in solution.alpha.iter().enumerate() {
                    if alpha > 0.0 {
                        support_vectors.push(instances[k].clone());
                        coefficients.push(alpha * labels[k]);
                    }
                }
                debug!(
                    positive = classes[positive],
                    negative = classes[negative],
                    support_vectors = support_vectors.len(),
                    iterations = solution.iterations,
                    "trained pair"
                );

                pairs.push(PairModel {
                    positive,
                    negative,
                    support_vectors,
                    coefficients,
                });
            }
        }

        Ok(Self {
            params: *params,
            classes,
            pairs,
            trained_at: Utc::now(),
        })
    }

    /// Predict a label by one-vs-one voting. Ties go to the earlier class.
    pub fn predict(&self, x: &SparseVector) -> f64 {
        let kernel = Kernel::new(&self.params);
        let mut votes = vec![0usize; self.classes.len()];
        for pair in &self.pairs {
            if pair.decision(&kernel, x) > 0.0 {
                votes[pair.positive] += 1;
            } else {
                votes[pair.negative] += 1;
            }
        }

        let mut best = 0;
        for (idx, &count) in votes.iter().enumerate() {
            if count > votes[best] {
                best = idx;
            }
        }
        self.classes[best]
    }

    pub fn total_support_vectors(&self) -> usize {
        self.pairs.iter().map(|p| p.support_vectors.len()).sum()
    }

    /// Write the model as JSON, replacing any existing file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> GsResult<()> {
        let path = path.as_ref();
        let save_failed = |message: String| EngineError::SaveFailed {
            path: path.display().to_string(),
            message,
        };

        let file = File::create(path).map_err(|e| save_failed(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| save_failed(e.to_string()))?;
        writer.flush().map_err(|e| save_failed(e.to_string()))?;

        info!(
            path = %path.display(),
            classes = self.classes.len(),
            support_vectors = self.total_support_vectors(),
            "model saved"
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> GsResult<Self> {
        let path = path.as_ref();
        let load_failed = |message: String| EngineError::LoadFailed {
            path: path.display().to_string(),
            message,
        };

        let file = File::open(path).map_err(|e| load_failed(e.to_string()))?;
        let model: SvmModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| load_failed(e.to_string()))?;
        if model.classes.is_empty() {
            return Err(EngineError::EmptyModel.into());
        }
        Ok(model)
    }
}
