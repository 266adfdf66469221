//! Seams between the grid-search scheduler and the learning engine.

use std::path::Path;

use crate::errors::GsResult;
use crate::params::SvmParameter;
use crate::problem::Problem;

/// Scores one parameter configuration by cross-validation.
///
/// This is the expensive call of the whole sweep. Implementations must be
/// deterministic for a given problem and parameter value, and are shared
/// across worker threads.
pub trait Scorer: Send + Sync {
    /// Accuracy in percent, within `[0, 100]`.
    fn cross_validate(&self, problem: &Problem, params: &SvmParameter) -> GsResult<f64>;
}

/// Trains the final model on the whole problem.
pub trait Trainer: Send + Sync {
    type Model: Send;

    fn train(&self, problem: &Problem, params: &SvmParameter) -> GsResult<Self::Model>;
}

/// Writes a trained model to durable storage.
pub trait ModelPersister<M>: Send + Sync {
    fn persist(&self, model: &M, path: &Path) -> GsResult<()>;
}
