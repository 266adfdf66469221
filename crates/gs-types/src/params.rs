//! Learning parameters handed to the scorer and the final trainer.

use serde::{Deserialize, Serialize};

use crate::errors::ParameterError;

/// Kernel function family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelType {
    Linear,
    Polynomial,
    Rbf,
    Sigmoid,
}

impl Default for KernelType {
    fn default() -> Self {
        Self::Rbf
    }
}

/// Immutable C-SVC configuration.
///
/// The sweep never mutates a shared instance: each cell gets its own value
/// from [`SvmParameter::with_cost_gamma`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvmParameter {
    pub kernel: KernelType,
    /// Polynomial degree.
    pub degree: i32,
    pub gamma: f64,
    pub coef0: f64,
    /// Penalty `C`.
    pub cost: f64,
    /// Stopping tolerance on the projected gradient.
    pub eps: f64,
    /// Kernel row cache per binary solve, in MB.
    pub cache_size: f64,
    /// Upper bound on solver sweeps over the training set.
    pub max_iterations: usize,
    /// Fold count for cross-validation.
    pub folds: usize,
    /// Seed for fold assignment; identical on every worker.
    pub seed: u64,
}

impl Default for SvmParameter {
    fn default() -> Self {
        Self {
            kernel: KernelType::Rbf,
            degree: 3,
            gamma: 0.0,
            coef0: 0.0,
            cost: 1.0,
            eps: 1e-3,
            cache_size: 100.0,
            max_iterations: 1000,
            folds: 2,
            seed: 1,
        }
    }
}

impl SvmParameter {
    /// A copy of `self` evaluated at one grid cell.
    pub fn with_cost_gamma(&self, cost: f64, gamma: f64) -> Self {
        Self {
            cost,
            gamma,
            ..*self
        }
    }

    pub fn with_folds(self, folds: usize) -> Self {
        Self { folds, ..self }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self { seed, ..self }
    }

    /// Reject parameter values the solver cannot work with.
    pub fn check(&self) -> Result<(), ParameterError> {
        if !(self.cost > 0.0) {
            return Err(ParameterError::NonPositiveCost(self.cost));
        }
        if !(self.gamma >= 0.0) {
            return Err(ParameterError::NegativeGamma(self.gamma));
        }
        if !(self.eps > 0.0) {
            return Err(ParameterError::NonPositiveEps(self.eps));
        }
        if !(self.cache_size > 0.0) {
            return Err(ParameterError::NonPositiveCacheSize(self.cache_size));
        }
        if self.kernel == KernelType::Polynomial && self.degree < 0 {
            return Err(ParameterError::NegativeDegree(self.degree));
        }
        if self.max_iterations == 0 {
            return Err(ParameterError::NoIterations);
        }
        if self.folds < 2 {
            return Err(ParameterError::TooFewFolds(self.folds));
        }
        Ok(())
    }
}
