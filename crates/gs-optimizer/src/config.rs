//! Sweep configuration from the launch environment.

use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use gs_types::{config_error, GsResult, SvmParameter};

/// Process-group size.
pub const ENV_WORKERS: &str = "GS_WORKERS";
/// Diagnostic matrix file.
pub const ENV_ACCURACY_GRID: &str = "GS_ACCURACY_GRID";
/// Cross-validation folds.
pub const ENV_FOLDS: &str = "GS_FOLDS";
/// Evaluate a rank's cells on the rayon pool.
pub const ENV_PARALLEL_CELLS: &str = "GS_PARALLEL_CELLS";
/// Fold-shuffling seed.
pub const ENV_SEED: &str = "GS_SEED";

pub const DEFAULT_ACCURACY_GRID: &str = "AccuracyGrid";

/// Settings shared by every rank of one sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub workers: usize,
    pub accuracy_grid_path: PathBuf,
    pub folds: usize,
    pub parallel_cells: bool,
    pub seed: u64,
}

impl Default for SweepConfig {
    fn default() -> Self {
        let params = SvmParameter::default();
        Self {
            workers: 1,
            accuracy_grid_path: PathBuf::from(DEFAULT_ACCURACY_GRID),
            folds: params.folds,
            parallel_cells: false,
            seed: params.seed,
        }
    }
}

impl SweepConfig {
    /// Read overrides from the process environment.
    pub fn from_env() -> GsResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> GsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_WORKERS) {
            config.workers = parse_value(ENV_WORKERS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_ACCURACY_GRID) {
            if raw.trim().is_empty() {
                return Err(config_error!("{ENV_ACCURACY_GRID} must not be empty"));
            }
            config.accuracy_grid_path = PathBuf::from(raw);
        }
        if let Some(raw) = lookup(ENV_FOLDS) {
            config.folds = parse_value(ENV_FOLDS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PARALLEL_CELLS) {
            config.parallel_cells = parse_flag(ENV_PARALLEL_CELLS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_SEED) {
            config.seed = parse_value(ENV_SEED, &raw)?;
        }

        Ok(config)
    }

    /// Base learning parameters every cell starts from.
    pub fn base_params(&self) -> SvmParameter {
        SvmParameter::default()
            .with_folds(self.folds)
            .with_seed(self.seed)
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> GsResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| config_error!("{key}: cannot parse '{raw}'"))
}

fn parse_flag(key: &str, raw: &str) -> GsResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(config_error!("{key}: expected a boolean, got '{raw}'")),
    }
}
