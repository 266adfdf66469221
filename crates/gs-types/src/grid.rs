//! The (cost, gamma) search grid and the accuracy matrix laid over it.

use serde::{Deserialize, Serialize};

use crate::errors::GsResult;

/// Number of values on each grid axis.
pub const GRID_SIZE: usize = 16;

/// Smallest cost value; each following value doubles it.
pub const COST_START: f64 = 0.03125;

/// Largest gamma value; each preceding value halves it.
pub const GAMMA_END: f64 = 8.0;

/// The two geometric parameter axes.
///
/// Built from fixed constants only, so every worker can rebuild an identical
/// grid locally instead of receiving it over the wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterGrid {
    pub cost: [f64; GRID_SIZE],
    pub gamma: [f64; GRID_SIZE],
}

impl ParameterGrid {
    pub fn build() -> Self {
        let mut cost = [0.0; GRID_SIZE];
        cost[0] = COST_START;
        for i in 1..GRID_SIZE {
            cost[i] = cost[i - 1] * 2.0;
        }

        let mut gamma = [0.0; GRID_SIZE];
        gamma[GRID_SIZE - 1] = GAMMA_END;
        for i in (0..GRID_SIZE - 1).rev() {
            gamma[i] = gamma[i + 1] / 2.0;
        }

        Self { cost, gamma }
    }

    /// The (cost, gamma) pair of one grid cell.
    pub fn point(&self, cost_index: usize, gamma_index: usize) -> (f64, f64) {
        (self.cost[cost_index], self.gamma[gamma_index])
    }
}

impl Default for ParameterGrid {
    fn default() -> Self {
        Self::build()
    }
}

/// Row-major accuracy values, `rows x GRID_SIZE`.
///
/// The full matrix has `GRID_SIZE` rows; a worker's private block has only the
/// rows it owns, addressed relative to its first row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMatrix {
    rows: usize,
    values: Vec<f64>,
}

impl AccuracyMatrix {
    /// A zero-filled matrix with `rows` rows.
    pub fn zeros(rows: usize) -> Self {
        Self {
            rows,
            values: vec![0.0; rows * GRID_SIZE],
        }
    }

    /// A zero-filled full `GRID_SIZE x GRID_SIZE` matrix.
    pub fn full() -> Self {
        Self::zeros(GRID_SIZE)
    }

    /// Wrap a flat row-major buffer. Its length must be a whole number of rows.
    pub fn from_flat(values: Vec<f64>) -> GsResult<Self> {
        if values.len() % GRID_SIZE != 0 {
            return Err(crate::validation_error!(
                "{} values do not form whole rows of {}",
                values.len(),
                GRID_SIZE
            ));
        }
        Ok(Self {
            rows: values.len() / GRID_SIZE,
            values,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * GRID_SIZE + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * GRID_SIZE + col] = value;
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * GRID_SIZE..(row + 1) * GRID_SIZE]
    }

    /// Iterate rows as slices, top to bottom.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.values.chunks_exact(GRID_SIZE)
    }

    /// Mutable row slices, for index-addressed filling.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, f64> {
        self.values.chunks_exact_mut(GRID_SIZE)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn into_flat(self) -> Vec<f64> {
        self.values
    }
}

/// Indices of the winning grid cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BestPoint {
    pub cost_index: usize,
    pub gamma_index: usize,
}

impl BestPoint {
    pub fn new(cost_index: usize, gamma_index: usize) -> Self {
        Self {
            cost_index,
            gamma_index,
        }
    }
}

impl std::fmt::Display for BestPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.cost_index, self.gamma_index)
    }
}
