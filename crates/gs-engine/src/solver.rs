//! Binary C-SVC by dual coordinate descent.
//!
//! The bias term is folded into the kernel (`K(x, y) + 1`), which removes the
//! equality constraint of the dual and lets each coordinate be updated in
//! closed form with a box clamp to `[0, C]`. Only the diagonal is kept for
//! every instance; full rows go through a bounded cache.

use rayon::prelude::*;
use tracing::debug;

use gs_types::{SparseVector, SvmParameter};

use crate::kernel::Kernel;

/// Dual variables of a solved binary problem.
#[derive(Debug, Clone)]
pub struct BinarySolution {
    pub alpha: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Solver settings for one binary sub-problem
#[derive(Debug, Clone, Copy)]
pub struct SolverConfig {
    pub cost: f64,
    pub eps: f64,
    pub max_iterations: usize,
    /// Upper bound on kernel rows held in memory, in bytes.
    pub cache_bytes: usize,
}

impl SolverConfig {
    pub fn from_params(params: &SvmParameter) -> Self {
        Self {
            cost: params.cost,
            eps: params.eps,
            max_iterations: params.max_iterations,
            cache_bytes: (params.cache_size * 1024.0 * 1024.0) as usize,
        }
    }
}

/// Solve `min 1/2 a'Qa - e'a, 0 <= a <= C` with `Q_ij = y_i y_j (K_ij + 1)`.
///
/// `labels` must be `+1.0` or `-1.0`. Kernel rows are computed on demand and
/// kept in a least-recently-used cache bounded by `config.cache_bytes`.
pub fn solve(
    instances: &[&SparseVector],
    labels: &[f64],
    kernel: &Kernel,
    config: SolverConfig,
) -> BinarySolution {
    let n = instances.len();
    let diag: Vec<f64> = instances
        .iter()
        .map(|x| kernel.eval(x, x) + 1.0)
        .collect();
    let mut cache = RowCache::new(instances, kernel, config.cache_bytes);

    let mut alpha = vec![0.0; n];
    // f[i] = sum_j alpha_j y_j (K_ij + 1)
    let mut f = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iterations {
        iterations += 1;
        let mut max_violation: f64 = 0.0;

        for i in 0..n {
            let g = labels[i] * f[i] - 1.0;
            let projected = if alpha[i] <= 0.0 {
                g.min(0.0)
            } else if alpha[i] >= config.cost {
                g.max(0.0)
            } else {
                g
            };
            max_violation = max_violation.max(projected.abs());

            let q_ii = diag[i];
            if projected.abs() <= 1e-12 || q_ii <= 0.0 {
                continue;
            }

            let old = alpha[i];
            alpha[i] = (old - g / q_ii).clamp(0.0, config.cost);
            let delta = (alpha[i] - old) * labels[i];
            if delta != 0.0 {
                for (fj, k) in f.iter_mut().zip(cache.row(i)) {
                    *fj += delta * k;
                }
            }
        }

        if max_violation < config.eps {
            converged = true;
            break;
        }
    }

    debug!(
        n,
        iterations,
        converged,
        cached_rows = cache.capacity,
        rows_computed = cache.computed,
        "binary solve finished"
    );
    BinarySolution {
        alpha,
        iterations,
        converged,
    }
}

/// Least-recently-used cache of `K + 1` rows.
struct RowCache<'a> {
    instances: &'a [&'a SparseVector],
    kernel: &'a Kernel,
    rows: Vec<Option<Vec<f64>>>,
    last_used: Vec<u64>,
    resident: Vec<usize>,
    capacity: usize,
    clock: u64,
    computed: usize,
}

impl<'a> RowCache<'a> {
    /// Holds at least one row, and never more than `n`.
    fn new(instances: &'a [&'a SparseVector], kernel: &'a Kernel, cache_bytes: usize) -> Self {
        let n = instances.len();
        let row_bytes = (n * std::mem::size_of::<f64>()).max(1);
        Self {
            instances,
            kernel,
            rows: vec![None; n],
            last_used: vec![0; n],
            resident: Vec::new(),
            capacity: (cache_bytes / row_bytes).clamp(1, n.max(1)),
            clock: 0,
            computed: 0,
        }
    }

    fn row(&mut self, i: usize) -> &[f64] {
        self.clock += 1;
        self.last_used[i] = self.clock;

        if self.rows[i].is_none() {
            if self.resident.len() >= self.capacity {
                self.evict();
            }
            let (instances, kernel) = (self.instances, self.kernel);
            let x = instances[i];
            let row = instances
                .par_iter()
                .map(|y| kernel.eval(x, y) + 1.0)
                .collect();
            self.rows[i] = Some(row);
            self.resident.push(i);
            self.computed += 1;
        }
        self.rows[i].as_deref().unwrap_or_default()
    }

    fn evict(&mut self) {
        let victim = self
            .resident
            .iter()
            .enumerate()
            .min_by_key(|&(_, &row)| self.last_used[row])
            .map(|(pos, _)| pos);
        if let Some(pos) = victim {
            let row = self.resident.swap_remove(pos);
            self.rows[row] = None;
        }
    }
}
