//! Kernel functions over sparse vectors.

use gs_types::{KernelType, SparseVector, SvmParameter};

/// A kernel function with its parameters bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Kernel {
    kind: KernelType,
    degree: i32,
    gamma: f64,
    coef0: f64,
}

impl Kernel {
    pub fn new(params: &SvmParameter) -> Self {
        Self {
            kind: params.kernel,
            degree: params.degree,
            gamma: params.gamma,
            coef0: params.coef0,
        }
    }

    pub fn eval(&self, a: &SparseVector, b: &SparseVector) -> f64 {
        match self.kind {
            KernelType::Linear => a.dot(b),
            KernelType::Polynomial => (self.gamma * a.dot(b) + self.coef0).powi(self.degree),
            KernelType::Rbf => (-self.gamma * a.distance_squared(b)).exp(),
            KernelType::Sigmoid => (self.gamma * a.dot(b) + self.coef0).tanh(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gs_types::FeatureNode;

    fn sv(pairs: &[(u32, f64)]) -> SparseVector {
        SparseVector::from_sorted(
            pairs
                .iter()
                .map(|&(index, value)| FeatureNode { index, value })
                .collect(),
        )
    }

    #[test]
    fn rbf_is_one_on_identical_vectors() {
        let kernel = Kernel::new(&SvmParameter::default().with_cost_gamma(1.0, 0.5));
        let x = sv(&[(1, 0.3), (2, -0.7)]);
        assert_eq!(kernel.eval(&x, &x), 1.0);

        let y = sv(&[(1, 1.3), (2, -0.7)]);
        assert!((kernel.eval(&x, &y) - (-0.5f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn polynomial_and_linear() {
        let params = SvmParameter {
            kernel: KernelType::Polynomial,
            degree: 2,
            gamma: 1.0,
            coef0: 1.0,
            ..SvmParameter::default()
        };
        let a = sv(&[(1, 1.0), (2, 2.0)]);
        let b = sv(&[(1, 3.0), (2, 1.0)]);
        assert_eq!(Kernel::new(&params).eval(&a, &b), 36.0);

        let linear = SvmParameter {
            kernel: KernelType::Linear,
            ..params
        };
        assert_eq!(Kernel::new(&linear).eval(&a, &b), 5.0);
    }
}
