//! Labelled sparse training data.

use serde::{Deserialize, Serialize};

/// One non-zero feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureNode {
    pub index: u32,
    pub value: f64,
}

/// A sparse vector with strictly ascending feature indices.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    nodes: Vec<FeatureNode>,
}

impl SparseVector {
    /// Build from nodes already sorted by ascending index.
    pub fn from_sorted(nodes: Vec<FeatureNode>) -> Self {
        debug_assert!(nodes.windows(2).all(|w| w[0].index < w[1].index));
        Self { nodes }
    }

    pub fn nodes(&self) -> &[FeatureNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_index(&self) -> Option<u32> {
        self.nodes.last().map(|n| n.index)
    }

    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (a, b) = (&self.nodes, &other.nodes);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].index.cmp(&b[j].index) {
                std::cmp::Ordering::Equal => {
                    sum += a[i].value * b[j].value;
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
            }
        }
        sum
    }

    /// Squared euclidean distance.
    pub fn distance_squared(&self, other: &SparseVector) -> f64 {
        let (a, b) = (&self.nodes, &other.nodes);
        let (mut i, mut j) = (0, 0);
        let mut sum = 0.0;
        while i < a.len() && j < b.len() {
            match a[i].index.cmp(&b[j].index) {
                std::cmp::Ordering::Equal => {
                    let d = a[i].value - b[j].value;
                    sum += d * d;
                    i += 1;
                    j += 1;
                }
                std::cmp::Ordering::Less => {
                    sum += a[i].value * a[i].value;
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    sum += b[j].value * b[j].value;
                    j += 1;
                }
            }
        }
        sum += a[i..].iter().map(|n| n.value * n.value).sum::<f64>();
        sum += b[j..].iter().map(|n| n.value * n.value).sum::<f64>();
        sum
    }
}

/// A classification dataset: one label per instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Problem {
    pub labels: Vec<f64>,
    pub instances: Vec<SparseVector>,
}

impl Problem {
    pub fn new(labels: Vec<f64>, instances: Vec<SparseVector>) -> Self {
        debug_assert_eq!(labels.len(), instances.len());
        Self { labels, instances }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Highest feature index across all instances (0 when all are empty).
    pub fn max_index(&self) -> u32 {
        self.instances
            .iter()
            .filter_map(SparseVector::max_index)
            .max()
            .unwrap_or(0)
    }

    /// A new problem holding the given instances, in the given order.
    pub fn subset(&self, indices: &[usize]) -> Problem {
        Problem {
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            instances: indices.iter().map(|&i| self.instances[i].clone()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sv(pairs: &[(u32, f64)]) -> SparseVector {
        SparseVector::from_sorted(
            pairs
                .iter()
                .map(|&(index, value)| FeatureNode { index, value })
                .collect(),
        )
    }

    #[test]
    fn dot_skips_missing_indices() {
        let a = sv(&[(1, 2.0), (3, 1.0)]);
        let b = sv(&[(2, 5.0), (3, 4.0)]);
        assert_eq!(a.dot(&b), 4.0);
    }

    #[test]
    fn distance_counts_unshared_features() {
        let a = sv(&[(1, 1.0), (4, 2.0)]);
        let b = sv(&[(2, 3.0), (4, 1.0)]);
        // 1^2 + 3^2 + (2-1)^2
        assert_eq!(a.distance_squared(&b), 11.0);
        assert_eq!(a.distance_squared(&a), 0.0);
    }

    #[test]
    fn subset_and_max_index() {
        let problem = Problem::new(
            vec![1.0, -1.0, 1.0],
            vec![sv(&[(1, 1.0)]), sv(&[(7, 1.0)]), sv(&[])],
        );
        assert_eq!(problem.max_index(), 7);

        let sub = problem.subset(&[2, 0]);
        assert_eq!(sub.labels, vec![1.0, 1.0]);
        assert!(sub.instances[0].is_empty());
        assert_eq!(sub.max_index(), 1);
    }
}
