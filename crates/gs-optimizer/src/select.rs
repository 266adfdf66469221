//! Picking the winning grid cell.

use serde::{Deserialize, Serialize};

use gs_types::{AccuracyMatrix, BestPoint};

/// Outcome of scanning the gathered matrix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Selection {
    /// Some cell scored above zero.
    Found { point: BestPoint, accuracy: f64 },
    /// No cell scored above zero.
    Unset,
}

impl Selection {
    /// The cell to train with. `Unset` falls back to `(0, 0)`.
    pub fn point(&self) -> BestPoint {
        match self {
            Selection::Found { point, .. } => *point,
            Selection::Unset => BestPoint::default(),
        }
    }

    pub fn accuracy(&self) -> f64 {
        match self {
            Selection::Found { accuracy, .. } => *accuracy,
            Selection::Unset => 0.0,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Selection::Found { .. })
    }
}

/// Row-major scan keeping the first cell strictly above the running maximum.
///
/// The maximum starts at `0.0`, so equal later values never replace an
/// earlier winner and an all-zero matrix yields [`Selection::Unset`].
pub fn select_best(matrix: &AccuracyMatrix) -> Selection {
    let mut best = Selection::Unset;
    let mut max = 0.0;

    for (i, row) in matrix.iter_rows().enumerate() {
        for (j, &accuracy) in row.iter().enumerate() {
            if max < accuracy {
                max = accuracy;
                best = Selection::Found {
                    point: BestPoint::new(i, j),
                    accuracy,
                };
            }
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(value: f64) -> AccuracyMatrix {
        let mut m = AccuracyMatrix::full();
        m.as_mut_slice().fill(value);
        m
    }

    #[test]
    fn unique_maximum_wins() {
        let mut m = filled(50.0);
        m.set(3, 7, 91.2);

        let selection = select_best(&m);
        assert_eq!(selection.point(), BestPoint::new(3, 7));
        assert_eq!(selection.accuracy(), 91.2);
    }

    #[test]
    fn all_zero_matrix_falls_back_to_origin() {
        let selection = select_best(&AccuracyMatrix::full());
        assert_eq!(selection, Selection::Unset);
        assert_eq!(selection.point(), BestPoint::new(0, 0));
        assert!(!selection.is_found());
    }

    #[test]
    fn first_of_equal_maxima_is_kept() {
        let mut m = filled(10.0);
        m.set(2, 5, 80.0);
        m.set(2, 9, 80.0);
        m.set(11, 0, 80.0);
        assert_eq!(select_best(&m).point(), BestPoint::new(2, 5));
    }

    #[test]
    fn uniform_positive_matrix_selects_first_cell() {
        let selection = select_best(&filled(42.0));
        assert!(selection.is_found());
        assert_eq!(selection.point(), BestPoint::new(0, 0));
    }
}
