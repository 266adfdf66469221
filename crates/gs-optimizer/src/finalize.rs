//! Coordinator-only tail of the sweep: diagnostics, selection, final model.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use gs_types::{
    AccuracyMatrix, GsResult, ModelPersister, ParameterGrid, Problem, SvmParameter, Trainer,
};

use crate::select::{select_best, Selection};

/// Significant digits of `%g`.
const GENERAL_PRECISION: usize = 6;

/// Format like C's `%g`: six significant digits, trailing zeros dropped,
/// scientific notation for exponents below -4 or from 6 up.
pub fn format_general(value: f64) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    // Round to the target precision first; rounding can carry into the
    // exponent (9.999995 -> 1e+01).
    let scientific = format!("{:.*e}", GENERAL_PRECISION - 1, value);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= GENERAL_PRECISION as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!(
            "{}e{}{:02}",
            trim_fraction(mantissa),
            sign,
            exponent.unsigned_abs()
        )
    } else {
        let decimals = (GENERAL_PRECISION as i32 - 1 - exponent) as usize;
        trim_fraction(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// The diagnostic grid text: one line per cost row, each value followed by
/// a space.
pub fn render_accuracy_grid(matrix: &AccuracyMatrix) -> String {
    let mut out = String::new();
    for row in matrix.iter_rows() {
        for &value in row {
            out.push_str(&format_general(value));
            out.push(' ');
        }
        out.push('\n');
    }
    out
}

/// Truncate-and-write the diagnostic grid.
pub fn write_accuracy_grid(path: &Path, matrix: &AccuracyMatrix) -> io::Result<()> {
    fs::write(path, render_accuracy_grid(matrix))
}

/// Where the coordinator writes its outputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub model: PathBuf,
    pub accuracy_grid: PathBuf,
}

/// What the coordinator did after the gather.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalReport {
    pub selection: Selection,
    pub cost: f64,
    pub gamma: f64,
    pub grid_written: bool,
}

/// Trains and persists the winning configuration on the whole problem.
pub struct Finalizer<'a, E: ?Sized> {
    engine: &'a E,
    problem: &'a Problem,
    base: SvmParameter,
    paths: &'a OutputPaths,
}

impl<'a, E> Finalizer<'a, E>
where
    E: Trainer + ModelPersister<<E as Trainer>::Model> + ?Sized,
{
    pub fn new(
        engine: &'a E,
        problem: &'a Problem,
        base: SvmParameter,
        paths: &'a OutputPaths,
    ) -> Self {
        Self {
            engine,
            problem,
            base,
            paths,
        }
    }

    /// Write diagnostics, select, train, persist. Only the persist step and
    /// training itself are fatal.
    pub fn finalize(&self, matrix: &AccuracyMatrix, grid: &ParameterGrid) -> GsResult<FinalReport> {
        let grid_written = match write_accuracy_grid(&self.paths.accuracy_grid, matrix) {
            Ok(()) => true,
            Err(e) => {
                warn!(
                    path = %self.paths.accuracy_grid.display(),
                    error = %e,
                    "skipping accuracy grid"
                );
                false
            }
        };

        let selection = select_best(matrix);
        let point = selection.point();
        if !selection.is_found() {
            warn!("no grid cell scored above zero; training with the first cell");
        }

        let (cost, gamma) = grid.point(point.cost_index, point.gamma_index);
        info!(
            best = %point,
            cost,
            gamma,
            accuracy = selection.accuracy(),
            "training final model"
        );

        let params = self.base.with_cost_gamma(cost, gamma);
        let model = self.engine.train(self.problem, &params)?;
        if let Err(e) = self.engine.persist(&model, &self.paths.model) {
            error!(path = %self.paths.model.display(), error = %e, "model not saved");
            return Err(e);
        }

        Ok(FinalReport {
            selection,
            cost,
            gamma,
            grid_written,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn general_format_matches_printf() {
        assert_eq!(format_general(100.0), "100");
        assert_eq!(format_general(10.0), "10");
        assert_eq!(format_general(0.0), "0");
        assert_eq!(format_general(66.66666666), "66.6667");
        assert_eq!(format_general(0.03125), "0.03125");
        assert_eq!(format_general(0.0001), "0.0001");
        assert_eq!(format_general(0.00001), "1e-05");
        assert_eq!(format_general(123456.0), "123456");
        assert_eq!(format_general(1234567.0), "1.23457e+06");
        assert_eq!(format_general(9.9999996), "10");
        assert_eq!(format_general(-2.5), "-2.5");
    }

    #[test]
    fn grid_text_has_sixteen_lines_of_sixteen_values() {
        let mut m = AccuracyMatrix::full();
        m.set(5, 9, 100.0);
        let text = render_accuracy_grid(&m);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 16);
        for (i, line) in lines.iter().enumerate() {
            let values: Vec<&str> = line.split_whitespace().collect();
            assert_eq!(values.len(), 16);
            for (j, v) in values.iter().enumerate() {
                let expected = if (i, j) == (5, 9) { "100" } else { "0" };
                assert_eq!(*v, expected);
            }
        }
    }

    #[test]
    fn rewriting_the_grid_is_byte_identical() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("AccuracyGrid");
        let mut m = AccuracyMatrix::full();
        m.set(0, 1, 66.666666);
        m.set(15, 15, 12.5);

        write_accuracy_grid(&path, &m).unwrap();
        let first = fs::read(&path).unwrap();
        write_accuracy_grid(&path, &m).unwrap();
        let second = fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn overwrite_truncates_previous_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("AccuracyGrid");
        fs::write(&path, "x".repeat(10_000)).unwrap();

        let m = AccuracyMatrix::full();
        write_accuracy_grid(&path, &m).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), render_accuracy_grid(&m));
    }
}
