//! Scripted learning engine for scheduler tests.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use gs_types::{
    validation_error, EngineError, GsResult, ModelPersister, ParameterGrid, Problem, Scorer,
    SvmParameter, Trainer,
};

/// The cell [`StubEngine::peaked`] scores highest.
pub const TARGET: (usize, usize) = (5, 9);

enum Script {
    Peaked,
    Constant(f64),
    FailOnRow(usize),
}

/// Scores cells from a fixed script and records what it was asked to do.
pub struct StubEngine {
    grid: ParameterGrid,
    script: Script,
    fail_persist: bool,
    evaluations: AtomicUsize,
    trained: Mutex<Vec<SvmParameter>>,
}

impl StubEngine {
    fn with_script(script: Script) -> Self {
        Self {
            grid: ParameterGrid::build(),
            script,
            fail_persist: false,
            evaluations: AtomicUsize::new(0),
            trained: Mutex::new(Vec::new()),
        }
    }

    /// 100 at [`TARGET`], 10 everywhere else.
    pub fn peaked() -> Self {
        Self::with_script(Script::Peaked)
    }

    pub fn constant(value: f64) -> Self {
        Self::with_script(Script::Constant(value))
    }

    /// Errors on every cell of cost row `row`, scores 10 elsewhere.
    pub fn failing_on_row(row: usize) -> Self {
        Self::with_script(Script::FailOnRow(row))
    }

    pub fn with_failing_persist(mut self) -> Self {
        self.fail_persist = true;
        self
    }

    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::SeqCst)
    }

    pub fn trained(&self) -> Vec<SvmParameter> {
        self.trained.lock().clone()
    }

    fn cell_of(&self, params: &SvmParameter) -> (usize, usize) {
        let i = self.grid.cost.iter().position(|&c| c == params.cost);
        let j = self.grid.gamma.iter().position(|&g| g == params.gamma);
        (i.unwrap_or(usize::MAX), j.unwrap_or(usize::MAX))
    }
}

impl Scorer for StubEngine {
    fn cross_validate(&self, _problem: &Problem, params: &SvmParameter) -> GsResult<f64> {
        self.evaluations.fetch_add(1, Ordering::SeqCst);
        let cell = self.cell_of(params);
        match self.script {
            Script::Peaked if cell == TARGET => Ok(100.0),
            Script::Peaked => Ok(10.0),
            Script::Constant(value) => Ok(value),
            Script::FailOnRow(row) if cell.0 == row => {
                Err(validation_error!("scripted failure at row {row}"))
            }
            Script::FailOnRow(_) => Ok(10.0),
        }
    }
}

impl Trainer for StubEngine {
    type Model = SvmParameter;

    fn train(&self, _problem: &Problem, params: &SvmParameter) -> GsResult<SvmParameter> {
        self.trained.lock().push(*params);
        Ok(*params)
    }
}

impl ModelPersister<SvmParameter> for StubEngine {
    fn persist(&self, model: &SvmParameter, path: &Path) -> GsResult<()> {
        if self.fail_persist {
            return Err(EngineError::SaveFailed {
                path: path.display().to_string(),
                message: "scripted failure".into(),
            }
            .into());
        }
        std::fs::write(path, serde_json::to_vec(model)?)?;
        Ok(())
    }
}
