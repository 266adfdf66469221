use std::path::Path;
use std::process::ExitCode;

use tracing::info;
use tracing_subscriber::EnvFilter;

use gs_data::ProblemLoader;
use gs_engine::SvmEngine;
use gs_optimizer::{launch, SweepConfig};

const USAGE: &str = "Usage: gs-train training_set_file model_file";

fn main() -> ExitCode {
    let filter = match "gs_optimizer=info".parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::from_default_env(),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    }

    match run(Path::new(&args[1]), Path::new(&args[2])) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("gs-train: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(training_set: &Path, model: &Path) -> anyhow::Result<()> {
    let config = SweepConfig::from_env()?;
    let problem = ProblemLoader::new().load_file(training_set)?;
    let outcome = launch(&config, &problem, &SvmEngine, model)?;

    info!(
        run_id = %outcome.run_id,
        best = %outcome.selection.point(),
        cost = outcome.cost,
        gamma = outcome.gamma,
        model = %model.display(),
        "model saved"
    );
    Ok(())
}
