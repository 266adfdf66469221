use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::tempdir;

const USAGE: &str = "Usage: gs-train training_set_file model_file";

fn gs_train(args: &[&str], grid: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_gs-train"))
        .args(args)
        .env("RUST_LOG", "off")
        .env("GS_ACCURACY_GRID", grid)
        .env_remove("GS_WORKERS")
        .output()
        .expect("failed to run gs-train")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn wrong_argument_count_prints_usage() {
    let dir = tempdir().unwrap();
    let grid = dir.path().join("AccuracyGrid");

    let cases: [&[&str]; 3] = [&[], &["data.txt"], &["a", "b", "c"]];
    for args in cases {
        let output = gs_train(args, &grid);
        assert_eq!(output.status.code(), Some(1), "args {args:?}");
        assert!(stderr_of(&output).contains(USAGE), "args {args:?}");
    }
    assert!(!grid.exists());
}

#[test]
fn missing_dataset_exits_with_error() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("missing.txt");
    let model = dir.path().join("out.model");

    let output = gs_train(
        &[dataset.to_str().unwrap(), model.to_str().unwrap()],
        &dir.path().join("AccuracyGrid"),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("can't open input file"));
    assert!(!model.exists());
}

#[test]
fn malformed_dataset_reports_the_line() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("train.txt");
    fs::write(&dataset, "1 1:0.5 2:0.5\n-1 1:oops\n").unwrap();
    let model = dir.path().join("out.model");

    let output = gs_train(
        &[dataset.to_str().unwrap(), model.to_str().unwrap()],
        &dir.path().join("AccuracyGrid"),
    );

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr_of(&output).contains("Wrong input format at line 2"));
    assert!(!model.exists());
}

#[test]
fn small_dataset_trains_and_writes_outputs() {
    let dir = tempdir().unwrap();
    let dataset = dir.path().join("train.txt");
    let mut text = String::new();
    for k in 0..4 {
        let d = 0.1 * k as f64;
        text.push_str(&format!("1 1:{} 2:{}\n", 1.0 + d, 1.0 - d));
        text.push_str(&format!("-1 1:{} 2:{}\n", -1.0 - d, -1.0 + d));
    }
    fs::write(&dataset, text).unwrap();
    let model = dir.path().join("out.model");
    let grid = dir.path().join("AccuracyGrid");

    let output = gs_train(&[dataset.to_str().unwrap(), model.to_str().unwrap()], &grid);

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert!(model.exists());
    assert_eq!(fs::read_to_string(&grid).unwrap().lines().count(), 16);
}
