//! End-to-end tests of the driver binaries
//!
//! Each test spawns a compiled driver and checks exit code, stdout report,
//! and stderr behavior.

use std::process::{Command, Output};

fn run_driver(bin: &str, args: &[&str]) -> Output {
    Command::new(bin)
        .args(args)
        .env("RUST_LOG", "warn")
        .output()
        .expect("failed to spawn driver binary")
}

fn average_ms(stdout: &str) -> f64 {
    let line = stdout
        .lines()
        .find(|l| l.starts_with("Average execution time:"))
        .expect("report has no average line");
    line.trim_start_matches("Average execution time:")
        .trim()
        .trim_end_matches("ms")
        .trim()
        .parse()
        .expect("average is not a number")
}

#[test]
fn geqrf_end_to_end_reports_positive_average() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_geqrf"),
        &[
            "-m", "10", "-n", "10", "-l", "10", "-b", "2", "-r", "42", "-i", "10", "-w", "1000",
        ],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Matrix size: 10 x 10"));
    assert!(stdout.contains("Batch count: 2"));
    assert!(stdout.contains("Warm-up time: 1000 ms"));
    assert!(stdout.contains("Timing iterations: 10"));
    assert!(average_ms(&stdout) > 0.0);
}

#[test]
fn geqrf_zero_batch_still_reports() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_geqrf"),
        &["-b", "0", "-i", "3", "-w", "0"],
    );
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Batch count: 0"));
    assert!(stdout.contains("Timing iterations: 3"));
    assert!(stdout.contains("Average execution time:"));
}

#[test]
fn malformed_flag_exits_one_with_usage_on_stderr() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_geqrf"),
        &["--rows", "not-a-number"],
    );
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("Usage"), "no usage text: {stderr}");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("Performance Results"));
}

#[test]
fn help_exits_zero() {
    let out = run_driver(env!("CARGO_BIN_EXE_bench_geqrf"), &["--help"]);
    assert!(out.status.success());
}

#[test]
fn zero_timing_iterations_is_a_config_error() {
    let out = run_driver(env!("CARGO_BIN_EXE_bench_geqrf"), &["-i", "0", "-w", "0"]);
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(!stdout.contains("Performance Results"));
}

#[test]
fn geqrf_pointer_array_layout_runs() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_geqrf"),
        &["--layout", "array", "-i", "3", "-w", "0"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Matrix size: 10 x 10"));
}

#[test]
fn gesvdj_reports_kernel_specific_lines() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_gesvdj"),
        &["-i", "3", "-w", "0", "--left-svect", "singular"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Matrix size: 10 x 8"));
    assert!(stdout.contains("Left singular vectors: singular"));
    assert!(stdout.contains("Right singular vectors: all"));
    assert!(stdout.contains("Max sweeps: 100"));
}

#[test]
fn syevj_end_to_end_runs() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_syevj"),
        &["-n", "8", "-l", "8", "-b", "2", "-i", "3", "-w", "0"],
    );
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Matrix size: 8 x 8"));
    assert!(stdout.contains("Tolerance:"));
}

#[cfg(not(feature = "cuda"))]
#[test]
fn device_backend_without_cuda_feature_fails_clearly() {
    let out = run_driver(
        env!("CARGO_BIN_EXE_bench_geqrf"),
        &["--backend", "device", "-i", "1", "-w", "0"],
    );
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("cuda"), "unexpected stderr: {stderr}");
}
