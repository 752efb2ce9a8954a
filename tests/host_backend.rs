//! Integration tests driving the host backend through the full harness
//!
//! Tests verify:
//! - End-to-end warm-up + timing over real kernels
//! - Pristine-input restore between destructive iterations
//! - Zero-batch degenerate runs
//! - Non-convergence is reported, never fatal

use linbench::backend::cpu::{HostGeqrf, HostGesvdj, HostSyevj};
use linbench::config::{BatchConfig, JacobiControls, Layout, RunConfig, SvectMode};
use linbench::generate;
use linbench::harness;
use linbench::kernel::BenchKernel;
use linbench::stats::Summary;

fn controls(tolerance: f64, max_sweeps: u32) -> JacobiControls {
    JacobiControls {
        tolerance,
        max_sweeps,
    }
}

#[test]
fn geqrf_run_produces_full_series() {
    let cfg = BatchConfig::new(10, 10, 10, None, 2, Layout::Strided).unwrap();
    let run_cfg = RunConfig::new(10, 0, 42).unwrap();
    let pristine = generate::general::<f64>(&cfg, 100.0, run_cfg.seed).unwrap();
    let mut kernel = HostGeqrf::new(cfg, pristine);

    let (warmup, series) = harness::run(&mut kernel, &run_cfg).unwrap();
    assert!(warmup.iterations >= 1);
    assert_eq!(series.len(), 10);
    let summary = Summary::of(&series).unwrap();
    assert!(summary.mean_ms > 0.0);
    assert!(summary.std_dev_ms >= 0.0);
}

#[test]
fn geqrf_pointer_array_run_matches_strided_tau() {
    // the same seed through either layout factors the same matrices
    let seed = 77;
    let strided_cfg = BatchConfig::new(8, 8, 8, None, 3, Layout::Strided).unwrap();
    let array_cfg = BatchConfig::new(8, 8, 8, None, 3, Layout::PointerArray).unwrap();

    let mut strided = HostGeqrf::new(
        strided_cfg,
        generate::general::<f64>(&strided_cfg, 100.0, seed).unwrap(),
    );
    let mut array = HostGeqrf::new(
        array_cfg,
        generate::general::<f64>(&array_cfg, 100.0, seed).unwrap(),
    );
    strided.invoke().unwrap();
    array.invoke().unwrap();

    for (a, b) in strided.tau().iter().zip(array.tau().iter()) {
        assert_eq!(a.to_bits(), b.to_bits());
    }
}

#[test]
fn repeated_timed_iterations_start_from_identical_input() {
    let cfg = BatchConfig::new(12, 12, 12, None, 2, Layout::Strided).unwrap();
    let pristine = generate::general::<f64>(&cfg, 100.0, 9).unwrap();
    let mut kernel = HostGeqrf::new(cfg, pristine);

    kernel.restore().unwrap();
    kernel.invoke().unwrap();
    let first: Vec<u64> = kernel.tau().iter().map(|t| t.to_bits()).collect();

    // without restore the input is the previous iteration's factors
    kernel.invoke().unwrap();
    let no_restore: Vec<u64> = kernel.tau().iter().map(|t| t.to_bits()).collect();
    assert_ne!(first, no_restore);

    kernel.restore().unwrap();
    kernel.invoke().unwrap();
    let restored: Vec<u64> = kernel.tau().iter().map(|t| t.to_bits()).collect();
    assert_eq!(first, restored);
}

#[test]
fn zero_batch_run_completes_with_empty_outputs() {
    let cfg = BatchConfig::new(10, 10, 10, None, 0, Layout::Strided).unwrap();
    let run_cfg = RunConfig::new(5, 0, 42).unwrap();

    let pristine = generate::general::<f32>(&cfg, 10.0, run_cfg.seed).unwrap();
    let mut kernel = HostGesvdj::new(
        cfg,
        SvectMode::All,
        SvectMode::All,
        controls(1e-7, 100),
        pristine,
    )
    .unwrap();

    let (warmup, series) = harness::run(&mut kernel, &run_cfg).unwrap();
    assert!(warmup.iterations >= 1);
    assert_eq!(series.len(), 5);
    assert!(kernel.singular_values().is_empty());
    assert!(kernel.outcomes().is_empty());
}

#[test]
fn nonconvergence_is_recorded_and_run_continues() {
    let cfg = BatchConfig::square(10, 10, None, 3, Layout::Strided).unwrap();
    let run_cfg = RunConfig::new(4, 0, 42).unwrap();
    let pristine = generate::symmetric::<f32>(&cfg, 10.0, run_cfg.seed).unwrap();
    // one sweep cannot diagonalize a dense 10x10 matrix
    let mut kernel = HostSyevj::new(cfg, controls(1e-12, 1), pristine).unwrap();

    let (_, series) = harness::run(&mut kernel, &run_cfg).unwrap();
    assert_eq!(series.len(), 4);
    assert!(kernel.outcomes().iter().all(|o| o.info != 0));
    assert!(kernel.outcomes().iter().all(|o| o.sweeps == 1));
}

#[test]
fn syevj_eigenvalues_match_gershgorin_bounds() {
    let cfg = BatchConfig::square(8, 8, None, 2, Layout::Strided).unwrap();
    let pristine = generate::symmetric::<f32>(&cfg, 10.0, 11).unwrap();
    let bound: f32 = 100.0 + 7.0 * 10.0; // max |diag| + (n-1) * max |off|
    let mut kernel = HostSyevj::new(cfg, controls(1e-3, 100), pristine).unwrap();
    kernel.invoke().unwrap();
    assert!(kernel.eigenvalues().iter().all(|w| w.abs() <= bound));
}

#[test]
fn gesvdj_with_explicit_stride_uses_it() {
    let cfg = BatchConfig::new(6, 4, 6, Some(40), 2, Layout::Strided).unwrap();
    assert_eq!(cfg.stride, 40);
    let pristine = generate::general::<f32>(&cfg, 10.0, 13).unwrap();
    let mut kernel = HostGesvdj::new(
        cfg,
        SvectMode::Singular,
        SvectMode::Singular,
        controls(1e-4, 100),
        pristine,
    )
    .unwrap();
    kernel.invoke().unwrap();
    // both elements produced nonzero leading singular values
    assert!(kernel.singular_values()[0] > 0.0);
    assert!(kernel.singular_values()[cfg.min_dim()] > 0.0);
}
