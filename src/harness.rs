//! Warm-up and timing loops
//!
//! The two loops here, together with [`crate::stats`], are the shared core
//! that every benchmark variant runs through. Warm-up is wall-clock bounded
//! with a guaranteed minimum of one pass; timing is a fixed iteration count
//! with no retries and no outlier rejection.

use std::time::Instant;

use tracing::info;

use crate::config::RunConfig;
use crate::error::Result;
use crate::kernel::BenchKernel;
use crate::stats::TimingSeries;

/// What the warm-up phase did; reported, not retained
#[derive(Clone, Copy, Debug)]
pub struct WarmupOutcome {
    /// Completed warm-up iterations
    pub iterations: u32,
    /// Wall-clock time the warm-up actually took, milliseconds
    pub elapsed_ms: f64,
}

/// Run `kernel` untimed until at least `budget_ms` of wall-clock time has
/// elapsed.
///
/// Always performs at least one iteration, so a zero (or effectively
/// negative) budget still exercises the kernel once before measurement.
/// Destructive kernels are restored before every pass.
pub fn warm_up<K: BenchKernel + ?Sized>(kernel: &mut K, budget_ms: u64) -> Result<WarmupOutcome> {
    info!(budget_ms, "performing warm-up");
    let start = Instant::now();
    let mut iterations = 0u32;
    let elapsed_ms = loop {
        if kernel.destructive() {
            kernel.restore()?;
        }
        kernel.invoke()?;
        kernel.synchronize()?;
        iterations += 1;
        let elapsed = start.elapsed().as_secs_f64() * 1e3;
        if elapsed >= budget_ms as f64 {
            break elapsed;
        }
    };
    info!(iterations, elapsed_ms, "warm-up complete");
    Ok(WarmupOutcome {
        iterations,
        elapsed_ms,
    })
}

/// Run `kernel` for exactly `iterations` timed passes.
///
/// Each pass restores pristine input (for destructive kernels), invokes
/// once, and records the elapsed time on the backend clock. Every
/// iteration's timing is kept, including ones where some batch elements did
/// not converge.
pub fn collect_timings<K: BenchKernel + ?Sized>(
    kernel: &mut K,
    iterations: usize,
) -> Result<TimingSeries> {
    let mut series = TimingSeries::with_capacity(iterations);
    for _ in 0..iterations {
        if kernel.destructive() {
            kernel.restore()?;
        }
        series.push(kernel.timed_invoke()?);
    }
    Ok(series)
}

/// Warm up, time, and log convergence state for one benchmark run.
pub fn run<K: BenchKernel + ?Sized>(
    kernel: &mut K,
    run: &RunConfig,
) -> Result<(WarmupOutcome, TimingSeries)> {
    let warmup = warm_up(kernel, run.warmup_ms)?;
    let series = collect_timings(kernel, run.iterations)?;
    kernel.log_convergence()?;
    Ok((warmup, series))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Counts calls; "destructive" so restore bookkeeping is observable.
    struct CountingKernel {
        restores: usize,
        invokes: usize,
        syncs: usize,
    }

    impl CountingKernel {
        fn new() -> Self {
            Self {
                restores: 0,
                invokes: 0,
                syncs: 0,
            }
        }
    }

    impl BenchKernel for CountingKernel {
        fn restore(&mut self) -> Result<()> {
            self.restores += 1;
            Ok(())
        }
        fn invoke(&mut self) -> Result<()> {
            self.invokes += 1;
            Ok(())
        }
        fn synchronize(&mut self) -> Result<()> {
            self.syncs += 1;
            Ok(())
        }
    }

    #[test]
    fn warmup_with_zero_budget_runs_exactly_once() {
        let mut k = CountingKernel::new();
        let outcome = warm_up(&mut k, 0).unwrap();
        assert_eq!(outcome.iterations, 1);
        assert_eq!(k.invokes, 1);
        assert_eq!(k.restores, 1);
        assert_eq!(k.syncs, 1);
    }

    #[test]
    fn warmup_runs_until_budget_elapses() {
        let mut k = CountingKernel::new();
        let outcome = warm_up(&mut k, 5).unwrap();
        assert!(outcome.iterations >= 1);
        assert!(outcome.elapsed_ms >= 5.0);
    }

    #[test]
    fn timing_series_has_exactly_k_samples() {
        for k_iters in [1usize, 3, 10] {
            let mut k = CountingKernel::new();
            let series = collect_timings(&mut k, k_iters).unwrap();
            assert_eq!(series.len(), k_iters);
            assert_eq!(k.invokes, k_iters);
            assert_eq!(k.restores, k_iters);
        }
    }

    #[test]
    fn non_destructive_kernel_is_never_restored() {
        struct Plain(usize);
        impl BenchKernel for Plain {
            fn restore(&mut self) -> Result<()> {
                self.0 += 1;
                Ok(())
            }
            fn invoke(&mut self) -> Result<()> {
                Ok(())
            }
            fn synchronize(&mut self) -> Result<()> {
                Ok(())
            }
            fn destructive(&self) -> bool {
                false
            }
        }
        let mut k = Plain(0);
        collect_timings(&mut k, 4).unwrap();
        assert_eq!(k.0, 0);
    }

    #[test]
    fn timings_are_non_negative() {
        let mut k = CountingKernel::new();
        let series = collect_timings(&mut k, 5).unwrap();
        assert!(series.as_slice().iter().all(|&t| t >= 0.0));
    }
}
