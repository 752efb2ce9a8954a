//! Capability interface implemented by every benchmark variant
//!
//! One kernel family x backend x layout combination is one strategy struct
//! implementing [`BenchKernel`]; the warm-up and timing loops in
//! [`crate::harness`] drive any of them through this trait, which is what
//! lets a single generic harness replace per-variant driver duplication.

use std::time::Instant;

use crate::error::Result;

/// One stageable, invocable, restorable benchmark kernel
///
/// Implementations own their staged input, output buffers, and the pristine
/// host copy used for restoring destructive kernels. All staged resources
/// release on drop, on every exit path.
pub trait BenchKernel {
    /// Restore the staged input from the pristine host copy.
    ///
    /// Called before every warm-up and timed iteration of a destructive
    /// kernel, so each run starts from identical input rather than the
    /// previous iteration's partially-factored result.
    fn restore(&mut self) -> Result<()>;

    /// Invoke the kernel once over the whole batch.
    ///
    /// On the device backend this is asynchronous relative to the calling
    /// thread; callers must pair it with [`BenchKernel::synchronize`] before
    /// reading any clock. Numerical non-convergence of individual batch
    /// elements is not an error.
    fn invoke(&mut self) -> Result<()>;

    /// Block until all work issued by [`BenchKernel::invoke`] has completed.
    fn synchronize(&mut self) -> Result<()>;

    /// Invoke once and return the elapsed time in milliseconds, measured
    /// with the backend's clock.
    ///
    /// The default implementation brackets `invoke` + `synchronize` with the
    /// host high-resolution clock; the device backend overrides it with an
    /// event pair recorded on the stream.
    fn timed_invoke(&mut self) -> Result<f64> {
        let start = Instant::now();
        self.invoke()?;
        self.synchronize()?;
        Ok(start.elapsed().as_secs_f64() * 1e3)
    }

    /// Whether `invoke` consumes its input destructively.
    fn destructive(&self) -> bool {
        true
    }

    /// Log per-element convergence state after the run.
    ///
    /// Kernels that report `info` codes copy them back (device) or scan them
    /// (host) and emit a warning per non-converged element. Non-fatal by
    /// contract; the default is a no-op for kernels without info codes.
    fn log_convergence(&mut self) -> Result<()> {
        Ok(())
    }
}
