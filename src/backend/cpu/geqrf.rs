//! Host QR-factorization benchmark kernel

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::config::BatchConfig;
use crate::dtype::Scalar;
use crate::error::Result;
use crate::generate::BatchedMatrixSet;
use crate::kernel::BenchKernel;

use super::provider;

/// Batched Householder QR on the host worker pool
///
/// Works for both layouts: the strided buffer is split into per-element
/// chunks, the pointer-array set iterates its per-matrix buffers. Factors
/// overwrite the working input in place; Householder scalars land in `tau`
/// (`min(rows, cols)` per batch element).
pub struct HostGeqrf<T: Scalar> {
    cfg: BatchConfig,
    pristine: BatchedMatrixSet<T>,
    working: BatchedMatrixSet<T>,
    tau: Vec<T>,
}

impl<T: Scalar> HostGeqrf<T> {
    /// Stage a generated batch for benchmarking.
    pub fn new(cfg: BatchConfig, pristine: BatchedMatrixSet<T>) -> Self {
        let working = pristine.clone();
        let tau = vec![T::zero(); cfg.min_dim() * cfg.batch_count];
        Self {
            cfg,
            pristine,
            working,
            tau,
        }
    }

    /// Householder scalars of the last invocation, `min(rows, cols)` per
    /// batch element.
    pub fn tau(&self) -> &[T] {
        &self.tau
    }

    /// The staged working set (factors after an invocation).
    pub fn working(&self) -> &BatchedMatrixSet<T> {
        &self.working
    }
}

impl<T: Scalar> BenchKernel for HostGeqrf<T> {
    fn restore(&mut self) -> Result<()> {
        self.working.copy_from(&self.pristine);
        Ok(())
    }

    fn invoke(&mut self) -> Result<()> {
        let m = self.cfg.rows;
        let n = self.cfg.cols;
        let lda = self.cfg.lda;
        let k = self.cfg.min_dim();
        if self.cfg.batch_count == 0 || k == 0 {
            return Ok(());
        }
        let lwork = provider::geqrf_lwork(n);
        let tau = &mut self.tau;

        match &mut self.working {
            BatchedMatrixSet::Strided(buf) => {
                let stride = self.cfg.stride;
                #[cfg(feature = "rayon")]
                buf.par_chunks_mut(stride)
                    .zip(tau.par_chunks_mut(k))
                    .for_each_init(
                        || vec![T::zero(); lwork],
                        |work, (a, t)| provider::geqrf(m, n, a, lda, t, work),
                    );
                #[cfg(not(feature = "rayon"))]
                {
                    let mut work = vec![T::zero(); lwork];
                    for (a, t) in buf.chunks_mut(stride).zip(tau.chunks_mut(k)) {
                        provider::geqrf(m, n, a, lda, t, &mut work);
                    }
                }
            }
            BatchedMatrixSet::PointerArray(bufs) => {
                #[cfg(feature = "rayon")]
                bufs.par_iter_mut().zip(tau.par_chunks_mut(k)).for_each_init(
                    || vec![T::zero(); lwork],
                    |work, (a, t)| provider::geqrf(m, n, a, lda, t, work),
                );
                #[cfg(not(feature = "rayon"))]
                {
                    let mut work = vec![T::zero(); lwork];
                    for (a, t) in bufs.iter_mut().zip(tau.chunks_mut(k)) {
                        provider::geqrf(m, n, a, lda, t, &mut work);
                    }
                }
            }
        }
        Ok(())
    }

    fn synchronize(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Layout;
    use crate::generate;

    fn staged(layout: Layout) -> (BatchConfig, HostGeqrf<f64>) {
        let cfg = BatchConfig::new(8, 6, 8, None, 3, layout).unwrap();
        let pristine = generate::general::<f64>(&cfg, 100.0, 42).unwrap();
        (cfg, HostGeqrf::new(cfg, pristine))
    }

    #[test]
    fn invoke_factors_every_batch_element() {
        for layout in [Layout::Strided, Layout::PointerArray] {
            let (cfg, mut kernel) = staged(layout);
            kernel.invoke().unwrap();
            // every reflector past a full-rank random column is nontrivial
            for b in 0..cfg.batch_count {
                let tau = &kernel.tau()[b * cfg.min_dim()..(b + 1) * cfg.min_dim()];
                assert!(tau.iter().all(|t| t.is_finite()));
                assert!(tau.iter().any(|&t| t != 0.0));
            }
        }
    }

    #[test]
    fn restore_returns_working_set_to_pristine() {
        let (cfg, mut kernel) = staged(Layout::Strided);
        let before = kernel.working().get(&cfg, 1, 3, 2);
        kernel.invoke().unwrap();
        assert_ne!(kernel.working().get(&cfg, 1, 3, 2), before);
        kernel.restore().unwrap();
        assert_eq!(kernel.working().get(&cfg, 1, 3, 2).to_bits(), before.to_bits());
    }

    #[test]
    fn zero_batch_invoke_is_a_noop() {
        let cfg = BatchConfig::new(8, 6, 8, None, 0, Layout::Strided).unwrap();
        let pristine = generate::general::<f64>(&cfg, 100.0, 42).unwrap();
        let mut kernel = HostGeqrf::new(cfg, pristine);
        kernel.invoke().unwrap();
        assert!(kernel.tau().is_empty());
    }
}
