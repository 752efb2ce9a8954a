//! Benchmark configuration types
//!
//! Command-line parsing lives in the driver binaries; the structs here are
//! the validated configuration the harness consumes. Construction enforces
//! the batch-shape invariants (leading-dimension clamping, default stride)
//! so every downstream component can rely on them.

use crate::error::{Error, Result};

/// Memory layout of a batched matrix set
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
    /// One contiguous buffer; batch element `b` starts at `b * stride`
    Strided,
    /// Independent per-element buffers addressed through a pointer array
    PointerArray,
}

/// Shape of one batched matrix set
///
/// Matrices are column-major: element `(i, j)` of batch element `b` lives at
/// `i + j * lda` within that element's buffer, and strided buffers place
/// element `b` at offset `b * stride`.
#[derive(Clone, Copy, Debug)]
pub struct BatchConfig {
    /// Number of rows (M)
    pub rows: usize,
    /// Number of columns (N)
    pub cols: usize,
    /// Leading dimension, at least `rows`
    pub lda: usize,
    /// Element stride between consecutive matrices in a strided buffer
    pub stride: usize,
    /// Number of matrices in the batch; zero is a legal degenerate case
    pub batch_count: usize,
    /// Buffer layout
    pub layout: Layout,
}

impl BatchConfig {
    /// Build a validated config.
    ///
    /// `lda` smaller than `rows` is clamped up to `rows` rather than
    /// rejected. An unspecified `stride` defaults to `lda * cols`; an
    /// explicit one overrides the default exactly, but a stride that would
    /// make matrices of a multi-element batch alias is rejected.
    pub fn new(
        rows: usize,
        cols: usize,
        lda: usize,
        stride: Option<usize>,
        batch_count: usize,
        layout: Layout,
    ) -> Result<Self> {
        let lda = lda.max(rows);
        let stride = stride.unwrap_or(lda * cols);
        if batch_count > 0 && stride < lda * cols {
            return Err(Error::config(
                "stride",
                format!(
                    "stride {} is smaller than one matrix ({} = lda {} x cols {})",
                    stride,
                    lda * cols,
                    lda,
                    cols
                ),
            ));
        }
        Ok(Self {
            rows,
            cols,
            lda,
            stride,
            batch_count,
            layout,
        })
    }

    /// Square symmetric variant: `rows == cols == n`
    pub fn square(
        n: usize,
        lda: usize,
        stride: Option<usize>,
        batch_count: usize,
        layout: Layout,
    ) -> Result<Self> {
        Self::new(n, n, lda, stride, batch_count, layout)
    }

    /// Elements in one matrix buffer (`lda * cols`)
    pub fn matrix_len(&self) -> usize {
        self.lda * self.cols
    }

    /// `min(rows, cols)`
    pub fn min_dim(&self) -> usize {
        self.rows.min(self.cols)
    }

    /// Total elements in the strided batch buffer (`stride * batch_count`)
    pub fn strided_len(&self) -> usize {
        self.stride * self.batch_count
    }
}

/// Iteration and seeding parameters of one benchmark run
#[derive(Clone, Copy, Debug)]
pub struct RunConfig {
    /// Number of timed iterations; must be at least 1
    pub iterations: usize,
    /// Minimum warm-up wall-clock budget in milliseconds
    pub warmup_ms: u64,
    /// Seed for matrix generation
    pub seed: u64,
}

impl RunConfig {
    /// Build a validated run config; `iterations == 0` is rejected.
    pub fn new(iterations: usize, warmup_ms: u64, seed: u64) -> Result<Self> {
        if iterations == 0 {
            return Err(Error::config("iterations", "must be at least 1"));
        }
        Ok(Self {
            iterations,
            warmup_ms,
            seed,
        })
    }
}

/// Convergence controls for the Jacobi-method kernels (SVD, symmetric eig)
#[derive(Clone, Copy, Debug)]
pub struct JacobiControls {
    /// Off-diagonal norm threshold
    pub tolerance: f64,
    /// Sweep limit; reaching it without convergence sets `info != 0`
    pub max_sweeps: u32,
}

/// Which singular vectors a SVD benchmark computes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SvectMode {
    /// No vectors
    None,
    /// The leading `min(rows, cols)` vectors
    Singular,
    /// The full orthogonal factor
    All,
}

impl SvectMode {
    /// Lowercase label used in reports, mirroring the CLI spelling
    pub fn label(&self) -> &'static str {
        match self {
            SvectMode::None => "none",
            SvectMode::Singular => "singular",
            SvectMode::All => "all",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_stride_is_lda_times_cols() {
        let cfg = BatchConfig::new(10, 8, 12, None, 2, Layout::Strided).unwrap();
        assert_eq!(cfg.stride, 96);
    }

    #[test]
    fn explicit_stride_overrides_default() {
        let cfg = BatchConfig::new(10, 8, 12, Some(200), 2, Layout::Strided).unwrap();
        assert_eq!(cfg.stride, 200);
    }

    #[test]
    fn lda_clamped_to_rows() {
        let cfg = BatchConfig::new(10, 8, 4, None, 1, Layout::Strided).unwrap();
        assert_eq!(cfg.lda, 10);
    }

    #[test]
    fn overlapping_stride_rejected() {
        let err = BatchConfig::new(10, 8, 10, Some(40), 2, Layout::Strided);
        assert!(err.is_err());
    }

    #[test]
    fn zero_iterations_rejected() {
        assert!(RunConfig::new(0, 100, 42).is_err());
        assert!(RunConfig::new(1, 0, 42).is_ok());
    }
}
