//! # linbench
//!
//! **Latency benchmarks for batched dense linear-algebra kernels.**
//!
//! linbench measures the execution time of batched QR factorization
//! (`geqrf`), Jacobi SVD (`gesvdj`), and Jacobi symmetric eigendecomposition
//! (`syevj`) on two backends: an accelerator device (CUDA) and the
//! multi-core host.
//!
//! The crate is the benchmarking harness, not a solver library: seeded
//! batched-matrix generation, backend memory staging with pristine-input
//! restore between destructive iterations, a wall-clock-bounded warm-up,
//! a fixed-iteration timing loop with the backend's own clock, and
//! mean/population-std-dev reporting. The numerical kernels themselves sit
//! behind a fixed call contract (per-matrix column-major routines with
//! caller workspace on the host, batched PTX kernels on the device).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linbench::prelude::*;
//!
//! let cfg = BatchConfig::new(10, 10, 10, None, 2, Layout::Strided)?;
//! let run = RunConfig::new(10, 1000, 42)?;
//! let pristine = generate::general::<f64>(&cfg, 100.0, run.seed)?;
//! let mut kernel = HostGeqrf::new(cfg, pristine);
//! let (warmup, series) = harness::run(&mut kernel, &run)?;
//! println!("{:?}", Summary::of(&series));
//! ```
//!
//! ## Feature Flags
//!
//! - `rayon` (default): parallel batch-element workers on the host backend
//! - `cuda`: NVIDIA CUDA device backend

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod config;
pub mod dtype;
pub mod error;
pub mod generate;
pub mod harness;
pub mod kernel;
pub mod stats;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::backend::cpu::{HostGeqrf, HostGesvdj, HostSyevj};
    pub use crate::config::{BatchConfig, JacobiControls, Layout, RunConfig, SvectMode};
    pub use crate::dtype::Scalar;
    pub use crate::error::{Error, Result};
    pub use crate::generate::{self, BatchedMatrixSet};
    pub use crate::harness::{self, WarmupOutcome};
    pub use crate::kernel::BenchKernel;
    pub use crate::stats::{Report, Summary, TimingSeries};

    #[cfg(feature = "cuda")]
    pub use crate::backend::cuda::{CudaBackend, CudaGeqrf, CudaGesvdj, CudaSyevj};
}
