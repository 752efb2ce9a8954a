//! Execution backends
//!
//! One module per backend: `cpu` is always available; `cuda` is compiled
//! behind the `cuda` feature and stages batches into device global memory.

pub mod cpu;

#[cfg(feature = "cuda")]
pub mod cuda;
