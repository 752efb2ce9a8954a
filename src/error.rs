//! Error types for linbench

use thiserror::Error;

/// Result type alias using linbench's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or running a benchmark
///
/// Numerical non-convergence of a batch element (`info != 0`) is *not* an
/// error: it is recorded per element, logged, and the run continues. Only
/// configuration, allocation, and launch failures abort a run.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid benchmark configuration
    #[error("Invalid configuration '{arg}': {reason}")]
    Config {
        /// The offending parameter
        arg: &'static str,
        /// Reason for invalidity
        reason: String,
    },

    /// Host or device memory allocation failed
    #[error("Out of memory: failed to allocate {size} bytes on {backend}")]
    Allocation {
        /// Requested size in bytes
        size: usize,
        /// Backend the allocation was requested on
        backend: &'static str,
    },

    /// Kernel launch or module load failed on the device backend
    #[error("Kernel launch failed: {0}")]
    Launch(String),

    /// The requested backend is not available in this build or on this machine
    #[error("Backend '{backend}' unavailable: {reason}")]
    BackendUnavailable {
        /// The requested backend
        backend: &'static str,
        /// Why it cannot be used
        reason: String,
    },

    /// CUDA driver error
    #[cfg(feature = "cuda")]
    #[error("CUDA error: {0}")]
    Cuda(#[from] cudarc::driver::DriverError),
}

impl Error {
    /// Create a configuration error
    pub fn config(arg: &'static str, reason: impl Into<String>) -> Self {
        Self::Config {
            arg,
            reason: reason.into(),
        }
    }
}
