//! Host (CPU) backend
//!
//! Staging is plain heap allocation; restore is a memcpy from the pristine
//! generator output. Batch elements are processed by the rayon worker pool
//! (serially with the `rayon` feature disabled), each worker with its own
//! scratch workspace, since the provider routines cannot share one.

mod geqrf;
mod gesvdj;
pub mod jacobi;
pub mod provider;
mod syevj;

pub use geqrf::HostGeqrf;
pub use gesvdj::HostGesvdj;
pub use syevj::HostSyevj;
