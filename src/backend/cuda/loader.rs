//! PTX loading, module caching, and launch configuration
//!
//! PTX files are compiled by `build.rs` (nvcc) into `CUDA_KERNEL_DIR`;
//! modules are loaded on first use and cached per device. The cache uses
//! `OnceLock<Mutex<HashMap>>` so concurrent benchmarks on multiple devices
//! stay thread-safe.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use cudarc::driver::safe::{CudaContext, CudaFunction, CudaModule, LaunchConfig};
use cudarc::nvrtc::Ptx;

use crate::error::{Error, Result};

/// Directory containing compiled PTX files (set by build.rs)
const KERNEL_DIR: &str = env!("CUDA_KERNEL_DIR");

/// Batched-kernel module names
pub mod module_names {
    /// QR factorization kernels
    pub const GEQRF: &str = "batched_geqrf";
    /// Jacobi SVD kernels
    pub const GESVDJ: &str = "batched_gesvdj";
    /// Jacobi symmetric eigendecomposition kernels
    pub const SYEVJ: &str = "batched_syevj";
}

/// Threads per block for one-thread-per-batch-element launches
pub const BLOCK_SIZE: u32 = 64;

static MODULE_CACHE: OnceLock<Mutex<HashMap<(usize, &'static str), Arc<CudaModule>>>> =
    OnceLock::new();

/// Get or load a CUDA module from its compiled PTX.
pub fn get_or_load_module(
    context: &Arc<CudaContext>,
    device_index: usize,
    module_name: &'static str,
) -> Result<Arc<CudaModule>> {
    let cache = MODULE_CACHE.get_or_init(|| Mutex::new(HashMap::new()));
    let mut guard = cache
        .lock()
        .map_err(|e| Error::Launch(format!("module cache lock poisoned: {e}")))?;

    let key = (device_index, module_name);
    if let Some(module) = guard.get(&key) {
        return Ok(module.clone());
    }

    let ptx = Ptx::from_file(format!("{KERNEL_DIR}/{module_name}.ptx"));
    let module = context.load_module(ptx).map_err(|e| {
        Error::Launch(format!(
            "failed to load CUDA module '{module_name}': {e:?}; \
             ensure kernels were compiled by build.rs"
        ))
    })?;

    guard.insert(key, module.clone());
    Ok(module)
}

/// Get a kernel function from a loaded module.
pub fn get_kernel_function(module: &Arc<CudaModule>, kernel_name: &str) -> Result<CudaFunction> {
    module.load_function(kernel_name).map_err(|e| {
        Error::Launch(format!(
            "failed to get kernel '{kernel_name}': {e:?}; \
             check that the name matches the CUDA source"
        ))
    })
}

/// One thread per batch element, `BLOCK_SIZE` threads per block.
pub fn batched_launch_config(batch_count: usize) -> LaunchConfig {
    let grid = ((batch_count as u32) + BLOCK_SIZE - 1) / BLOCK_SIZE;
    LaunchConfig {
        grid_dim: (grid.max(1), 1, 1),
        block_dim: (BLOCK_SIZE, 1, 1),
        shared_mem_bytes: 0,
    }
}
