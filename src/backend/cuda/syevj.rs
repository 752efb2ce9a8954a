//! Device symmetric-eigendecomposition benchmark kernel

use cudarc::driver::safe::CudaFunction;
use cudarc::driver::PushKernelArg;
use tracing::{debug, warn};

use crate::config::{BatchConfig, JacobiControls, Layout};
use crate::error::{Error, Result};
use crate::generate::BatchedMatrixSet;
use crate::kernel::BenchKernel;

use super::loader::{batched_launch_config, get_kernel_function, get_or_load_module, module_names};
use super::{CudaBackend, DeviceBuffer, EventTimer};

/// Batched two-sided Jacobi eigendecomposition on the device
///
/// Eigenvectors overwrite the staged input; eigenvalues, per-element
/// residuals, sweep counts, and info codes land in device buffers. The
/// rotation accumulator workspace is device-resident, `n * n` elements per
/// batch element.
pub struct CudaSyevj {
    backend: CudaBackend,
    cfg: BatchConfig,
    controls: JacobiControls,
    pristine: Vec<f32>,
    d_a: DeviceBuffer<f32>,
    d_w: DeviceBuffer<f32>,
    d_residual: DeviceBuffer<f32>,
    d_sweeps: DeviceBuffer<i32>,
    d_info: DeviceBuffer<i32>,
    d_vwork: DeviceBuffer<f32>,
    func: CudaFunction,
    timer: EventTimer,
}

impl CudaSyevj {
    /// Stage a generated symmetric batch into device memory.
    pub fn new(
        backend: CudaBackend,
        cfg: BatchConfig,
        controls: JacobiControls,
        pristine: BatchedMatrixSet<f32>,
    ) -> Result<Self> {
        if cfg.layout != Layout::Strided {
            return Err(Error::config(
                "layout",
                "the eigendecomposition benchmark supports the strided layout only",
            ));
        }
        let host = match pristine {
            BatchedMatrixSet::Strided(host) => host,
            BatchedMatrixSet::PointerArray(_) => unreachable!("rejected above"),
        };
        let n = cfg.cols;
        let batch = cfg.batch_count;

        let mut d_a = backend.alloc::<f32>(cfg.strided_len())?;
        d_a.copy_from_host(&host)?;
        let d_w = backend.alloc::<f32>(n * batch)?;
        let d_residual = backend.alloc::<f32>(batch)?;
        let d_sweeps = backend.alloc::<i32>(batch)?;
        let d_info = backend.alloc::<i32>(batch)?;
        let d_vwork = backend.alloc::<f32>(n * n * batch)?;

        let module =
            get_or_load_module(backend.context(), backend.device_index(), module_names::SYEVJ)?;
        let func = get_kernel_function(&module, "syevj_strided_batched_f32")?;
        let timer = EventTimer::new(&backend)?;

        Ok(Self {
            backend,
            cfg,
            controls,
            pristine: host,
            d_a,
            d_w,
            d_residual,
            d_sweeps,
            d_info,
            d_vwork,
            func,
            timer,
        })
    }

    fn launch(&self) -> Result<()> {
        if self.cfg.batch_count == 0 || self.cfg.cols == 0 {
            return Ok(());
        }
        let stream = self.backend.stream();
        let launch_cfg = batched_launch_config(self.cfg.batch_count);

        let a = self.d_a.ptr();
        let n = self.cfg.cols as i32;
        let lda = self.cfg.lda as i32;
        let stride_a = self.cfg.stride as i64;
        let tolerance = self.controls.tolerance as f32;
        let max_sweeps = self.controls.max_sweeps as i32;
        let w = self.d_w.ptr();
        let stride_w = self.cfg.cols as i64;
        let residual = self.d_residual.ptr();
        let sweeps = self.d_sweeps.ptr();
        let info = self.d_info.ptr();
        let vwork = self.d_vwork.ptr();
        let batch = self.cfg.batch_count as i32;

        let mut builder = stream.launch_builder(&self.func);
        builder.arg(&a);
        builder.arg(&n);
        builder.arg(&lda);
        builder.arg(&stride_a);
        builder.arg(&tolerance);
        builder.arg(&max_sweeps);
        builder.arg(&w);
        builder.arg(&stride_w);
        builder.arg(&residual);
        builder.arg(&sweeps);
        builder.arg(&info);
        builder.arg(&vwork);
        builder.arg(&batch);
        unsafe { builder.launch(launch_cfg) }?;
        Ok(())
    }
}

impl BenchKernel for CudaSyevj {
    fn restore(&mut self) -> Result<()> {
        self.d_a.copy_from_host(&self.pristine)
    }

    fn invoke(&mut self) -> Result<()> {
        self.launch()
    }

    fn synchronize(&mut self) -> Result<()> {
        self.backend.synchronize()
    }

    fn timed_invoke(&mut self) -> Result<f64> {
        let stream = self.backend.stream().clone();
        self.timer.begin(&stream)?;
        self.launch()?;
        self.timer.finish(&stream)
    }

    fn log_convergence(&mut self) -> Result<()> {
        let mut info = vec![0i32; self.cfg.batch_count];
        self.d_info.copy_to_host(&mut info)?;
        let mut converged = 0usize;
        for (b, &code) in info.iter().enumerate() {
            if code != 0 {
                warn!(
                    batch_element = b,
                    info = code,
                    "eigendecomposition did not converge within the sweep limit"
                );
            } else {
                converged += 1;
            }
        }
        debug!(
            converged,
            batch_count = info.len(),
            "eigendecomposition convergence summary"
        );
        Ok(())
    }
}
