//! Device Jacobi-SVD benchmark kernel

use cudarc::driver::safe::CudaFunction;
use cudarc::driver::PushKernelArg;
use tracing::{debug, warn};

use crate::config::{BatchConfig, JacobiControls, Layout, SvectMode};
use crate::error::{Error, Result};
use crate::generate::BatchedMatrixSet;
use crate::kernel::BenchKernel;

use super::loader::{batched_launch_config, get_kernel_function, get_or_load_module, module_names};
use super::{CudaBackend, DeviceBuffer, EventTimer};

fn svect_code(mode: SvectMode) -> i32 {
    match mode {
        SvectMode::None => 0,
        SvectMode::Singular => 1,
        SvectMode::All => 2,
    }
}

/// Batched one-sided Jacobi SVD on the device
///
/// Stages the input batch, singular-value/vector outputs sized per the
/// svect modes, per-element residual/sweep/info buffers, and an `n * n`
/// per-element rotation accumulator workspace.
pub struct CudaGesvdj {
    backend: CudaBackend,
    cfg: BatchConfig,
    left: SvectMode,
    right: SvectMode,
    controls: JacobiControls,
    pristine: Vec<f32>,
    d_a: DeviceBuffer<f32>,
    d_s: DeviceBuffer<f32>,
    d_u: DeviceBuffer<f32>,
    d_v: DeviceBuffer<f32>,
    d_residual: DeviceBuffer<f32>,
    d_sweeps: DeviceBuffer<i32>,
    d_info: DeviceBuffer<i32>,
    d_vwork: DeviceBuffer<f32>,
    ldu: usize,
    ldv: usize,
    stride_u: usize,
    stride_v: usize,
    func: CudaFunction,
    timer: EventTimer,
}

impl CudaGesvdj {
    /// Stage a generated batch into device memory.
    pub fn new(
        backend: CudaBackend,
        cfg: BatchConfig,
        left: SvectMode,
        right: SvectMode,
        controls: JacobiControls,
        pristine: BatchedMatrixSet<f32>,
    ) -> Result<Self> {
        if cfg.layout != Layout::Strided {
            return Err(Error::config(
                "layout",
                "the SVD benchmark supports the strided layout only",
            ));
        }
        let host = match pristine {
            BatchedMatrixSet::Strided(host) => host,
            BatchedMatrixSet::PointerArray(_) => unreachable!("rejected above"),
        };
        let (m, n, k) = (cfg.rows, cfg.cols, cfg.min_dim());
        let batch = cfg.batch_count;

        let ldu = if left == SvectMode::None { 1 } else { m };
        let stride_u = match left {
            SvectMode::None => 1,
            SvectMode::Singular => ldu * k,
            SvectMode::All => ldu * m,
        };
        let ldv = match right {
            SvectMode::None => 1,
            SvectMode::Singular => k,
            SvectMode::All => n,
        };
        let stride_v = if right == SvectMode::None { 1 } else { ldv * n };

        let mut d_a = backend.alloc::<f32>(cfg.strided_len())?;
        d_a.copy_from_host(&host)?;
        let d_s = backend.alloc::<f32>(k * batch)?;
        let d_u = backend.alloc::<f32>(stride_u * batch)?;
        let d_v = backend.alloc::<f32>(stride_v * batch)?;
        let d_residual = backend.alloc::<f32>(batch)?;
        let d_sweeps = backend.alloc::<i32>(batch)?;
        let d_info = backend.alloc::<i32>(batch)?;
        let d_vwork = backend.alloc::<f32>(n * n * batch)?;

        let module = get_or_load_module(
            backend.context(),
            backend.device_index(),
            module_names::GESVDJ,
        )?;
        let func = get_kernel_function(&module, "gesvdj_strided_batched_f32")?;
        let timer = EventTimer::new(&backend)?;

        Ok(Self {
            backend,
            cfg,
            left,
            right,
            controls,
            pristine: host,
            d_a,
            d_s,
            d_u,
            d_v,
            d_residual,
            d_sweeps,
            d_info,
            d_vwork,
            ldu,
            ldv,
            stride_u,
            stride_v,
            func,
            timer,
        })
    }

    fn launch(&self) -> Result<()> {
        if self.cfg.batch_count == 0 || self.cfg.min_dim() == 0 {
            return Ok(());
        }
        let stream = self.backend.stream();
        let launch_cfg = batched_launch_config(self.cfg.batch_count);

        let left = svect_code(self.left);
        let right = svect_code(self.right);
        let m = self.cfg.rows as i32;
        let n = self.cfg.cols as i32;
        let a = self.d_a.ptr();
        let lda = self.cfg.lda as i32;
        let stride_a = self.cfg.stride as i64;
        let tolerance = self.controls.tolerance as f32;
        let residual = self.d_residual.ptr();
        let max_sweeps = self.controls.max_sweeps as i32;
        let sweeps = self.d_sweeps.ptr();
        let s = self.d_s.ptr();
        let stride_s = self.cfg.min_dim() as i64;
        let u = self.d_u.ptr();
        let ldu = self.ldu as i32;
        let stride_u = self.stride_u as i64;
        let v = self.d_v.ptr();
        let ldv = self.ldv as i32;
        let stride_v = self.stride_v as i64;
        let info = self.d_info.ptr();
        let vwork = self.d_vwork.ptr();
        let batch = self.cfg.batch_count as i32;

        let mut builder = stream.launch_builder(&self.func);
        builder.arg(&left);
        builder.arg(&right);
        builder.arg(&m);
        builder.arg(&n);
        builder.arg(&a);
        builder.arg(&lda);
        builder.arg(&stride_a);
        builder.arg(&tolerance);
        builder.arg(&residual);
        builder.arg(&max_sweeps);
        builder.arg(&sweeps);
        builder.arg(&s);
        builder.arg(&stride_s);
        builder.arg(&u);
        builder.arg(&ldu);
        builder.arg(&stride_u);
        builder.arg(&v);
        builder.arg(&ldv);
        builder.arg(&stride_v);
        builder.arg(&info);
        builder.arg(&vwork);
        builder.arg(&batch);
        unsafe { builder.launch(launch_cfg) }?;
        Ok(())
    }
}

impl BenchKernel for CudaGesvdj {
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
                    "svd did not converge within the sweep limit"
                );
            } else {
                converged += 1;
            }
        }
        debug!(
            converged,
            batch_count = info.len(),
            "svd convergence summary"
        );
        Ok(())
    }
}
