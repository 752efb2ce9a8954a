//! Device QR-factorization benchmark kernel

use cudarc::driver::safe::CudaFunction;
use cudarc::driver::PushKernelArg;

use crate::config::{BatchConfig, Layout};
use crate::error::Result;
use crate::generate::BatchedMatrixSet;
use crate::kernel::BenchKernel;

use super::loader::{batched_launch_config, get_kernel_function, get_or_load_module, module_names};
use super::{CudaBackend, DeviceBuffer, EventTimer};

enum StagedInput {
    /// One contiguous device buffer
    Strided(DeviceBuffer<f64>),
    /// Per-element device buffers plus the staged array of their addresses
    PointerArray {
        elements: Vec<DeviceBuffer<f64>>,
        addresses: DeviceBuffer<u64>,
    },
}

/// Batched Householder QR on the device
///
/// Factors overwrite the staged input in place; Householder scalars land in
/// a device buffer of `min(rows, cols)` elements per batch element. The
/// pointer-array variant stages the address array itself as a separate
/// device allocation, like the reference batched call.
pub struct CudaGeqrf {
    backend: CudaBackend,
    cfg: BatchConfig,
    pristine: BatchedMatrixSet<f64>,
    input: StagedInput,
    d_tau: DeviceBuffer<f64>,
    func: CudaFunction,
    timer: EventTimer,
}

impl CudaGeqrf {
    /// Stage a generated batch into device memory.
    pub fn new(
        backend: CudaBackend,
        cfg: BatchConfig,
        pristine: BatchedMatrixSet<f64>,
    ) -> Result<Self> {
        let module =
            get_or_load_module(backend.context(), backend.device_index(), module_names::GEQRF)?;

        let (input, func) = match (&pristine, cfg.layout) {
            (BatchedMatrixSet::Strided(host), Layout::Strided) => {
                let mut buf = backend.alloc::<f64>(cfg.strided_len())?;
                buf.copy_from_host(host)?;
                let func = get_kernel_function(&module, "geqrf_strided_batched_f64")?;
                (StagedInput::Strided(buf), func)
            }
            (BatchedMatrixSet::PointerArray(host), Layout::PointerArray) => {
                let mut elements = Vec::with_capacity(cfg.batch_count);
                for matrix in host {
                    let mut buf = backend.alloc::<f64>(cfg.matrix_len())?;
                    buf.copy_from_host(matrix)?;
                    elements.push(buf);
                }
                let ptrs: Vec<u64> = elements.iter().map(DeviceBuffer::ptr).collect();
                let mut addresses = backend.alloc::<u64>(cfg.batch_count)?;
                addresses.copy_from_host(&ptrs)?;
                let func = get_kernel_function(&module, "geqrf_ptr_batched_f64")?;
                (
                    StagedInput::PointerArray {
                        elements,
                        addresses,
                    },
                    func,
                )
            }
            _ => unreachable!("generator layout always matches the config"),
        };

        let d_tau = backend.alloc::<f64>(cfg.min_dim() * cfg.batch_count)?;
        let timer = EventTimer::new(&backend)?;
        Ok(Self {
            backend,
            cfg,
            pristine,
            input,
            d_tau,
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

        let m = self.cfg.rows as i32;
        let n = self.cfg.cols as i32;
        let lda = self.cfg.lda as i32;
        let stride_p = self.cfg.min_dim() as i64;
        let batch = self.cfg.batch_count as i32;
        let tau = self.d_tau.ptr();

        let mut builder = stream.launch_builder(&self.func);
        match &self.input {
            StagedInput::Strided(buf) => {
                let a = buf.ptr();
                let stride_a = self.cfg.stride as i64;
                builder.arg(&a);
                builder.arg(&m);
                builder.arg(&n);
                builder.arg(&lda);
                builder.arg(&stride_a);
                builder.arg(&tau);
                builder.arg(&stride_p);
                builder.arg(&batch);
                unsafe { builder.launch(launch_cfg) }?;
            }
            StagedInput::PointerArray { addresses, .. } => {
                let a = addresses.ptr();
                builder.arg(&a);
                builder.arg(&m);
                builder.arg(&n);
                builder.arg(&lda);
                builder.arg(&tau);
                builder.arg(&stride_p);
                builder.arg(&batch);
                unsafe { builder.launch(launch_cfg) }?;
            }
        }
        Ok(())
    }
}

impl BenchKernel for CudaGeqrf {
    fn restore(&mut self) -> Result<()> {
        match (&mut self.input, &self.pristine) {
            (StagedInput::Strided(buf), BatchedMatrixSet::Strided(host)) => {
                buf.copy_from_host(host)?;
            }
            (
                StagedInput::PointerArray { elements, .. },
                BatchedMatrixSet::PointerArray(host),
            ) => {
                for (buf, matrix) in elements.iter_mut().zip(host.iter()) {
                    buf.copy_from_host(matrix)?;
                }
            }
            _ => unreachable!("staging layout always matches the pristine set"),
        }
        Ok(())
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
}
