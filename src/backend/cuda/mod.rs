//! CUDA device backend
//!
//! Staging allocates device global memory on a single stream; kernel
//! launches are asynchronous to the issuing thread and every measured
//! interval is closed with an event synchronization before the elapsed time
//! is read. Kernels are compiled from `.cu` sources to PTX by `build.rs`
//! and loaded through the module cache in [`loader`].

mod geqrf;
mod gesvdj;
pub mod loader;
mod syevj;

pub use geqrf::CudaGeqrf;
pub use gesvdj::CudaGesvdj;
pub use syevj::CudaSyevj;

use std::marker::PhantomData;
use std::sync::Arc;

use cudarc::driver::safe::{CudaContext, CudaEvent, CudaStream};
use cudarc::driver::sys;
use tracing::debug;

use crate::error::{Error, Result};

/// Context and stream of the active device
///
/// Cheap to clone; all staged buffers and events of one benchmark share the
/// same stream, so launches, restores, and event records are totally
/// ordered.
#[derive(Clone)]
pub struct CudaBackend {
    context: Arc<CudaContext>,
    stream: Arc<CudaStream>,
    device_index: usize,
}

impl CudaBackend {
    /// Bind to device `device_index`.
    pub fn new(device_index: usize) -> Result<Self> {
        let context = CudaContext::new(device_index).map_err(|e| Error::BackendUnavailable {
            backend: "device",
            reason: format!("failed to initialize CUDA device {device_index}: {e:?}"),
        })?;
        let stream = context.default_stream();
        debug!(device_index, "cuda backend initialized");
        Ok(Self {
            context,
            stream,
            device_index,
        })
    }

    /// The CUDA context of this device.
    pub fn context(&self) -> &Arc<CudaContext> {
        &self.context
    }

    /// The command stream all work of this backend is issued on.
    pub fn stream(&self) -> &Arc<CudaStream> {
        &self.stream
    }

    /// Ordinal of the bound device.
    pub fn device_index(&self) -> usize {
        self.device_index
    }

    /// Allocate `len` elements of device memory.
    pub fn alloc<T: Copy>(&self, len: usize) -> Result<DeviceBuffer<T>> {
        DeviceBuffer::alloc(self.stream.clone(), len)
    }

    /// Block the host until all issued work has completed.
    pub fn synchronize(&self) -> Result<()> {
        self.stream.synchronize()?;
        Ok(())
    }
}

/// Scoped device allocation
///
/// Frees its memory on drop (stream-ordered), so staged buffers release on
/// every exit path, including errors during staging.
pub struct DeviceBuffer<T> {
    ptr: u64,
    len: usize,
    stream: Arc<CudaStream>,
    _elem: PhantomData<T>,
}

impl<T: Copy> DeviceBuffer<T> {
    fn alloc(stream: Arc<CudaStream>, len: usize) -> Result<Self> {
        let bytes = len * std::mem::size_of::<T>();
        let mut ptr: u64 = 0;
        if bytes > 0 {
            let result =
                unsafe { sys::cuMemAllocAsync(&mut ptr, bytes, stream.cu_stream()) };
            if result != sys::CUresult::CUDA_SUCCESS {
                return Err(Error::Allocation {
                    size: bytes,
                    backend: "device",
                });
            }
        }
        Ok(Self {
            ptr,
            len,
            stream,
            _elem: PhantomData,
        })
    }

    /// Raw device address, for kernel arguments.
    pub fn ptr(&self) -> u64 {
        self.ptr
    }

    /// Elements this buffer holds.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True for a zero-length buffer.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Stream-ordered host-to-device copy of `src` into this buffer.
    ///
    /// `src` must stay valid until the stream reaches the copy; staged
    /// pristine data lives for the whole benchmark, which satisfies that.
    pub fn copy_from_host(&mut self, src: &[T]) -> Result<()> {
        debug_assert!(src.len() <= self.len);
        let bytes = src.len() * std::mem::size_of::<T>();
        if bytes == 0 {
            return Ok(());
        }
        let result = unsafe {
            sys::cuMemcpyHtoDAsync_v2(
                self.ptr,
                src.as_ptr() as *const std::ffi::c_void,
                bytes,
                self.stream.cu_stream(),
            )
        };
        if result != sys::CUresult::CUDA_SUCCESS {
            return Err(Error::Launch(format!(
                "host-to-device copy of {bytes} bytes failed: {result:?}"
            )));
        }
        Ok(())
    }

    /// Copy this buffer back to `dst` and wait for completion.
    pub fn copy_to_host(&self, dst: &mut [T]) -> Result<()> {
        debug_assert!(dst.len() <= self.len);
        let bytes = dst.len() * std::mem::size_of::<T>();
        if bytes == 0 {
            return Ok(());
        }
        let result = unsafe {
            sys::cuMemcpyDtoHAsync_v2(
                dst.as_mut_ptr() as *mut std::ffi::c_void,
                self.ptr,
                bytes,
                self.stream.cu_stream(),
            )
        };
        if result != sys::CUresult::CUDA_SUCCESS {
            return Err(Error::Launch(format!(
                "device-to-host copy of {bytes} bytes failed: {result:?}"
            )));
        }
        self.stream.synchronize()?;
        Ok(())
    }
}

impl<T> Drop for DeviceBuffer<T> {
    fn drop(&mut self) {
        if self.ptr != 0 {
            // stream-ordered free; failures here are benign at teardown
            unsafe {
                let _ = sys::cuMemFreeAsync(self.ptr, self.stream.cu_stream());
            }
        }
    }
}

/// Event pair bracketing one timed kernel invocation
pub struct EventTimer {
    start: CudaEvent,
    stop: CudaEvent,
}

impl EventTimer {
    /// Create the event pair on `backend`'s context.
    pub fn new(backend: &CudaBackend) -> Result<Self> {
        let start = backend
            .context
            .new_event(Some(sys::CUevent_flags::CU_EVENT_DEFAULT))?;
        let stop = backend
            .context
            .new_event(Some(sys::CUevent_flags::CU_EVENT_DEFAULT))?;
        Ok(Self { start, stop })
    }

    /// Record the start event on `stream`.
    pub fn begin(&self, stream: &CudaStream) -> Result<()> {
        self.start.record(stream)?;
        Ok(())
    }

    /// Record the stop event, synchronize on it, and return the elapsed
    /// device time in milliseconds.
    ///
    /// The synchronization closes the measured interval before the clock is
    /// read.
    pub fn finish(&self, stream: &CudaStream) -> Result<f64> {
        self.stop.record(stream)?;
        self.stop.synchronize()?;
        let elapsed = self.start.elapsed_ms(&self.stop)?;
        Ok(f64::from(elapsed))
    }
}
