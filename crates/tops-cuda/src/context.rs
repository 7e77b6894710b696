//! CUDA context and kernel management.

use crate::error::{CudaError, Result};
use cudarc::driver::sys::CUdevice_attribute;
use cudarc::driver::{CudaDevice, CudaFunction};
use cudarc::nvrtc::{compile_ptx_with_opts, CompileOptions};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tops_core::{Capability, Device};

/// Fallback CUDA include directory for NVRTC.
const DEFAULT_CUDA_INCLUDE: &str = "/usr/local/cuda/include";

/// CUDA context for tensor-core micro-kernels.
///
/// Manages device selection, kernel compilation, and caching. Kernels are
/// compiled with NVRTC on first use for the architecture the caller names;
/// the driver JIT-compiles older PTX for newer devices.
pub struct CudaContext {
    device: Arc<CudaDevice>,
    capability: Capability,
    name: String,
    kernels: Mutex<HashMap<&'static str, CudaFunction>>,
}

impl CudaContext {
    /// Create a new CUDA context on the default device (device 0).
    pub fn new() -> Result<Self> {
        Self::new_on_device(0)
    }

    /// Create a new CUDA context on a specific device.
    pub fn new_on_device(device_id: usize) -> Result<Self> {
        if CudaDevice::count()? <= device_id as i32 {
            return Err(CudaError::NoDevice);
        }
        let device = CudaDevice::new(device_id)?;
        Self::from_device(device)
    }

    /// Create a context from an existing device.
    ///
    /// Fails with [`CudaError::UnsupportedDevice`] when the compute
    /// capability maps to no known tier.
    pub fn from_device(device: Arc<CudaDevice>) -> Result<Self> {
        let major =
            device.attribute(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MAJOR)?;
        let minor =
            device.attribute(CUdevice_attribute::CU_DEVICE_ATTRIBUTE_COMPUTE_CAPABILITY_MINOR)?;
        let capability = u32::try_from(major)
            .ok()
            .zip(u32::try_from(minor).ok())
            .and_then(|(major, minor)| Capability::from_compute_capability(major, minor))
            .ok_or(CudaError::UnsupportedDevice { major, minor })?;

        let name = device
            .name()
            .unwrap_or_else(|_| format!("CUDA Device {}", device.ordinal()));
        tracing::debug!(device = %name, %capability, "cuda context created");

        Ok(Self {
            device,
            capability,
            name,
            kernels: Mutex::new(HashMap::new()),
        })
    }

    /// Get the underlying CUDA device.
    pub fn device(&self) -> &Arc<CudaDevice> {
        &self.device
    }

    /// Get a kernel function, compiling `source` for `arch` on first use.
    ///
    /// `name` must be the `extern "C"` symbol defined by `source`; it also
    /// names the loaded module and keys the cache.
    pub fn get_or_compile(
        &self,
        name: &'static str,
        source: &str,
        arch: &'static str,
    ) -> Result<CudaFunction> {
        let mut kernels = self
            .kernels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(func) = kernels.get(name) {
            return Ok(func.clone());
        }

        tracing::debug!(kernel = name, arch, "compiling");
        let opts = CompileOptions {
            arch: Some(arch),
            include_paths: vec![cuda_include_dir()],
            ..Default::default()
        };
        let ptx = compile_ptx_with_opts(source, opts)?;
        self.device.load_ptx(ptx, name, &[name])?;

        let func = self
            .device
            .get_func(name, name)
            .ok_or_else(|| CudaError::KernelNotFound(name.to_string()))?;
        kernels.insert(name, func.clone());
        Ok(func)
    }

    /// Number of kernels compiled so far.
    pub fn compiled_kernels(&self) -> usize {
        self.kernels
            .lock()
            .map(|kernels| kernels.len())
            .unwrap_or_default()
    }
}

impl Device for CudaContext {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// CUDA include directory for NVRTC: `$CUDA_PATH/include` or the default.
fn cuda_include_dir() -> String {
    std::env::var("CUDA_PATH")
        .map(|root| format!("{}/include", root.trim_end_matches('/')))
        .unwrap_or_else(|_| DEFAULT_CUDA_INCLUDE.to_string())
}
