//! Error types for CUDA operations.

use cudarc::driver::DriverError;
use cudarc::nvrtc::CompileError;
use thiserror::Error;
use tops_core::TopsError;

/// Errors that can occur during CUDA operations.
#[derive(Debug, Error)]
pub enum CudaError {
    /// CUDA driver error.
    #[error("CUDA driver error: {0}")]
    Driver(#[from] DriverError),

    /// CUDA kernel compilation error.
    #[error("CUDA compilation error: {0}")]
    Compile(#[from] CompileError),

    /// No CUDA device available.
    #[error("No CUDA device available")]
    NoDevice,

    /// The device's compute capability maps to no known tier.
    #[error("Unsupported device: compute capability {major}.{minor}")]
    UnsupportedDevice {
        /// Compute capability major version.
        major: i32,
        /// Compute capability minor version.
        minor: i32,
    },

    /// Selection or launch configuration error.
    #[error(transparent)]
    Core(#[from] TopsError),

    /// Kernel not found.
    #[error("Kernel not found: {0}")]
    KernelNotFound(String),
}

/// Result type for CUDA operations.
pub type Result<T> = std::result::Result<T, CudaError>;
