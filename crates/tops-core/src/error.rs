//! Error types for kernel selection and launch.

use crate::tier::Capability;
use thiserror::Error;

/// Errors that can occur while selecting or launching a kernel.
///
/// Unsupported shape/precision/tier combinations never show up here: they
/// have no trait implementation and fail to compile.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopsError {
    /// The device is older than the tier the kernel was built for.
    #[error("kernel requires {required} but the device provides {available}")]
    CapabilityMismatch {
        /// Tier the kernel was built for.
        required: Capability,
        /// Tier the device reports.
        available: Capability,
    },

    /// No variant with this name is registered.
    #[error("unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// A capability name or compute capability that maps to no known tier.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// Launch configuration failed validation.
    #[error("invalid launch configuration: {0}")]
    InvalidLaunch(&'static str),
}

/// Result type for kernel selection and launch.
pub type Result<T> = std::result::Result<T, TopsError>;
