//! CUDA backend for tensor-core micro-kernels.
//!
//! Each warp-level variant from the host crate has a CUDA counterpart that
//! is generated as source, compiled with NVRTC for the variant's tier and
//! launched one warp per execution group. Every operand element is one and
//! the accumulator starts at zero. The kernel repeats the tile instruction
//! and finally stores the accumulator only on a lane whose index equals a
//! runtime argument set to `u32::MAX`, so the store never happens and the
//! sink keeps its sentinel fill.
//!
//! # Quick Start
//!
//! ```ignore
//! use tops_cuda::{launch_variant, CudaContext, WmmaVariant};
//! use tops_core::{LaunchConfig, Sm80};
//! use tops_types::{Bf16, F32};
//!
//! let ctx = CudaContext::new()?;
//! let report =
//!     launch_variant::<WmmaVariant<Sm80, Bf16, F32, 16, 16, 16>>(&ctx, &LaunchConfig::DEFAULT)?;
//! println!("{}: {:.2} TOPS", report.variant, report.tops());
//! assert!(!report.guard_fired);
//! ```
//!
//! # Performance
//!
//! NVRTC compilation takes a noticeable fraction of a second per kernel.
//! [`get_global_context`] returns a lazily created context whose compiled
//! kernels persist for the lifetime of the process.
//!
//! The warpgroup (`wgmma`) and `mma`-only variants have no CUDA
//! counterpart here; they run on the host emulator only.

mod context;
mod error;
mod kernels;

use once_cell::sync::OnceCell;

/// Global CUDA context, created on first use.
static GLOBAL_CONTEXT: OnceCell<CudaContext> = OnceCell::new();

/// Get or initialize the global CUDA context.
///
/// # Errors
///
/// Returns an error if CUDA initialization fails (no device, driver issues,
/// or a compute capability older than `sm_70`).
pub fn get_global_context() -> Result<&'static CudaContext> {
    GLOBAL_CONTEXT.get_or_try_init(CudaContext::new)
}

pub use context::CudaContext;
pub use error::{CudaError, Result};
pub use kernels::{
    binary_source, dense_source, launch_dims, launch_variant, virtual_arch, BmmaOp, BmmaVariant,
    CudaVariant, WmmaAccumulator, WmmaInput, WmmaVariant,
};

#[cfg(test)]
mod tests {
    use super::*;
    use tops_core::{Capability, Device, LaunchConfig, Sm70, Sm75, Sm80, Sm90, TopsError};
    use tops_types::{Xor, F16, F32, S32, S8};

    /// Helper to check if CUDA is available
    fn cuda_context_or_skip() -> Option<CudaContext> {
        let result = std::panic::catch_unwind(CudaContext::new);
        match result {
            Ok(Ok(ctx)) => Some(ctx),
            Ok(Err(e)) => {
                println!("CUDA not available (error: {:?}), skipping test", e);
                None
            }
            Err(_) => {
                println!("CUDA libraries not found, skipping test");
                None
            }
        }
    }

    #[test]
    fn test_smoke_launch_sm70() {
        let Some(ctx) = cuda_context_or_skip() else {
            return;
        };

        let report =
            launch_variant::<WmmaVariant<Sm70, F16, F32, 16, 16, 16>>(&ctx, &LaunchConfig::SMOKE)
                .unwrap();
        assert_eq!(report.variant, "f16f32_sm70wmma_16x16x16");
        assert_eq!(report.group_size, 32);
        assert_eq!(report.macs, 4096);
        assert_eq!(report.checksum, None);
        assert!(!report.guard_fired);
    }

    #[test]
    fn test_launch_integer_and_binary() {
        let Some(ctx) = cuda_context_or_skip() else {
            return;
        };
        if !ctx.capability().satisfies(Capability::Turing) {
            return;
        }

        let cfg = LaunchConfig::new(4, 64);
        let report = launch_variant::<WmmaVariant<Sm75, S8, S32, 16, 16, 16>>(&ctx, &cfg).unwrap();
        assert!(!report.guard_fired);
        assert_eq!(report.macs, 4096 * 4 * 64);

        let report = launch_variant::<BmmaVariant<Sm75, Xor, 8, 8, 4>>(&ctx, &cfg).unwrap();
        assert_eq!(report.variant, "b1i32xor_sm75bmma_8x8x128");
        assert!(!report.guard_fired);
    }

    #[test]
    fn test_kernel_cache() {
        let Some(ctx) = cuda_context_or_skip() else {
            return;
        };

        let cfg = LaunchConfig::SMOKE;
        launch_variant::<WmmaVariant<Sm70, F16, F32, 16, 16, 16>>(&ctx, &cfg).unwrap();
        launch_variant::<WmmaVariant<Sm70, F16, F32, 16, 16, 16>>(&ctx, &cfg).unwrap();
        assert_eq!(ctx.compiled_kernels(), 1);
    }

    #[test]
    fn test_capability_mismatch_before_compile() {
        let Some(ctx) = cuda_context_or_skip() else {
            return;
        };
        if ctx.capability().satisfies(Capability::Hopper) {
            return;
        }

        let err = launch_variant::<WmmaVariant<Sm90, F16, F32, 16, 16, 16>>(
            &ctx,
            &LaunchConfig::SMOKE,
        )
        .unwrap_err();
        match err {
            CudaError::Core(TopsError::CapabilityMismatch { required, .. }) => {
                assert_eq!(required, Capability::Hopper)
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(ctx.compiled_kernels(), 0);
    }

    #[test]
    fn test_invalid_config() {
        let Some(ctx) = cuda_context_or_skip() else {
            return;
        };

        let err = launch_variant::<WmmaVariant<Sm80, F16, F32, 16, 16, 16>>(
            &ctx,
            &LaunchConfig::new(0, 1),
        )
        .unwrap_err();
        assert!(matches!(err, CudaError::Core(TopsError::InvalidLaunch(_))));

        let err = launch_variant::<WmmaVariant<Sm70, F16, F32, 16, 16, 16>>(
            &ctx,
            &LaunchConfig::new(1, 1 << 31),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CudaError::Core(TopsError::InvalidLaunch("repetitions exceed i32::MAX"))
        ));
        assert_eq!(ctx.compiled_kernels(), 0);
    }
}
