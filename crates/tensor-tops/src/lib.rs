//! Generation-dispatched tensor-core micro-kernel runner.
//!
//! Every kernel repeatedly executes one fixed-shape matrix-multiply-accumulate
//! primitive for a precision pairing on a hardware capability tier, and
//! discards the result except for a guarded store that never executes. The
//! kernels exist to measure sustained tensor-core throughput.
//!
//! # Capability Tiers
//!
//! | Tier | Generation | Adds |
//! |------|------------|------|
//! | [`Sm70`] | Volta | f16 wmma, f16 mma 8×8×4 |
//! | [`Sm75`] | Turing | u8/s8, u4/s4, XOR popcount |
//! | [`Sm80`] | Ampere | bf16, tf32, f64, AND popcount |
//! | [`Sm89`] | Ada | same primitives as Ampere |
//! | [`Sm90`] | Hopper | wgmma; drops u4/s4 and XOR |
//!
//! Which primitives exist on which tier is checked when the crate is built.
//! Whether a device can run a tier is checked once, by [`select`].
//!
//! # Quick Start
//!
//! ```
//! use tensor_tops::{select, tops_f16f32_sm70wmma_16x16x16, Capability, HostEmulator,
//!     LaunchConfig, Sm70};
//!
//! let device = HostEmulator::new(Capability::Turing);
//! let launcher = select::<Sm70>(&device)?;
//!
//! let report = tops_f16f32_sm70wmma_16x16x16(&launcher, &LaunchConfig::new(4, 32))?;
//! assert_eq!(report.variant, "f16f32_sm70wmma_16x16x16");
//! assert!(!report.guard_fired);
//! println!("{:.3} TOPS", report.tops());
//! # Ok::<(), tensor_tops::TopsError>(())
//! ```
//!
//! # Registry
//!
//! ```
//! use tensor_tops::{find, registry, Capability, HostEmulator, LaunchConfig};
//!
//! for variant in registry::available_on(Capability::Volta) {
//!     println!("{}", variant);
//! }
//!
//! let variant = find("b1i32and_sm80bmma_8x8x128")?;
//! let report = variant.run(&HostEmulator::new(Capability::Ampere), &LaunchConfig::SMOKE)?;
//! assert_eq!(report.checksum, Some(64.0 * 128.0));
//! # Ok::<(), tensor_tops::TopsError>(())
//! ```
//!
//! # GPU Execution
//!
//! The `tops-cuda` crate launches the `wmma` variants on a real device:
//!
//! ```ignore
//! use tensor_tops::Sm80;
//! use tops_cuda::{launch_variant, CudaContext, WmmaVariant};
//! use tops_types::{Bf16, F32};
//!
//! let ctx = CudaContext::new()?;
//! let report = launch_variant::<WmmaVariant<Sm80, Bf16, F32, 16, 16, 16>>(&ctx, &cfg)?;
//! ```

mod api;
mod info;
pub mod registry;

pub use api::*;
pub use info::{host_primitives, version_info};
pub use registry::{find, Variant};

pub use tops_core::{
    select, BitTileInit, Capability, Device, Family, HostEmulator, LaunchConfig, LaunchReport,
    Launcher, Result, Sm70, Sm75, Sm80, Sm89, Sm90, Tier, TileInit, TopsError,
};
pub use tops_simd::{simd_level, SimdLevel};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{
        find, registry, run_binary, run_dense, select, Capability, HostEmulator, LaunchConfig,
        LaunchReport, Sm70, Sm75, Sm80, Sm89, Sm90, TopsError,
    };
}
