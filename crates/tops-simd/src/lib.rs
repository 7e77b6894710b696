//! Vectorised host primitives for tensor-tops.
//!
//! This crate provides `wide`-based implementations of the dense
//! multiply-accumulate primitive and the build-time table that picks a
//! host primitive for every precision pairing.
//!
//! # Supported Pairings
//!
//! | Input | Accumulator | Primitive |
//! |-------|-------------|-----------|
//! | f16, bf16, tf32 | f32 | [`WideMma`] (`f32x8`) |
//! | f64 | f64 | [`WideMma`] (`f64x4`) |
//! | f16 | f16 | [`tops_core::EmulatedMma`] |
//! | u8, s8, u4, s4 | s32 | [`tops_core::EmulatedMma`] |
//! | b1 | i32 | [`tops_core::EmulatedBmma`] |
//!
//! # Example
//!
//! ```
//! use tops_core::{Primitive, Tile};
//! use tops_simd::{primitive_for, simd_level};
//! use tops_types::{bf16, Bf16, F32};
//!
//! println!("Compiled SIMD level: {}", simd_level());
//!
//! let a = Tile::<bf16, 16, 16>::filled(bf16::from_f32(1.0));
//! let b = Tile::<bf16, 16, 16>::filled(bf16::from_f32(2.0));
//! let mut acc = Tile::<f32, 16, 16>::zeros();
//!
//! let mma = primitive_for::<Bf16, F32>();
//! Primitive::<Bf16, F32, 16, 16, 16>::mma(&mma, &a, &b, &mut acc);
//! assert!(acc.all_eq(32.0));
//! ```

mod detect;
pub mod dispatch;
pub mod kernels;

pub use detect::{simd_level, SimdLevel};
pub use dispatch::{primitive_for, BinaryDispatch, Dispatch};
pub use kernels::*;
