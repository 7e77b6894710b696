//! Precision types for tensor-core style multiply-accumulate tiles.
//!
//! Every tile element is described by a [`Precision`] marker that names the
//! storage scalar, and every legal input/output pairing is described by an
//! [`Accumulate`] implementation on the output precision.
//!
//! # Supported Precisions
//!
//! | Marker | Storage | Bits | Accumulates into |
//! |--------|---------|------|------------------|
//! | [`F16`] | `half::f16` | 16 | [`F16`], [`F32`] |
//! | [`Bf16`] | `half::bf16` | 16 | [`F32`] |
//! | [`Tf32`] | `f32` | 19 | [`F32`] |
//! | [`F64`] | `f64` | 64 | [`F64`] |
//! | [`U8`] / [`S8`] | `u8` / `i8` | 8 | [`S32`] |
//! | [`U4`] / [`S4`] | `u8` / `i8` | 4 | [`S32`] |
//! | [`B1`] | `u32` (32 packed bits) | 1 | `i32` via [`BitOp`] + popcount |
//!
//! # Example
//!
//! ```
//! use tops_types::{Accumulate, Precision, TileScalar, F16, F32};
//!
//! let one = <F16 as Precision>::Scalar::scalar_one();
//! let acc = <F32 as Accumulate<F16>>::multiply_add(0.5, one, one);
//! assert_eq!(acc, 1.5);
//! ```

mod binary;
mod float;
mod int;
mod scalar;
mod traits;

pub use binary::{And, BitOp, Xor, B1};
pub use float::{Bf16, Tf32, F16, F32, F64};
pub use half::{bf16, f16};
pub use int::{S32, S4, S8, U4, U8};
pub use scalar::TileScalar;
pub use traits::{Accumulate, Precision};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use super::{
        Accumulate, And, Bf16, BitOp, Precision, Tf32, TileScalar, Xor, B1, F16, F32, F64, S32,
        S4, S8, U4, U8,
    };
}
