use crate::scalar::TileScalar;
use std::fmt::Debug;

/// A numeric precision that tiles can be built from.
///
/// Precisions are zero-sized markers: the data lives in [`Precision::Scalar`],
/// while the marker selects the accumulation rule and the legality of a
/// primitive at compile time.
pub trait Precision: Copy + Clone + Default + Send + Sync + Debug + 'static {
    /// The element type stored in a tile.
    type Scalar: TileScalar;

    /// Short lowercase name used in kernel names (`f16`, `s32`, ...).
    const NAME: &'static str;

    /// Number of significant bits per element.
    const BITS: u32;

    /// Round or clamp a host value into the representable range.
    #[inline(always)]
    fn quantize(s: Self::Scalar) -> Self::Scalar {
        s
    }
}

/// Multiply-accumulate rule for an input precision `I` accumulating into `Self`.
///
/// Only legal pairings implement this trait; the primitive for an illegal
/// pairing does not exist.
pub trait Accumulate<I: Precision>: Precision {
    /// Returns `acc + a * b` in the accumulator precision.
    fn multiply_add(acc: Self::Scalar, a: I::Scalar, b: I::Scalar) -> Self::Scalar;
}
