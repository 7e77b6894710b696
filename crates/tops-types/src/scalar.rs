use half::{bf16, f16};
use std::fmt::Debug;

/// Trait for element types stored inside operand and accumulator tiles.
pub trait TileScalar:
    Copy + Clone + Send + Sync + Debug + Default + PartialEq + 'static + Sized
{
    /// The additive identity (standard arithmetic).
    fn scalar_zero() -> Self;

    /// The multiplicative identity (standard arithmetic).
    ///
    /// For bit-packed words this is the all-ones word.
    fn scalar_one() -> Self;

    /// Widen to `f64`, used for checksums and reporting.
    fn to_f64(self) -> f64;
}

macro_rules! impl_tile_scalar_float {
    ($($t:ty),*) => {
        $(
            impl TileScalar for $t {
                #[inline(always)]
                fn scalar_zero() -> Self {
                    0.0
                }

                #[inline(always)]
                fn scalar_one() -> Self {
                    1.0
                }

                #[inline(always)]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

macro_rules! impl_tile_scalar_int {
    ($($t:ty),*) => {
        $(
            impl TileScalar for $t {
                #[inline(always)]
                fn scalar_zero() -> Self {
                    0
                }

                #[inline(always)]
                fn scalar_one() -> Self {
                    1
                }

                #[inline(always)]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

macro_rules! impl_tile_scalar_half {
    ($($t:ty),*) => {
        $(
            impl TileScalar for $t {
                #[inline(always)]
                fn scalar_zero() -> Self {
                    <$t>::ZERO
                }

                #[inline(always)]
                fn scalar_one() -> Self {
                    <$t>::ONE
                }

                #[inline(always)]
                fn to_f64(self) -> f64 {
                    <$t>::to_f64(self)
                }
            }
        )*
    };
}

impl_tile_scalar_float!(f32, f64);
impl_tile_scalar_int!(i8, u8, i32);
impl_tile_scalar_half!(f16, bf16);

impl TileScalar for u32 {
    #[inline(always)]
    fn scalar_zero() -> Self {
        0
    }

    #[inline(always)]
    fn scalar_one() -> Self {
        u32::MAX
    }

    #[inline(always)]
    fn to_f64(self) -> f64 {
        self.count_ones() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identities() {
        assert_eq!(f32::scalar_zero(), 0.0);
        assert_eq!(f64::scalar_one(), 1.0);
        assert_eq!(i8::scalar_one(), 1);
        assert_eq!(f16::scalar_one().to_f32(), 1.0);
        assert_eq!(bf16::scalar_zero().to_f32(), 0.0);
    }

    #[test]
    fn test_packed_word_is_all_ones() {
        assert_eq!(u32::scalar_one(), 0xFFFF_FFFF);
        // Bit words widen to their population count.
        assert_eq!(u32::scalar_one().to_f64(), 32.0);
        assert_eq!(0x0F0Fu32.to_f64(), 8.0);
    }

    #[test]
    fn test_to_f64() {
        assert_eq!((-3i8).to_f64(), -3.0);
        assert_eq!(f16::from_f32(2.5).to_f64(), 2.5);
        assert_eq!(bf16::from_f32(-4.0).to_f64(), -4.0);
    }
}
