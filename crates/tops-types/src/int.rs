use crate::traits::{Accumulate, Precision};

/// Unsigned 8-bit integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct U8;

/// Signed 8-bit integer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct S8;

/// Unsigned 4-bit integer, one nibble stored per byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct U4;

/// Signed 4-bit integer, one nibble stored per byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct S4;

/// Signed 32-bit integer accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct S32;

impl Precision for U8 {
    type Scalar = u8;
    const NAME: &'static str = "u8";
    const BITS: u32 = 8;
}

impl Precision for S8 {
    type Scalar = i8;
    const NAME: &'static str = "s8";
    const BITS: u32 = 8;
}

impl Precision for U4 {
    type Scalar = u8;
    const NAME: &'static str = "u4";
    const BITS: u32 = 4;

    #[inline(always)]
    fn quantize(s: u8) -> u8 {
        s & 0x0F
    }
}

impl Precision for S4 {
    type Scalar = i8;
    const NAME: &'static str = "s4";
    const BITS: u32 = 4;

    /// Keeps the low nibble and sign-extends it.
    #[inline(always)]
    fn quantize(s: i8) -> i8 {
        s.wrapping_shl(4) >> 4
    }
}

impl Precision for S32 {
    type Scalar = i32;
    const NAME: &'static str = "s32";
    const BITS: u32 = 32;
}

macro_rules! impl_accumulate_s32 {
    ($($input:ty),*) => {
        $(
            impl Accumulate<$input> for S32 {
                #[inline(always)]
                fn multiply_add(
                    acc: i32,
                    a: <$input as Precision>::Scalar,
                    b: <$input as Precision>::Scalar,
                ) -> i32 {
                    let a = i32::from(<$input>::quantize(a));
                    let b = i32::from(<$input>::quantize(b));
                    acc.wrapping_add(a * b)
                }
            }
        )*
    };
}

impl_accumulate_s32!(U8, S8, U4, S4);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_u4_keeps_low_nibble() {
        assert_eq!(U4::quantize(0x3A), 0x0A);
        assert_eq!(U4::quantize(15), 15);
    }

    #[test]
    fn test_s4_sign_extends() {
        assert_eq!(S4::quantize(7), 7);
        assert_eq!(S4::quantize(8), -8);
        assert_eq!(S4::quantize(-1), -1);
        assert_eq!(S4::quantize(0x1F), -1);
    }

    #[test]
    fn test_integer_accumulation() {
        assert_eq!(<S32 as Accumulate<U8>>::multiply_add(1, 200, 3), 601);
        assert_eq!(<S32 as Accumulate<S8>>::multiply_add(0, -128, 127), -16256);
        assert_eq!(<S32 as Accumulate<U4>>::multiply_add(0, 0xFF, 2), 30);
        assert_eq!(<S32 as Accumulate<S4>>::multiply_add(10, -8, 7), -46);
    }

    #[test]
    fn test_s32_accumulation_wraps() {
        let acc = <S32 as Accumulate<U8>>::multiply_add(i32::MAX, 1, 1);
        assert_eq!(acc, i32::MIN);
    }
}
