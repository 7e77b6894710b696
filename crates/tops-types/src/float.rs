use crate::traits::{Accumulate, Precision};
use half::{bf16, f16};

/// IEEE 754 half precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct F16;

/// Brain floating point (8-bit exponent, 7-bit mantissa).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Bf16;

/// TensorFloat-32: `f32` storage with a 10-bit mantissa.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Tf32;

/// IEEE 754 single precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct F32;

/// IEEE 754 double precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct F64;

/// Low mantissa bits dropped by tf32 (23 - 10).
const TF32_DROPPED_MASK: u32 = (1 << 13) - 1;

impl Precision for F16 {
    type Scalar = f16;
    const NAME: &'static str = "f16";
    const BITS: u32 = 16;
}

impl Precision for Bf16 {
    type Scalar = bf16;
    const NAME: &'static str = "bf16";
    const BITS: u32 = 16;
}

impl Precision for Tf32 {
    type Scalar = f32;
    const NAME: &'static str = "tf32";
    const BITS: u32 = 19;

    /// Truncates the mantissa to 10 bits, as the tensor cores read it.
    #[inline(always)]
    fn quantize(s: f32) -> f32 {
        f32::from_bits(s.to_bits() & !TF32_DROPPED_MASK)
    }
}

impl Precision for F32 {
    type Scalar = f32;
    const NAME: &'static str = "f32";
    const BITS: u32 = 32;
}

impl Precision for F64 {
    type Scalar = f64;
    const NAME: &'static str = "f64";
    const BITS: u32 = 64;
}

impl Accumulate<F16> for F16 {
    #[inline(always)]
    fn multiply_add(acc: f16, a: f16, b: f16) -> f16 {
        f16::from_f32(a.to_f32().mul_add(b.to_f32(), acc.to_f32()))
    }
}

impl Accumulate<F16> for F32 {
    #[inline(always)]
    fn multiply_add(acc: f32, a: f16, b: f16) -> f32 {
        a.to_f32().mul_add(b.to_f32(), acc)
    }
}

impl Accumulate<Bf16> for F32 {
    #[inline(always)]
    fn multiply_add(acc: f32, a: bf16, b: bf16) -> f32 {
        a.to_f32().mul_add(b.to_f32(), acc)
    }
}

impl Accumulate<Tf32> for F32 {
    #[inline(always)]
    fn multiply_add(acc: f32, a: f32, b: f32) -> f32 {
        Tf32::quantize(a).mul_add(Tf32::quantize(b), acc)
    }
}

impl Accumulate<F64> for F64 {
    #[inline(always)]
    fn multiply_add(acc: f64, a: f64, b: f64) -> f64 {
        a.mul_add(b, acc)
    }
}
