use crate::traits::Precision;
use std::fmt::Debug;

/// Single-bit precision, packed 32 elements per `u32` word.
///
/// Bit-packed tiles do not multiply: each step combines two words with a
/// [`BitOp`] and accumulates the population count of the result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct B1;

impl Precision for B1 {
    type Scalar = u32;
    const NAME: &'static str = "b1";
    const BITS: u32 = 1;
}

/// Boolean combination applied to bit-packed operands before population count.
///
/// The operator is passed by value on each invocation, so the same kernel can
/// run with a different combination on every call.
pub trait BitOp: Copy + Clone + Default + Send + Sync + Debug + 'static {
    /// Short lowercase name used in kernel names (`xor`, `and`).
    const NAME: &'static str;

    /// Combine two packed words bitwise.
    fn combine(self, a: u32, b: u32) -> u32;

    /// Combine two packed words and count the set bits.
    #[inline(always)]
    fn popc(self, a: u32, b: u32) -> i32 {
        self.combine(a, b).count_ones() as i32
    }
}

/// Exclusive-or combination (Hamming distance).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Xor;

/// Conjunction combination (binary dot product).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct And;

impl BitOp for Xor {
    const NAME: &'static str = "xor";

    #[inline(always)]
    fn combine(self, a: u32, b: u32) -> u32 {
        a ^ b
    }
}

impl BitOp for And {
    const NAME: &'static str = "and";

    #[inline(always)]
    fn combine(self, a: u32, b: u32) -> u32 {
        a & b
    }
}
