//! Dense tile primitives.
//!
//! [`EmulatedMma`] is the scalar reference every other primitive is checked
//! against.

use crate::tile::{Accumulator, OperandA, OperandB};
use tops_types::{Accumulate, Precision};

/// Trait for dense multiply-accumulate primitives.
///
/// A primitive computes one fixed-shape `acc = a × b + acc` step. The runner
/// calls it repeatedly with the same accumulator, so every implementation
/// must read the accumulator it is given rather than overwrite it.
pub trait Primitive<I: Precision, O: Precision, const M: usize, const N: usize, const K: usize> {
    /// Execute one multiply-accumulate step in place.
    fn mma(&self, a: &OperandA<I, M, K>, b: &OperandB<I, K, N>, acc: &mut Accumulator<O, M, N>);
}

/// Scalar reference primitive.
///
/// Applies [`Accumulate::multiply_add`] element by element in `k` order, which
/// is the rounding behaviour every other primitive is checked against.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmulatedMma;

impl<I, O, const M: usize, const N: usize, const K: usize> Primitive<I, O, M, N, K> for EmulatedMma
where
    I: Precision,
    O: Accumulate<I>,
{
    #[inline]
    fn mma(&self, a: &OperandA<I, M, K>, b: &OperandB<I, K, N>, acc: &mut Accumulator<O, M, N>) {
        for i in 0..M {
            let a_row = a.row(i);
            for j in 0..N {
                let mut c = acc[(i, j)];
                for (p, &a_val) in a_row.iter().enumerate() {
                    c = O::multiply_add(c, a_val, b[(p, j)]);
                }
                acc[(i, j)] = c;
            }
        }
    }
}
