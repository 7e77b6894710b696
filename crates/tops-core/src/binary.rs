//! Bit-packed tile primitives.

use crate::tile::{BitAccumulator, BitOperandA, BitOperandB};
use tops_types::BitOp;

/// Trait for bit-packed combine-and-popcount primitives.
///
/// Computes `acc[i][j] += Σ_w popc(op(a[i][w], b[j][w]))` where `a` is stored
/// by rows and `b` by columns, both as `KW` packed words.
pub trait BinaryPrimitive<Op: BitOp, const M: usize, const N: usize, const KW: usize> {
    /// Execute one combine-and-accumulate step in place.
    fn bmma(
        &self,
        op: Op,
        a: &BitOperandA<M, KW>,
        b: &BitOperandB<N, KW>,
        acc: &mut BitAccumulator<M, N>,
    );
}

/// Scalar reference bit-packed primitive.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmulatedBmma;

impl<Op: BitOp, const M: usize, const N: usize, const KW: usize> BinaryPrimitive<Op, M, N, KW>
    for EmulatedBmma
{
    #[inline]
    fn bmma(
        &self,
        op: Op,
        a: &BitOperandA<M, KW>,
        b: &BitOperandB<N, KW>,
        acc: &mut BitAccumulator<M, N>,
    ) {
        for i in 0..M {
            let a_row = a.row(i);
            for j in 0..N {
                let b_col = b.row(j);
                let count: i32 = a_row
                    .iter()
                    .zip(b_col.iter())
                    .map(|(&x, &y)| op.popc(x, y))
                    .sum();
                acc[(i, j)] = acc[(i, j)].wrapping_add(count);
            }
        }
    }
}
