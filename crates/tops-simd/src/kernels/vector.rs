use tops_core::{Accumulator, OperandA, OperandB, Primitive};
use tops_types::{bf16, f16, Bf16, Precision, Tf32, F16, F32, F64};
use wide::{f32x8, f64x4};

const F32_LANES: usize = 8;
const F64_LANES: usize = 4;

fn load_f32x8(values: &[f32], at: usize) -> f32x8 {
    f32x8::from(std::array::from_fn::<f32, F32_LANES, _>(|t| values[at + t]))
}

fn load_f64x4(values: &[f64], at: usize) -> f64x4 {
    f64x4::from(std::array::from_fn::<f64, F64_LANES, _>(|t| values[at + t]))
}

/// Input precisions that are multiplied in `f32`.
pub trait WidenF32: Precision {
    /// The value the tensor core multiplies with.
    fn widen(s: Self::Scalar) -> f32;
}

impl WidenF32 for F16 {
    #[inline(always)]
    fn widen(s: f16) -> f32 {
        s.to_f32()
    }
}

impl WidenF32 for Bf16 {
    #[inline(always)]
    fn widen(s: bf16) -> f32 {
        s.to_f32()
    }
}

impl WidenF32 for Tf32 {
    #[inline(always)]
    fn widen(s: f32) -> f32 {
        Tf32::quantize(s)
    }
}

/// Vectorised primitive for floating-point accumulators.
///
/// Each accumulator row is processed in `f32x8` (or `f64x4`) column
/// strips. The reduction runs in `k` order like [`tops_core::EmulatedMma`],
/// so results agree with it exactly whenever every partial sum is
/// representable.
#[derive(Debug, Default, Clone, Copy)]
pub struct WideMma;

impl<I, const M: usize, const N: usize, const K: usize> Primitive<I, F32, M, N, K> for WideMma
where
    I: WidenF32,
{
    fn mma(&self, a: &OperandA<I, M, K>, b: &OperandB<I, K, N>, acc: &mut Accumulator<F32, M, N>) {
        let b_wide: [[f32; N]; K] =
            std::array::from_fn(|p| std::array::from_fn(|j| I::widen(b[(p, j)])));
        let strips = N - N % F32_LANES;

        for i in 0..M {
            let a_wide: [f32; K] = std::array::from_fn(|p| I::widen(a[(i, p)]));
            let row = acc.row_mut(i);

            for j0 in (0..strips).step_by(F32_LANES) {
                let mut c = load_f32x8(&row[..], j0);
                for (p, &a_val) in a_wide.iter().enumerate() {
                    c = f32x8::splat(a_val).mul_add(load_f32x8(&b_wide[p], j0), c);
                }
                let out: [f32; F32_LANES] = c.into();
                row[j0..j0 + F32_LANES].copy_from_slice(&out);
            }

            for j in strips..N {
                let mut c = row[j];
                for (p, &a_val) in a_wide.iter().enumerate() {
                    c = a_val.mul_add(b_wide[p][j], c);
                }
                row[j] = c;
            }
        }
    }
}

impl<const M: usize, const N: usize, const K: usize> Primitive<F64, F64, M, N, K> for WideMma {
    fn mma(
        &self,
        a: &OperandA<F64, M, K>,
        b: &OperandB<F64, K, N>,
        acc: &mut Accumulator<F64, M, N>,
    ) {
        let strips = N - N % F64_LANES;

        for i in 0..M {
            let a_row = *a.row(i);
            let row = acc.row_mut(i);

            for j0 in (0..strips).step_by(F64_LANES) {
                let mut c = load_f64x4(&row[..], j0);
                for (p, &a_val) in a_row.iter().enumerate() {
                    c = f64x4::splat(a_val).mul_add(load_f64x4(b.row(p), j0), c);
                }
                let out: [f64; F64_LANES] = c.into();
                row[j0..j0 + F64_LANES].copy_from_slice(&out);
            }

            for j in strips..N {
                let mut c = row[j];
                for (p, &a_val) in a_row.iter().enumerate() {
                    c = a_val.mul_add(b[(p, j)], c);
                }
                row[j] = c;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tops_core::{EmulatedMma, Tile};

    fn compare_f32<I: WidenF32, const M: usize, const N: usize, const K: usize>(
        a: &OperandA<I, M, K>,
        b: &OperandB<I, K, N>,
        baseline: f32,
        steps: usize,
    ) where
        F32: tops_types::Accumulate<I>,
    {
        let mut wide = Tile::<f32, M, N>::filled(baseline);
        let mut scalar = Tile::<f32, M, N>::filled(baseline);
        for _ in 0..steps {
            <WideMma as Primitive<I, F32, M, N, K>>::mma(&WideMma, a, b, &mut wide);
            <EmulatedMma as Primitive<I, F32, M, N, K>>::mma(&EmulatedMma, a, b, &mut scalar);
        }
        assert_eq!(wide, scalar);
    }

    #[test]
    fn test_f16_matches_emulated() {
        let mut a = Tile::<f16, 16, 16>::zeros();
        let mut b = Tile::<f16, 16, 16>::zeros();
        for i in 0..16 {
            for j in 0..16 {
                a[(i, j)] = f16::from_f32(((i + j) % 5) as f32 - 2.0);
                b[(i, j)] = f16::from_f32(((i * j) % 3) as f32);
            }
        }
        compare_f32::<F16, 16, 16, 16>(&a, &b, 1.0, 3);
    }

    #[test]
    fn test_bf16_narrow_tile_uses_remainder() {
        // 8x32 has full strips; 2x3 is entirely remainder.
        let a = Tile::<bf16, 8, 16>::filled(bf16::from_f32(0.5));
        let b = Tile::<bf16, 16, 32>::filled(bf16::from_f32(2.0));
        compare_f32::<Bf16, 8, 32, 16>(&a, &b, 0.0, 2);

        let a = Tile::<bf16, 2, 4>::filled(bf16::from_f32(3.0));
        let b = Tile::<bf16, 4, 3>::filled(bf16::from_f32(-1.0));
        compare_f32::<Bf16, 2, 3, 4>(&a, &b, 10.0, 1);
    }

    #[test]
    fn test_tf32_quantizes_operands() {
        let noisy = f32::from_bits(1.0f32.to_bits() | 0xFF);
        let a = Tile::<f32, 8, 4>::filled(noisy);
        let b = Tile::<f32, 4, 8>::filled(noisy);
        let mut acc = Tile::<f32, 8, 8>::filled(0.5);

        <WideMma as Primitive<Tf32, F32, 8, 8, 4>>::mma(&WideMma, &a, &b, &mut acc);

        assert!(acc.all_eq(4.5));
        compare_f32::<Tf32, 8, 8, 4>(&a, &b, 0.5, 128);
    }

    #[test]
    fn test_f64_matches_emulated() {
        let mut a = Tile::<f64, 8, 4>::zeros();
        let mut b = Tile::<f64, 4, 8>::zeros();
        for i in 0..8 {
            for p in 0..4 {
                a[(i, p)] = (i as f64) - (p as f64);
                b[(p, i)] = 0.25 * (p + i) as f64;
            }
        }
        let mut wide = Tile::<f64, 8, 8>::filled(-1.0);
        let mut scalar = wide.clone();
        for _ in 0..4 {
            <WideMma as Primitive<F64, F64, 8, 8, 4>>::mma(&WideMma, &a, &b, &mut wide);
            <EmulatedMma as Primitive<F64, F64, 8, 8, 4>>::mma(&EmulatedMma, &a, &b, &mut scalar);
        }
        assert_eq!(wide, scalar);
    }

    proptest! {
        #[test]
        fn prop_small_integers_agree(
            a_val in -8i32..8,
            b_val in -8i32..8,
            baseline in -64i32..64,
            steps in 0usize..16,
        ) {
            let a = Tile::<f16, 16, 16>::filled(f16::from_f32(a_val as f32));
            let b = Tile::<f16, 16, 16>::filled(f16::from_f32(b_val as f32));
            let mut wide = Tile::<f32, 16, 16>::filled(baseline as f32);
            let mut scalar = wide.clone();
            for _ in 0..steps {
                <WideMma as Primitive<F16, F32, 16, 16, 16>>::mma(&WideMma, &a, &b, &mut wide);
                <EmulatedMma as Primitive<F16, F32, 16, 16, 16>>::mma(&EmulatedMma, &a, &b, &mut scalar);
            }
            prop_assert_eq!(&wide, &scalar);
            let expected = (baseline + steps as i32 * 16 * a_val * b_val) as f32;
            prop_assert!(wide.all_eq(expected));
        }
    }
}
