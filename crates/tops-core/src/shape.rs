//! Fixed primitive shapes.

use std::fmt::Debug;

/// Bits per packed word in bit-packed tiles.
pub const WORD_BITS: usize = 32;

/// The `m × n × k` shape of one primitive invocation.
pub trait Shape: Copy + Clone + Default + Send + Sync + Debug + 'static {
    /// Rows of A and of the accumulator.
    const M: usize;
    /// Columns of B and of the accumulator.
    const N: usize;
    /// Shared (reduction) dimension.
    const K: usize;

    /// Shape formatted as `MxNxK`.
    fn name() -> String {
        format!("{}x{}x{}", Self::M, Self::N, Self::K)
    }

    /// Scalar multiply-accumulates performed by one invocation.
    fn macs() -> u64 {
        (Self::M * Self::N * Self::K) as u64
    }
}

/// Dense shape with element-granular dimensions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Mnk<const M: usize, const N: usize, const K: usize>;

impl<const ROWS: usize, const COLS: usize, const DEPTH: usize> Shape for Mnk<ROWS, COLS, DEPTH> {
    const M: usize = ROWS;
    const N: usize = COLS;
    const K: usize = DEPTH;
}

/// Bit-packed shape: the reduction dimension is `KW` words of [`WORD_BITS`] bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BitMnk<const M: usize, const N: usize, const KW: usize>;

impl<const ROWS: usize, const COLS: usize, const WORDS: usize> Shape for BitMnk<ROWS, COLS, WORDS> {
    const M: usize = ROWS;
    const N: usize = COLS;
    const K: usize = WORDS * WORD_BITS;
}

/// 16×16×16 (wmma, all dense precisions).
pub type M16N16K16 = Mnk<16, 16, 16>;
/// 32×8×16 (wmma).
pub type M32N8K16 = Mnk<32, 8, 16>;
/// 8×32×16 (wmma).
pub type M8N32K16 = Mnk<8, 32, 16>;
/// 8×8×4 (mma f16, dmma f64, tf32).
pub type M8N8K4 = Mnk<8, 8, 4>;
/// 16×16×8 (wmma tf32).
pub type M16N16K8 = Mnk<16, 16, 8>;
/// 8×8×32 (wmma 4-bit integers).
pub type M8N8K32 = Mnk<8, 8, 32>;
/// 16×8×16 (mma f16/bf16).
pub type M16N8K16 = Mnk<16, 8, 16>;
/// 16×8×8 (mma tf32).
pub type M16N8K8 = Mnk<16, 8, 8>;
/// 64×256×16 (wgmma f16/bf16).
pub type M64N256K16 = Mnk<64, 256, 16>;
/// 64×256×8 (wgmma tf32).
pub type M64N256K8 = Mnk<64, 256, 8>;
/// 8×8×128 bits (bmma).
pub type M8N8K128 = BitMnk<8, 8, 4>;
/// 64×256×256 bits (wgmma b1).
pub type M64N256K256 = BitMnk<64, 256, 8>;
