//! Fixed-shape operand and accumulator tiles.

use std::ops::{Index, IndexMut};
use tops_types::{Precision, TileScalar};

/// A fixed-shape `R × C` matrix fragment held inline.
///
/// Tiles live on the stack of the execution group that owns them; the
/// runner never heap-allocates one.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile<T: TileScalar, const R: usize, const C: usize> {
    data: [[T; C]; R],
}

/// Row-major `M × K` left operand.
pub type OperandA<I, const M: usize, const K: usize> = Tile<<I as Precision>::Scalar, M, K>;

/// Row-major `K × N` right operand.
pub type OperandB<I, const K: usize, const N: usize> = Tile<<I as Precision>::Scalar, K, N>;

/// Row-major `M × N` accumulator.
pub type Accumulator<O, const M: usize, const N: usize> = Tile<<O as Precision>::Scalar, M, N>;

/// Bit-packed left operand: row `i` is `KW` words covering the reduction dimension.
pub type BitOperandA<const M: usize, const KW: usize> = Tile<u32, M, KW>;

/// Bit-packed right operand, column-major: column `j` is `KW` words.
pub type BitOperandB<const N: usize, const KW: usize> = Tile<u32, N, KW>;

/// Population-count accumulator of a bit-packed primitive.
pub type BitAccumulator<const M: usize, const N: usize> = Tile<i32, M, N>;

impl<T: TileScalar, const R: usize, const C: usize> Tile<T, R, C> {
    /// Tile with every element set to `value`.
    #[inline]
    pub fn filled(value: T) -> Self {
        Self {
            data: [[value; C]; R],
        }
    }

    /// Tile of additive identities.
    #[inline]
    pub fn zeros() -> Self {
        Self::filled(T::scalar_zero())
    }

    /// Number of rows.
    pub const fn rows(&self) -> usize {
        R
    }

    /// Number of columns.
    pub const fn cols(&self) -> usize {
        C
    }

    /// Borrow row `i`.
    #[inline(always)]
    pub fn row(&self, i: usize) -> &[T; C] {
        &self.data[i]
    }

    /// Mutably borrow row `i`.
    #[inline(always)]
    pub fn row_mut(&mut self, i: usize) -> &mut [T; C] {
        &mut self.data[i]
    }

    /// Iterate over all elements in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter().flat_map(|row| row.iter())
    }

    /// Whether every element equals `value`.
    pub fn all_eq(&self, value: T) -> bool {
        self.iter().all(|&x| x == value)
    }

    /// Sum of all elements widened to `f64`.
    pub fn checksum(&self) -> f64 {
        self.iter().map(|x| x.to_f64()).sum()
    }
}

impl<T: TileScalar, const R: usize, const C: usize> Index<(usize, usize)> for Tile<T, R, C> {
    type Output = T;

    #[inline(always)]
    fn index(&self, (i, j): (usize, usize)) -> &T {
        &self.data[i][j]
    }
}

impl<T: TileScalar, const R: usize, const C: usize> IndexMut<(usize, usize)> for Tile<T, R, C> {
    #[inline(always)]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        &mut self.data[i][j]
    }
}
