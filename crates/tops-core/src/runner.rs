//! The repeated multiply-accumulate runner.
//!
//! One execution group initialises its tiles, runs the primitive a fixed
//! number of times with the accumulator fed back in, and finally hands the
//! accumulator to a [`Sink`] behind a predicate that can never hold. The
//! guarded store is what keeps the optimiser from deleting the loop.

use crate::binary::BinaryPrimitive;
use crate::legal::{Family, Supports, SupportsBinary};
use crate::primitive::Primitive;
use crate::shape::{BitMnk, Mnk, Shape};
use crate::tier::Tier;
use crate::tile::{Accumulator, BitAccumulator, BitOperandA, BitOperandB, OperandA, OperandB};
use std::fmt;
use std::hint::black_box;
use std::marker::PhantomData;
use std::sync::OnceLock;
use tops_types::{BitOp, Precision, TileScalar, B1};

/// Lane index that no execution group contains.
pub const UNREACHABLE_LANE: u32 = u32::MAX;

/// Index of a lane inside an execution group.
///
/// Only indices below the group size can be constructed, so a `LaneId` is
/// never equal to [`UNREACHABLE_LANE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LaneId(u32);

impl LaneId {
    /// The first lane of every group.
    pub const LEADER: LaneId = LaneId(0);

    /// Lane `index` of a group of `group_size` lanes.
    pub fn new(index: u32, group_size: usize) -> Option<Self> {
        ((index as usize) < group_size).then_some(LaneId(index))
    }

    /// The raw lane index.
    pub const fn index(&self) -> u32 {
        self.0
    }
}

/// Fixed destination of the guarded accumulator store.
pub struct Sink<T> {
    slot: OnceLock<T>,
}

impl<T: Clone> Sink<T> {
    /// An empty sink.
    pub const fn new() -> Self {
        Self {
            slot: OnceLock::new(),
        }
    }

    /// Observe `value` from `lane`.
    ///
    /// Stores only if `lane` is [`UNREACHABLE_LANE`]. The lane index is read
    /// through [`black_box`] so the comparison stays opaque to the optimiser,
    /// and the value itself is passed through [`black_box`] as well.
    #[inline]
    pub fn guard(&self, lane: LaneId, value: &T) {
        if black_box(lane.index()) == UNREACHABLE_LANE {
            let _ = self.slot.set(value.clone());
        }
        black_box(value);
    }

    /// Whether the guarded store never happened.
    pub fn is_untouched(&self) -> bool {
        self.slot.get().is_none()
    }
}

impl<T: Clone> Default for Sink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Sink<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("written", &self.slot.get().is_some())
            .finish()
    }
}

/// Initial contents of dense tiles.
pub struct TileInit<I: Precision, O: Precision> {
    /// Value every operand element starts at (quantised to `I`).
    pub operand: I::Scalar,
    /// Value every accumulator element starts at.
    pub baseline: O::Scalar,
}

impl<I: Precision, O: Precision> TileInit<I, O> {
    /// Operands filled with `operand`, accumulator with `baseline`.
    pub fn new(operand: I::Scalar, baseline: O::Scalar) -> Self {
        Self { operand, baseline }
    }
}

impl<I: Precision, O: Precision> Default for TileInit<I, O> {
    /// Operands of ones, zero accumulator.
    fn default() -> Self {
        Self::new(I::Scalar::scalar_one(), O::Scalar::scalar_zero())
    }
}

impl<I: Precision, O: Precision> Clone for TileInit<I, O> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<I: Precision, O: Precision> Copy for TileInit<I, O> {}

impl<I: Precision, O: Precision> fmt::Debug for TileInit<I, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TileInit")
            .field("operand", &self.operand)
            .field("baseline", &self.baseline)
            .finish()
    }
}

/// Initial contents of bit-packed tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitTileInit {
    /// Word every row of A is filled with.
    pub pattern_a: u32,
    /// Word every column of B is filled with.
    pub pattern_b: u32,
    /// Value every accumulator element starts at.
    pub baseline: i32,
}

impl Default for BitTileInit {
    /// All-ones operands, zero accumulator.
    fn default() -> Self {
        Self {
            pattern_a: u32::MAX,
            pattern_b: u32::MAX,
            baseline: 0,
        }
    }
}

/// A dense kernel: tier `T`, input `I`, accumulator `O`, shape `M × N × K`.
///
/// The type only exists when `T` supports the primitive, so an illegal
/// combination cannot be named, let alone run.
pub struct MmaKernel<T, I, O, const M: usize, const N: usize, const K: usize>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Precision,
    O: Precision,
{
    init: TileInit<I, O>,
    _tier: PhantomData<T>,
}

impl<T, I, O, const M: usize, const N: usize, const K: usize> MmaKernel<T, I, O, M, N, K>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Precision,
    O: Precision,
{
    /// Instruction family of this kernel.
    pub const FAMILY: Family = <T as Supports<Mnk<M, N, K>, I, O>>::FAMILY;

    /// Kernel with ones as operands and a zero accumulator.
    pub fn new() -> Self {
        Self::with_init(TileInit::default())
    }

    /// Kernel with explicit tile contents.
    pub fn with_init(init: TileInit<I, O>) -> Self {
        Self {
            init,
            _tier: PhantomData,
        }
    }

    /// Tile contents this kernel starts from.
    pub fn init(&self) -> &TileInit<I, O> {
        &self.init
    }

    /// Kernel name, e.g. `f16f32_sm70wmma_16x16x16`.
    pub fn name() -> String {
        format!(
            "{}{}_sm{}{}_{}",
            I::NAME,
            O::NAME,
            T::CAPABILITY.sm(),
            Self::FAMILY.name(),
            Mnk::<M, N, K>::name()
        )
    }

    /// Scalar multiply-accumulates per primitive invocation.
    pub fn macs() -> u64 {
        Mnk::<M, N, K>::macs()
    }

    /// Run one execution group.
    ///
    /// Invokes `primitive` exactly `repetitions` times, each invocation
    /// accumulating into the previous result, then observes the accumulator
    /// through `sink`. With zero repetitions the accumulator is returned at
    /// its baseline.
    pub fn run_group<P>(
        &self,
        primitive: &P,
        repetitions: usize,
        lane: LaneId,
        sink: &Sink<Accumulator<O, M, N>>,
    ) -> Accumulator<O, M, N>
    where
        P: Primitive<I, O, M, N, K> + ?Sized,
    {
        let operand = I::quantize(self.init.operand);
        let a = OperandA::<I, M, K>::filled(operand);
        let b = OperandB::<I, K, N>::filled(operand);
        let mut acc = Accumulator::<O, M, N>::filled(self.init.baseline);

        for _ in 0..repetitions {
            primitive.mma(&a, &b, &mut acc);
        }

        sink.guard(lane, &acc);
        acc
    }
}

impl<T, I, O, const M: usize, const N: usize, const K: usize> Default
    for MmaKernel<T, I, O, M, N, K>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Precision,
    O: Precision,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, I, O, const M: usize, const N: usize, const K: usize> fmt::Debug
    for MmaKernel<T, I, O, M, N, K>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Precision,
    O: Precision,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MmaKernel")
            .field("name", &Self::name())
            .field("init", &self.init)
            .finish()
    }
}

/// A bit-packed kernel: tier `T`, shape `M × N × (32·KW)`.
///
/// The combination operator is not part of the type. It is passed to
/// [`BmmaKernel::run_group`] on every call, and legality of that operator on
/// `T` is checked at the call site.
pub struct BmmaKernel<T: Tier, const M: usize, const N: usize, const KW: usize> {
    init: BitTileInit,
    _tier: PhantomData<T>,
}

impl<T: Tier, const M: usize, const N: usize, const KW: usize> BmmaKernel<T, M, N, KW> {
    /// Kernel with all-ones operands and a zero accumulator.
    pub fn new() -> Self {
        Self::with_init(BitTileInit::default())
    }

    /// Kernel with explicit tile contents.
    pub fn with_init(init: BitTileInit) -> Self {
        Self {
            init,
            _tier: PhantomData,
        }
    }

    /// Tile contents this kernel starts from.
    pub fn init(&self) -> &BitTileInit {
        &self.init
    }

    /// Kernel name for operator `Op`, e.g. `b1i32xor_sm75bmma_8x8x128`.
    pub fn name<Op: BitOp>() -> String
    where
        T: SupportsBinary<BitMnk<M, N, KW>, Op>,
    {
        format!(
            "{}i32{}_sm{}{}_{}",
            B1::NAME,
            Op::NAME,
            T::CAPABILITY.sm(),
            <T as SupportsBinary<BitMnk<M, N, KW>, Op>>::FAMILY.binary_name(),
            BitMnk::<M, N, KW>::name()
        )
    }

    /// Bit-level multiply-accumulates per primitive invocation.
    pub fn macs() -> u64 {
        BitMnk::<M, N, KW>::macs()
    }

    /// Run one execution group with combination `op`.
    ///
    /// Same contract as [`MmaKernel::run_group`].
    pub fn run_group<Op, P>(
        &self,
        primitive: &P,
        op: Op,
        repetitions: usize,
        lane: LaneId,
        sink: &Sink<BitAccumulator<M, N>>,
    ) -> BitAccumulator<M, N>
    where
        Op: BitOp,
        T: SupportsBinary<BitMnk<M, N, KW>, Op>,
        P: BinaryPrimitive<Op, M, N, KW> + ?Sized,
    {
        let a = BitOperandA::<M, KW>::filled(self.init.pattern_a);
        let b = BitOperandB::<N, KW>::filled(self.init.pattern_b);
        let mut acc = BitAccumulator::<M, N>::filled(self.init.baseline);

        for _ in 0..repetitions {
            primitive.bmma(op, &a, &b, &mut acc);
        }

        sink.guard(lane, &acc);
        acc
    }
}

impl<T: Tier, const M: usize, const N: usize, const KW: usize> Default for BmmaKernel<T, M, N, KW> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Tier, const M: usize, const N: usize, const KW: usize> fmt::Debug
    for BmmaKernel<T, M, N, KW>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BmmaKernel")
            .field("tier", &T::CAPABILITY)
            .field("shape", &BitMnk::<M, N, KW>::name())
            .field("init", &self.init)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::EmulatedBmma;
    use crate::primitive::EmulatedMma;
    use crate::tier::{Sm70, Sm75, Sm80, Sm90};
    use crate::tile::Tile;
    use proptest::prelude::*;
    use std::cell::Cell;
    use tops_types::{f16, And, Tf32, Xor, F16, F32, S32, S8, U4, U8};

    /// Adds one to every accumulator element and counts invocations.
    #[derive(Default)]
    struct CountingPrimitive {
        calls: Cell<usize>,
    }

    impl<I: Precision, const M: usize, const N: usize, const K: usize> Primitive<I, F32, M, N, K>
        for CountingPrimitive
    {
        fn mma(
            &self,
            _a: &OperandA<I, M, K>,
            _b: &OperandB<I, K, N>,
            acc: &mut Accumulator<F32, M, N>,
        ) {
            self.calls.set(self.calls.get() + 1);
            for i in 0..M {
                for x in acc.row_mut(i).iter_mut() {
                    *x += 1.0;
                }
            }
        }
    }

    impl<I: Precision, const M: usize, const N: usize, const K: usize> Primitive<I, S32, M, N, K>
        for CountingPrimitive
    {
        fn mma(
            &self,
            _a: &OperandA<I, M, K>,
            _b: &OperandB<I, K, N>,
            acc: &mut Accumulator<S32, M, N>,
        ) {
            self.calls.set(self.calls.get() + 1);
            for i in 0..M {
                for x in acc.row_mut(i).iter_mut() {
                    *x += 1;
                }
            }
        }
    }

    #[test]
    fn test_counting_stand_in_runs_exactly_r_steps() {
        let kernel = MmaKernel::<Sm70, F16, F32, 16, 16, 16>::with_init(TileInit::new(
            f16::from_f32(1.0),
            3.0,
        ));
        let sink = Sink::new();
        let counter = CountingPrimitive::default();

        let acc = kernel.run_group(&counter, 37, LaneId::LEADER, &sink);

        assert_eq!(counter.calls.get(), 37);
        assert!(acc.all_eq(40.0));
        assert!(sink.is_untouched());
    }

    #[test]
    fn test_counting_stand_in_integer_variant() {
        let kernel = MmaKernel::<Sm75, U8, S32, 32, 8, 16>::with_init(TileInit::new(1, -5));
        let sink = Sink::new();
        let counter = CountingPrimitive::default();

        let acc = kernel.run_group(&counter, 12, LaneId::LEADER, &sink);

        assert_eq!(counter.calls.get(), 12);
        assert!(acc.all_eq(7));
    }

    #[test]
    fn test_zero_repetitions_keeps_baseline() {
        let kernel =
            MmaKernel::<Sm80, Tf32, F32, 8, 8, 4>::with_init(TileInit::new(1.0, 0.25));
        let sink = Sink::new();
        let counter = CountingPrimitive::default();

        let acc = kernel.run_group(&counter, 0, LaneId::LEADER, &sink);
        assert_eq!(counter.calls.get(), 0);
        assert!(acc.all_eq(0.25));

        let acc = kernel.run_group(&EmulatedMma, 0, LaneId::LEADER, &sink);
        assert!(acc.all_eq(0.25));
        assert!(sink.is_untouched());
    }

    #[test]
    fn test_identity_product_single_step() {
        // 8x8x4 with ones: every entry gains k = 4 per step.
        let kernel = MmaKernel::<Sm80, Tf32, F32, 8, 8, 4>::with_init(TileInit::new(1.0, 0.5));
        let sink = Sink::new();

        let acc = kernel.run_group(&EmulatedMma, 1, LaneId::LEADER, &sink);

        assert!(acc.all_eq(4.5));
        assert!(sink.is_untouched());
    }

    #[test]
    fn test_identity_product_128_steps() {
        let kernel = MmaKernel::<Sm80, Tf32, F32, 8, 8, 4>::with_init(TileInit::new(1.0, 0.5));
        let sink = Sink::new();

        let acc = kernel.run_group(&EmulatedMma, 128, LaneId::LEADER, &sink);

        assert!(acc.all_eq(0.5 + 128.0 * 4.0));
        assert!(sink.is_untouched());
    }

    #[test]
    fn test_operand_is_quantized() {
        // 4-bit operands keep only their low nibble.
        let kernel = MmaKernel::<Sm75, U4, S32, 8, 8, 32>::with_init(TileInit::new(0x13, 0));
        let sink = Sink::new();

        let acc = kernel.run_group(&EmulatedMma, 2, LaneId::LEADER, &sink);

        // 0x13 -> 3; each step adds 32 * 3 * 3.
        assert!(acc.all_eq(2 * 32 * 9));
    }

    #[test]
    fn test_signed_integer_accumulation() {
        let kernel = MmaKernel::<Sm90, S8, S32, 16, 16, 16>::with_init(TileInit::new(-3, 100));
        let sink = Sink::new();

        let acc = kernel.run_group(&EmulatedMma, 5, LaneId::LEADER, &sink);

        assert!(acc.all_eq(100 + 5 * 16 * 9));
    }

    #[test]
    fn test_names() {
        assert_eq!(
            MmaKernel::<Sm70, F16, F32, 16, 16, 16>::name(),
            "f16f32_sm70wmma_16x16x16"
        );
        assert_eq!(MmaKernel::<Sm80, Tf32, F32, 8, 8, 4>::name(), "tf32f32_sm80mma_8x8x4");
        assert_eq!(
            BmmaKernel::<Sm75, 8, 8, 4>::name::<Xor>(),
            "b1i32xor_sm75bmma_8x8x128"
        );
        assert_eq!(
            BmmaKernel::<Sm90, 64, 256, 8>::name::<And>(),
            "b1i32and_sm90wgmma_64x256x256"
        );
        assert_eq!(MmaKernel::<Sm70, F16, F32, 16, 16, 16>::FAMILY.group_size(), 32);
    }

    #[test]
    fn test_binary_operator_is_selected_per_invocation() {
        let kernel = BmmaKernel::<Sm80, 8, 8, 4>::with_init(BitTileInit {
            pattern_a: 0xFFFF_0000,
            pattern_b: 0xFF00_FF00,
            baseline: 1,
        });
        let sink = Sink::new();

        let xor = kernel.run_group(&EmulatedBmma, Xor, 3, LaneId::LEADER, &sink);
        let and = kernel.run_group(&EmulatedBmma, And, 3, LaneId::LEADER, &sink);

        // Per word: xor differs in 16 bits, and shares 8 bits; 4 words per step.
        assert!(xor.all_eq(1 + 3 * 4 * 16));
        assert!(and.all_eq(1 + 3 * 4 * 8));
        assert_ne!(xor, and);
        assert!(sink.is_untouched());
    }

    #[test]
    fn test_binary_all_ones() {
        let kernel = BmmaKernel::<Sm90, 64, 256, 8>::new();
        let sink = Sink::new();

        let acc = kernel.run_group(&EmulatedBmma, And, 2, LaneId::LEADER, &sink);

        assert!(acc.all_eq(2 * 256));
    }

    #[test]
    fn test_lane_bounds() {
        assert_eq!(LaneId::new(31, 32).map(|l| l.index()), Some(31));
        assert!(LaneId::new(32, 32).is_none());
        assert!(LaneId::new(UNREACHABLE_LANE, 128).is_none());
    }

    #[test]
    fn test_sink_untouched_for_every_lane() {
        let kernel = MmaKernel::<Sm70, F16, F16, 8, 32, 16>::new();
        let sink = Sink::new();
        for index in 0..32 {
            let lane = LaneId::new(index, 32).expect("lane in range");
            kernel.run_group(&EmulatedMma, 1, lane, &sink);
        }
        assert!(sink.is_untouched());
        assert!(format!("{:?}", sink).contains("written: false"));
    }

    #[test]
    fn test_sink_debug_reports_write() {
        let sink: Sink<Tile<i32, 1, 1>> = Sink::new();
        // Only reachable by forging the lane; the runner never does this.
        sink.guard(LaneId(UNREACHABLE_LANE), &Tile::filled(5));
        assert!(!sink.is_untouched());
    }

    proptest! {
        #[test]
        fn prop_counting_stand_in_matches_closed_form(reps in 0usize..300, baseline in -100i32..100) {
            let kernel = MmaKernel::<Sm80, S8, S32, 16, 16, 16>::with_init(TileInit::new(1, baseline));
            let sink = Sink::new();
            let counter = CountingPrimitive::default();

            let acc = kernel.run_group(&counter, reps, LaneId::LEADER, &sink);

            prop_assert_eq!(counter.calls.get(), reps);
            prop_assert!(acc.all_eq(baseline + reps as i32));
            prop_assert!(sink.is_untouched());
        }

        #[test]
        fn prop_emulated_matches_closed_form(reps in 0usize..64, operand in -3i8..4) {
            let kernel = MmaKernel::<Sm75, S8, S32, 8, 32, 16>::with_init(TileInit::new(operand, 0));
            let sink = Sink::new();

            let acc = kernel.run_group(&EmulatedMma, reps, LaneId::LEADER, &sink);

            let step = 16 * i32::from(operand) * i32::from(operand);
            prop_assert!(acc.all_eq(reps as i32 * step));
        }
    }
}
