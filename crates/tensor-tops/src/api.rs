use crate::registry::Variant;
use tops_core::{
    select, BinaryPrimitive, BitMnk, BitTileInit, BmmaKernel, Device, LaunchConfig, LaunchReport,
    Launcher, MmaKernel, Mnk, Primitive, Result, Sink, Supports, SupportsBinary, TileInit,
};
use tops_core::{Sm70, Sm75, Sm80, Sm89, Sm90};
use tops_simd::{BinaryDispatch, Dispatch};
use tops_types::{And, Bf16, BitOp, Precision, Tf32, Xor, B1, F16, F32, F64, S32, S4, S8, U4, U8};

/// Run a dense kernel with ones as operands and a zero accumulator.
///
/// The host primitive is the one [`Dispatch`] names for the `I → O`
/// pairing.
///
/// # Example
///
/// ```
/// use tensor_tops::{run_dense, select, Capability, HostEmulator, LaunchConfig, Sm80};
/// use tops_types::{Tf32, F32};
///
/// let launcher = select::<Sm80>(&HostEmulator::new(Capability::Ampere))?;
/// let report = run_dense::<Sm80, Tf32, F32, 8, 8, 4>(&launcher, &LaunchConfig::SMOKE)?;
///
/// // 64 accumulator entries, each gaining k = 4.
/// assert_eq!(report.checksum, Some(256.0));
/// # Ok::<(), tensor_tops::TopsError>(())
/// ```
pub fn run_dense<T, I, O, const M: usize, const N: usize, const K: usize>(
    launcher: &Launcher<T>,
    cfg: &LaunchConfig,
) -> Result<LaunchReport>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Dispatch<O>,
    O: Precision,
    I::Kernel: Primitive<I, O, M, N, K>,
{
    run_dense_with::<T, I, O, M, N, K>(launcher, TileInit::default(), cfg)
}

/// Run a dense kernel with explicit tile contents.
pub fn run_dense_with<T, I, O, const M: usize, const N: usize, const K: usize>(
    launcher: &Launcher<T>,
    init: TileInit<I, O>,
    cfg: &LaunchConfig,
) -> Result<LaunchReport>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Dispatch<O>,
    O: Precision,
    I::Kernel: Primitive<I, O, M, N, K>,
{
    let kernel = MmaKernel::<T, I, O, M, N, K>::with_init(init);
    let sink = Sink::new();
    launcher.launch(&kernel, &I::kernel(), cfg, &sink)
}

/// Run a bit-packed kernel with all-ones operands and a zero accumulator.
pub fn run_binary<T, Op, const M: usize, const N: usize, const KW: usize>(
    launcher: &Launcher<T>,
    op: Op,
    cfg: &LaunchConfig,
) -> Result<LaunchReport>
where
    Op: BitOp,
    T: SupportsBinary<BitMnk<M, N, KW>, Op>,
    B1: BinaryDispatch<Op>,
    <B1 as BinaryDispatch<Op>>::Kernel: BinaryPrimitive<Op, M, N, KW>,
{
    run_binary_with::<T, Op, M, N, KW>(launcher, op, BitTileInit::default(), cfg)
}

/// Run a bit-packed kernel with explicit tile contents.
pub fn run_binary_with<T, Op, const M: usize, const N: usize, const KW: usize>(
    launcher: &Launcher<T>,
    op: Op,
    init: BitTileInit,
    cfg: &LaunchConfig,
) -> Result<LaunchReport>
where
    Op: BitOp,
    T: SupportsBinary<BitMnk<M, N, KW>, Op>,
    B1: BinaryDispatch<Op>,
    <B1 as BinaryDispatch<Op>>::Kernel: BinaryPrimitive<Op, M, N, KW>,
{
    let kernel = BmmaKernel::<T, M, N, KW>::with_init(init);
    let sink = Sink::new();
    launcher.launch_binary(
        &kernel,
        &<B1 as BinaryDispatch<Op>>::kernel(),
        op,
        cfg,
        &sink,
    )
}

fn dense_on<T, I, O, const M: usize, const N: usize, const K: usize>(
    device: &dyn Device,
    cfg: &LaunchConfig,
) -> Result<LaunchReport>
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: Dispatch<O>,
    O: Precision,
    I::Kernel: Primitive<I, O, M, N, K>,
{
    run_dense::<T, I, O, M, N, K>(&select::<T>(device)?, cfg)
}

fn binary_on<T, Op, const M: usize, const N: usize, const KW: usize>(
    device: &dyn Device,
    cfg: &LaunchConfig,
) -> Result<LaunchReport>
where
    Op: BitOp,
    T: SupportsBinary<BitMnk<M, N, KW>, Op>,
    B1: BinaryDispatch<Op>,
    <B1 as BinaryDispatch<Op>>::Kernel: BinaryPrimitive<Op, M, N, KW>,
{
    run_binary::<T, Op, M, N, KW>(&select::<T>(device)?, Op::default(), cfg)
}

macro_rules! entry_points {
    (
        dense {
            $($name:ident => $tier:ident, $input:ident => $output:ident, $m:literal x $n:literal x $k:literal;)*
        }
        binary {
            $($bname:ident => $btier:ident, $op:ident, $bm:literal x $bn:literal x $bkw:literal;)*
        }
    ) => {
        $(
            #[doc = concat!(
                "`", stringify!($input), " → ", stringify!($output), "` at ",
                stringify!($m), "×", stringify!($n), "×", stringify!($k),
                " on [`", stringify!($tier), "`]."
            )]
            pub fn $name(launcher: &Launcher<$tier>, cfg: &LaunchConfig) -> Result<LaunchReport> {
                run_dense::<$tier, $input, $output, $m, $n, $k>(launcher, cfg)
            }
        )*

        $(
            #[doc = concat!(
                "Bit-packed `", stringify!($op), "` popcount at ",
                stringify!($bm), "×", stringify!($bn), "×(32·", stringify!($bkw), ")",
                " on [`", stringify!($btier), "`]."
            )]
            pub fn $bname(launcher: &Launcher<$btier>, cfg: &LaunchConfig) -> Result<LaunchReport> {
                run_binary::<$btier, $op, $bm, $bn, $bkw>(launcher, $op, cfg)
            }
        )*

        pub(crate) static VARIANTS: &[Variant] = &[
            $(
                Variant::dense::<$tier, $input, $output, $m, $n, $k>(
                    stringify!($name),
                    dense_on::<$tier, $input, $output, $m, $n, $k>,
                ),
            )*
            $(
                Variant::binary::<$btier, $op, $bm, $bn, $bkw>(
                    stringify!($bname),
                    binary_on::<$btier, $op, $bm, $bn, $bkw>,
                ),
            )*
        ];
    };
}

entry_points! {
    dense {
        // sm_70
        tops_f16f16_sm70wmma_16x16x16 => Sm70, F16 => F16, 16 x 16 x 16;
        tops_f16f16_sm70wmma_32x8x16 => Sm70, F16 => F16, 32 x 8 x 16;
        tops_f16f16_sm70wmma_8x32x16 => Sm70, F16 => F16, 8 x 32 x 16;
        tops_f16f32_sm70wmma_16x16x16 => Sm70, F16 => F32, 16 x 16 x 16;
        tops_f16f32_sm70wmma_32x8x16 => Sm70, F16 => F32, 32 x 8 x 16;
        tops_f16f32_sm70wmma_8x32x16 => Sm70, F16 => F32, 8 x 32 x 16;
        tops_f16f32_sm70mma_8x8x4 => Sm70, F16 => F32, 8 x 8 x 4;
        // sm_75
        tops_f16f16_sm75wmma_16x16x16 => Sm75, F16 => F16, 16 x 16 x 16;
        tops_f16f16_sm75wmma_32x8x16 => Sm75, F16 => F16, 32 x 8 x 16;
        tops_f16f16_sm75wmma_8x32x16 => Sm75, F16 => F16, 8 x 32 x 16;
        tops_f16f32_sm75wmma_16x16x16 => Sm75, F16 => F32, 16 x 16 x 16;
        tops_f16f32_sm75wmma_32x8x16 => Sm75, F16 => F32, 32 x 8 x 16;
        tops_f16f32_sm75wmma_8x32x16 => Sm75, F16 => F32, 8 x 32 x 16;
        tops_f16f32_sm75mma_8x8x4 => Sm75, F16 => F32, 8 x 8 x 4;
        tops_u8s32_sm75wmma_16x16x16 => Sm75, U8 => S32, 16 x 16 x 16;
        tops_u8s32_sm75wmma_32x8x16 => Sm75, U8 => S32, 32 x 8 x 16;
        tops_u8s32_sm75wmma_8x32x16 => Sm75, U8 => S32, 8 x 32 x 16;
        tops_s8s32_sm75wmma_16x16x16 => Sm75, S8 => S32, 16 x 16 x 16;
        tops_s8s32_sm75wmma_32x8x16 => Sm75, S8 => S32, 32 x 8 x 16;
        tops_s8s32_sm75wmma_8x32x16 => Sm75, S8 => S32, 8 x 32 x 16;
        tops_u4s32_sm75wmma_8x8x32 => Sm75, U4 => S32, 8 x 8 x 32;
        tops_s4s32_sm75wmma_8x8x32 => Sm75, S4 => S32, 8 x 8 x 32;
        // sm_80
        tops_f16f16_sm80wmma_16x16x16 => Sm80, F16 => F16, 16 x 16 x 16;
        tops_f16f16_sm80wmma_32x8x16 => Sm80, F16 => F16, 32 x 8 x 16;
        tops_f16f16_sm80wmma_8x32x16 => Sm80, F16 => F16, 8 x 32 x 16;
        tops_f16f32_sm80wmma_16x16x16 => Sm80, F16 => F32, 16 x 16 x 16;
        tops_f16f32_sm80wmma_32x8x16 => Sm80, F16 => F32, 32 x 8 x 16;
        tops_f16f32_sm80wmma_8x32x16 => Sm80, F16 => F32, 8 x 32 x 16;
        tops_f16f32_sm80mma_8x8x4 => Sm80, F16 => F32, 8 x 8 x 4;
        tops_u8s32_sm80wmma_16x16x16 => Sm80, U8 => S32, 16 x 16 x 16;
        tops_u8s32_sm80wmma_32x8x16 => Sm80, U8 => S32, 32 x 8 x 16;
        tops_u8s32_sm80wmma_8x32x16 => Sm80, U8 => S32, 8 x 32 x 16;
        tops_s8s32_sm80wmma_16x16x16 => Sm80, S8 => S32, 16 x 16 x 16;
        tops_s8s32_sm80wmma_32x8x16 => Sm80, S8 => S32, 32 x 8 x 16;
        tops_s8s32_sm80wmma_8x32x16 => Sm80, S8 => S32, 8 x 32 x 16;
        tops_u4s32_sm80wmma_8x8x32 => Sm80, U4 => S32, 8 x 8 x 32;
        tops_s4s32_sm80wmma_8x8x32 => Sm80, S4 => S32, 8 x 8 x 32;
        tops_bf16f32_sm80wmma_16x16x16 => Sm80, Bf16 => F32, 16 x 16 x 16;
        tops_bf16f32_sm80wmma_32x8x16 => Sm80, Bf16 => F32, 32 x 8 x 16;
        tops_bf16f32_sm80wmma_8x32x16 => Sm80, Bf16 => F32, 8 x 32 x 16;
        tops_tf32f32_sm80wmma_16x16x8 => Sm80, Tf32 => F32, 16 x 16 x 8;
        tops_f64f64_sm80wmma_8x8x4 => Sm80, F64 => F64, 8 x 8 x 4;
        tops_tf32f32_sm80mma_8x8x4 => Sm80, Tf32 => F32, 8 x 8 x 4;
        tops_tf32f32_sm80mma_16x8x8 => Sm80, Tf32 => F32, 16 x 8 x 8;
        tops_f16f32_sm80mma_16x8x16 => Sm80, F16 => F32, 16 x 8 x 16;
        tops_bf16f32_sm80mma_16x8x16 => Sm80, Bf16 => F32, 16 x 8 x 16;
        // sm_89
        tops_f16f16_sm89wmma_16x16x16 => Sm89, F16 => F16, 16 x 16 x 16;
        tops_f16f16_sm89wmma_32x8x16 => Sm89, F16 => F16, 32 x 8 x 16;
        tops_f16f16_sm89wmma_8x32x16 => Sm89, F16 => F16, 8 x 32 x 16;
        tops_f16f32_sm89wmma_16x16x16 => Sm89, F16 => F32, 16 x 16 x 16;
        tops_f16f32_sm89wmma_32x8x16 => Sm89, F16 => F32, 32 x 8 x 16;
        tops_f16f32_sm89wmma_8x32x16 => Sm89, F16 => F32, 8 x 32 x 16;
        tops_f16f32_sm89mma_8x8x4 => Sm89, F16 => F32, 8 x 8 x 4;
        tops_u8s32_sm89wmma_16x16x16 => Sm89, U8 => S32, 16 x 16 x 16;
        tops_u8s32_sm89wmma_32x8x16 => Sm89, U8 => S32, 32 x 8 x 16;
        tops_u8s32_sm89wmma_8x32x16 => Sm89, U8 => S32, 8 x 32 x 16;
        tops_s8s32_sm89wmma_16x16x16 => Sm89, S8 => S32, 16 x 16 x 16;
        tops_s8s32_sm89wmma_32x8x16 => Sm89, S8 => S32, 32 x 8 x 16;
        tops_s8s32_sm89wmma_8x32x16 => Sm89, S8 => S32, 8 x 32 x 16;
        tops_u4s32_sm89wmma_8x8x32 => Sm89, U4 => S32, 8 x 8 x 32;
        tops_s4s32_sm89wmma_8x8x32 => Sm89, S4 => S32, 8 x 8 x 32;
        tops_bf16f32_sm89wmma_16x16x16 => Sm89, Bf16 => F32, 16 x 16 x 16;
        tops_bf16f32_sm89wmma_32x8x16 => Sm89, Bf16 => F32, 32 x 8 x 16;
        tops_bf16f32_sm89wmma_8x32x16 => Sm89, Bf16 => F32, 8 x 32 x 16;
        tops_tf32f32_sm89wmma_16x16x8 => Sm89, Tf32 => F32, 16 x 16 x 8;
        tops_f64f64_sm89wmma_8x8x4 => Sm89, F64 => F64, 8 x 8 x 4;
        tops_tf32f32_sm89mma_8x8x4 => Sm89, Tf32 => F32, 8 x 8 x 4;
        tops_tf32f32_sm89mma_16x8x8 => Sm89, Tf32 => F32, 16 x 8 x 8;
        tops_f16f32_sm89mma_16x8x16 => Sm89, F16 => F32, 16 x 8 x 16;
        tops_bf16f32_sm89mma_16x8x16 => Sm89, Bf16 => F32, 16 x 8 x 16;
        // sm_90
        tops_f16f16_sm90wmma_16x16x16 => Sm90, F16 => F16, 16 x 16 x 16;
        tops_f16f16_sm90wmma_32x8x16 => Sm90, F16 => F16, 32 x 8 x 16;
        tops_f16f16_sm90wmma_8x32x16 => Sm90, F16 => F16, 8 x 32 x 16;
        tops_f16f32_sm90wmma_16x16x16 => Sm90, F16 => F32, 16 x 16 x 16;
        tops_f16f32_sm90wmma_32x8x16 => Sm90, F16 => F32, 32 x 8 x 16;
        tops_f16f32_sm90wmma_8x32x16 => Sm90, F16 => F32, 8 x 32 x 16;
        tops_f16f32_sm90mma_8x8x4 => Sm90, F16 => F32, 8 x 8 x 4;
        tops_u8s32_sm90wmma_16x16x16 => Sm90, U8 => S32, 16 x 16 x 16;
        tops_u8s32_sm90wmma_32x8x16 => Sm90, U8 => S32, 32 x 8 x 16;
        tops_u8s32_sm90wmma_8x32x16 => Sm90, U8 => S32, 8 x 32 x 16;
        tops_s8s32_sm90wmma_16x16x16 => Sm90, S8 => S32, 16 x 16 x 16;
        tops_s8s32_sm90wmma_32x8x16 => Sm90, S8 => S32, 32 x 8 x 16;
        tops_s8s32_sm90wmma_8x32x16 => Sm90, S8 => S32, 8 x 32 x 16;
        tops_bf16f32_sm90wmma_16x16x16 => Sm90, Bf16 => F32, 16 x 16 x 16;
        tops_bf16f32_sm90wmma_32x8x16 => Sm90, Bf16 => F32, 32 x 8 x 16;
        tops_bf16f32_sm90wmma_8x32x16 => Sm90, Bf16 => F32, 8 x 32 x 16;
        tops_tf32f32_sm90wmma_16x16x8 => Sm90, Tf32 => F32, 16 x 16 x 8;
        tops_f64f64_sm90wmma_8x8x4 => Sm90, F64 => F64, 8 x 8 x 4;
        tops_tf32f32_sm90mma_8x8x4 => Sm90, Tf32 => F32, 8 x 8 x 4;
        tops_tf32f32_sm90mma_16x8x8 => Sm90, Tf32 => F32, 16 x 8 x 8;
        tops_f16f32_sm90mma_16x8x16 => Sm90, F16 => F32, 16 x 8 x 16;
        tops_bf16f32_sm90mma_16x8x16 => Sm90, Bf16 => F32, 16 x 8 x 16;
        tops_f16f32_sm90wgmma_64x256x16 => Sm90, F16 => F32, 64 x 256 x 16;
        tops_bf16f32_sm90wgmma_64x256x16 => Sm90, Bf16 => F32, 64 x 256 x 16;
        tops_tf32f32_sm90wgmma_64x256x8 => Sm90, Tf32 => F32, 64 x 256 x 8;
    }
    binary {
        tops_b1i32xor_sm75bmma_8x8x128 => Sm75, Xor, 8 x 8 x 4;
        tops_b1i32xor_sm80bmma_8x8x128 => Sm80, Xor, 8 x 8 x 4;
        tops_b1i32and_sm80bmma_8x8x128 => Sm80, And, 8 x 8 x 4;
        tops_b1i32xor_sm89bmma_8x8x128 => Sm89, Xor, 8 x 8 x 4;
        tops_b1i32and_sm89bmma_8x8x128 => Sm89, And, 8 x 8 x 4;
        tops_b1i32and_sm90bmma_8x8x128 => Sm90, And, 8 x 8 x 4;
        tops_b1i32and_sm90wgmma_64x256x256 => Sm90, And, 64 x 256 x 8;
    }
}
