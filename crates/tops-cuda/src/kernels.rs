//! Generated wmma/bmma kernels and their launch path.

use crate::context::CudaContext;
use crate::error::Result;
use cudarc::driver::{LaunchAsync, LaunchConfig as GridConfig};
use std::marker::PhantomData;
use std::time::Instant;
use tops_core::{
    select, BitMnk, Capability, Family, LaunchConfig, LaunchReport, Mnk, Shape, Supports,
    SupportsBinary, Tier, TopsError, UNREACHABLE_LANE,
};
use tops_core::{Sm70, Sm75, Sm80, Sm89, Sm90};
use tops_types::{And, Bf16, BitOp, Precision, Tf32, Xor, F16, F32, F64, S32, S4, S8, U4, U8};

/// Lanes per block: one warp.
const WARP_SIZE: u32 = 32;

/// Input precision with a wmma operand fragment.
pub trait WmmaInput: Precision {
    /// Fragment element type.
    const FRAGMENT: &'static str;
    /// Fill value that makes every operand element one.
    const ONE: &'static str;
}

/// Accumulator precision with a wmma accumulator fragment.
pub trait WmmaAccumulator: Precision {
    /// Fragment element type.
    const FRAGMENT: &'static str;
    /// Fill value for a zero accumulator.
    const ZERO: &'static str;
    /// Bytes per stored element.
    const BYTES: usize;
}

/// Bit combination with a `bmma_sync` operator.
pub trait BmmaOp: BitOp {
    /// `wmma::experimental` operator name.
    const BMMA_OP: &'static str;
}

macro_rules! impl_wmma_input {
    ($($precision:ty => $fragment:literal, $one:literal);* $(;)?) => {
        $(
            impl WmmaInput for $precision {
                const FRAGMENT: &'static str = $fragment;
                const ONE: &'static str = $one;
            }
        )*
    };
}

impl_wmma_input! {
    F16 => "half", "__float2half(1.0f)";
    Bf16 => "__nv_bfloat16", "__float2bfloat16(1.0f)";
    Tf32 => "wmma::precision::tf32", "1.0f";
    F64 => "double", "1.0";
    U8 => "unsigned char", "1";
    S8 => "signed char", "1";
    // Sub-byte fragments are filled by packed word: one per nibble.
    U4 => "wmma::experimental::precision::u4", "0x11111111u";
    S4 => "wmma::experimental::precision::s4", "0x11111111";
}

macro_rules! impl_wmma_accumulator {
    ($($precision:ty => $fragment:literal, $zero:literal, $bytes:literal);* $(;)?) => {
        $(
            impl WmmaAccumulator for $precision {
                const FRAGMENT: &'static str = $fragment;
                const ZERO: &'static str = $zero;
                const BYTES: usize = $bytes;
            }
        )*
    };
}

impl_wmma_accumulator! {
    F16 => "half", "__float2half(0.0f)", 2;
    F32 => "float", "0.0f", 4;
    F64 => "double", "0.0", 8;
    S32 => "int", "0", 4;
}

impl BmmaOp for Xor {
    const BMMA_OP: &'static str = "wmma::experimental::bmmaBitOpXOR";
}

impl BmmaOp for And {
    const BMMA_OP: &'static str = "wmma::experimental::bmmaBitOpAND";
}

/// A kernel that can be compiled and launched on a CUDA device.
pub trait CudaVariant {
    /// Tier the kernel was built for.
    type Tier: Tier;

    /// `extern "C"` symbol of the kernel.
    const KERNEL_NAME: &'static str;

    /// Instruction family (only warp-level families are generated).
    const FAMILY: Family;

    /// `(m, n, k)` of one invocation.
    const SHAPE: (usize, usize, usize);

    /// Bytes of the accumulator tile written by the guarded store.
    const SINK_BYTES: usize;

    /// CUDA C++ source defining [`Self::KERNEL_NAME`].
    fn source() -> String;

    /// Multiply-accumulates per invocation.
    fn macs() -> u64 {
        let (m, n, k) = Self::SHAPE;
        (m * n * k) as u64
    }

    /// NVRTC target: the variant's tier, whatever device it runs on.
    fn arch() -> &'static str {
        virtual_arch(<Self::Tier as Tier>::CAPABILITY)
    }
}

/// Virtual architecture for `capability`. The driver JIT-compiles its PTX
/// for the device the kernel is loaded on.
pub const fn virtual_arch(capability: Capability) -> &'static str {
    match capability {
        Capability::Volta => "compute_70",
        Capability::Turing => "compute_75",
        Capability::Ampere => "compute_80",
        Capability::Ada => "compute_89",
        Capability::Hopper => "compute_90",
    }
}

/// A dense wmma kernel: tier `T`, input `I`, accumulator `O`, shape `M × N × K`.
pub struct WmmaVariant<T, I, O, const M: usize, const N: usize, const K: usize>(
    PhantomData<(T, I, O)>,
)
where
    T: Supports<Mnk<M, N, K>, I, O>,
    I: WmmaInput,
    O: WmmaAccumulator;

/// A bit-packed bmma kernel: tier `T`, operator `Op`, shape `M × N × (32·KW)`.
pub struct BmmaVariant<T, Op, const M: usize, const N: usize, const KW: usize>(
    PhantomData<(T, Op)>,
)
where
    T: SupportsBinary<BitMnk<M, N, KW>, Op>,
    Op: BmmaOp;

const PRELUDE: &str = r#"#include <mma.h>
#include <cuda_fp16.h>
#include <cuda_bf16.h>
using namespace nvcuda;
"#;

/// Source of a dense kernel.
///
/// The accumulator is stored to `sink` only by a lane whose index equals
/// `unreachable_lane`, which the host passes as `u32::MAX`.
pub fn dense_source<I: WmmaInput, O: WmmaAccumulator>(
    name: &str,
    (m, n, k): (usize, usize, usize),
) -> String {
    format!(
        r#"{PRELUDE}
extern "C" __global__ void {name}(unsigned char* sink, int repetitions, unsigned int unreachable_lane) {{
    wmma::fragment<wmma::matrix_a, {m}, {n}, {k}, {input}, wmma::row_major> a;
    wmma::fragment<wmma::matrix_b, {m}, {n}, {k}, {input}, wmma::col_major> b;
    wmma::fragment<wmma::accumulator, {m}, {n}, {k}, {output}> c;
    wmma::fill_fragment(a, {one});
    wmma::fill_fragment(b, {one});
    wmma::fill_fragment(c, {zero});
    for (int i = 0; i < repetitions; ++i) {{
        wmma::mma_sync(c, a, b, c);
    }}
    if (threadIdx.x == unreachable_lane) {{
        wmma::store_matrix_sync(reinterpret_cast<{output}*>(sink), c, {n}, wmma::mem_row_major);
    }}
}}
"#,
        input = I::FRAGMENT,
        output = O::FRAGMENT,
        one = I::ONE,
        zero = O::ZERO,
    )
}

/// Source of a bit-packed kernel combining with `Op`.
pub fn binary_source<Op: BmmaOp>(name: &str, (m, n, k): (usize, usize, usize)) -> String {
    format!(
        r#"{PRELUDE}
extern "C" __global__ void {name}(unsigned char* sink, int repetitions, unsigned int unreachable_lane) {{
    wmma::fragment<wmma::matrix_a, {m}, {n}, {k}, wmma::experimental::precision::b1, wmma::row_major> a;
    wmma::fragment<wmma::matrix_b, {m}, {n}, {k}, wmma::experimental::precision::b1, wmma::col_major> b;
    wmma::fragment<wmma::accumulator, {m}, {n}, {k}, int> c;
    wmma::fill_fragment(a, 0xFFFFFFFFu);
    wmma::fill_fragment(b, 0xFFFFFFFFu);
    wmma::fill_fragment(c, 0);
    for (int i = 0; i < repetitions; ++i) {{
        wmma::bmma_sync(c, a, b, c, {op}, wmma::experimental::bmmaAccumulateOpPOPC);
    }}
    if (threadIdx.x == unreachable_lane) {{
        wmma::store_matrix_sync(reinterpret_cast<int*>(sink), c, {n}, wmma::mem_row_major);
    }}
}}
"#,
        op = Op::BMMA_OP,
    )
}

macro_rules! impl_wmma_variant {
    ($($tier:ident, $input:ident => $output:ident, $m:literal x $n:literal x $k:literal => $name:literal;)*) => {
        $(
            impl CudaVariant for WmmaVariant<$tier, $input, $output, $m, $n, $k> {
                type Tier = $tier;
                const KERNEL_NAME: &'static str = $name;
                const FAMILY: Family = Family::Wmma;
                const SHAPE: (usize, usize, usize) = ($m, $n, $k);
                const SINK_BYTES: usize = $m * $n * <$output as WmmaAccumulator>::BYTES;

                fn source() -> String {
                    dense_source::<$input, $output>(Self::KERNEL_NAME, Self::SHAPE)
                }
            }
        )*
    };
}

macro_rules! impl_bmma_variant {
    ($($tier:ident, $op:ident, $m:literal x $n:literal x $kw:literal => $name:literal;)*) => {
        $(
            impl CudaVariant for BmmaVariant<$tier, $op, $m, $n, $kw> {
                type Tier = $tier;
                const KERNEL_NAME: &'static str = $name;
                const FAMILY: Family = Family::Wmma;
                const SHAPE: (usize, usize, usize) = ($m, $n, <BitMnk<$m, $n, $kw> as Shape>::K);
                const SINK_BYTES: usize = $m * $n * 4;

                fn source() -> String {
                    binary_source::<$op>(Self::KERNEL_NAME, Self::SHAPE)
                }
            }
        )*
    };
}

impl_wmma_variant! {
    // sm_70
    Sm70, F16 => F16, 16 x 16 x 16 => "tops_f16f16_sm70wmma_16x16x16";
    Sm70, F16 => F16, 32 x 8 x 16 => "tops_f16f16_sm70wmma_32x8x16";
    Sm70, F16 => F16, 8 x 32 x 16 => "tops_f16f16_sm70wmma_8x32x16";
    Sm70, F16 => F32, 16 x 16 x 16 => "tops_f16f32_sm70wmma_16x16x16";
    Sm70, F16 => F32, 32 x 8 x 16 => "tops_f16f32_sm70wmma_32x8x16";
    Sm70, F16 => F32, 8 x 32 x 16 => "tops_f16f32_sm70wmma_8x32x16";
    // sm_75
    Sm75, F16 => F16, 16 x 16 x 16 => "tops_f16f16_sm75wmma_16x16x16";
    Sm75, F16 => F16, 32 x 8 x 16 => "tops_f16f16_sm75wmma_32x8x16";
    Sm75, F16 => F16, 8 x 32 x 16 => "tops_f16f16_sm75wmma_8x32x16";
    Sm75, F16 => F32, 16 x 16 x 16 => "tops_f16f32_sm75wmma_16x16x16";
    Sm75, F16 => F32, 32 x 8 x 16 => "tops_f16f32_sm75wmma_32x8x16";
    Sm75, F16 => F32, 8 x 32 x 16 => "tops_f16f32_sm75wmma_8x32x16";
    Sm75, U8 => S32, 16 x 16 x 16 => "tops_u8s32_sm75wmma_16x16x16";
    Sm75, U8 => S32, 32 x 8 x 16 => "tops_u8s32_sm75wmma_32x8x16";
    Sm75, U8 => S32, 8 x 32 x 16 => "tops_u8s32_sm75wmma_8x32x16";
    Sm75, S8 => S32, 16 x 16 x 16 => "tops_s8s32_sm75wmma_16x16x16";
    Sm75, S8 => S32, 32 x 8 x 16 => "tops_s8s32_sm75wmma_32x8x16";
    Sm75, S8 => S32, 8 x 32 x 16 => "tops_s8s32_sm75wmma_8x32x16";
    Sm75, U4 => S32, 8 x 8 x 32 => "tops_u4s32_sm75wmma_8x8x32";
    Sm75, S4 => S32, 8 x 8 x 32 => "tops_s4s32_sm75wmma_8x8x32";
    // sm_80
    Sm80, F16 => F16, 16 x 16 x 16 => "tops_f16f16_sm80wmma_16x16x16";
    Sm80, F16 => F16, 32 x 8 x 16 => "tops_f16f16_sm80wmma_32x8x16";
    Sm80, F16 => F16, 8 x 32 x 16 => "tops_f16f16_sm80wmma_8x32x16";
    Sm80, F16 => F32, 16 x 16 x 16 => "tops_f16f32_sm80wmma_16x16x16";
    Sm80, F16 => F32, 32 x 8 x 16 => "tops_f16f32_sm80wmma_32x8x16";
    Sm80, F16 => F32, 8 x 32 x 16 => "tops_f16f32_sm80wmma_8x32x16";
    Sm80, U8 => S32, 16 x 16 x 16 => "tops_u8s32_sm80wmma_16x16x16";
    Sm80, U8 => S32, 32 x 8 x 16 => "tops_u8s32_sm80wmma_32x8x16";
    Sm80, U8 => S32, 8 x 32 x 16 => "tops_u8s32_sm80wmma_8x32x16";
    Sm80, S8 => S32, 16 x 16 x 16 => "tops_s8s32_sm80wmma_16x16x16";
    Sm80, S8 => S32, 32 x 8 x 16 => "tops_s8s32_sm80wmma_32x8x16";
    Sm80, S8 => S32, 8 x 32 x 16 => "tops_s8s32_sm80wmma_8x32x16";
    Sm80, U4 => S32, 8 x 8 x 32 => "tops_u4s32_sm80wmma_8x8x32";
    Sm80, S4 => S32, 8 x 8 x 32 => "tops_s4s32_sm80wmma_8x8x32";
    Sm80, Bf16 => F32, 16 x 16 x 16 => "tops_bf16f32_sm80wmma_16x16x16";
    Sm80, Bf16 => F32, 32 x 8 x 16 => "tops_bf16f32_sm80wmma_32x8x16";
    Sm80, Bf16 => F32, 8 x 32 x 16 => "tops_bf16f32_sm80wmma_8x32x16";
    Sm80, Tf32 => F32, 16 x 16 x 8 => "tops_tf32f32_sm80wmma_16x16x8";
    Sm80, F64 => F64, 8 x 8 x 4 => "tops_f64f64_sm80wmma_8x8x4";
    // sm_89
    Sm89, F16 => F16, 16 x 16 x 16 => "tops_f16f16_sm89wmma_16x16x16";
    Sm89, F16 => F16, 32 x 8 x 16 => "tops_f16f16_sm89wmma_32x8x16";
    Sm89, F16 => F16, 8 x 32 x 16 => "tops_f16f16_sm89wmma_8x32x16";
    Sm89, F16 => F32, 16 x 16 x 16 => "tops_f16f32_sm89wmma_16x16x16";
    Sm89, F16 => F32, 32 x 8 x 16 => "tops_f16f32_sm89wmma_32x8x16";
    Sm89, F16 => F32, 8 x 32 x 16 => "tops_f16f32_sm89wmma_8x32x16";
    Sm89, U8 => S32, 16 x 16 x 16 => "tops_u8s32_sm89wmma_16x16x16";
    Sm89, U8 => S32, 32 x 8 x 16 => "tops_u8s32_sm89wmma_32x8x16";
    Sm89, U8 => S32, 8 x 32 x 16 => "tops_u8s32_sm89wmma_8x32x16";
    Sm89, S8 => S32, 16 x 16 x 16 => "tops_s8s32_sm89wmma_16x16x16";
    Sm89, S8 => S32, 32 x 8 x 16 => "tops_s8s32_sm89wmma_32x8x16";
    Sm89, S8 => S32, 8 x 32 x 16 => "tops_s8s32_sm89wmma_8x32x16";
    Sm89, U4 => S32, 8 x 8 x 32 => "tops_u4s32_sm89wmma_8x8x32";
    Sm89, S4 => S32, 8 x 8 x 32 => "tops_s4s32_sm89wmma_8x8x32";
    Sm89, Bf16 => F32, 16 x 16 x 16 => "tops_bf16f32_sm89wmma_16x16x16";
    Sm89, Bf16 => F32, 32 x 8 x 16 => "tops_bf16f32_sm89wmma_32x8x16";
    Sm89, Bf16 => F32, 8 x 32 x 16 => "tops_bf16f32_sm89wmma_8x32x16";
    Sm89, Tf32 => F32, 16 x 16 x 8 => "tops_tf32f32_sm89wmma_16x16x8";
    Sm89, F64 => F64, 8 x 8 x 4 => "tops_f64f64_sm89wmma_8x8x4";
    // sm_90
    Sm90, F16 => F16, 16 x 16 x 16 => "tops_f16f16_sm90wmma_16x16x16";
    Sm90, F16 => F16, 32 x 8 x 16 => "tops_f16f16_sm90wmma_32x8x16";
    Sm90, F16 => F16, 8 x 32 x 16 => "tops_f16f16_sm90wmma_8x32x16";
    Sm90, F16 => F32, 16 x 16 x 16 => "tops_f16f32_sm90wmma_16x16x16";
    Sm90, F16 => F32, 32 x 8 x 16 => "tops_f16f32_sm90wmma_32x8x16";
    Sm90, F16 => F32, 8 x 32 x 16 => "tops_f16f32_sm90wmma_8x32x16";
    Sm90, U8 => S32, 16 x 16 x 16 => "tops_u8s32_sm90wmma_16x16x16";
    Sm90, U8 => S32, 32 x 8 x 16 => "tops_u8s32_sm90wmma_32x8x16";
    Sm90, U8 => S32, 8 x 32 x 16 => "tops_u8s32_sm90wmma_8x32x16";
    Sm90, S8 => S32, 16 x 16 x 16 => "tops_s8s32_sm90wmma_16x16x16";
    Sm90, S8 => S32, 32 x 8 x 16 => "tops_s8s32_sm90wmma_32x8x16";
    Sm90, S8 => S32, 8 x 32 x 16 => "tops_s8s32_sm90wmma_8x32x16";
    Sm90, Bf16 => F32, 16 x 16 x 16 => "tops_bf16f32_sm90wmma_16x16x16";
    Sm90, Bf16 => F32, 32 x 8 x 16 => "tops_bf16f32_sm90wmma_32x8x16";
    Sm90, Bf16 => F32, 8 x 32 x 16 => "tops_bf16f32_sm90wmma_8x32x16";
    Sm90, Tf32 => F32, 16 x 16 x 8 => "tops_tf32f32_sm90wmma_16x16x8";
    Sm90, F64 => F64, 8 x 8 x 4 => "tops_f64f64_sm90wmma_8x8x4";
}

impl_bmma_variant! {
    Sm75, Xor, 8 x 8 x 4 => "tops_b1i32xor_sm75bmma_8x8x128";
    Sm80, Xor, 8 x 8 x 4 => "tops_b1i32xor_sm80bmma_8x8x128";
    Sm80, And, 8 x 8 x 4 => "tops_b1i32and_sm80bmma_8x8x128";
    Sm89, Xor, 8 x 8 x 4 => "tops_b1i32xor_sm89bmma_8x8x128";
    Sm89, And, 8 x 8 x 4 => "tops_b1i32and_sm89bmma_8x8x128";
    Sm90, And, 8 x 8 x 4 => "tops_b1i32and_sm90bmma_8x8x128";
}

/// Byte the sink is filled with before every launch.
const SINK_SENTINEL: u8 = 0xA5;

/// Grid width and repetition count as the kernel receives them.
///
/// The CUDA grid is limited to `i32::MAX` blocks in x and the kernel takes a
/// signed repetition count, so larger values are rejected instead of
/// truncated.
pub fn launch_dims(cfg: &LaunchConfig) -> tops_core::Result<(u32, i32)> {
    let groups = i32::try_from(cfg.groups)
        .map_err(|_| TopsError::InvalidLaunch("groups exceed the CUDA grid limit"))?;
    let repetitions = i32::try_from(cfg.repetitions)
        .map_err(|_| TopsError::InvalidLaunch("repetitions exceed i32::MAX"))?;
    Ok((groups as u32, repetitions))
}

/// Compile (once), launch and synchronise variant `V` on `ctx`.
///
/// The device is first checked against `V::Tier` by [`select`]; a device
/// older than the tier fails with [`tops_core::TopsError::CapabilityMismatch`]
/// before anything is compiled. The kernel is compiled for the variant's
/// tier, not the device's, and runs one block of one warp per execution
/// group. The sink is filled with a sentinel byte beforehand; any byte that
/// differs afterwards means the guarded store ran.
pub fn launch_variant<V: CudaVariant>(
    ctx: &CudaContext,
    cfg: &LaunchConfig,
) -> Result<LaunchReport> {
    cfg.validate()?;
    let (groups, repetitions) = launch_dims(cfg)?;
    select::<V::Tier>(ctx)?;

    let arch = V::arch();
    let func = ctx.get_or_compile(V::KERNEL_NAME, &V::source(), arch)?;
    let device = ctx.device();
    let mut sink = device.htod_copy(vec![SINK_SENTINEL; V::SINK_BYTES])?;
    let grid = GridConfig {
        grid_dim: (groups, 1, 1),
        block_dim: (WARP_SIZE, 1, 1),
        shared_mem_bytes: 0,
    };
    tracing::debug!(
        kernel = V::KERNEL_NAME,
        arch,
        groups,
        repetitions,
        "cuda launch"
    );

    let start = Instant::now();
    unsafe {
        func.launch(grid, (&mut sink, repetitions, UNREACHABLE_LANE))?;
    }
    device.synchronize()?;
    let elapsed = start.elapsed();

    let written = device.dtoh_sync_copy(&sink)?;
    let variant = V::KERNEL_NAME
        .strip_prefix("tops_")
        .unwrap_or(V::KERNEL_NAME)
        .to_string();

    Ok(LaunchReport {
        variant,
        groups: cfg.groups,
        repetitions: cfg.repetitions,
        group_size: V::FAMILY.group_size(),
        macs: V::macs()
            .saturating_mul(cfg.groups as u64)
            .saturating_mul(cfg.repetitions as u64),
        checksum: None,
        elapsed,
        guard_fired: sink_written(&written),
    })
}

/// Whether any byte of a read-back sink differs from the sentinel.
fn sink_written(bytes: &[u8]) -> bool {
    bytes.iter().any(|&byte| byte != SINK_SENTINEL)
}
