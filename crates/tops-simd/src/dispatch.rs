use crate::kernels::WideMma;
use tops_core::{EmulatedBmma, EmulatedMma};
use tops_types::{Bf16, BitOp, Precision, Tf32, B1, F16, F32, F64, S32, S4, S8, U4, U8};

/// Host primitive for input precision `Self` accumulating into `O`.
///
/// Resolved when the crate is built: every pairing names exactly one
/// primitive type and there is no branch on CPU features at run time.
pub trait Dispatch<O: Precision>: Precision {
    /// The primitive used for this pairing.
    type Kernel: Default + Copy + Send + Sync + 'static;

    /// Short name of the primitive for reports.
    const BACKEND: &'static str;

    /// The primitive instance.
    fn kernel() -> Self::Kernel {
        Self::Kernel::default()
    }
}

macro_rules! impl_dispatch {
    ($kernel:ty, $backend:literal: $($input:ty => $output:ty),* $(,)?) => {
        $(
            impl Dispatch<$output> for $input {
                type Kernel = $kernel;
                const BACKEND: &'static str = $backend;
            }
        )*
    };
}

impl_dispatch!(WideMma, "wide": F16 => F32, Bf16 => F32, Tf32 => F32, F64 => F64);

// Half accumulators round after every step, which a widened vector
// accumulator would not reproduce.
impl_dispatch!(EmulatedMma, "emulated": F16 => F16);

impl_dispatch!(EmulatedMma, "emulated": U8 => S32, S8 => S32, U4 => S32, S4 => S32);

/// Host primitive for bit-packed operands combined with `Op`.
pub trait BinaryDispatch<Op: BitOp> {
    /// The primitive used for this operator.
    type Kernel: Default + Copy + Send + Sync + 'static;

    /// Short name of the primitive for reports.
    const BACKEND: &'static str;

    /// The primitive instance.
    fn kernel() -> Self::Kernel {
        Self::Kernel::default()
    }
}

impl<Op: BitOp> BinaryDispatch<Op> for B1 {
    type Kernel = EmulatedBmma;
    const BACKEND: &'static str = "emulated";
}

/// Host primitive for the `I → O` pairing.
pub fn primitive_for<I: Dispatch<O>, O: Precision>() -> I::Kernel {
    I::kernel()
}
