//! Which primitives exist on which tier.
//!
//! Legality is expressed as trait implementations on the tier markers. A
//! combination that is missing from the table below has no implementation,
//! so any kernel that names it is rejected by the compiler:
//!
//! ```compile_fail
//! use tops_core::{MmaKernel, Sm70};
//! use tops_types::{Bf16, F32};
//!
//! // bf16 tensor cores arrived with Ampere.
//! let _ = MmaKernel::<Sm70, Bf16, F32, 16, 16, 16>::new();
//! ```
//!
//! Legality is not monotonic in the tier ordinal:
//!
//! ```compile_fail
//! use tops_core::{MmaKernel, Sm90};
//! use tops_types::{S32, U4};
//!
//! // Hopper dropped the 4-bit integer tensor cores.
//! let _ = MmaKernel::<Sm90, U4, S32, 8, 8, 32>::new();
//! ```

use crate::shape::*;
use crate::tier::{Sm70, Sm75, Sm80, Sm89, Sm90, Tier};
use tops_types::{And, Bf16, BitOp, Precision, Tf32, Xor, F16, F32, F64, S32, S4, S8, U4, U8};

/// Instruction family a primitive lowers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// Warp-level matrix fragments (`wmma.mma.sync`, `bmma.sync`).
    Wmma,
    /// Warp-level register-operand MMA (`mma.sync`).
    Mma,
    /// Warpgroup-level asynchronous MMA (`wgmma.mma_async`).
    Wgmma,
}

impl Family {
    /// Lanes that execute one primitive invocation in lock-step.
    pub const fn group_size(&self) -> usize {
        match self {
            Family::Wmma | Family::Mma => 32,
            Family::Wgmma => 128,
        }
    }

    /// Lowercase name used in kernel names.
    pub const fn name(&self) -> &'static str {
        match self {
            Family::Wmma => "wmma",
            Family::Mma => "mma",
            Family::Wgmma => "wgmma",
        }
    }

    /// Name used for bit-packed kernels of this family.
    pub const fn binary_name(&self) -> &'static str {
        match self {
            Family::Wmma | Family::Mma => "bmma",
            Family::Wgmma => "wgmma",
        }
    }
}

/// A tier on which the dense primitive `S` with input `I` and accumulator `O` exists.
pub trait Supports<S: Shape, I: Precision, O: Precision>: Tier {
    /// Instruction family the primitive lowers to on this tier.
    const FAMILY: Family;
}

/// A tier on which the bit-packed primitive `S` with combination `Op` exists.
pub trait SupportsBinary<S: Shape, Op: BitOp>: Tier {
    /// Instruction family the primitive lowers to on this tier.
    const FAMILY: Family;
}

macro_rules! legal {
    ($($family:ident: $input:ident => $output:ident @ $shape:ident on [$($tier:ident),+ $(,)?];)*) => {
        $($(
            impl Supports<$shape, $input, $output> for $tier {
                const FAMILY: Family = Family::$family;
            }
        )+)*
    };
}

macro_rules! legal_binary {
    ($($family:ident: $op:ident @ $shape:ident on [$($tier:ident),+ $(,)?];)*) => {
        $($(
            impl SupportsBinary<$shape, $op> for $tier {
                const FAMILY: Family = Family::$family;
            }
        )+)*
    };
}

legal! {
    Wmma: F16 => F16 @ M16N16K16 on [Sm70, Sm75, Sm80, Sm89, Sm90];
    Wmma: F16 => F16 @ M32N8K16 on [Sm70, Sm75, Sm80, Sm89, Sm90];
    Wmma: F16 => F16 @ M8N32K16 on [Sm70, Sm75, Sm80, Sm89, Sm90];
    Wmma: F16 => F32 @ M16N16K16 on [Sm70, Sm75, Sm80, Sm89, Sm90];
    Wmma: F16 => F32 @ M32N8K16 on [Sm70, Sm75, Sm80, Sm89, Sm90];
    Wmma: F16 => F32 @ M8N32K16 on [Sm70, Sm75, Sm80, Sm89, Sm90];
    Mma: F16 => F32 @ M8N8K4 on [Sm70, Sm75, Sm80, Sm89, Sm90];

    Wmma: U8 => S32 @ M16N16K16 on [Sm75, Sm80, Sm89, Sm90];
    Wmma: U8 => S32 @ M32N8K16 on [Sm75, Sm80, Sm89, Sm90];
    Wmma: U8 => S32 @ M8N32K16 on [Sm75, Sm80, Sm89, Sm90];
    Wmma: S8 => S32 @ M16N16K16 on [Sm75, Sm80, Sm89, Sm90];
    Wmma: S8 => S32 @ M32N8K16 on [Sm75, Sm80, Sm89, Sm90];
    Wmma: S8 => S32 @ M8N32K16 on [Sm75, Sm80, Sm89, Sm90];
    Wmma: U4 => S32 @ M8N8K32 on [Sm75, Sm80, Sm89];
    Wmma: S4 => S32 @ M8N8K32 on [Sm75, Sm80, Sm89];

    Wmma: Bf16 => F32 @ M16N16K16 on [Sm80, Sm89, Sm90];
    Wmma: Bf16 => F32 @ M32N8K16 on [Sm80, Sm89, Sm90];
    Wmma: Bf16 => F32 @ M8N32K16 on [Sm80, Sm89, Sm90];
    Wmma: Tf32 => F32 @ M16N16K8 on [Sm80, Sm89, Sm90];
    Wmma: F64 => F64 @ M8N8K4 on [Sm80, Sm89, Sm90];
    Mma: Tf32 => F32 @ M8N8K4 on [Sm80, Sm89, Sm90];
    Mma: Tf32 => F32 @ M16N8K8 on [Sm80, Sm89, Sm90];
    Mma: F16 => F32 @ M16N8K16 on [Sm80, Sm89, Sm90];
    Mma: Bf16 => F32 @ M16N8K16 on [Sm80, Sm89, Sm90];

    Wgmma: F16 => F32 @ M64N256K16 on [Sm90];
    Wgmma: Bf16 => F32 @ M64N256K16 on [Sm90];
    Wgmma: Tf32 => F32 @ M64N256K8 on [Sm90];
}

legal_binary! {
    Wmma: Xor @ M8N8K128 on [Sm75, Sm80, Sm89];
    Wmma: And @ M8N8K128 on [Sm80, Sm89, Sm90];
    Wgmma: And @ M64N256K256 on [Sm90];
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family<T: Supports<S, I, O>, S: Shape, I: Precision, O: Precision>() -> Family {
        T::FAMILY
    }

    fn binary_family<T: SupportsBinary<S, Op>, S: Shape, Op: BitOp>() -> Family {
        T::FAMILY
    }

    #[test]
    fn test_families() {
        assert_eq!(family::<Sm70, M16N16K16, F16, F32>(), Family::Wmma);
        assert_eq!(family::<Sm70, M8N8K4, F16, F32>(), Family::Mma);
        assert_eq!(family::<Sm80, M8N8K4, F64, F64>(), Family::Wmma);
        assert_eq!(family::<Sm90, M64N256K16, Bf16, F32>(), Family::Wgmma);
        assert_eq!(binary_family::<Sm75, M8N8K128, Xor>(), Family::Wmma);
        assert_eq!(binary_family::<Sm90, M64N256K256, And>(), Family::Wgmma);
    }

    #[test]
    fn test_table_rows_expand_to_every_listed_tier() {
        assert_eq!(family::<Sm70, M8N32K16, F16, F16>(), Family::Wmma);
        assert_eq!(family::<Sm75, M8N32K16, F16, F16>(), Family::Wmma);
        assert_eq!(family::<Sm80, M8N32K16, F16, F16>(), Family::Wmma);
        assert_eq!(family::<Sm89, M8N32K16, F16, F16>(), Family::Wmma);
        assert_eq!(family::<Sm90, M8N32K16, F16, F16>(), Family::Wmma);

        assert_eq!(family::<Sm75, M8N8K32, S4, S32>(), Family::Wmma);
        assert_eq!(family::<Sm89, M8N8K32, U4, S32>(), Family::Wmma);
        assert_eq!(family::<Sm89, M16N8K8, Tf32, F32>(), Family::Mma);

        assert_eq!(binary_family::<Sm80, M8N8K128, Xor>(), Family::Wmma);
        assert_eq!(binary_family::<Sm89, M8N8K128, Xor>(), Family::Wmma);
        assert_eq!(binary_family::<Sm80, M8N8K128, And>(), Family::Wmma);
        assert_eq!(binary_family::<Sm90, M8N8K128, And>(), Family::Wmma);
    }

    #[test]
    fn test_group_sizes() {
        assert_eq!(Family::Wmma.group_size(), 32);
        assert_eq!(Family::Mma.group_size(), 32);
        assert_eq!(Family::Wgmma.group_size(), 128);
    }

    #[test]
    fn test_names() {
        assert_eq!(Family::Wgmma.name(), "wgmma");
        assert_eq!(Family::Wmma.binary_name(), "bmma");
    }
}
