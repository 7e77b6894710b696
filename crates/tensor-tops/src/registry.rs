//! Table of every kernel variant this crate provides.

use crate::api::VARIANTS;
use std::fmt;
use tops_core::{
    BitMnk, Capability, Device, Family, LaunchConfig, LaunchReport, Mnk, Result, Shape, Supports,
    SupportsBinary, TopsError,
};
use tops_types::{BitOp, Precision, B1};

/// Type-erased launch of one variant on a device.
pub type RunFn = fn(&dyn Device, &LaunchConfig) -> Result<LaunchReport>;

/// Descriptor of one entry point.
#[derive(Clone, Copy)]
pub struct Variant {
    symbol: &'static str,
    capability: Capability,
    family: Family,
    input: &'static str,
    output: &'static str,
    op: Option<&'static str>,
    shape: (usize, usize, usize),
    run: RunFn,
}

impl Variant {
    pub(crate) const fn dense<T, I, O, const M: usize, const N: usize, const K: usize>(
        symbol: &'static str,
        run: RunFn,
    ) -> Self
    where
        T: Supports<Mnk<M, N, K>, I, O>,
        I: Precision,
        O: Precision,
    {
        Self {
            symbol,
            capability: T::CAPABILITY,
            family: <T as Supports<Mnk<M, N, K>, I, O>>::FAMILY,
            input: I::NAME,
            output: O::NAME,
            op: None,
            shape: (M, N, K),
            run,
        }
    }

    pub(crate) const fn binary<T, Op, const M: usize, const N: usize, const KW: usize>(
        symbol: &'static str,
        run: RunFn,
    ) -> Self
    where
        T: SupportsBinary<BitMnk<M, N, KW>, Op>,
        Op: BitOp,
    {
        Self {
            symbol,
            capability: T::CAPABILITY,
            family: <T as SupportsBinary<BitMnk<M, N, KW>, Op>>::FAMILY,
            input: B1::NAME,
            output: "i32",
            op: Some(Op::NAME),
            shape: (M, N, <BitMnk<M, N, KW> as Shape>::K),
            run,
        }
    }

    /// Kernel name, e.g. `f16f32_sm70wmma_16x16x16`.
    pub fn name(&self) -> &'static str {
        self.symbol.strip_prefix("tops_").unwrap_or(self.symbol)
    }

    /// Name of the entry-point function, e.g. `tops_f16f32_sm70wmma_16x16x16`.
    pub fn symbol(&self) -> &'static str {
        self.symbol
    }

    /// Tier the variant was built for.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Instruction family of the primitive.
    pub fn family(&self) -> Family {
        self.family
    }

    /// Input precision name.
    pub fn input(&self) -> &'static str {
        self.input
    }

    /// Accumulator precision name.
    pub fn output(&self) -> &'static str {
        self.output
    }

    /// Bit combination of a bit-packed variant.
    pub fn op(&self) -> Option<&'static str> {
        self.op
    }

    /// `(m, n, k)` of one invocation; `k` counts bits for bit-packed variants.
    pub fn shape(&self) -> (usize, usize, usize) {
        self.shape
    }

    /// Multiply-accumulates per invocation.
    pub fn macs(&self) -> u64 {
        let (m, n, k) = self.shape;
        (m * n * k) as u64
    }

    /// Whether the variant is bit-packed.
    pub fn is_binary(&self) -> bool {
        self.op.is_some()
    }

    /// Whether a device of tier `capability` may run this variant.
    pub fn runnable_on(&self, capability: Capability) -> bool {
        capability.satisfies(self.capability)
    }

    /// Select `device` for this variant's tier and launch it.
    pub fn run(&self, device: &dyn Device, cfg: &LaunchConfig) -> Result<LaunchReport> {
        (self.run)(device, cfg)
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name())
            .field("capability", &self.capability)
            .field("family", &self.family)
            .field("shape", &self.shape)
            .finish()
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Every registered variant, grouped by tier.
pub fn variants() -> &'static [Variant] {
    VARIANTS
}

/// Look a variant up by kernel name or entry-point name.
pub fn find(name: &str) -> Result<&'static Variant> {
    VARIANTS
        .iter()
        .find(|v| v.name() == name || v.symbol() == name)
        .ok_or_else(|| TopsError::UnsupportedVariant(name.to_string()))
}

/// Variants a device of tier `capability` may run.
pub fn available_on(capability: Capability) -> impl Iterator<Item = &'static Variant> {
    VARIANTS.iter().filter(move |v| v.runnable_on(capability))
}

/// Variants whose name contains `filter`.
pub fn matching<'a>(filter: &'a str) -> impl Iterator<Item = &'static Variant> + 'a {
    VARIANTS.iter().filter(move |v| v.name().contains(filter))
}

/// Variants matching `filter`, split into those a device of tier
/// `capability` may run and those that need a newer tier.
pub fn partition(
    filter: &str,
    capability: Capability,
) -> (Vec<&'static Variant>, Vec<&'static Variant>) {
    matching(filter).partition(|v| v.runnable_on(capability))
}
