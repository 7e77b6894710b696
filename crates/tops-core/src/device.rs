//! Devices and the selection layer.
//!
//! A kernel is compiled for exactly one tier. Before it may run, the device
//! it is headed for has to be checked against that tier; [`select`] does the
//! check once and hands back a [`Launcher`], which is the only way to launch
//! a kernel of that tier.

use crate::binary::BinaryPrimitive;
use crate::error::{Result, TopsError};
use crate::launch::{lane_for, run_groups, total_macs, LaunchConfig, LaunchReport};
use crate::legal::{Supports, SupportsBinary};
use crate::primitive::Primitive;
use crate::runner::{BmmaKernel, MmaKernel, Sink};
use crate::shape::{BitMnk, Mnk};
use crate::tier::{Capability, Tier};
use crate::tile::{Accumulator, BitAccumulator};
use std::fmt;
use std::marker::PhantomData;
use std::time::Instant;
use tops_types::{BitOp, Precision};

/// Something kernels can be launched on.
pub trait Device {
    /// Tier the device reports.
    fn capability(&self) -> Capability;

    /// Human-readable device name.
    fn name(&self) -> &str;
}

/// Host-side emulation of a device of a declared tier.
///
/// Primitives run on the CPU; only the tier is emulated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostEmulator {
    capability: Capability,
    name: String,
}

impl HostEmulator {
    /// Emulate a device of tier `capability`.
    pub fn new(capability: Capability) -> Self {
        Self {
            capability,
            name: format!("host emulator ({})", capability),
        }
    }

    /// Emulate the newest known tier.
    pub fn newest() -> Self {
        Self::new(Capability::Hopper)
    }
}

impl Device for HostEmulator {
    fn capability(&self) -> Capability {
        self.capability
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Check `device` against tier `T`.
///
/// Fails with [`TopsError::CapabilityMismatch`] when the device is older
/// than `T`. Nothing is launched in that case.
pub fn select<T: Tier>(device: &(impl Device + ?Sized)) -> Result<Launcher<T>> {
    let available = device.capability();
    let required = T::CAPABILITY;
    if !available.satisfies(required) {
        tracing::debug!(
            device = device.name(),
            %required,
            %available,
            "capability mismatch"
        );
        return Err(TopsError::CapabilityMismatch {
            required,
            available,
        });
    }
    tracing::debug!(device = device.name(), tier = %required, "selected");
    Ok(Launcher {
        device: device.name().to_string(),
        available,
        _tier: PhantomData,
    })
}

/// Launch handle for kernels of tier `T` on a device that supports it.
pub struct Launcher<T: Tier> {
    device: String,
    available: Capability,
    _tier: PhantomData<T>,
}

impl<T: Tier> Launcher<T> {
    /// Name of the selected device.
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Tier the selected device reports (at least `T::CAPABILITY`).
    pub fn available(&self) -> Capability {
        self.available
    }

    /// Run `cfg.groups` groups of a dense kernel.
    pub fn launch<I, O, P, const M: usize, const N: usize, const K: usize>(
        &self,
        kernel: &MmaKernel<T, I, O, M, N, K>,
        primitive: &P,
        cfg: &LaunchConfig,
        sink: &Sink<Accumulator<O, M, N>>,
    ) -> Result<LaunchReport>
    where
        T: Supports<Mnk<M, N, K>, I, O>,
        I: Precision,
        O: Precision,
        P: Primitive<I, O, M, N, K> + Sync + ?Sized,
    {
        cfg.validate()?;
        let variant = MmaKernel::<T, I, O, M, N, K>::name();
        let group_size = MmaKernel::<T, I, O, M, N, K>::FAMILY.group_size();
        tracing::debug!(
            %variant,
            groups = cfg.groups,
            repetitions = cfg.repetitions,
            "launch"
        );

        let start = Instant::now();
        let checksum = run_groups(cfg.groups, |group| {
            let acc = kernel.run_group(
                primitive,
                cfg.repetitions,
                lane_for(group, group_size),
                sink,
            );
            tracing::trace!(group, "group done");
            acc.checksum()
        });
        let elapsed = start.elapsed();

        Ok(LaunchReport {
            variant,
            groups: cfg.groups,
            repetitions: cfg.repetitions,
            group_size,
            macs: total_macs(cfg, MmaKernel::<T, I, O, M, N, K>::macs()),
            checksum: Some(checksum),
            elapsed,
            guard_fired: !sink.is_untouched(),
        })
    }

    /// Run `cfg.groups` groups of a bit-packed kernel with combination `op`.
    pub fn launch_binary<Op, P, const M: usize, const N: usize, const KW: usize>(
        &self,
        kernel: &BmmaKernel<T, M, N, KW>,
        primitive: &P,
        op: Op,
        cfg: &LaunchConfig,
        sink: &Sink<BitAccumulator<M, N>>,
    ) -> Result<LaunchReport>
    where
        Op: BitOp,
        T: SupportsBinary<BitMnk<M, N, KW>, Op>,
        P: BinaryPrimitive<Op, M, N, KW> + Sync + ?Sized,
    {
        cfg.validate()?;
        let variant = BmmaKernel::<T, M, N, KW>::name::<Op>();
        let group_size = <T as SupportsBinary<BitMnk<M, N, KW>, Op>>::FAMILY.group_size();
        tracing::debug!(
            %variant,
            groups = cfg.groups,
            repetitions = cfg.repetitions,
            "launch"
        );

        let start = Instant::now();
        let checksum = run_groups(cfg.groups, |group| {
            let acc = kernel.run_group(
                primitive,
                op,
                cfg.repetitions,
                lane_for(group, group_size),
                sink,
            );
            tracing::trace!(group, "group done");
            acc.checksum()
        });
        let elapsed = start.elapsed();

        Ok(LaunchReport {
            variant,
            groups: cfg.groups,
            repetitions: cfg.repetitions,
            group_size,
            macs: total_macs(cfg, BmmaKernel::<T, M, N, KW>::macs()),
            checksum: Some(checksum),
            elapsed,
            guard_fired: !sink.is_untouched(),
        })
    }
}

impl<T: Tier> fmt::Debug for Launcher<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Launcher")
            .field("tier", &T::CAPABILITY)
            .field("device", &self.device)
            .field("available", &self.available)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::EmulatedBmma;
    use crate::primitive::EmulatedMma;
    use crate::runner::{BitTileInit, TileInit};
    use crate::tier::{Sm70, Sm75, Sm80, Sm89, Sm90};
    use tops_types::{And, Tf32, Xor, F16, F32, S32, U8};

    #[test]
    fn test_select_same_or_newer() {
        let ampere = HostEmulator::new(Capability::Ampere);
        assert!(select::<Sm70>(&ampere).is_ok());
        assert!(select::<Sm75>(&ampere).is_ok());
        let launcher = select::<Sm80>(&ampere).unwrap();
        assert_eq!(launcher.available(), Capability::Ampere);
        assert!(launcher.device().contains("sm_80"));
    }

    #[test]
    fn test_select_rejects_older_device() {
        let volta = HostEmulator::new(Capability::Volta);
        let err = select::<Sm80>(&volta).unwrap_err();
        assert_eq!(
            err,
            TopsError::CapabilityMismatch {
                required: Capability::Ampere,
                available: Capability::Volta,
            }
        );
        assert!(select::<Sm89>(&HostEmulator::new(Capability::Ampere)).is_err());
        assert!(select::<Sm90>(&HostEmulator::new(Capability::Ada)).is_err());
    }

    #[test]
    fn test_select_through_trait_object() {
        let device: Box<dyn Device> = Box::new(HostEmulator::newest());
        assert!(select::<Sm90>(device.as_ref()).is_ok());
    }

    #[test]
    fn test_launch_report() {
        let launcher = select::<Sm80>(&HostEmulator::new(Capability::Ampere)).unwrap();
        let kernel = MmaKernel::<Sm80, Tf32, F32, 8, 8, 4>::with_init(TileInit::new(1.0, 0.5));
        let sink = Sink::new();

        let report = launcher
            .launch(&kernel, &EmulatedMma, &LaunchConfig::new(4, 128), &sink)
            .unwrap();

        assert_eq!(report.variant, "tf32f32_sm80mma_8x8x4");
        assert_eq!(report.group_size, 32);
        assert_eq!(report.macs, 4 * 128 * 8 * 8 * 4);
        // Every entry of every group ends at 0.5 + 128 * 4.
        assert_eq!(report.checksum, Some(4.0 * 64.0 * 512.5));
        assert!(!report.guard_fired);
    }

    #[test]
    fn test_launch_integer_variant() {
        let launcher = select::<Sm75>(&HostEmulator::new(Capability::Hopper)).unwrap();
        let kernel = MmaKernel::<Sm75, U8, S32, 16, 16, 16>::new();
        let sink = Sink::new();

        let report = launcher
            .launch(&kernel, &EmulatedMma, &LaunchConfig::new(3, 2), &sink)
            .unwrap();

        assert_eq!(report.checksum, Some(3.0 * 256.0 * 32.0));
        assert!(!report.guard_fired);
    }

    #[test]
    fn test_launch_zero_repetitions() {
        let launcher = select::<Sm70>(&HostEmulator::new(Capability::Volta)).unwrap();
        let kernel = MmaKernel::<Sm70, F16, F32, 32, 8, 16>::with_init(TileInit::new(
            tops_types::f16::from_f32(1.0),
            2.0,
        ));
        let sink = Sink::new();

        let report = launcher
            .launch(&kernel, &EmulatedMma, &LaunchConfig::new(2, 0), &sink)
            .unwrap();

        assert_eq!(report.macs, 0);
        assert_eq!(report.checksum, Some(2.0 * 256.0 * 2.0));
    }

    #[test]
    fn test_launch_invalid_config() {
        let launcher = select::<Sm70>(&HostEmulator::newest()).unwrap();
        let kernel = MmaKernel::<Sm70, F16, F32, 16, 16, 16>::new();
        let sink = Sink::new();
        let err = launcher
            .launch(&kernel, &EmulatedMma, &LaunchConfig::new(0, 1), &sink)
            .unwrap_err();
        assert!(matches!(err, TopsError::InvalidLaunch(_)));
    }

    #[test]
    fn test_launch_binary_xor_and() {
        let launcher = select::<Sm80>(&HostEmulator::new(Capability::Ada)).unwrap();
        let kernel = BmmaKernel::<Sm80, 8, 8, 4>::with_init(BitTileInit {
            pattern_a: 0xFFFF_0000,
            pattern_b: 0xFF00_FF00,
            baseline: 0,
        });
        let sink = Sink::new();
        let cfg = LaunchConfig::new(2, 10);

        let xor = launcher
            .launch_binary(&kernel, &EmulatedBmma, Xor, &cfg, &sink)
            .unwrap();
        let and = launcher
            .launch_binary(&kernel, &EmulatedBmma, And, &cfg, &sink)
            .unwrap();

        assert_eq!(xor.variant, "b1i32xor_sm80bmma_8x8x128");
        assert_eq!(and.variant, "b1i32and_sm80bmma_8x8x128");
        assert_eq!(xor.checksum, Some(2.0 * 64.0 * 10.0 * 64.0));
        assert_eq!(and.checksum, Some(2.0 * 64.0 * 10.0 * 32.0));
        assert!(!xor.guard_fired && !and.guard_fired);
    }

    #[test]
    fn test_launch_wgmma_group_size() {
        let launcher = select::<Sm90>(&HostEmulator::newest()).unwrap();
        let kernel = BmmaKernel::<Sm90, 64, 256, 8>::new();
        let sink = Sink::new();

        let report = launcher
            .launch_binary(&kernel, &EmulatedBmma, And, &LaunchConfig::SMOKE, &sink)
            .unwrap();

        assert_eq!(report.group_size, 128);
        assert_eq!(report.macs, 64 * 256 * 256);
    }
}
