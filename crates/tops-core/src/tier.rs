//! Hardware capability tiers.

use crate::error::TopsError;
use std::fmt;
use std::str::FromStr;

/// Ordinal classification of GPU generations.
///
/// The ordering is the order of release, which is also the order used to
/// decide whether a device can run a kernel built for a given tier. It says
/// nothing about which primitives are legal: see [`crate::Supports`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Capability {
    /// sm_70: first-generation tensor cores (f16).
    Volta,
    /// sm_75: adds 8-bit, 4-bit and 1-bit integer tensor cores.
    Turing,
    /// sm_80: adds bf16, tf32, f64 and AND-popcount.
    Ampere,
    /// sm_89: Ampere instruction set on a newer die.
    Ada,
    /// sm_90: warpgroup-wide asynchronous MMA; drops 4-bit and XOR-popcount.
    Hopper,
}

impl Capability {
    /// All tiers in ascending order.
    pub const ALL: [Capability; 5] = [
        Capability::Volta,
        Capability::Turing,
        Capability::Ampere,
        Capability::Ada,
        Capability::Hopper,
    ];

    /// The `sm_XX` number of this tier.
    pub const fn sm(&self) -> u32 {
        match self {
            Capability::Volta => 70,
            Capability::Turing => 75,
            Capability::Ampere => 80,
            Capability::Ada => 89,
            Capability::Hopper => 90,
        }
    }

    /// The `sm_XX` architecture name of this tier.
    pub const fn arch(&self) -> &'static str {
        match self {
            Capability::Volta => "sm_70",
            Capability::Turing => "sm_75",
            Capability::Ampere => "sm_80",
            Capability::Ada => "sm_89",
            Capability::Hopper => "sm_90",
        }
    }

    /// Human-readable generation name.
    pub const fn generation(&self) -> &'static str {
        match self {
            Capability::Volta => "Volta",
            Capability::Turing => "Turing",
            Capability::Ampere => "Ampere",
            Capability::Ada => "Ada",
            Capability::Hopper => "Hopper",
        }
    }

    /// Map a CUDA compute capability to a tier.
    ///
    /// Generations newer than Hopper are not mapped: their primitive set has
    /// not been characterised and nothing here may assume it.
    pub fn from_compute_capability(major: u32, minor: u32) -> Option<Self> {
        match (major, minor) {
            (7, 0..=2) => Some(Capability::Volta),
            (7, 5) => Some(Capability::Turing),
            (8, 0..=7) => Some(Capability::Ampere),
            (8, 9) => Some(Capability::Ada),
            (9, 0) => Some(Capability::Hopper),
            _ => None,
        }
    }

    /// Whether a device of this tier can run a kernel built for `required`.
    pub fn satisfies(&self, required: Capability) -> bool {
        *self >= required
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.arch(), self.generation())
    }
}

impl FromStr for Capability {
    type Err = TopsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower.trim_start_matches("sm").trim_start_matches('_');
        Capability::ALL
            .into_iter()
            .find(|cap| {
                cap.generation().eq_ignore_ascii_case(&lower) || digits == cap.sm().to_string()
            })
            .ok_or_else(|| TopsError::UnknownCapability(s.to_string()))
    }
}

/// Type-level capability tier.
///
/// Kernels carry their tier as a type parameter so that legality is resolved
/// when the crate is built, never by branching on a capability at run time.
pub trait Tier: Copy + Clone + Default + Send + Sync + fmt::Debug + 'static {
    /// The runtime tier this marker stands for.
    const CAPABILITY: Capability;
}

macro_rules! define_tiers {
    ($($(#[$doc:meta])* $name:ident => $cap:ident),* $(,)?) => {
        $(
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
            pub struct $name;

            impl Tier for $name {
                const CAPABILITY: Capability = Capability::$cap;
            }
        )*
    };
}

define_tiers! {
    /// Volta (sm_70).
    Sm70 => Volta,
    /// Turing (sm_75).
    Sm75 => Turing,
    /// Ampere (sm_80).
    Sm80 => Ampere,
    /// Ada Lovelace (sm_89).
    Sm89 => Ada,
    /// Hopper (sm_90).
    Sm90 => Hopper,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Capability::Volta < Capability::Turing);
        assert!(Capability::Ada < Capability::Hopper);
        assert_eq!(Capability::ALL.iter().max(), Some(&Capability::Hopper));
    }

    #[test]
    fn test_satisfies() {
        assert!(Capability::Hopper.satisfies(Capability::Volta));
        assert!(Capability::Ampere.satisfies(Capability::Ampere));
        assert!(!Capability::Turing.satisfies(Capability::Ampere));
    }

    #[test]
    fn test_from_compute_capability() {
        assert_eq!(Capability::from_compute_capability(7, 0), Some(Capability::Volta));
        assert_eq!(Capability::from_compute_capability(7, 5), Some(Capability::Turing));
        assert_eq!(Capability::from_compute_capability(8, 6), Some(Capability::Ampere));
        assert_eq!(Capability::from_compute_capability(8, 9), Some(Capability::Ada));
        assert_eq!(Capability::from_compute_capability(9, 0), Some(Capability::Hopper));
        assert_eq!(Capability::from_compute_capability(6, 1), None);
        assert_eq!(Capability::from_compute_capability(10, 0), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!("volta".parse::<Capability>(), Ok(Capability::Volta));
        assert_eq!("Hopper".parse::<Capability>(), Ok(Capability::Hopper));
        assert_eq!("sm80".parse::<Capability>(), Ok(Capability::Ampere));
        assert_eq!("sm_75".parse::<Capability>(), Ok(Capability::Turing));
        assert_eq!("89".parse::<Capability>(), Ok(Capability::Ada));
        assert_eq!(
            "pascal".parse::<Capability>(),
            Err(TopsError::UnknownCapability("pascal".to_string()))
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Capability::Ampere.to_string(), "sm_80 (Ampere)");
    }

    #[test]
    fn test_markers() {
        assert_eq!(Sm70::CAPABILITY, Capability::Volta);
        assert_eq!(Sm90::CAPABILITY, Capability::Hopper);
        assert_eq!(Sm89::CAPABILITY.sm(), 89);
    }
}
