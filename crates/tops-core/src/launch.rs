//! Launch configuration and reporting.

use crate::error::{Result, TopsError};
use crate::runner::LaneId;
use std::time::Duration;

/// How many execution groups to run and how many primitive invocations
/// each performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Number of independent execution groups.
    pub groups: usize,
    /// Primitive invocations per group.
    pub repetitions: usize,
}

impl LaunchConfig {
    /// One group, one invocation.
    pub const SMOKE: Self = Self {
        groups: 1,
        repetitions: 1,
    };

    /// Throughput run.
    pub const DEFAULT: Self = Self {
        groups: 128,
        repetitions: 128,
    };

    /// Create a custom configuration.
    pub const fn new(groups: usize, repetitions: usize) -> Self {
        Self {
            groups,
            repetitions,
        }
    }

    /// Validate the configuration.
    ///
    /// Zero repetitions is allowed and leaves every accumulator at its
    /// baseline; zero groups is not.
    pub fn validate(&self) -> Result<()> {
        if self.groups == 0 {
            return Err(TopsError::InvalidLaunch("groups must be non-zero"));
        }
        Ok(())
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Outcome of one launch.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchReport {
    /// Kernel name.
    pub variant: String,
    /// Execution groups run.
    pub groups: usize,
    /// Primitive invocations per group.
    pub repetitions: usize,
    /// Lanes per execution group.
    pub group_size: usize,
    /// Scalar multiply-accumulates performed across all groups.
    pub macs: u64,
    /// Sum of every group's final accumulator, when the backend reads it back.
    pub checksum: Option<f64>,
    /// Wall-clock time of the launch including the final join.
    pub elapsed: Duration,
    /// Whether the guarded store ran. Always false for a correct kernel.
    pub guard_fired: bool,
}

impl LaunchReport {
    /// Tera-operations per second, counting a multiply-accumulate as two.
    pub fn tops(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        2.0 * self.macs as f64 / secs / 1e12
    }
}

/// Total multiply-accumulates of a launch.
pub(crate) fn total_macs(cfg: &LaunchConfig, macs_per_invocation: u64) -> u64 {
    macs_per_invocation
        .saturating_mul(cfg.groups as u64)
        .saturating_mul(cfg.repetitions as u64)
}

/// Lane the host runs group `group` on.
///
/// Groups rotate through the lanes so every lane index reaches the guard.
pub(crate) fn lane_for(group: usize, group_size: usize) -> LaneId {
    LaneId::new((group % group_size.max(1)) as u32, group_size).unwrap_or(LaneId::LEADER)
}

/// Run `groups` independent groups and sum their checksums.
///
/// Each group owns its tiles; the only synchronisation is the final join.
#[cfg(feature = "parallel")]
pub(crate) fn run_groups<F>(groups: usize, group: F) -> f64
where
    F: Fn(usize) -> f64 + Sync + Send,
{
    use rayon::prelude::*;

    (0..groups).into_par_iter().map(group).sum()
}

/// Run `groups` independent groups and sum their checksums.
#[cfg(not(feature = "parallel"))]
pub(crate) fn run_groups<F>(groups: usize, group: F) -> f64
where
    F: Fn(usize) -> f64,
{
    (0..groups).map(group).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        assert!(LaunchConfig::SMOKE.validate().is_ok());
        assert!(LaunchConfig::DEFAULT.validate().is_ok());
        assert_eq!(LaunchConfig::default(), LaunchConfig::DEFAULT);
    }

    #[test]
    fn test_zero_groups_rejected() {
        assert_eq!(
            LaunchConfig::new(0, 4).validate(),
            Err(TopsError::InvalidLaunch("groups must be non-zero"))
        );
        assert!(LaunchConfig::new(3, 0).validate().is_ok());
    }

    #[test]
    fn test_total_macs() {
        assert_eq!(total_macs(&LaunchConfig::new(2, 3), 256), 1536);
        assert_eq!(total_macs(&LaunchConfig::new(usize::MAX, 2), u64::MAX), u64::MAX);
    }

    #[test]
    fn test_lane_rotation() {
        assert_eq!(lane_for(0, 32).index(), 0);
        assert_eq!(lane_for(33, 32).index(), 1);
        assert_eq!(lane_for(127, 128).index(), 127);
    }

    #[test]
    fn test_run_groups_sums() {
        let total = run_groups(10, |g| g as f64);
        assert_eq!(total, 45.0);
    }

    /// Without `parallel` the groups run in order on the calling thread.
    #[cfg(not(feature = "parallel"))]
    #[test]
    fn test_run_groups_sequential_order() {
        use std::cell::RefCell;

        let caller = std::thread::current().id();
        let visited = RefCell::new(Vec::new());
        let total = run_groups(5, |g| {
            assert_eq!(std::thread::current().id(), caller);
            visited.borrow_mut().push(g);
            1.0
        });
        assert_eq!(total, 5.0);
        assert_eq!(visited.into_inner(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_tops() {
        let report = LaunchReport {
            variant: "x".to_string(),
            groups: 1,
            repetitions: 1,
            group_size: 32,
            macs: 500_000_000_000,
            checksum: None,
            elapsed: Duration::from_secs(1),
            guard_fired: false,
        };
        assert_eq!(report.tops(), 1.0);

        let instant = LaunchReport {
            elapsed: Duration::ZERO,
            ..report
        };
        assert_eq!(instant.tops(), 0.0);
    }
}
