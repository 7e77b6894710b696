//! Capability-tiered tile primitives and the repeated multiply-accumulate runner.
//!
//! A kernel is a fixed-shape matrix-multiply-accumulate primitive, a
//! precision pairing and a hardware tier, all chosen as type parameters.
//! The runner invokes the primitive a fixed number of times per execution
//! group, feeding the accumulator back in, and keeps the work alive with a
//! guarded store that can never execute.
//!
//! # Features
//!
//! - Legality resolved at build time: illegal tier/precision/shape
//!   combinations do not compile
//! - Runtime capability check at a single selection point ([`select`])
//! - Dense and bit-packed (XOR/AND popcount) primitives
//! - Data-parallel execution groups with the `parallel` feature
//!
//! # Example
//!
//! ```
//! use tops_core::{select, Capability, EmulatedMma, HostEmulator, LaunchConfig, MmaKernel, Sink,
//!     Sm80, TileInit};
//! use tops_types::{Tf32, F32};
//!
//! let device = HostEmulator::new(Capability::Ampere);
//! let launcher = select::<Sm80>(&device)?;
//!
//! let kernel = MmaKernel::<Sm80, Tf32, F32, 8, 8, 4>::with_init(TileInit::new(1.0, 0.5));
//! let sink = Sink::new();
//! let report = launcher.launch(&kernel, &EmulatedMma, &LaunchConfig::new(1, 128), &sink)?;
//!
//! assert_eq!(report.checksum, Some(64.0 * 512.5));
//! assert!(!report.guard_fired);
//! # Ok::<(), tops_core::TopsError>(())
//! ```

mod binary;
mod device;
mod error;
mod launch;
mod legal;
mod primitive;
mod runner;
mod shape;
mod tier;
mod tile;

pub use binary::{BinaryPrimitive, EmulatedBmma};
pub use device::{select, Device, HostEmulator, Launcher};
pub use error::{Result, TopsError};
pub use launch::{LaunchConfig, LaunchReport};
pub use legal::{Family, Supports, SupportsBinary};
pub use primitive::{EmulatedMma, Primitive};
pub use runner::{BitTileInit, BmmaKernel, LaneId, MmaKernel, Sink, TileInit, UNREACHABLE_LANE};
pub use shape::*;
pub use tier::{Capability, Sm70, Sm75, Sm80, Sm89, Sm90, Tier};
pub use tile::{
    Accumulator, BitAccumulator, BitOperandA, BitOperandB, OperandA, OperandB, Tile,
};
