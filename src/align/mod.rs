//! Time-series alignment core.
//!
//! Stages, in pipeline order:
//! - `normalize`: drop UTC offsets so every key compares as a naive wall-clock time
//! - `resample`: daily -> monthly mean, keyed at month end
//! - `merge`: outer join on exact date equality
//! - `complete`: drop rows with any missing field
//! - `diagnose`: explain how many rows survived and why
//!
//! Everything here is pure: no I/O, no logging beyond `tracing` events.

pub mod complete;
pub mod diagnose;
pub mod merge;
pub mod normalize;
pub mod resample;

pub use complete::*;
pub use diagnose::*;
pub use merge::*;
pub use normalize::*;
pub use resample::*;
