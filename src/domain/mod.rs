//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the date-keyed `TimeSeries` and its `Record` rows
//! - the `TimeKey` trait bridging timezone-aware and naive keys
//! - the run configuration (`MergeConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
