//! Input/output helpers.
//!
//! - CSV ingest of source series (`ingest`)
//! - CSV / JSON exports of series and merged tables (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
