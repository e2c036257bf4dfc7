//! `macro-align` library crate.
//!
//! The binary (`malign`) is a thin wrapper around this library so that:
//!
//! - the alignment core is testable without spawning processes or touching the network
//! - adapters (Yahoo, FRED, CSV) stay swappable behind plain `TimeSeries` values
//! - code stays easy to navigate as the project grows

pub mod align;
pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod forecast;
pub mod io;
pub mod report;
