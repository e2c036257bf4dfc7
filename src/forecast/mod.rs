//! Forecasting on the merged monthly table.
//!
//! - `ols`: least-squares solver (nalgebra SVD)
//! - `arima`: ARIMA(p, d, 0) fitted by conditional least squares

pub mod arima;
pub mod ols;

pub use arima::*;
pub use ols::*;
