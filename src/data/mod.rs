//! Source adapters.
//!
//! - `yahoo`: daily stock bars (timezone-aware)
//! - `fred`: monthly FRED series such as `UNRATE` (naive, first of month)
//! - `synthetic`: placeholder macro panel (naive, month end)

pub mod fred;
pub mod synthetic;
pub mod yahoo;

pub use fred::{FIELD_UNEMPLOYMENT, FredClient, SERIES_UNRATE};
pub use synthetic::macro_indicators;
pub use yahoo::{STOCK_FIELDS, YahooClient};
