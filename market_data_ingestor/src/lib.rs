//! Market data access for Taiwan-listed equities.
//!
//! - [`models`]: vendor-agnostic bars, series, timeframes and symbols
//! - [`providers`]: the [`DataProvider`](providers::DataProvider) trait plus
//!   the Fugle (real-time) and Yahoo chart (delayed) adapters
//! - [`tz`]: venue time-zone helpers

pub mod models;
pub mod providers;
pub mod tz;
