//! Yahoo Finance chart adapter (delayed intraday bars, quotes and daily history).

pub mod provider;
pub mod response;

pub use provider::YahooChartProvider;
