//! Fugle market data REST adapter (real-time intraday candles).

pub mod provider;
pub mod response;

pub use provider::FugleProvider;
