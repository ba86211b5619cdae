//! VWAP-deviation signal engine for Taiwan equities.
//!
//! The pipeline, leaf first:
//!
//! 1. [`coordinator`] pulls one-minute bars from the real-time provider, falling
//!    back to the public one and stitching a live quote onto stale data.
//! 2. [`resample`] folds them into the requested resolution.
//! 3. [`context`] derives the prior close and daily trend.
//! 4. [`vwap`] computes the cumulative session VWAP.
//! 5. [`engine`] picks a [`strategy`] from the sentiment score and scans for
//!    entry and exit.
//!
//! [`analyzer`] wires the stages together and [`cache`] memoises results for a
//! short time. [`screener`] is the batch scan over the fixed symbol universe.

pub mod analyzer;
pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod engine;
pub mod resample;
pub mod screener;
pub mod sentiment;
pub mod strategy;
pub mod vwap;

pub use analyzer::{AnalysisError, AnalysisRequest, Analyzer, SignalReport};
pub use config::EngineConfig;
pub use engine::{Fill, Phase, SignalEngine, SignalError, SignalState};
pub use strategy::{Strategy, StrategyParams};
