//! Canonical in-memory representation of a time-series bar (OHLCV).
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! implementation, regardless of which vendor produced it. Timestamps are stored in UTC;
//! use [`crate::tz`] to view them on the venue clock.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::{asset::Symbol, timeframe::Timeframe};

/// A single time-series bar (OHLCV) for a given timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Start of the bar interval (UTC).
    pub timestamp: DateTime<Utc>,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Volume traded during the bar interval. Never negative.
    pub volume: f64,
}

impl Bar {
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// A zero-volume bar with all four prices equal to `price`.
    ///
    /// Used to pin a lagging bar feed to a fresher single quote.
    pub fn flat(timestamp: DateTime<Utc>, price: f64) -> Self {
        Self::new(timestamp, price, price, price, price, 0.0)
    }

    /// `close > open`.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// The bar timestamp on the given venue clock.
    pub fn local_timestamp(&self, tz: Tz) -> DateTime<Tz> {
        self.timestamp.with_timezone(&tz)
    }
}

/// Represents a complete set of time-series data for a single symbol.
///
/// This struct groups a vector of [`Bar`]s with their corresponding symbol
/// and [`Timeframe`], making the data set self-describing. Bars are kept in
/// non-decreasing timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    /// The symbol this data represents (e.g. `2330.TW`).
    pub symbol: Symbol,
    /// The time interval for each bar in the series.
    pub timeframe: Timeframe,
    /// The collection of OHLCV bars.
    pub bars: Vec<Bar>,
}

impl BarSeries {
    /// Builds a series, sorting the bars by timestamp.
    pub fn new(symbol: Symbol, timeframe: Timeframe, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            symbol,
            timeframe,
            bars,
        }
    }

    pub fn empty(symbol: Symbol, timeframe: Timeframe) -> Self {
        Self {
            symbol,
            timeframe,
            bars: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn first(&self) -> Option<&Bar> {
        self.bars.first()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    /// Returns a new series with `bar` appended at the end.
    ///
    /// The caller guarantees `bar` is not older than the current last bar.
    pub fn with_appended(mut self, bar: Bar) -> Self {
        debug_assert!(self.last().is_none_or(|last| last.timestamp <= bar.timestamp));
        self.bars.push(bar);
        self
    }
}
