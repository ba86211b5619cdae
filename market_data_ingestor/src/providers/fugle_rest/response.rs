use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;

use crate::models::bar::Bar;

/// One element of the `data` array of the intraday candles endpoint.
#[derive(Deserialize, Debug)]
pub struct FugleCandle {
    /// Bar start with the venue offset, e.g. `2025-03-03T09:00:00.000+08:00`.
    pub date: DateTime<FixedOffset>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    /// Fugle's own running average price; unused, VWAP is recomputed downstream.
    #[serde(default)]
    pub average: Option<f64>,
}

impl From<FugleCandle> for Bar {
    fn from(c: FugleCandle) -> Self {
        Bar::new(
            c.date.with_timezone(&Utc),
            c.open,
            c.high,
            c.low,
            c.close,
            c.volume,
        )
    }
}
