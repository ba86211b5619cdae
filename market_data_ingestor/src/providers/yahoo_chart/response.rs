use chrono::{TimeZone, Utc};
use serde::Deserialize;

use crate::models::bar::Bar;

#[derive(Deserialize, Debug)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Deserialize, Debug)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Deserialize, Debug)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Bar start times, Unix seconds. Absent when the range has no trades.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    #[serde(default)]
    pub regular_market_price: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteColumns>,
}

/// Column-oriented OHLCV; any cell may be `null`.
#[derive(Deserialize, Debug, Default)]
pub struct QuoteColumns {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

impl ChartResult {
    /// Zips the columns into bars.
    ///
    /// Rows with any missing price are dropped (Yahoo emits them for minutes
    /// without trades); a missing volume counts as zero.
    pub fn to_bars(&self) -> Vec<Bar> {
        let Some(q) = self.indicators.quote.first() else {
            return Vec::new();
        };
        let cell = |col: &[Option<f64>], i: usize| col.get(i).copied().flatten();

        self.timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &secs)| {
                let ts = Utc.timestamp_opt(secs, 0).single()?;
                let open = cell(&q.open, i)?;
                let high = cell(&q.high, i)?;
                let low = cell(&q.low, i)?;
                let close = cell(&q.close, i)?;
                let volume = cell(&q.volume, i).unwrap_or(0.0).max(0.0);
                Some(Bar::new(ts, open, high, low, close, volume))
            })
            .collect()
    }
}
