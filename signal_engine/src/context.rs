//! Daily context: prior close and trend.

use std::sync::Arc;

use market_data_ingestor::{
    models::{asset::Symbol, bar::{Bar, BarSeries}},
    providers::DataProvider,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ContextConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Bullish,
    Bearish,
    Unknown,
}

/// Where [`Context::prior_close`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorCloseSource {
    DailyHistory,
    /// Daily history was unavailable; the session's first open stands in.
    FirstIntradayOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub trend: Trend,
    pub prior_close: f64,
    pub prior_close_source: PriorCloseSource,
}

impl Context {
    /// Context built only from the intraday series.
    pub fn from_intraday(intraday: &BarSeries) -> Self {
        Self {
            trend: Trend::Unknown,
            prior_close: intraday.first().map_or(0.0, |b| b.open),
            prior_close_source: PriorCloseSource::FirstIntradayOpen,
        }
    }

    /// Combines daily bars with the intraday fallback.
    pub fn from_daily(daily: &[Bar], intraday: &BarSeries, trend_window: usize) -> Self {
        let fallback = Self::from_intraday(intraday);
        let trend = classify_trend(daily, trend_window);

        let prior = daily
            .len()
            .checked_sub(2)
            .map(|i| daily[i].close)
            .filter(|c| c.is_finite() && *c > 0.0);

        match prior {
            Some(prior_close) => Self {
                trend,
                prior_close,
                prior_close_source: PriorCloseSource::DailyHistory,
            },
            None => Self { trend, ..fallback },
        }
    }

    /// `(price - prior_close) / prior_close`, or 0 with no usable prior close.
    pub fn pct_change(&self, price: f64) -> f64 {
        if self.prior_close > 0.0 {
            (price - self.prior_close) / self.prior_close
        } else {
            0.0
        }
    }
}

/// Last close against the trailing `window`-session mean, which includes it.
pub fn classify_trend(daily: &[Bar], window: usize) -> Trend {
    if window == 0 || daily.len() < window {
        return Trend::Unknown;
    }
    let tail = &daily[daily.len() - window..];
    let sma = tail.iter().map(|b| b.close).sum::<f64>() / window as f64;
    match tail.last() {
        Some(last) if last.close > sma => Trend::Bullish,
        Some(_) => Trend::Bearish,
        None => Trend::Unknown,
    }
}

/// Fetches daily history from the public provider and derives a [`Context`].
pub struct ContextClassifier {
    provider: Arc<dyn DataProvider>,
    config: ContextConfig,
}

impl ContextClassifier {
    pub fn new(provider: Arc<dyn DataProvider>, config: ContextConfig) -> Self {
        Self { provider, config }
    }

    /// Never fails: a history fetch error degrades to the intraday fallback.
    pub async fn classify(&self, symbol: &Symbol, intraday: &BarSeries) -> Context {
        match self
            .provider
            .fetch_daily_history(symbol, self.config.daily_lookback_days)
            .await
        {
            Ok(daily) => {
                let ctx = Context::from_daily(&daily.bars, intraday, self.config.trend_window);
                debug!(
                    %symbol,
                    sessions = daily.len(),
                    trend = ?ctx.trend,
                    prior_close = ctx.prior_close,
                    "context classified"
                );
                ctx
            }
            Err(e) => {
                warn!(%symbol, error = %e, "daily history unavailable; using first intraday open");
                Context::from_intraday(intraday)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use market_data_ingestor::models::timeframe::Timeframe;

    fn daily(closes: &[f64]) -> Vec<Bar> {
        let t0 = Utc.with_ymd_and_hms(2025, 2, 3, 0, 0, 0).unwrap();
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar::new(t0 + Duration::days(i as i64), c, c, c, c, 1000.0))
            .collect()
    }

    fn intraday(first_open: f64) -> BarSeries {
        let t = Utc.with_ymd_and_hms(2025, 3, 3, 1, 0, 0).unwrap();
        BarSeries::new(
            "2330".parse().unwrap(),
            Timeframe::ONE_MINUTE,
            vec![Bar::new(t, first_open, first_open + 1.0, first_open - 1.0, first_open, 10.0)],
        )
    }

    #[test]
    fn prior_close_is_second_to_last_session() {
        let ctx = Context::from_daily(&daily(&[90.0, 95.0, 100.0, 98.0, 104.0]), &intraday(1.0), 5);
        assert_eq!(ctx.prior_close, 98.0);
        assert_eq!(ctx.prior_close_source, PriorCloseSource::DailyHistory);
        // mean 97.4
        assert_eq!(ctx.trend, Trend::Bullish);
    }

    #[test]
    fn bearish_when_last_close_not_above_mean() {
        assert_eq!(classify_trend(&daily(&[100.0, 100.0, 100.0, 100.0, 100.0]), 5), Trend::Bearish);
        assert_eq!(classify_trend(&daily(&[110.0, 108.0, 106.0, 104.0, 90.0]), 5), Trend::Bearish);
    }

    #[test]
    fn short_history_is_unknown_trend() {
        let ctx = Context::from_daily(&daily(&[100.0, 101.0, 102.0]), &intraday(1.0), 5);
        assert_eq!(ctx.trend, Trend::Unknown);
        assert_eq!(ctx.prior_close, 101.0);
    }

    #[test]
    fn single_session_falls_back_to_first_open() {
        let ctx = Context::from_daily(&daily(&[100.0]), &intraday(97.5), 5);
        assert_eq!(ctx.prior_close, 97.5);
        assert_eq!(ctx.prior_close_source, PriorCloseSource::FirstIntradayOpen);
    }

    #[test]
    fn pct_change_guards_zero_prior() {
        let ctx = Context {
            trend: Trend::Unknown,
            prior_close: 0.0,
            prior_close_source: PriorCloseSource::FirstIntradayOpen,
        };
        assert_eq!(ctx.pct_change(50.0), 0.0);

        let ctx = Context { prior_close: 100.0, ..ctx };
        assert!((ctx.pct_change(96.0) + 0.04).abs() < 1e-12);
    }
}
