//! Premium-first bar sourcing with public fallback and quote stitching.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use market_data_ingestor::{
    models::{asset::Symbol, bar::{Bar, BarSeries}},
    providers::{DataProvider, ProviderError, ProviderId},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::clock::Clock;

/// Which tier the bars came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    /// Real-time, from the credentialed provider.
    Premium,
    /// Delayed, from the public provider.
    Public,
}

/// Typed result of one adapter call.
#[derive(Debug)]
pub enum FetchOutcome {
    Data(BarSeries),
    /// The provider answered but had no bars.
    Empty { reason: String },
    Failed { reason: String },
}

impl FetchOutcome {
    pub fn from_result(result: Result<BarSeries, ProviderError>) -> Self {
        match result {
            Ok(series) if series.is_empty() => FetchOutcome::Empty {
                reason: format!("no bars for {}", series.symbol),
            },
            Ok(series) => FetchOutcome::Data(series),
            Err(e) if e.is_no_data() => FetchOutcome::Empty {
                reason: e.to_string(),
            },
            Err(e) => FetchOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    fn into_reason(self) -> Option<String> {
        match self {
            FetchOutcome::Data(_) => None,
            FetchOutcome::Empty { reason } | FetchOutcome::Failed { reason } => Some(reason),
        }
    }
}

/// Bars plus where they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourcedBars {
    pub series: BarSeries,
    pub source: SourceTag,
    pub provider: ProviderId,
    /// Why the premium tier was not used, when one was configured.
    pub premium_error: Option<String>,
    /// A synthetic quote bar was appended.
    pub stitched: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoordinatorError {
    #[error("no data available for {symbol}: {public_reason}")]
    NoDataAvailable {
        symbol: String,
        premium_error: Option<String>,
        public_reason: String,
    },
}

pub struct SourceCoordinator {
    public: Arc<dyn DataProvider>,
    clock: Arc<dyn Clock>,
    stale_after: Duration,
}

impl SourceCoordinator {
    pub fn new(
        public: Arc<dyn DataProvider>,
        clock: Arc<dyn Clock>,
        stale_after: Duration,
    ) -> Self {
        Self {
            public,
            clock,
            stale_after,
        }
    }

    /// Fetches today's one-minute bars.
    ///
    /// `premium` is tried first when given. Its failure is recorded on the
    /// result, never returned as an error.
    pub async fn get_bars(
        &self,
        symbol: &Symbol,
        premium: Option<&dyn DataProvider>,
    ) -> Result<SourcedBars, CoordinatorError> {
        let mut premium_error = None;

        if let Some(provider) = premium {
            match FetchOutcome::from_result(provider.fetch_intraday(symbol).await) {
                FetchOutcome::Data(series) => {
                    info!(
                        %symbol,
                        provider = %provider.id(),
                        bars = series.len(),
                        "using real-time bars"
                    );
                    return Ok(SourcedBars {
                        series,
                        source: SourceTag::Premium,
                        provider: provider.id(),
                        premium_error: None,
                        stitched: false,
                    });
                }
                other => {
                    let reason = other.into_reason().unwrap_or_default();
                    warn!(
                        %symbol,
                        provider = %provider.id(),
                        %reason,
                        "real-time source unavailable, falling back"
                    );
                    premium_error = Some(reason);
                }
            }
        }

        let series = match FetchOutcome::from_result(self.public.fetch_intraday(symbol).await) {
            FetchOutcome::Data(series) => series,
            other => {
                let public_reason = other.into_reason().unwrap_or_default();
                warn!(%symbol, %public_reason, "no intraday data from any source");
                return Err(CoordinatorError::NoDataAvailable {
                    symbol: symbol.to_string(),
                    premium_error,
                    public_reason,
                });
            }
        };

        let (series, stitched) = self.stitch(symbol, series).await;
        info!(
            %symbol,
            provider = %self.public.id(),
            bars = series.len(),
            stitched,
            "using delayed bars"
        );

        Ok(SourcedBars {
            series,
            source: SourceTag::Public,
            provider: self.public.id(),
            premium_error,
            stitched,
        })
    }

    async fn stitch(&self, symbol: &Symbol, series: BarSeries) -> (BarSeries, bool) {
        let now = self.clock.now();
        if !is_stale(&series, now, self.stale_after) {
            return (series, false);
        }

        let quote = match self.public.fetch_quote(symbol).await {
            Ok(q) => q,
            Err(e) => {
                debug!(%symbol, error = %e, "quote unavailable; not stitching");
                None
            }
        };
        stitch_quote(series, quote, now, self.stale_after)
    }
}

/// `true` when the last bar is more than `stale_after` older than `now`.
pub fn is_stale(series: &BarSeries, now: DateTime<Utc>, stale_after: Duration) -> bool {
    let Some(last) = series.last() else {
        return false;
    };
    match (now - last.timestamp).to_std() {
        Ok(age) => age > stale_after,
        // last bar is in the future
        Err(_) => false,
    }
}

/// Appends a zero-volume bar at `now` priced at `quote` when the series is stale.
pub fn stitch_quote(
    series: BarSeries,
    quote: Option<f64>,
    now: DateTime<Utc>,
    stale_after: Duration,
) -> (BarSeries, bool) {
    match quote {
        Some(price) if price.is_finite() && price > 0.0 && is_stale(&series, now, stale_after) => {
            (series.with_appended(Bar::flat(now, price)), true)
        }
        _ => (series, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use market_data_ingestor::models::timeframe::Timeframe;

    fn series_ending_at(last: DateTime<Utc>) -> BarSeries {
        BarSeries::new(
            "2330".parse().unwrap(),
            Timeframe::ONE_MINUTE,
            vec![Bar::new(last, 100.0, 101.0, 99.0, 100.5, 10.0)],
        )
    }

    #[test]
    fn stitches_stale_series() {
        let last = Utc.with_ymd_and_hms(2025, 3, 3, 2, 0, 0).unwrap();
        let now = last + chrono::Duration::seconds(121);
        let (out, stitched) = stitch_quote(
            series_ending_at(last),
            Some(103.0),
            now,
            Duration::from_secs(120),
        );

        assert!(stitched);
        assert_eq!(out.len(), 2);
        assert_eq!(out.bars[1], Bar::flat(now, 103.0));
        assert_eq!(out.bars[1].volume, 0.0);
    }

    #[test]
    fn fresh_series_is_left_alone() {
        let last = Utc.with_ymd_and_hms(2025, 3, 3, 2, 0, 0).unwrap();
        let now = last + chrono::Duration::seconds(120);
        let (out, stitched) = stitch_quote(
            series_ending_at(last),
            Some(103.0),
            now,
            Duration::from_secs(120),
        );
        assert!(!stitched);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn missing_or_bad_quote_is_ignored() {
        let last = Utc.with_ymd_and_hms(2025, 3, 3, 2, 0, 0).unwrap();
        let now = last + chrono::Duration::minutes(10);
        for quote in [None, Some(0.0), Some(f64::NAN)] {
            let (out, stitched) =
                stitch_quote(series_ending_at(last), quote, now, Duration::from_secs(120));
            assert!(!stitched);
            assert_eq!(out.len(), 1);
        }
    }

    #[test]
    fn outcome_classification() {
        let sym: Symbol = "2330".parse().unwrap();
        let empty = FetchOutcome::from_result(Ok(BarSeries::empty(
            sym.clone(),
            Timeframe::ONE_MINUTE,
        )));
        assert!(matches!(empty, FetchOutcome::Empty { .. }));

        let no_trades = FetchOutcome::from_result(Err(ProviderError::NoTradesYet {
            symbol: sym.to_string(),
        }));
        assert!(matches!(no_trades, FetchOutcome::Empty { .. }));

        let limited = FetchOutcome::from_result(Err(ProviderError::RateLimited {
            provider: ProviderId::Fugle,
        }));
        match limited {
            FetchOutcome::Failed { reason } => assert_eq!(reason, "Rate limited by fugle"),
            other => panic!("expected Failed, got {other:?}"),
        }
    }
}
