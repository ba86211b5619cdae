//! Batch scan of the fixed symbol universe for liquid, trending, volatile names.
//!
//! Sequential by design: the public provider throttles aggressively, so each
//! request is followed by a short randomised pause and a rate-limited
//! request is retried with exponential backoff.

use std::{sync::Arc, time::Duration};

use backon::{ExponentialBuilder, Retryable};
use market_data_ingestor::{
    models::{asset::Symbol, bar::{Bar, BarSeries}},
    providers::{DataProvider, ProviderError},
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Large-cap and sector-leader TWSE codes scanned by default.
pub const TW_MARKET_POOL: &[&str] = &[
    "2330", "2317", "2454", "2382", "2303", "2881", "2891", "2308", "3711", "3037", //
    "3035", "3017", "2368", "3231", "3443", "3661", "6669", "2376", "2356", "2301", //
    "2603", "2609", "2615", "2618", "2610", "2637", //
    "1513", "1519", "1503", "1504", "1609", //
    "3044", "2383", "6274", "6213", "2421", "3013", //
    "8046", "8069", "3533", "3529", "5269", "3653", //
    "2409", "3481", "6116", "2481", "3008", //
    "2363", "2344", "2449", "2313", "2324", //
    "3034", "4961", "4919", "2458", "3583", //
    "2353", "2323", "2352", "3260", "6239",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenerConfig {
    /// How many symbols to return.
    pub limit: usize,
    /// Calendar days of daily history per symbol.
    pub history_days: u32,
    pub min_sessions: usize,
    pub ma_window: usize,
    pub volatility_window: usize,
    /// Mean daily range, in percent of close.
    pub min_volatility_pct: f64,
    pub delay_ms_min: u64,
    pub delay_ms_max: u64,
    pub max_retries: usize,
    pub backoff_min_ms: u64,
    pub universe: Vec<String>,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            limit: 15,
            history_days: 92,
            min_sessions: 20,
            ma_window: 20,
            volatility_window: 10,
            min_volatility_pct: 2.0,
            delay_ms_min: 100,
            delay_ms_max: 250,
            max_retries: 3,
            backoff_min_ms: 2_000,
            universe: TW_MARKET_POOL.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScreenerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.ma_window == 0 || self.volatility_window == 0 {
            return Err("ma_window and volatility_window must be > 0".into());
        }
        if self.delay_ms_min > self.delay_ms_max {
            return Err(format!(
                "delay_ms_min ({}) exceeds delay_ms_max ({})",
                self.delay_ms_min, self.delay_ms_max
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenedSymbol {
    pub symbol: Symbol,
    pub volatility_pct: f64,
    pub last_close: f64,
    pub moving_average: f64,
}

/// Why a symbol was or was not kept.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    Kept(ScreenedSymbol),
    TooFewSessions(usize),
    BelowAverage { last_close: f64, moving_average: f64 },
    TooQuiet(f64),
}

/// Applies the trend and volatility filters to one symbol's daily bars.
pub fn evaluate(symbol: &Symbol, daily: &[Bar], config: &ScreenerConfig) -> Verdict {
    let needed = config.min_sessions.max(config.ma_window).max(config.volatility_window);
    let Some(last) = daily.last().filter(|_| daily.len() >= needed) else {
        return Verdict::TooFewSessions(daily.len());
    };

    let last_close = last.close;
    let moving_average = mean(daily[daily.len() - config.ma_window..].iter().map(|b| b.close));
    if last_close < moving_average {
        return Verdict::BelowAverage {
            last_close,
            moving_average,
        };
    }

    let volatility_pct = mean(
        daily[daily.len() - config.volatility_window..]
            .iter()
            .filter(|b| b.close > 0.0)
            .map(|b| (b.high - b.low) / b.close * 100.0),
    );
    if !(volatility_pct >= config.min_volatility_pct) {
        return Verdict::TooQuiet(volatility_pct);
    }

    Verdict::Kept(ScreenedSymbol {
        symbol: symbol.clone(),
        volatility_pct,
        last_close,
        moving_average,
    })
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if n == 0 { f64::NAN } else { sum / n as f64 }
}

pub struct Screener {
    provider: Arc<dyn DataProvider>,
    config: ScreenerConfig,
}

impl Screener {
    pub fn new(provider: Arc<dyn DataProvider>, config: ScreenerConfig) -> Self {
        Self { provider, config }
    }

    /// Scans the universe, most volatile first, at most `limit` entries.
    ///
    /// Per-symbol failures are logged and skipped.
    pub async fn screen(&self) -> Vec<ScreenedSymbol> {
        let mut kept = Vec::new();

        for (i, raw) in self.config.universe.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.jitter()).await;
            }

            let symbol: Symbol = match raw.parse() {
                Ok(s) => s,
                Err(e) => {
                    warn!(symbol = %raw, error = %e, "skipping unparseable universe entry");
                    continue;
                }
            };

            let history = match self.fetch_history(&symbol).await {
                Ok(h) => h,
                Err(e) => {
                    warn!(%symbol, error = %e, "skipping symbol");
                    continue;
                }
            };

            match evaluate(&symbol, &history.bars, &self.config) {
                Verdict::Kept(hit) => {
                    debug!(%symbol, volatility = hit.volatility_pct, "kept");
                    kept.push(hit);
                }
                other => debug!(%symbol, verdict = ?other, "filtered out"),
            }
        }

        kept.sort_by(|a, b| b.volatility_pct.total_cmp(&a.volatility_pct));
        kept.truncate(self.config.limit);
        info!(scanned = self.config.universe.len(), kept = kept.len(), "screen complete");
        kept
    }

    async fn fetch_history(&self, symbol: &Symbol) -> Result<BarSeries, ProviderError> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(self.config.backoff_min_ms))
            .with_max_times(self.config.max_retries);

        let provider = &self.provider;
        let days = self.config.history_days;

        (move || async move { provider.fetch_daily_history(symbol, days).await })
        .retry(backoff)
        .sleep(tokio::time::sleep)
        .when(ProviderError::is_rate_limited)
        .notify(|e: &ProviderError, dur: Duration| {
            warn!(%symbol, error = %e, retry_in = ?dur, "rate limited; backing off");
        })
        .await
    }

    fn jitter(&self) -> Duration {
        let lo = self.config.delay_ms_min;
        let hi = self.config.delay_ms_max.max(lo);
        let ms = rand::thread_rng().gen_range(lo..=hi);
        Duration::from_millis(ms)
    }
}
