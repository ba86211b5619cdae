use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::{Client, StatusCode};
use snafu::{ResultExt, ensure};
use tracing::debug;

use crate::{
    models::{asset::Symbol, bar::BarSeries, timeframe::Timeframe},
    providers::{
        ApiSnafu, ClientBuildSnafu, DEFAULT_TIMEOUT, DataProvider, EmptyResponseSnafu,
        MalformedResponseSnafu, NoTradesYetSnafu, ProviderError, ProviderId, ProviderInitError,
        RateLimitedSnafu, ReqwestSnafu,
        yahoo_chart::response::{ChartResponse, ChartResult},
    },
};

pub const BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo rejects requests without a browser-like user agent.
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Default request pacing for the public endpoint.
pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = nonzero!(4u32);

pub struct YahooChartProvider {
    client: Client,
    base_url: String,
    limiter: DefaultDirectRateLimiter,
}

impl YahooChartProvider {
    pub fn new() -> Result<Self, ProviderInitError> {
        Self::with_options(BASE_URL, DEFAULT_TIMEOUT, DEFAULT_REQUESTS_PER_SECOND)
    }

    /// Creates a provider with an explicit base URL, timeout and request pacing.
    pub fn with_options(
        base_url: impl Into<String>,
        timeout: Duration,
        requests_per_second: NonZeroU32,
    ) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: RateLimiter::direct(Quota::per_second(requests_per_second)),
        })
    }

    async fn fetch_chart(
        &self,
        symbol: &Symbol,
        range: &str,
        interval: &str,
    ) -> Result<ChartResult, ProviderError> {
        self.limiter.until_ready().await;

        let url = format!("{}/{}", self.base_url, symbol.ticker());
        debug!(%symbol, range, interval, "fetching yahoo chart");

        let response = self
            .client
            .get(&url)
            .query(&[("range", range), ("interval", interval)])
            .send()
            .await
            .context(ReqwestSnafu)?;
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return RateLimitedSnafu {
                provider: ProviderId::Yahoo,
            }
            .fail();
        }
        let body = response.text().await.context(ReqwestSnafu)?;
        parse_chart(symbol, status, &body)
    }
}

/// Decodes a chart payload into its single result.
pub fn parse_chart(
    symbol: &Symbol,
    status: StatusCode,
    body: &str,
) -> Result<ChartResult, ProviderError> {
    ensure!(
        !body.trim().is_empty(),
        EmptyResponseSnafu {
            symbol: symbol.to_string()
        }
    );

    let decoded: Result<ChartResponse, _> = serde_json::from_str(body);
    let chart = match decoded {
        Ok(resp) => resp.chart,
        Err(_) if !status.is_success() => {
            return ApiSnafu {
                message: status.to_string(),
            }
            .fail();
        }
        Err(e) => {
            return MalformedResponseSnafu {
                message: format!("invalid chart payload: {e}"),
            }
            .fail();
        }
    };

    if let Some(err) = chart.error {
        let message = match err.description {
            Some(d) => format!("{}: {d}", err.code),
            None => err.code,
        };
        return ApiSnafu { message }.fail();
    }
    if !status.is_success() {
        return ApiSnafu {
            message: status.to_string(),
        }
        .fail();
    }

    chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| {
            EmptyResponseSnafu {
                symbol: symbol.to_string(),
            }
            .build()
        })
}

/// Smallest chart range covering `days` calendar days.
pub fn range_for_days(days: u32) -> &'static str {
    match days {
        0..=5 => "5d",
        6..=31 => "1mo",
        32..=92 => "3mo",
        93..=183 => "6mo",
        184..=366 => "1y",
        _ => "2y",
    }
}

#[async_trait]
impl DataProvider for YahooChartProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Yahoo
    }

    async fn fetch_intraday(&self, symbol: &Symbol) -> Result<BarSeries, ProviderError> {
        let result = self.fetch_chart(symbol, "1d", "1m").await?;
        let bars = result.to_bars();
        ensure!(
            !bars.is_empty(),
            NoTradesYetSnafu {
                symbol: symbol.to_string()
            }
        );
        Ok(BarSeries::new(symbol.clone(), Timeframe::ONE_MINUTE, bars))
    }

    async fn fetch_quote(&self, symbol: &Symbol) -> Result<Option<f64>, ProviderError> {
        let result = self.fetch_chart(symbol, "1d", "1d").await?;
        Ok(result
            .meta
            .regular_market_price
            .filter(|p| p.is_finite() && *p > 0.0))
    }

    async fn fetch_daily_history(
        &self,
        symbol: &Symbol,
        lookback_days: u32,
    ) -> Result<BarSeries, ProviderError> {
        let result = self
            .fetch_chart(symbol, range_for_days(lookback_days), "1d")
            .await?;
        let bars = result.to_bars();
        ensure!(
            !bars.is_empty(),
            EmptyResponseSnafu {
                symbol: symbol.to_string()
            }
        );
        Ok(BarSeries::new(symbol.clone(), Timeframe::ONE_DAY, bars))
    }
}
