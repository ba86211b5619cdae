//! Provider abstraction for market data sources.
//!
//! This module defines the [`DataProvider`] trait, which serves as a unified interface
//! for fetching bar data and quotes from any market data vendor.
//!
//! Each concrete provider implementation should implement [`DataProvider`] to handle
//! vendor-specific API logic and validation. Adapters never retry; retry policy belongs
//! to the caller.
//!
//! The trait is designed for async usage and supports dynamic dispatch (`dyn DataProvider`)
//! for runtime selection of providers.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use market_data_ingestor::models::{asset::Symbol, bar::BarSeries, timeframe::Timeframe};
//! use market_data_ingestor::providers::{DataProvider, ProviderError, ProviderId};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     fn id(&self) -> ProviderId {
//!         ProviderId::Yahoo
//!     }
//!
//!     async fn fetch_intraday(&self, symbol: &Symbol) -> Result<BarSeries, ProviderError> {
//!         Ok(BarSeries::empty(symbol.clone(), Timeframe::ONE_MINUTE))
//!     }
//! }
//! ```

pub mod fugle_rest;
pub mod yahoo_chart;

use std::{fmt, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{asset::Symbol, bar::BarSeries};

/// Default per-request timeout for every HTTP adapter.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Which upstream produced a piece of data (serde snake_case).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderId {
    /// Fugle market data API (real-time, needs an API key).
    Fugle,
    /// Yahoo Finance chart API (delayed, public).
    Yahoo,
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderId::Fugle => f.write_str("fugle"),
            ProviderId::Yahoo => f.write_str("yahoo"),
        }
    }
}

/// Trait for fetching bars and quotes from a market data provider.
#[async_trait]
pub trait DataProvider: Send + Sync {
    fn id(&self) -> ProviderId;

    /// Fetches today's one-minute bars for `symbol`.
    async fn fetch_intraday(&self, symbol: &Symbol) -> Result<BarSeries, ProviderError>;

    /// Fetches the latest traded price, if the provider offers one.
    async fn fetch_quote(&self, _symbol: &Symbol) -> Result<Option<f64>, ProviderError> {
        Ok(None)
    }

    /// Fetches daily bars covering at least the last `lookback_days` calendar days.
    async fn fetch_daily_history(
        &self,
        _symbol: &Symbol,
        _lookback_days: u32,
    ) -> Result<BarSeries, ProviderError> {
        UnsupportedSnafu {
            provider: self.id(),
            operation: "daily history",
        }
        .fail()
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// API key contains invalid characters.
    #[snafu(display("Invalid API key format: {source}"))]
    InvalidApiKey {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// API key is blank after trimming.
    #[snafu(display("API key is empty"))]
    EmptyApiKey,
}

/// Errors that can occur within a `DataProvider` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider answered with no payload at all.
    #[snafu(display("Empty response for {symbol} (the code may be wrong)"))]
    EmptyResponse { symbol: String },

    /// The payload is missing the expected data key or cannot be decoded.
    #[snafu(display("Malformed response: {message}"))]
    MalformedResponse { message: String },

    /// The provider's API returned a specific error message (e.g., invalid API key).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload is well formed but holds no bars, e.g. before the first trade of the day.
    #[snafu(display("No trades yet today for {symbol}"))]
    NoTradesYet { symbol: String },

    /// HTTP 429 from the provider.
    #[snafu(display("Rate limited by {provider}"))]
    RateLimited { provider: ProviderId },

    /// The provider does not implement the requested operation.
    #[snafu(display("{provider} does not support {operation}"))]
    Unsupported {
        provider: ProviderId,
        operation: &'static str,
    },
}

impl ProviderError {
    /// `true` when the provider answered but had nothing to give.
    ///
    /// The fallback coordinator treats these as "empty" rather than "failed".
    pub fn is_no_data(&self) -> bool {
        matches!(
            self,
            ProviderError::EmptyResponse { .. } | ProviderError::NoTradesYet { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        match self {
            ProviderError::RateLimited { .. } => true,
            ProviderError::Reqwest { source, .. } => {
                source.status() == Some(reqwest::StatusCode::TOO_MANY_REQUESTS)
            }
            _ => false,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ProviderError::Reqwest { source, .. } if source.is_timeout())
    }
}
