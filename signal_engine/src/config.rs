//! Engine configuration.
//!
//! Every section defaults, so an empty file is a valid config:
//!
//! ```toml
//! [strategy]
//! dip_threshold = -0.04
//!
//! [sources]
//! timeout_secs = 5
//!
//! [cache]
//! ttl_secs = 10
//! ```

use std::{num::NonZeroU32, path::Path, sync::Arc, time::Duration};

use market_data_ingestor::providers::{
    ProviderInitError, fugle_rest::{self, FugleProvider}, yahoo_chart::{self, YahooChartProvider},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use shared_utils::config::{ConfigError, load_toml_path, load_toml_str};
use thiserror::Error;

use crate::{screener::ScreenerConfig, sentiment::SentimentScore, strategy::StrategyParams};

#[derive(Debug, Error)]
pub enum EngineConfigError {
    #[error(transparent)]
    Load(#[from] ConfigError),

    #[error("invalid [{section}] config: {message}")]
    Invalid {
        section: &'static str,
        message: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub strategy: StrategyParams,
    pub sources: SourcesConfig,
    pub context: ContextConfig,
    pub cache: CacheConfig,
    pub analysis: AnalysisConfig,
    pub screener: ScreenerConfig,
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, EngineConfigError> {
        let config: Self = load_toml_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EngineConfigError> {
        let config: Self = load_toml_path(path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineConfigError> {
        let invalid = |section, message: String| EngineConfigError::Invalid { section, message };

        self.strategy.validate().map_err(|m| invalid("strategy", m))?;
        if self.sources.timeout_secs == 0 {
            return Err(invalid("sources", "timeout_secs must be > 0".into()));
        }
        if self.sources.public_requests_per_second == 0 {
            return Err(invalid("sources", "public_requests_per_second must be > 0".into()));
        }
        if self.context.trend_window == 0 {
            return Err(invalid("context", "trend_window must be > 0".into()));
        }
        self.screener.validate().map_err(|m| invalid("screener", m))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourcesConfig {
    pub fugle_base_url: String,
    pub yahoo_base_url: String,
    /// Per-request timeout for both providers.
    pub timeout_secs: u64,
    /// Public bars older than this get a live quote stitched on.
    pub stale_after_secs: u64,
    pub public_requests_per_second: u32,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            fugle_base_url: fugle_rest::provider::BASE_URL.to_string(),
            yahoo_base_url: yahoo_chart::provider::BASE_URL.to_string(),
            timeout_secs: 10,
            stale_after_secs: 120,
            public_requests_per_second: 4,
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }

    pub fn public_provider(&self) -> Result<Arc<YahooChartProvider>, ProviderInitError> {
        let rps = NonZeroU32::new(self.public_requests_per_second)
            .unwrap_or(yahoo_chart::provider::DEFAULT_REQUESTS_PER_SECOND);
        YahooChartProvider::with_options(&self.yahoo_base_url, self.timeout(), rps).map(Arc::new)
    }

    pub fn premium_provider(
        &self,
        api_key: SecretString,
    ) -> Result<FugleProvider, ProviderInitError> {
        FugleProvider::with_options(api_key, &self.fugle_base_url, self.timeout())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextConfig {
    /// Calendar days of daily history to request.
    pub daily_lookback_days: u32,
    /// Sessions in the trend moving average.
    pub trend_window: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            daily_lookback_days: 30,
            trend_window: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 5 }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Applied when a request carries no sentiment score.
    pub default_sentiment: SentimentScore,
}
