//! End-to-end analysis of one symbol.
//!
//! coordinator -> resample -> context -> VWAP -> signal engine.

use std::sync::Arc;

use market_data_ingestor::{
    models::{asset::Symbol, bar::BarSeries, timeframe::Timeframe},
    providers::{DataProvider, ProviderId},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    cache::{CacheKey, SignalCache},
    clock::Clock,
    config::EngineConfig,
    context::{Context, ContextClassifier},
    coordinator::{CoordinatorError, SourceCoordinator, SourceTag},
    engine::{SignalEngine, SignalError, SignalState},
    resample::{ResampleError, resample},
    sentiment::SentimentScore,
    vwap::{VwapSeries, compute_vwap},
};

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    NoData(#[from] CoordinatorError),

    #[error(transparent)]
    Resample(#[from] ResampleError),

    #[error(transparent)]
    Signal(#[from] SignalError),
}

pub struct AnalysisRequest<'a> {
    pub symbol: Symbol,
    pub timeframe: Timeframe,
    /// Real-time provider, present only when the caller holds a credential.
    pub premium: Option<&'a dyn DataProvider>,
    pub sentiment: Option<SentimentScore>,
}

impl<'a> AnalysisRequest<'a> {
    pub fn new(symbol: Symbol, timeframe: Timeframe) -> Self {
        Self {
            symbol,
            timeframe,
            premium: None,
            sentiment: None,
        }
    }

    pub fn with_premium(mut self, provider: &'a dyn DataProvider) -> Self {
        self.premium = Some(provider);
        self
    }

    pub fn with_sentiment(mut self, sentiment: Option<SentimentScore>) -> Self {
        self.sentiment = sentiment;
        self
    }

    pub fn cache_key(&self) -> CacheKey {
        CacheKey {
            symbol: self.symbol.clone(),
            timeframe: self.timeframe,
            premium: self.premium.is_some(),
            sentiment: self.sentiment,
        }
    }
}

/// Everything the presentation layer needs for one symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalReport {
    pub bars: BarSeries,
    pub vwap: VwapSeries,
    pub signal: SignalState,
    pub context: Context,
    pub source: SourceTag,
    pub provider: ProviderId,
    pub premium_error: Option<String>,
    pub stitched: bool,
    /// The score actually used, after defaulting.
    pub sentiment: SentimentScore,
}

impl SignalReport {
    pub fn is_realtime(&self) -> bool {
        self.source == SourceTag::Premium
    }

    /// A real-time credential was supplied but the delayed feed was used.
    pub fn is_downgraded(&self) -> bool {
        self.premium_error.is_some()
    }
}

pub struct Analyzer {
    coordinator: SourceCoordinator,
    classifier: ContextClassifier,
    engine: SignalEngine,
    default_sentiment: SentimentScore,
}

impl Analyzer {
    pub fn new(
        public: Arc<dyn DataProvider>,
        clock: Arc<dyn Clock>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            coordinator: SourceCoordinator::new(
                Arc::clone(&public),
                clock,
                config.sources.stale_after(),
            ),
            classifier: ContextClassifier::new(public, config.context.clone()),
            engine: SignalEngine::new(config.strategy.clone()),
            default_sentiment: config.analysis.default_sentiment,
        }
    }

    /// Runs the full pipeline, uncached.
    #[instrument(skip_all, fields(symbol = %req.symbol, timeframe = %req.timeframe))]
    pub async fn analyze(&self, req: &AnalysisRequest<'_>) -> Result<SignalReport, AnalysisError> {
        let sourced = self.coordinator.get_bars(&req.symbol, req.premium).await?;
        let bars = resample(&sourced.series, req.timeframe)?;
        let context = self.classifier.classify(&req.symbol, &bars).await;
        let vwap = compute_vwap(&bars.bars);

        let sentiment = req.sentiment.unwrap_or(self.default_sentiment);
        let signal = self.engine.evaluate(&bars, &vwap, &context, sentiment)?;

        info!(
            source = ?sourced.source,
            strategy = signal.strategy.label(),
            status = %signal.status_label,
            "analysis complete"
        );

        Ok(SignalReport {
            bars,
            vwap,
            signal,
            context,
            source: sourced.source,
            provider: sourced.provider,
            premium_error: sourced.premium_error,
            stitched: sourced.stitched,
            sentiment,
        })
    }

    /// Like [`Analyzer::analyze`], reusing a live entry from `cache`.
    pub async fn analyze_cached(
        &self,
        cache: &SignalCache,
        req: &AnalysisRequest<'_>,
    ) -> Result<Arc<SignalReport>, AnalysisError> {
        cache
            .get_or_try_insert_with(req.cache_key(), || self.analyze(req))
            .await
    }
}
