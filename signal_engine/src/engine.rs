//! Signal state machine: pick a strategy, scan for entry, then for exit.
//!
//! Evaluation is synchronous, pure and deterministic. A fresh
//! [`SignalState`] is built on every call; nothing carries over between calls.

use chrono::{DateTime, Utc};
use market_data_ingestor::models::bar::BarSeries;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    context::Context,
    sentiment::SentimentScore,
    strategy::{EntryScan, Strategy, StrategyParams, scan_exit},
    vwap::VwapSeries,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignalError {
    #[error("no bars to evaluate for {symbol}")]
    NoData { symbol: String },

    #[error("VWAP series has {vwap} points for {bars} bars")]
    Misaligned { bars: usize, vwap: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    AwaitingSignal,
    Entered,
    Exited,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalState {
    pub strategy: Strategy,
    pub entry: Option<Fill>,
    pub exit: Option<Fill>,
    pub phase: Phase,
    pub status_label: String,
    /// Change of `current_price` from the prior close, as a fraction.
    pub pct_change: f64,
    pub current_price: f64,
}

impl SignalState {
    /// Realised return of a closed trade, as a fraction.
    pub fn realized_return(&self) -> Option<f64> {
        match (self.entry, self.exit) {
            (Some(entry), Some(exit)) => Some((exit.price - entry.price) / entry.price),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignalEngine {
    params: StrategyParams,
}

impl SignalEngine {
    pub fn new(params: StrategyParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &StrategyParams {
        &self.params
    }

    pub fn evaluate(
        &self,
        series: &BarSeries,
        vwap: &VwapSeries,
        context: &Context,
        sentiment: SentimentScore,
    ) -> Result<SignalState, SignalError> {
        let bars = &series.bars;
        let last = bars.last().ok_or_else(|| SignalError::NoData {
            symbol: series.symbol.to_string(),
        })?;
        if vwap.len() != bars.len() {
            return Err(SignalError::Misaligned {
                bars: bars.len(),
                vwap: vwap.len(),
            });
        }

        let current_price = last.close;
        let pct_change = context.pct_change(current_price);
        let strategy = Strategy::select(sentiment, &self.params);

        let mut state = SignalState {
            strategy,
            entry: None,
            exit: None,
            phase: Phase::AwaitingSignal,
            status_label: String::new(),
            pct_change,
            current_price,
        };

        match strategy.scan_entry(bars, vwap, context, &self.params) {
            EntryScan::Waiting { status } => state.status_label = status,
            EntryScan::Entered(entry) => {
                state.entry = Some(entry);
                match scan_exit(bars, &entry, &self.params) {
                    Some(exit) => {
                        state.exit = Some(exit);
                        state.phase = Phase::Exited;
                        state.status_label = "exited".to_string();
                    }
                    None => {
                        let unrealized = (current_price - entry.price) / entry.price;
                        state.phase = Phase::Entered;
                        state.status_label = format!("held, {:+.2}%", unrealized * 100.0);
                    }
                }
            }
        }

        debug!(
            symbol = %series.symbol,
            strategy = strategy.label(),
            phase = ?state.phase,
            status = %state.status_label,
            "signal evaluated"
        );
        Ok(state)
    }
}
