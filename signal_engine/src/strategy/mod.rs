//! The two rule sets and their shared exit.
//!
//! Exactly one [`Strategy`] is chosen per evaluation from the sentiment score;
//! the other's entry rules are never consulted.

mod contrarian;
mod exit;
mod momentum;

use serde::{Deserialize, Serialize};

pub(crate) use exit::scan_exit;

use crate::{
    context::Context,
    engine::Fill,
    sentiment::SentimentScore,
    vwap::VwapSeries,
};
use market_data_ingestor::models::bar::Bar;

/// Entry and exit thresholds. All fractions, not percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    /// Sentiment strictly above this selects the contrarian rule set.
    pub contrarian_above: SentimentScore,
    /// Contrarian entry once the change from prior close is at or below this.
    pub dip_threshold: f64,
    /// Momentum needs the close to have run this far above VWAP at some point.
    pub breakout_deviation: f64,
    /// Momentum entry needs the close this far below the running high.
    pub pullback: f64,
    /// Momentum entry needs the low within this band above VWAP.
    pub vwap_band: f64,
    pub take_profit: f64,
    pub stop_loss: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            contrarian_above: SentimentScore::saturating(80),
            dip_threshold: -0.03,
            breakout_deviation: 0.006,
            pullback: 0.006,
            vwap_band: 0.015,
            take_profit: 0.02,
            stop_loss: 0.015,
        }
    }
}

impl StrategyParams {
    pub fn take_profit_price(&self, entry: f64) -> f64 {
        entry * (1.0 + self.take_profit)
    }

    pub fn stop_loss_price(&self, entry: f64) -> f64 {
        entry * (1.0 - self.stop_loss)
    }

    /// Checks sign and range of every threshold.
    pub fn validate(&self) -> Result<(), String> {
        if !(self.dip_threshold < 0.0 && self.dip_threshold > -1.0) {
            return Err(format!("dip_threshold must be in (-1, 0), got {}", self.dip_threshold));
        }
        for (name, v) in [
            ("breakout_deviation", self.breakout_deviation),
            ("pullback", self.pullback),
            ("vwap_band", self.vwap_band),
            ("take_profit", self.take_profit),
            ("stop_loss", self.stop_loss),
        ] {
            if !(v > 0.0 && v < 1.0) {
                return Err(format!("{name} must be in (0, 1), got {v}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Buy a pullback after price has broken away above VWAP.
    MomentumBreakout,
    /// Buy a sharp drop from the prior close when news is very bullish.
    ContrarianDip,
}

impl Strategy {
    pub fn select(sentiment: SentimentScore, params: &StrategyParams) -> Self {
        if sentiment > params.contrarian_above {
            Strategy::ContrarianDip
        } else {
            Strategy::MomentumBreakout
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Strategy::MomentumBreakout => "momentum breakout",
            Strategy::ContrarianDip => "contrarian dip",
        }
    }

    /// Runs this variant's entry rules over `bars`.
    pub(crate) fn scan_entry(
        self,
        bars: &[Bar],
        vwap: &VwapSeries,
        context: &Context,
        params: &StrategyParams,
    ) -> EntryScan {
        match self {
            Strategy::MomentumBreakout => momentum::scan_entry(bars, vwap, params),
            Strategy::ContrarianDip => contrarian::scan_entry(bars, context, params),
        }
    }
}

/// Result of an entry scan.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EntryScan {
    Entered(Fill),
    Waiting { status: String },
}
