use market_data_ingestor::models::bar::Bar;

use super::{EntryScan, StrategyParams};
use crate::{engine::Fill, vwap::VwapSeries};

const INSUFFICIENT_VOLATILITY: &str = "insufficient volatility";
const AWAITING: &str = "awaiting signal";

/// First bar that pulls back to VWAP after a breakout above it.
///
/// Bars without a VWAP value are skipped outright and feed neither the
/// running high nor the running deviation.
pub(super) fn scan_entry(bars: &[Bar], vwap: &VwapSeries, params: &StrategyParams) -> EntryScan {
    let mut max_dev = 0.0_f64;
    let mut high_water = 0.0_f64;

    for (bar, point) in bars.iter().zip(vwap.values()) {
        let Some(v) = point.filter(|v| *v > 0.0) else {
            continue;
        };

        high_water = high_water.max(bar.high);
        max_dev = max_dev.max((bar.close - v) / v);

        let broke_out = max_dev >= params.breakout_deviation;
        let pulled_back = high_water > 0.0 && bar.close < high_water * (1.0 - params.pullback);
        let near_vwap = bar.low <= v * (1.0 + params.vwap_band);
        let held = bar.is_bullish() && bar.close >= v;

        if broke_out && pulled_back && near_vwap && held {
            return EntryScan::Entered(Fill {
                timestamp: bar.timestamp,
                price: bar.close,
            });
        }
    }

    let status = if max_dev < params.breakout_deviation {
        INSUFFICIENT_VOLATILITY
    } else {
        AWAITING
    };
    EntryScan::Waiting {
        status: status.to_string(),
    }
}
