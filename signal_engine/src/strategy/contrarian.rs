use market_data_ingestor::models::bar::Bar;

use super::{EntryScan, StrategyParams};
use crate::{context::Context, engine::Fill};

/// First bar whose close sits at or below the dip threshold from prior close.
///
/// Only scans when the latest close is itself through the threshold.
pub(super) fn scan_entry(bars: &[Bar], context: &Context, params: &StrategyParams) -> EntryScan {
    let current = bars.last().map_or(0.0, |b| context.pct_change(b.close));
    let dipped = |bar: &&Bar| context.pct_change(bar.close) <= params.dip_threshold;

    if current <= params.dip_threshold {
        if let Some(bar) = bars.iter().find(dipped) {
            return EntryScan::Entered(Fill {
                timestamp: bar.timestamp,
                price: bar.close,
            });
        }
    }

    EntryScan::Waiting {
        status: format!(
            "below dip threshold ({:.2}%), currently {:.2}%",
            params.dip_threshold * 100.0,
            current * 100.0
        ),
    }
}
