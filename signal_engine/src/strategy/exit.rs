use market_data_ingestor::models::bar::Bar;

use super::StrategyParams;
use crate::engine::Fill;

/// Scans bars strictly after the entry for the first take-profit or stop-loss.
///
/// Take-profit is checked first within a bar. The fill is at the threshold
/// price, not the bar's extreme.
pub(crate) fn scan_exit(bars: &[Bar], entry: &Fill, params: &StrategyParams) -> Option<Fill> {
    let take_profit = params.take_profit_price(entry.price);
    let stop_loss = params.stop_loss_price(entry.price);

    bars.iter()
        .filter(|b| b.timestamp > entry.timestamp)
        .find_map(|b| {
            let price = if b.high >= take_profit {
                take_profit
            } else if b.low <= stop_loss {
                stop_loss
            } else {
                return None;
            };
            Some(Fill {
                timestamp: b.timestamp,
                price,
            })
        })
}
