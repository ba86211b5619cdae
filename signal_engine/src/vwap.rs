//! Cumulative session VWAP.

use market_data_ingestor::models::bar::Bar;
use serde::Serialize;

/// VWAP aligned 1:1 with the bars it was computed from.
///
/// A point is `None` while cumulative volume is still zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct VwapSeries(Vec<Option<f64>>);

impl VwapSeries {
    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn last(&self) -> Option<f64> {
        self.0.last().copied().flatten()
    }
}

/// Single forward pass of `cum(close * volume) / cum(volume)`.
///
/// Starts from zero on every call; there is no carried state between calls.
pub fn compute_vwap(bars: &[Bar]) -> VwapSeries {
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    let points = bars
        .iter()
        .map(|bar| {
            if bar.volume.is_finite() && bar.volume > 0.0 && bar.close.is_finite() {
                cum_pv += bar.close * bar.volume;
                cum_vol += bar.volume;
            }
            (cum_vol > 0.0).then(|| cum_pv / cum_vol)
        })
        .collect();
    VwapSeries(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    fn bar(i: i64, close: f64, volume: f64) -> Bar {
        let t = Utc.with_ymd_and_hms(2025, 3, 3, 1, 0, 0).unwrap() + Duration::minutes(i);
        Bar::new(t, close, close, close, close, volume)
    }

    #[test]
    fn undefined_until_volume_arrives() {
        let bars = [
            bar(0, 100.0, 0.0),
            bar(1, 101.0, 0.0),
            bar(2, 102.0, 10.0),
            bar(3, 104.0, 30.0),
        ];
        let v = compute_vwap(&bars);
        assert_eq!(v.values(), &[None, None, Some(102.0), Some(103.5)]);
        assert_eq!(v.last(), Some(103.5));
    }

    #[test]
    fn zero_volume_bar_keeps_previous_value() {
        let bars = [bar(0, 100.0, 10.0), bar(1, 200.0, 0.0)];
        assert_eq!(compute_vwap(&bars).values(), &[Some(100.0), Some(100.0)]);
    }

    #[test]
    fn empty_input() {
        assert!(compute_vwap(&[]).is_empty());
    }

    proptest! {
        #[test]
        fn matches_prefix_definition(
            rows in prop::collection::vec(
                (1.0f64..1000.0, prop_oneof![Just(0.0), 0.0f64..5000.0]),
                0..80,
            )
        ) {
            let bars: Vec<Bar> = rows
                .iter()
                .enumerate()
                .map(|(i, &(c, v))| bar(i as i64, c, v))
                .collect();
            let vwap = compute_vwap(&bars);
            prop_assert_eq!(vwap.len(), bars.len());

            for i in 0..bars.len() {
                let vol: f64 = bars[..=i].iter().map(|b| b.volume).sum();
                let pv: f64 = bars[..=i].iter().map(|b| b.close * b.volume).sum();
                match vwap.get(i) {
                    None => prop_assert!(vol == 0.0),
                    Some(v) => {
                        prop_assert!(vol > 0.0);
                        prop_assert!(v.is_finite());
                        prop_assert!((v - pv / vol).abs() <= 1e-9 * v.abs().max(1.0));
                    }
                }
            }
        }
    }
}
