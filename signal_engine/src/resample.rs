//! Bar resampling onto venue-clock buckets.
//!
//! - Buckets are anchored at local midnight of each session on the venue wall
//!   clock, so a 5-minute bucket starts at 09:00, 09:05, ... Taipei time and a
//!   7-minute bucket covering the open starts at 08:59 every day.
//! - Each bucket keeps first open, max high, min low, last close and summed
//!   volume, labelled with its start instant.
//! - Buckets with no constituent bars never appear in the output.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Timelike, Utc};
use chrono_tz::Tz;
use market_data_ingestor::{
    models::{
        bar::{Bar, BarSeries},
        timeframe::Timeframe,
    },
    tz::{DstPolicy, TzError, VENUE_TZ, from_local_naive_with_policy},
};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResampleError {
    #[error("cannot resample {from} bars into {to} buckets")]
    Incompatible { from: Timeframe, to: Timeframe },

    #[error("bucket start out of range for {0:?}")]
    OutOfRange(BucketKey),

    #[error(transparent)]
    Tz(#[from] TzError),
}

/// Resamples onto the venue (Asia/Taipei) clock.
pub fn resample(series: &BarSeries, target: Timeframe) -> Result<BarSeries, ResampleError> {
    resample_in(series, target, VENUE_TZ)
}

/// Resamples with bucket boundaries aligned to `tz`'s wall clock.
pub fn resample_in(
    series: &BarSeries,
    target: Timeframe,
    tz: Tz,
) -> Result<BarSeries, ResampleError> {
    if target == series.timeframe {
        return Ok(series.clone());
    }

    let from = series.timeframe;
    let width = target.width_secs();
    if !from.is_intraday() || !target.is_intraday() || width % from.width_secs() != 0 {
        return Err(ResampleError::Incompatible { from, to: target });
    }

    let mut out: Vec<Bar> = Vec::new();
    let mut current: Option<(BucketKey, Bar)> = None;

    for bar in &series.bars {
        let id = bucket_id(bar.timestamp, width, tz);
        match current.as_mut() {
            Some((open_id, agg)) if *open_id == id => {
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                if let Some((_, done)) = current.take() {
                    out.push(done);
                }
                let start = bucket_start(id, width, tz)?;
                current = Some((
                    id,
                    Bar::new(start, bar.open, bar.high, bar.low, bar.close, bar.volume),
                ));
            }
        }
    }
    if let Some((_, done)) = current {
        out.push(done);
    }

    Ok(BarSeries {
        symbol: series.symbol.clone(),
        timeframe: target,
        bars: out,
    })
}

/// A bucket on one session's wall clock: the local date and the slot index
/// counted from local midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    pub day: NaiveDate,
    pub slot: i64,
}

/// Bucket holding `ts` for buckets `width_secs` wide on `tz`'s wall clock.
pub fn bucket_id(ts: DateTime<Utc>, width_secs: i64, tz: Tz) -> BucketKey {
    let local = ts.with_timezone(&tz).naive_local();
    let since_midnight = i64::from(local.time().num_seconds_from_midnight());
    BucketKey {
        day: local.date(),
        slot: since_midnight.div_euclid(width_secs),
    }
}

/// First instant of bucket `key`.
pub fn bucket_start(
    key: BucketKey,
    width_secs: i64,
    tz: Tz,
) -> Result<DateTime<Utc>, ResampleError> {
    let naive = key
        .slot
        .checked_mul(width_secs)
        .and_then(TimeDelta::try_seconds)
        .and_then(|offset| key.day.and_time(NaiveTime::MIN).checked_add_signed(offset))
        .ok_or(ResampleError::OutOfRange(key))?;
    Ok(from_local_naive_with_policy(naive, tz, DstPolicy::ShiftForward)?)
}
