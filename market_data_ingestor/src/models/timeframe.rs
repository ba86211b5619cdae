//! Timeframe utilities for expressing uniform bar intervals.
//!
//! A [`Timeframe`] pairs a non-zero amount with a [`TimeframeUnit`]. Intraday
//! analysis works on multiples of the one-minute base bar; daily bars are only
//! used for context and screening.
//!
//! ```
//! use market_data_ingestor::models::timeframe::{Timeframe, TimeframeUnit};
//!
//! let tf: Timeframe = "5m".parse().unwrap();
//! assert_eq!(tf.amount().get(), 5);
//! assert_eq!(tf.unit(), TimeframeUnit::Minute);
//! assert_eq!(tf.to_string(), "5m");
//! ```

use std::{fmt, num::NonZeroU32, str::FromStr};

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeframeError {
    #[error("Invalid amount for {unit:?}: {message}")]
    InvalidAmount {
        unit: TimeframeUnit,
        message: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },
}

/// Timeframe granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimeframeUnit {
    Minute,
    Hour,
    /// One trading session.
    Day,
}

/// A timeframe = amount × unit (e.g. 5-Minute, 1-Hour, 1-Day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Timeframe {
    amount: NonZeroU32,
    unit: TimeframeUnit,
}

impl Timeframe {
    /// The base intraday resolution every provider delivers.
    pub const ONE_MINUTE: Self = Self {
        amount: nonzero!(1u32),
        unit: TimeframeUnit::Minute,
    };

    pub const ONE_DAY: Self = Self {
        amount: nonzero!(1u32),
        unit: TimeframeUnit::Day,
    };

    /// Creates a validated timeframe.
    ///
    /// Minutes accept 1-60, hours 1-4 (a TWSE session is 4.5 hours), days only 1.
    pub fn new(amount: u32, unit: TimeframeUnit) -> Result<Self, TimeframeError> {
        let valid = match unit {
            TimeframeUnit::Minute => (1..=60).contains(&amount),
            TimeframeUnit::Hour => (1..=4).contains(&amount),
            TimeframeUnit::Day => amount == 1,
        };
        if !valid {
            let message = match unit {
                TimeframeUnit::Minute => "Minute units can only be used with amounts between 1-60",
                TimeframeUnit::Hour => "Hour units can only be used with amounts between 1-4",
                TimeframeUnit::Day => "Day units can only be used with amount 1",
            };
            return Err(TimeframeError::InvalidAmount {
                unit,
                message: message.into(),
            });
        }
        // `valid` already excluded zero for every unit.
        let amount = NonZeroU32::new(amount).ok_or(TimeframeError::InvalidAmount {
            unit,
            message: "amount must be > 0".into(),
        })?;
        Ok(Self { amount, unit })
    }

    pub fn minutes(amount: u32) -> Result<Self, TimeframeError> {
        Self::new(amount, TimeframeUnit::Minute)
    }

    pub fn hours(amount: u32) -> Result<Self, TimeframeError> {
        Self::new(amount, TimeframeUnit::Hour)
    }

    pub const fn amount(&self) -> NonZeroU32 {
        self.amount
    }

    pub const fn unit(&self) -> TimeframeUnit {
        self.unit
    }

    pub fn is_intraday(&self) -> bool {
        !matches!(self.unit, TimeframeUnit::Day)
    }

    /// Fixed bucket width in seconds.
    pub fn width_secs(&self) -> i64 {
        let unit_secs = match self.unit {
            TimeframeUnit::Minute => 60,
            TimeframeUnit::Hour => 60 * 60,
            TimeframeUnit::Day => 24 * 60 * 60,
        };
        unit_secs * i64::from(self.amount.get())
    }
}

/// Display/parse for CLI ergonomics (`"5m"`, `"1h"`, `"1D"`)
impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = self.amount.get();
        let u = match self.unit {
            TimeframeUnit::Minute => "m",
            TimeframeUnit::Hour => "h",
            TimeframeUnit::Day => "D",
        };
        write!(f, "{a}{u}")
    }
}

impl FromStr for Timeframe {
    type Err = TimeframeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = |message: String| TimeframeError::InvalidInput { message };
        if s.is_empty() {
            return Err(invalid("empty timeframe".into()));
        }
        let split = s
            .find(|c: char| !c.is_ascii_digit())
            .ok_or_else(|| invalid(format!("missing unit in {s:?}")))?;
        let (digits, unit) = s.split_at(split);
        let amount: u32 = digits
            .parse()
            .map_err(|_| invalid(format!("bad amount in {s:?}")))?;
        let unit = match unit {
            "m" | "min" | "T" => TimeframeUnit::Minute,
            "h" | "H" => TimeframeUnit::Hour,
            "D" | "d" => TimeframeUnit::Day,
            _ => return Err(invalid(format!("unknown unit: {unit}"))),
        };
        Self::new(amount, unit)
    }
}

impl TryFrom<String> for Timeframe {
    type Error = TimeframeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Timeframe> for String {
    fn from(tf: Timeframe) -> Self {
        tf.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_supported_resolutions() {
        for (s, amount, unit) in [
            ("1m", 1, TimeframeUnit::Minute),
            ("5m", 5, TimeframeUnit::Minute),
            ("15m", 15, TimeframeUnit::Minute),
            ("30T", 30, TimeframeUnit::Minute),
            ("60m", 60, TimeframeUnit::Minute),
            ("1h", 1, TimeframeUnit::Hour),
            ("1D", 1, TimeframeUnit::Day),
        ] {
            let tf: Timeframe = s.parse().unwrap();
            assert_eq!(tf.amount().get(), amount, "{s}");
            assert_eq!(tf.unit(), unit, "{s}");
        }
    }

    #[test]
    fn rejects_out_of_range_amounts() {
        assert!(Timeframe::minutes(0).is_err());
        assert!(Timeframe::minutes(61).is_err());
        assert!(Timeframe::hours(5).is_err());
        assert!(Timeframe::new(2, TimeframeUnit::Day).is_err());

        match Timeframe::minutes(90) {
            Err(TimeframeError::InvalidAmount { unit, message }) => {
                assert_eq!(unit, TimeframeUnit::Minute);
                assert!(message.contains("1-60"));
            }
            other => panic!("expected InvalidAmount, got {other:?}"),
        }
    }

    #[test]
    fn rejects_garbage() {
        assert!("".parse::<Timeframe>().is_err());
        assert!("5".parse::<Timeframe>().is_err());
        assert!("m".parse::<Timeframe>().is_err());
        assert!("5w".parse::<Timeframe>().is_err());
    }

    #[test]
    fn widths() {
        assert_eq!(Timeframe::ONE_MINUTE.width_secs(), 60);
        assert_eq!(Timeframe::minutes(15).unwrap().width_secs(), 900);
        assert_eq!(Timeframe::hours(1).unwrap().width_secs(), 3600);
        assert!(!Timeframe::ONE_DAY.is_intraday());
    }

    #[test]
    fn serde_uses_display_form() {
        let tf = Timeframe::minutes(5).unwrap();
        let json = serde_json::to_string(&tf).unwrap();
        assert_eq!(json, "\"5m\"");
        let back: Timeframe = serde_json::from_str(&json).unwrap();
        assert_eq!(back, tf);
        assert!(serde_json::from_str::<Timeframe>("\"7x\"").is_err());
    }
}
