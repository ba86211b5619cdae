//! Exchange-qualified Taiwan equity symbols.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SymbolError {
    #[error("empty symbol")]
    Empty,

    #[error("invalid stock code: {0:?}")]
    InvalidCode(String),

    #[error("unknown market suffix: {0:?} (expected TW or TWO)")]
    UnknownMarket(String),
}

/// Listing venue of a Taiwan equity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Taiwan Stock Exchange, Yahoo suffix `.TW`.
    Twse,
    /// Taipei Exchange (OTC), Yahoo suffix `.TWO`.
    Tpex,
}

impl Market {
    pub const fn suffix(self) -> &'static str {
        match self {
            Market::Twse => "TW",
            Market::Tpex => "TWO",
        }
    }
}

/// A stock code plus its market, e.g. `2330.TW`.
///
/// Bare codes (`"2330"`) are taken as TWSE listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol {
    code: String,
    market: Market,
}

impl Symbol {
    pub fn new(code: &str, market: Market) -> Result<Self, SymbolError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(SymbolError::Empty);
        }
        if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(SymbolError::InvalidCode(code.to_string()));
        }
        Ok(Self {
            code: code.to_ascii_uppercase(),
            market,
        })
    }

    /// Bare venue code, as the real-time feed expects it (`"2330"`).
    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn market(&self) -> Market {
        self.market
    }

    /// Exchange-qualified ticker, as the public quote feed expects it (`"2330.TW"`).
    pub fn ticker(&self) -> String {
        format!("{}.{}", self.code, self.market.suffix())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.code, self.market.suffix())
    }
}

impl FromStr for Symbol {
    type Err = SymbolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('.') {
            None => Symbol::new(s, Market::Twse),
            Some((code, suffix)) => {
                let market = match suffix.to_ascii_uppercase().as_str() {
                    "TW" => Market::Twse,
                    "TWO" => Market::Tpex,
                    _ => return Err(SymbolError::UnknownMarket(suffix.to_string())),
                };
                Symbol::new(code, market)
            }
        }
    }
}

impl TryFrom<String> for Symbol {
    type Error = SymbolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Symbol> for String {
    fn from(s: Symbol) -> Self {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_code_defaults_to_twse() {
        let s: Symbol = " 2330 ".parse().unwrap();
        assert_eq!(s.code(), "2330");
        assert_eq!(s.market(), Market::Twse);
        assert_eq!(s.ticker(), "2330.TW");
    }

    #[test]
    fn suffix_selects_market() {
        let s: Symbol = "6488.two".parse().unwrap();
        assert_eq!(s.market(), Market::Tpex);
        assert_eq!(s.to_string(), "6488.TWO");

        let s: Symbol = "2317.TW".parse().unwrap();
        assert_eq!(s.market(), Market::Twse);
    }

    #[test]
    fn rejects_bad_input() {
        assert_eq!("".parse::<Symbol>(), Err(SymbolError::Empty));
        assert!(matches!("23 30".parse::<Symbol>(), Err(SymbolError::InvalidCode(_))));
        assert!(matches!("2330.HK".parse::<Symbol>(), Err(SymbolError::UnknownMarket(_))));
    }
}
