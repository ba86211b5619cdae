//! Sentiment boundary.
//!
//! Scoring news with a language model happens outside this crate. The engine
//! only sees a [`SentimentScore`]; [`keyword_score`] is the offline fallback
//! used when no external score is available.

use std::fmt;

use async_trait::async_trait;
use market_data_ingestor::models::asset::Symbol;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("sentiment score {0} is outside 0..=100")]
pub struct SentimentError(pub i64);

/// Bullishness of recent news, `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct SentimentScore(u8);

impl SentimentScore {
    pub const NEUTRAL: Self = Self(50);
    pub const MAX: u8 = 100;

    pub fn new(value: i64) -> Result<Self, SentimentError> {
        match u8::try_from(value) {
            Ok(v) if v <= Self::MAX => Ok(Self(v)),
            _ => Err(SentimentError(value)),
        }
    }

    /// Clamps any integer into range.
    pub fn saturating(value: i64) -> Self {
        // clamp keeps the value inside 0..=100, so the cast is lossless
        Self(value.clamp(0, i64::from(Self::MAX)) as u8)
    }

    pub const fn value(self) -> u8 {
        self.0
    }
}

impl Default for SentimentScore {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<i64> for SentimentScore {
    type Error = SentimentError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SentimentScore> for u8 {
    fn from(s: SentimentScore) -> Self {
        s.0
    }
}

/// Anything that can put a number on the news flow for a symbol.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// `None` means "no opinion"; the caller decides what that defaults to.
    async fn score(&self, symbol: &Symbol) -> Option<SentimentScore>;
}

/// A manual override, or no opinion at all.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSentiment(pub Option<SentimentScore>);

#[async_trait]
impl SentimentSource for FixedSentiment {
    async fn score(&self, _symbol: &Symbol) -> Option<SentimentScore> {
        self.0
    }
}

/// A news item as handed over by the scraper.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

impl Headline {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            snippet: String::new(),
        }
    }
}

/// Scores a fixed set of headlines with [`keyword_score`].
#[derive(Debug, Clone, Default)]
pub struct HeadlineSentiment {
    headlines: Vec<Headline>,
}

impl HeadlineSentiment {
    pub fn new(headlines: Vec<Headline>) -> Self {
        Self { headlines }
    }
}

#[async_trait]
impl SentimentSource for HeadlineSentiment {
    async fn score(&self, _symbol: &Symbol) -> Option<SentimentScore> {
        (!self.headlines.is_empty()).then(|| keyword_score(&self.headlines))
    }
}

const POSITIVE_KEYWORDS: &[&str] = &[
    "上漲", "飆", "創高", "買超", "強勢", "利多", "成長", "漲停", "旺", "攻頂", "受惠", "看好",
    "翻紅", "驚艷", "AI", "擴產", "獲利", "大漲",
];

const NEGATIVE_KEYWORDS: &[&str] = &[
    "下跌", "賣", "砍", "觀望", "保守", "重挫", "外資賣", "縮減", "崩", "跌停", "疲軟", "利空",
    "修正", "衰退", "翻黑", "示警", "虧損", "大跌",
];

const KEYWORD_WEIGHT: i64 = 5;

/// Keyword tally over title + snippet.
///
/// Starts at 50; each keyword present in a headline moves the score by 5.
/// A keyword counts once per headline no matter how often it repeats.
pub fn keyword_score(headlines: &[Headline]) -> SentimentScore {
    if headlines.is_empty() {
        return SentimentScore::NEUTRAL;
    }

    let mut score = i64::from(SentimentScore::NEUTRAL.value());
    for headline in headlines {
        let text = format!("{}{}", headline.title, headline.snippet);
        let hits = |words: &[&str]| words.iter().filter(|w| text.contains(*w)).count() as i64;
        score += KEYWORD_WEIGHT * hits(POSITIVE_KEYWORDS);
        score -= KEYWORD_WEIGHT * hits(NEGATIVE_KEYWORDS);
    }
    SentimentScore::saturating(score)
}
