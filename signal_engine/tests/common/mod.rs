#![allow(dead_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use market_data_ingestor::{
    models::{asset::Symbol, bar::{Bar, BarSeries}, timeframe::Timeframe},
    providers::{ApiSnafu, DataProvider, ProviderError, ProviderId},
};

/// One canned provider answer.
#[derive(Debug, Clone)]
pub enum Reply {
    Bars(Vec<Bar>),
    /// Well-formed payload, no rows.
    EmptySeries,
    NoTrades,
    RateLimited,
    Api(String),
}

impl Reply {
    fn into_result(
        self,
        id: ProviderId,
        symbol: &Symbol,
        timeframe: Timeframe,
    ) -> Result<BarSeries, ProviderError> {
        match self {
            Reply::Bars(bars) => Ok(BarSeries::new(symbol.clone(), timeframe, bars)),
            Reply::EmptySeries => Ok(BarSeries::empty(symbol.clone(), timeframe)),
            Reply::NoTrades => Err(ProviderError::NoTradesYet {
                symbol: symbol.to_string(),
            }),
            Reply::RateLimited => Err(ProviderError::RateLimited { provider: id }),
            Reply::Api(message) => Err(ApiSnafu { message }.build()),
        }
    }
}

pub struct MockProvider {
    id: ProviderId,
    intraday: Reply,
    quote: Option<f64>,
    default_daily: Reply,
    scripted_daily: Mutex<HashMap<String, VecDeque<Reply>>>,
    pub intraday_calls: AtomicUsize,
    pub quote_calls: AtomicUsize,
    pub daily_calls: AtomicUsize,
}

impl MockProvider {
    pub fn new(id: ProviderId) -> Self {
        Self {
            id,
            intraday: Reply::NoTrades,
            quote: None,
            default_daily: Reply::Api("no daily history".into()),
            scripted_daily: Mutex::new(HashMap::new()),
            intraday_calls: AtomicUsize::new(0),
            quote_calls: AtomicUsize::new(0),
            daily_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_intraday(mut self, reply: Reply) -> Self {
        self.intraday = reply;
        self
    }

    pub fn with_quote(mut self, price: f64) -> Self {
        self.quote = Some(price);
        self
    }

    pub fn with_daily(mut self, reply: Reply) -> Self {
        self.default_daily = reply;
        self
    }

    /// Answers for `code`, served in order before falling back to the default.
    pub fn script_daily(self, code: &str, replies: Vec<Reply>) -> Self {
        self.scripted_daily
            .lock()
            .unwrap()
            .insert(code.to_string(), replies.into());
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataProvider for MockProvider {
    fn id(&self) -> ProviderId {
        self.id
    }

    async fn fetch_intraday(&self, symbol: &Symbol) -> Result<BarSeries, ProviderError> {
        self.intraday_calls.fetch_add(1, Ordering::SeqCst);
        self.intraday
            .clone()
            .into_result(self.id, symbol, Timeframe::ONE_MINUTE)
    }

    async fn fetch_quote(&self, _symbol: &Symbol) -> Result<Option<f64>, ProviderError> {
        self.quote_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.quote)
    }

    async fn fetch_daily_history(
        &self,
        symbol: &Symbol,
        _lookback_days: u32,
    ) -> Result<BarSeries, ProviderError> {
        self.daily_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self
            .scripted_daily
            .lock()
            .unwrap()
            .get_mut(symbol.code())
            .and_then(VecDeque::pop_front);
        scripted
            .unwrap_or_else(|| self.default_daily.clone())
            .into_result(self.id, symbol, Timeframe::ONE_DAY)
    }
}

/// 2025-03-03 at `hh:mm` Taipei time.
pub fn venue_time(hh: u32, mm: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 3, hh - 8, mm, 0).unwrap()
}

/// One-minute bars from 09:00 venue time, `(open, high, low, close, volume)`.
pub fn minute_bars(rows: &[(f64, f64, f64, f64, f64)]) -> Vec<Bar> {
    rows.iter()
        .enumerate()
        .map(|(i, &(o, h, l, c, v))| {
            Bar::new(venue_time(9, 0) + Duration::minutes(i as i64), o, h, l, c, v)
        })
        .collect()
}

/// Daily bars ending the session before 2025-03-03, one per calendar day.
pub fn daily_bars(rows: &[(f64, f64, f64)]) -> Vec<Bar> {
    let n = rows.len() as i64;
    rows.iter()
        .enumerate()
        .map(|(i, &(h, l, c))| {
            let t =
                Utc.with_ymd_and_hms(2025, 3, 3, 0, 0, 0).unwrap() - Duration::days(n - i as i64);
            Bar::new(t, c, h, l, c, 1_000_000.0)
        })
        .collect()
}

pub fn closes_daily(closes: &[f64]) -> Vec<Bar> {
    let rows: Vec<_> = closes.iter().map(|&c| (c, c, c)).collect();
    daily_bars(&rows)
}

pub fn symbol(s: &str) -> Symbol {
    s.parse().unwrap()
}
