mod common;

use std::sync::Arc;

use common::{MockProvider, Reply, daily_bars};
use market_data_ingestor::providers::ProviderId;
use signal_engine::screener::{ScreenerConfig, Screener};

/// 25 rising sessions with a daily range of `range_pct` percent.
fn uptrend(range_pct: f64) -> Reply {
    let half = range_pct / 200.0;
    let rows: Vec<_> = (0..25)
        .map(|i| {
            let c = 100.0 + f64::from(i);
            (c * (1.0 + half), c * (1.0 - half), c)
        })
        .collect();
    Reply::Bars(daily_bars(&rows))
}

fn downtrend() -> Reply {
    let rows: Vec<_> = (0..25)
        .map(|i| {
            let c = 150.0 - f64::from(i);
            (c * 1.03, c * 0.97, c)
        })
        .collect();
    Reply::Bars(daily_bars(&rows))
}

fn config(universe: &[&str]) -> ScreenerConfig {
    ScreenerConfig {
        universe: universe.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn ranks_by_volatility_and_applies_filters() {
    let provider = Arc::new(
        MockProvider::new(ProviderId::Yahoo)
            .with_daily(Reply::Api("not found".into()))
            .script_daily("2330", vec![uptrend(2.5)])
            .script_daily("2317", vec![uptrend(4.0)])
            .script_daily("2454", vec![uptrend(1.0)])
            .script_daily("2382", vec![downtrend()])
            .script_daily("2303", vec![Reply::Bars(daily_bars(&[(101.0, 99.0, 100.0); 10]))]),
    );
    let screener = Screener::new(
        provider,
        config(&["2330", "2317", "2454", "2382", "2303", "9999"]),
    );

    let hits = screener.screen().await;
    let codes: Vec<_> = hits.iter().map(|h| h.symbol.code().to_string()).collect();
    assert_eq!(codes, vec!["2317", "2330"]);
    assert!((hits[0].volatility_pct - 4.0).abs() < 1e-9);
}

#[tokio::test(start_paused = true)]
async fn limit_truncates_results() {
    let provider = Arc::new(MockProvider::new(ProviderId::Yahoo).with_daily(uptrend(3.0)));
    let screener = Screener::new(
        provider,
        ScreenerConfig {
            limit: 2,
            ..config(&["2330", "2317", "2454"])
        },
    );
    assert_eq!(screener.screen().await.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn rate_limited_symbol_is_retried() {
    let provider = Arc::new(
        MockProvider::new(ProviderId::Yahoo)
            .script_daily("2330", vec![Reply::RateLimited, Reply::RateLimited, uptrend(3.0)]),
    );
    let screener = Screener::new(provider.clone(), config(&["2330"]));

    let hits = screener.screen().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(MockProvider::count(&provider.daily_calls), 3);
}

#[tokio::test(start_paused = true)]
async fn exhausted_retries_skip_the_symbol() {
    let provider = Arc::new(
        MockProvider::new(ProviderId::Yahoo)
            .with_daily(uptrend(3.0))
            .script_daily("2330", vec![Reply::RateLimited; 4]),
    );
    let screener = Screener::new(provider.clone(), config(&["2330", "2317"]));

    let hits = screener.screen().await;
    let codes: Vec<_> = hits.iter().map(|h| h.symbol.code().to_string()).collect();
    assert_eq!(codes, vec!["2317"]);
    // one attempt plus three retries, then one call for 2317
    assert_eq!(MockProvider::count(&provider.daily_calls), 5);
}

#[tokio::test(start_paused = true)]
async fn other_errors_are_not_retried() {
    let provider =
        Arc::new(MockProvider::new(ProviderId::Yahoo).with_daily(Reply::Api("boom".into())));
    let screener = Screener::new(provider.clone(), config(&["2330"]));

    assert!(screener.screen().await.is_empty());
    assert_eq!(MockProvider::count(&provider.daily_calls), 1);
}

#[tokio::test(start_paused = true)]
async fn bad_universe_entries_are_skipped() {
    let provider = Arc::new(MockProvider::new(ProviderId::Yahoo).with_daily(uptrend(3.0)));
    let screener = Screener::new(provider.clone(), config(&["23 30", "2330.HK", "2330"]));

    assert_eq!(screener.screen().await.len(), 1);
    assert_eq!(MockProvider::count(&provider.daily_calls), 1);
}
