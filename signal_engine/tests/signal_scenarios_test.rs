mod common;

use common::{minute_bars, symbol};
use market_data_ingestor::models::{bar::BarSeries, timeframe::Timeframe};
use signal_engine::{
    Phase, SignalEngine, Strategy, StrategyParams,
    context::{Context, PriorCloseSource, Trend},
    sentiment::SentimentScore,
    vwap::compute_vwap,
};

fn context(prior_close: f64) -> Context {
    Context {
        trend: Trend::Unknown,
        prior_close,
        prior_close_source: PriorCloseSource::DailyHistory,
    }
}

fn series(rows: &[(f64, f64, f64, f64, f64)]) -> BarSeries {
    BarSeries::new(symbol("2330"), Timeframe::ONE_MINUTE, minute_bars(rows))
}

/// Tight bars around each close, never touching the exit thresholds of a
/// position opened anywhere in the 95-100 range.
fn from_closes(closes: &[f64]) -> BarSeries {
    let rows: Vec<_> = closes
        .iter()
        .map(|&c| (c + 0.05, c + 0.2, c - 0.2, c, 1_000.0))
        .collect();
    series(&rows)
}

fn score(v: i64) -> SentimentScore {
    SentimentScore::new(v).unwrap()
}

fn evaluate(s: &BarSeries, ctx: &Context, sentiment: SentimentScore) -> signal_engine::SignalState {
    SignalEngine::default()
        .evaluate(s, &compute_vwap(&s.bars), ctx, sentiment)
        .unwrap()
}

#[test]
fn quiet_session_reports_insufficient_volatility() {
    let closes: Vec<f64> = (0..20).map(|i| 100.0 + f64::from(i % 4) * 0.1).collect();
    let s = from_closes(&closes);
    let vwap = compute_vwap(&s.bars);
    for (bar, v) in s.bars.iter().zip(vwap.values()) {
        let v = v.unwrap();
        assert!((bar.close - v) / v <= 0.004);
    }

    let state = evaluate(&s, &context(100.0), score(50));
    assert_eq!(state.strategy, Strategy::MomentumBreakout);
    assert_eq!(state.status_label, "insufficient volatility");
    assert_eq!(state.phase, Phase::AwaitingSignal);
    assert_eq!(state.entry, None);
}

#[test]
fn dip_of_four_percent_enters_at_bar_five() {
    let s = from_closes(&[99.5, 99.0, 98.5, 98.0, 97.5, 96.0, 96.2, 96.5]);
    let state = evaluate(&s, &context(100.0), score(90));

    assert_eq!(state.strategy, Strategy::ContrarianDip);
    let entry = state.entry.unwrap();
    assert_eq!(entry.timestamp, s.bars[5].timestamp);
    assert_eq!(entry.price, 96.0);
    assert_eq!(state.phase, Phase::Entered);
}

#[test]
fn entry_is_recorded_where_the_threshold_is_first_crossed() {
    // crosses -3% at index 7 and stays there
    let closes = [99.8, 99.4, 99.0, 98.6, 98.2, 97.8, 97.4, 96.9, 96.7, 96.8];
    let s = from_closes(&closes);
    let state = evaluate(&s, &context(100.0), score(95));

    let entry = state.entry.unwrap();
    assert_eq!(entry.timestamp, s.bars[7].timestamp);
    assert_eq!(entry.price, 96.9);
    assert!(s.bars[..7].iter().all(|b| b.timestamp < entry.timestamp));
}

#[test]
fn take_profit_fills_at_threshold_not_bar_high() {
    let s = series(&[
        (96.5, 96.6, 95.9, 96.0, 1_000.0),
        (96.0, 97.0, 95.8, 96.8, 1_000.0),
        // high far beyond 1.02 * 96
        (96.8, 99.5, 96.7, 97.0, 1_000.0),
        (97.0, 97.1, 96.0, 96.5, 1_000.0),
    ]);
    let params = StrategyParams::default();
    let state = evaluate(&s, &context(100.0), score(90));

    let entry = state.entry.unwrap();
    assert_eq!(entry.price, 96.0);
    let exit = state.exit.unwrap();
    assert_eq!(exit.timestamp, s.bars[2].timestamp);
    assert_eq!(exit.price, params.take_profit_price(96.0));
    assert!((exit.price - 97.92).abs() < 1e-9);
    assert_ne!(exit.price, 99.5);
    assert_eq!(state.phase, Phase::Exited);
    assert_eq!(state.status_label, "exited");
}

#[test]
fn stop_loss_before_take_profit() {
    let s = series(&[
        (96.5, 96.6, 95.9, 96.0, 1_000.0),
        (96.0, 96.1, 94.0, 94.2, 1_000.0),
        (94.2, 99.0, 94.2, 96.5, 1_000.0),
    ]);
    let state = evaluate(&s, &context(100.0), score(90));
    let exit = state.exit.unwrap();
    assert_eq!(exit.timestamp, s.bars[1].timestamp);
    assert_eq!(exit.price, StrategyParams::default().stop_loss_price(96.0));
}

#[test]
fn evaluation_is_idempotent() {
    let s = from_closes(&[99.5, 99.0, 96.5, 96.0, 96.8]);
    let ctx = context(100.0);
    for sentiment in [score(20), score(80), score(81), score(100)] {
        let a = evaluate(&s, &ctx, sentiment);
        let b = evaluate(&s, &ctx, sentiment);
        assert_eq!(a, b);
    }
}

#[test]
fn high_sentiment_never_takes_momentum_entries() {
    // a textbook breakout-and-pullback, but price is above the prior close
    let s = series(&[
        (100.0, 100.5, 99.5, 100.0, 10_000.0),
        (100.0, 102.0, 100.0, 101.5, 100.0),
        (101.5, 101.5, 100.2, 100.4, 100.0),
        (100.3, 100.8, 100.2, 100.7, 100.0),
    ]);
    let ctx = context(100.0);

    let momentum = evaluate(&s, &ctx, score(80));
    assert_eq!(momentum.strategy, Strategy::MomentumBreakout);
    assert_eq!(momentum.entry.map(|f| f.price), Some(100.7));

    let contrarian = evaluate(&s, &ctx, score(81));
    assert_eq!(contrarian.strategy, Strategy::ContrarianDip);
    assert_eq!(contrarian.entry, None);
    assert_eq!(contrarian.status_label, "below dip threshold (-3.00%), currently 0.70%");
}

#[test]
fn low_sentiment_never_takes_dip_entries() {
    let s = from_closes(&[99.0, 97.0, 96.0, 95.5, 95.8]);
    let ctx = context(100.0);

    let contrarian = evaluate(&s, &ctx, score(95));
    assert!(contrarian.entry.is_some());

    let momentum = evaluate(&s, &ctx, score(50));
    assert_eq!(momentum.strategy, Strategy::MomentumBreakout);
    assert_eq!(momentum.entry, None);
    assert_eq!(momentum.phase, Phase::AwaitingSignal);
}
