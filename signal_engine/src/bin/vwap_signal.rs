use std::{error::Error, path::PathBuf, process::ExitCode, sync::Arc, time::Duration};

use clap::{Parser, Subcommand};
use market_data_ingestor::{
    models::{asset::Symbol, timeframe::Timeframe},
    providers::{DataProvider, fugle_rest::provider::API_KEY_ENV},
    tz::VENUE_TZ,
};
use secrecy::SecretString;
use shared_utils::{env::get_env_var_opt, logging::init_logging};
use signal_engine::{
    AnalysisError, AnalysisRequest, Analyzer, EngineConfig, SignalReport,
    cache::SignalCache,
    clock::SystemClock,
    screener::Screener,
    sentiment::{FixedSentiment, Headline, HeadlineSentiment, SentimentScore, SentimentSource},
};
use tracing::warn;

#[derive(Parser)]
#[command(author, version, about = "Intraday VWAP signals for Taiwan equities")]
struct Cli {
    /// Path to an engine config TOML file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate the signal for one symbol
    Analyze {
        /// Stock code, optionally with market suffix (e.g. "2330", "6488.TWO")
        #[arg(long)]
        symbol: Symbol,

        /// Bar resolution (1m, 5m, 15m, 30m, 60m)
        #[arg(long, default_value = "5m")]
        timeframe: Timeframe,

        /// Sentiment override, 0-100
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        sentiment: Option<u8>,

        /// Headline to score by keyword when no override is given (repeatable)
        #[arg(long = "headline")]
        headlines: Vec<String>,

        /// Re-run every N seconds
        #[arg(long)]
        watch: Option<u64>,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan the symbol universe for volatile uptrends
    Screen {
        /// Maximum number of symbols to list
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    if let Err(e) = init_logging() {
        eprintln!("logging already initialised: {e}");
    }

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::default(),
    };
    let public = config.sources.public_provider()?;

    match cli.command {
        Commands::Analyze {
            symbol,
            timeframe,
            sentiment,
            headlines,
            watch,
            json,
        } => {
            let premium = match get_env_var_opt(API_KEY_ENV) {
                Some(key) => Some(config.sources.premium_provider(SecretString::from(key))?),
                None => None,
            };

            let sentiment = if let Some(s) = sentiment {
                FixedSentiment(Some(SentimentScore::saturating(i64::from(s))))
                    .score(&symbol)
                    .await
            } else {
                let headlines = headlines.into_iter().map(Headline::new).collect();
                HeadlineSentiment::new(headlines).score(&symbol).await
            };

            let analyzer = Analyzer::new(public, Arc::new(SystemClock), &config);
            let cache = SignalCache::new(config.cache.ttl());
            let mut req = AnalysisRequest::new(symbol, timeframe).with_sentiment(sentiment);
            if let Some(p) = premium.as_ref() {
                req = req.with_premium(p as &dyn DataProvider);
            }

            loop {
                match analyzer.analyze_cached(&cache, &req).await {
                    Ok(report) => print_report(&report, json)?,
                    Err(AnalysisError::NoData(e)) => {
                        // a watch loop keeps polling until the session opens
                        if watch.is_none() {
                            return Err(e.into());
                        }
                        eprintln!("{e}");
                    }
                    Err(e) => return Err(e.into()),
                }
                let Some(secs) = watch else { break };
                tokio::time::sleep(Duration::from_secs(secs.max(1))).await;
            }
        }
        Commands::Screen { limit } => {
            let mut screener_config = config.screener.clone();
            if let Some(limit) = limit {
                screener_config.limit = limit;
            }
            let hits = Screener::new(public, screener_config).screen().await;
            if hits.is_empty() {
                println!("no symbols passed the screen");
            }
            for (rank, hit) in hits.iter().enumerate() {
                println!(
                    "{:>2}. {:<9} vol {:>5.2}%  close {:>8.2}  ma {:>8.2}",
                    rank + 1,
                    hit.symbol,
                    hit.volatility_pct,
                    hit.last_close,
                    hit.moving_average
                );
            }
        }
    }
    Ok(())
}

fn print_report(report: &SignalReport, json: bool) -> Result<(), Box<dyn Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    if let Some(reason) = &report.premium_error {
        warn!(%reason, "real-time feed unavailable; showing delayed data");
        println!("! real-time feed unavailable ({reason}); showing delayed data");
    }

    let signal = &report.signal;
    let feed = if report.is_realtime() { "real-time" } else { "delayed" };
    println!(
        "{} {}  [{} via {}{}]",
        report.bars.symbol,
        report.bars.timeframe,
        feed,
        report.provider,
        if report.stitched { ", quote stitched" } else { "" }
    );
    println!(
        "  price {:.2} ({:+.2}% vs prior close {:.2})  trend {:?}",
        signal.current_price,
        signal.pct_change * 100.0,
        report.context.prior_close,
        report.context.trend
    );
    if let Some(last) = report.bars.last() {
        println!("  last bar {}", last.local_timestamp(VENUE_TZ).format("%H:%M"));
    }
    match report.vwap.last() {
        Some(v) => println!("  vwap {v:.2}"),
        None => println!("  vwap n/a"),
    }
    println!(
        "  sentiment {}  strategy {}  status: {}",
        report.sentiment,
        signal.strategy.label(),
        signal.status_label
    );
    if let Some(entry) = signal.entry {
        let at = entry.timestamp.with_timezone(&VENUE_TZ);
        println!("  entry {:.2} at {}", entry.price, at.format("%H:%M"));
    }
    if let Some(exit) = signal.exit {
        let at = exit.timestamp.with_timezone(&VENUE_TZ);
        println!("  exit  {:.2} at {}", exit.price, at.format("%H:%M"));
    }
    Ok(())
}
