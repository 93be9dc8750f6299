//! # Ticker Sentiment
//!
//! A news aggregation and sentiment pipeline for stock tickers. It scrapes
//! recent headlines (and optionally article bodies) from financial news
//! sources, scores each one with two independent sentiment models, and ranks
//! tickers by their positive-to-negative ratio.
//!
//! ## Features
//!
//! - Scrapes Finviz, Yahoo Finance and Google News per ticker
//! - Extracts readable body text from linked article pages
//! - Scores text with a rule-based lexicon scorer and a finance-tuned
//!   classifier
//! - Caches scraped articles in fixed time windows so repeated runs stay off
//!   the network
//! - Writes a timestamped JSON report, or prints it to stdout
//!
//! ## Usage
//!
//! ```sh
//! ticker_sentiment -t AAPL,MSFT -s finviz,yahoo -n 5 -a both -j ./reports
//! ```
//!
//! ## Architecture
//!
//! 1. **Scraping**: one unit of work per (ticker, source), run concurrently
//!    through the cache
//! 2. **Scoring**: lexicon and classifier scores per article
//! 3. **Aggregation**: per-ticker tallies ranked by classifier ratio
//! 4. **Output**: JSON report

use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod cache;
mod cli;
mod config;
mod error;
mod extract;
mod fetch;
mod models;
mod outputs;
mod pipeline;
mod scrapers;
mod sentiment;
mod throttle;
mod utils;

use cli::Cli;
use models::{AnalysisRequest, MAX_TICKERS};
use outputs::json;
use pipeline::Pipeline;
use utils::{ensure_writable_dir, format_ratio, parse_tickers};

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ticker_sentiment starting up");

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let settings = config::load_settings(args.config.as_deref()).await?;

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let tickers = parse_tickers(&args.tickers, MAX_TICKERS);
    let request = AnalysisRequest::new(
        tickers,
        args.sources,
        usize::from(args.articles),
        args.analysis_mode,
        args.cache_ttl,
    )?;
    info!(
        tickers = ?request.tickers,
        sources = ?request.sources,
        articles_per_source = request.articles_per_source,
        mode = ?request.analysis_mode,
        "Validated request"
    );

    let pipeline = Pipeline::new(settings)?;
    let report = pipeline.run(&request).await;

    for summary in &report.summaries {
        info!(
            ticker = %summary.ticker,
            articles = summary.total_articles,
            lexicon_ratio = %format_ratio(summary.lexicon.ratio),
            classifier_ratio = %format_ratio(summary.classifier.ratio),
            "Ticker sentiment"
        );
    }

    match &args.json_output_dir {
        Some(dir) => {
            if let Err(e) = json::write_report(&report, dir).await {
                error!(error = %e, "Failed to write JSON report");
                return Err(e);
            }
        }
        None => println!("{}", json::report_to_json(&report)?),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
