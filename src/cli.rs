//! Command-line interface definitions for Ticker Sentiment.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Ranges are enforced here for a friendly error message, and again when the
//! [`AnalysisRequest`](crate::models::AnalysisRequest) is built.

use crate::models::{AnalysisMode, Source};
use clap::Parser;

/// Command-line arguments for the Ticker Sentiment application.
///
/// # Examples
///
/// ```sh
/// # Headlines from every source, five per source
/// ticker_sentiment -t AAPL,MSFT,NVDA
///
/// # Body text from Finviz only, written to ./reports
/// ticker_sentiment -t "tsla amd" -s finviz -a content -j ./reports
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Ticker symbols, separated by commas or whitespace
    #[arg(short, long)]
    pub tickers: String,

    /// News sources to query
    #[arg(
        short,
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = Source::ALL.to_vec()
    )]
    pub sources: Vec<Source>,

    /// Articles to fetch per ticker and source
    #[arg(
        short = 'n',
        long,
        default_value_t = 5,
        value_parser = clap::value_parser!(u8).range(1..=10)
    )]
    pub articles: u8,

    /// Text to run sentiment over
    #[arg(short, long, value_enum, default_value_t = AnalysisMode::HeadlinesOnly)]
    pub analysis_mode: AnalysisMode,

    /// Lifetime of cached articles in minutes
    #[arg(long, default_value_t = 10, value_parser = clap::value_parser!(u32).range(5..=60))]
    pub cache_ttl: u32,

    /// Optional path to config.yaml file
    #[arg(short, long, env = "TICKER_SENTIMENT_CONFIG")]
    pub config: Option<String>,

    /// Output directory for the JSON report; printed to stdout when omitted
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}
