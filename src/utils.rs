//! Utility functions for text cleanup, ticker parsing, display formatting and
//! file system checks.
//!
//! This module provides helper functions used throughout the application:
//! - Whitespace collapsing and character-bounded truncation of scraped text
//! - Ticker symbol normalization and validation for the CLI
//! - Ratio formatting for report display
//! - File system validation for output directories

use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument, warn};

static TICKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9.\-]{1,5}$").expect("valid ticker regex"));

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().join(" ")
}

/// Keep at most `max` characters of `s`.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-character.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` characters with an ellipsis and
/// byte count indicator appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log("a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        kept
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Whether `ticker` looks like a symbol the sources understand.
pub fn is_valid_ticker(ticker: &str) -> bool {
    TICKER_RE.is_match(ticker)
}

/// Split raw user input into uppercase, de-duplicated, valid tickers.
///
/// Accepts comma and/or whitespace separated symbols. Invalid symbols are
/// logged and dropped; the first `limit` valid symbols are kept in input order.
pub fn parse_tickers(raw: &str, limit: usize) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|t| t.trim().to_uppercase())
        .filter(|t| !t.is_empty())
        .filter(|t| {
            let ok = is_valid_ticker(t);
            if !ok {
                warn!(ticker = %t, "Ignoring invalid ticker symbol");
            }
            ok
        })
        .unique()
        .take(limit)
        .collect()
}

/// Render a positive/negative ratio for display: `∞` or two decimals.
pub fn format_ratio(ratio: f64) -> String {
    if ratio.is_infinite() {
        "∞".to_string()
    } else {
        format!("{ratio:.2}")
    }
}

/// Ensure a directory exists and is writable.
///
/// This function creates the directory if it doesn't exist, then performs
/// a write test by creating and immediately deleting a scratch file.
///
/// # Errors
///
/// Returns an error if:
/// - The directory cannot be created
/// - The directory is not writable (permission denied, read-only filesystem, etc.)
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let scratch_path = format!("{}/..__write_check__", path.trim_end_matches('/'));
    match stdfs::File::create(&scratch_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&scratch_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}
