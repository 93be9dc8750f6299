//! Data models for scraped articles, sentiment scores and ticker reports.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: The news sites articles are scraped from
//! - [`ArticleRecord`]: One normalized news item, optionally scored
//! - [`SentimentScore`]: Output of a single sentiment scorer
//! - [`AnalysisRequest`]: A validated request coming from the CLI
//! - [`TickerSummary`] and [`Report`]: Derived per-run results

use crate::error::RequestError;
use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;

/// Headlines shorter than this are discarded during extraction.
pub const MIN_HEADLINE_LEN: usize = 10;

/// Sentinel for a record whose source shows no usable date.
pub const DATE_UNKNOWN: &str = "N/A";

/// Sentinel used by sources that list items without a timestamp.
pub const DATE_RECENT: &str = "Recent";

pub const MAX_TICKERS: usize = 30;
pub const MAX_ARTICLES_PER_SOURCE: usize = 10;
pub const MIN_CACHE_TTL_MINUTES: u32 = 5;
pub const MAX_CACHE_TTL_MINUTES: u32 = 60;

/// A news source that can be scraped for ticker news.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, clap::ValueEnum)]
pub enum Source {
    #[value(name = "finviz")]
    Finviz,
    #[value(name = "yahoo")]
    YahooFinance,
    #[value(name = "google-news")]
    GoogleNews,
}

impl Source {
    /// Canonical order, used to merge concurrent results deterministically.
    pub const ALL: [Source; 3] = [Source::Finviz, Source::YahooFinance, Source::GoogleNews];

    /// Human-readable name, as shown in reports.
    pub fn display_name(self) -> &'static str {
        match self {
            Source::Finviz => "Finviz",
            Source::YahooFinance => "Yahoo Finance",
            Source::GoogleNews => "Google News",
        }
    }

    /// Position in [`Source::ALL`].
    pub fn ordinal(self) -> usize {
        match self {
            Source::Finviz => 0,
            Source::YahooFinance => 1,
            Source::GoogleNews => 2,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Polarity label shared by both scorers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Label for a class index of the 3-way classifier output.
    pub fn from_class_index(idx: usize) -> Option<Self> {
        match idx {
            0 => Some(SentimentLabel::Positive),
            1 => Some(SentimentLabel::Negative),
            2 => Some(SentimentLabel::Neutral),
            _ => None,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        })
    }
}

/// Positive/negative/neutral breakdown reported alongside a label.
///
/// For the lexicon scorer these are the proportions of the text carrying each
/// polarity; for the classifier they are class probabilities summing to 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Distribution {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl Distribution {
    /// Index of the largest component, in `[positive, negative, neutral]`
    /// order. Ties resolve to the earlier index.
    pub fn argmax(&self) -> usize {
        let parts = [self.positive, self.negative, self.neutral];
        let mut best = 0;
        for (i, p) in parts.iter().enumerate().skip(1) {
            if *p > parts[best] {
                best = i;
            }
        }
        best
    }

    pub fn max(&self) -> f64 {
        self.positive.max(self.negative).max(self.neutral)
    }
}

/// Result of scoring one piece of text.
///
/// `score` is the scorer's primary metric: the signed compound polarity for
/// the lexicon scorer, the winning class probability for the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distribution: Option<Distribution>,
}

impl SentimentScore {
    /// The score for blank input and for any internal scorer failure.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            score: 0.0,
            distribution: None,
        }
    }
}

/// One discovered news item.
///
/// A record is only ever built with a headline of at least
/// [`MIN_HEADLINE_LEN`] characters; everything else may be empty or a sentinel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArticleRecord {
    pub source: Source,
    pub headline: String,
    /// Display string as shown by the source; never parsed.
    pub published_at: String,
    /// Absolute HTTP(S) URL, or empty when the item is not linkable.
    pub url: String,
    /// Extracted body text, empty when not fetched or extraction failed.
    pub content: String,
    /// Attached during aggregation.
    pub ticker: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lexicon_sentiment: Option<SentimentScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classifier_sentiment: Option<SentimentScore>,
}

impl ArticleRecord {
    pub fn new(source: Source, headline: String, published_at: String, url: String) -> Self {
        Self {
            source,
            headline,
            published_at,
            url,
            content: String::new(),
            ticker: String::new(),
            lexicon_sentiment: None,
            classifier_sentiment: None,
        }
    }
}

/// Which text of an article sentiment is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
pub enum AnalysisMode {
    /// Score the headline only.
    #[value(name = "headlines")]
    HeadlinesOnly,
    /// Score the extracted body, falling back to the headline when there is none.
    #[value(name = "content")]
    FullContent,
    /// Score headline and body concatenated, as a single text.
    #[value(name = "both")]
    Both,
}

impl AnalysisMode {
    pub fn text_for(self, article: &ArticleRecord) -> String {
        match self {
            AnalysisMode::HeadlinesOnly => article.headline.clone(),
            AnalysisMode::FullContent if article.content.trim().is_empty() => {
                article.headline.clone()
            }
            AnalysisMode::FullContent => article.content.clone(),
            AnalysisMode::Both => format!("{} {}", article.headline, article.content)
                .trim()
                .to_string(),
        }
    }
}

/// A validated request for one report run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisRequest {
    pub tickers: Vec<String>,
    pub sources: Vec<Source>,
    pub articles_per_source: usize,
    pub analysis_mode: AnalysisMode,
    pub cache_ttl_minutes: u32,
}

impl AnalysisRequest {
    /// Validate request ranges. Tickers are expected to be normalized and
    /// pattern-checked already; duplicates are dropped here, keeping the
    /// first occurrence. Sources are put in canonical order.
    pub fn new(
        tickers: Vec<String>,
        sources: Vec<Source>,
        articles_per_source: usize,
        analysis_mode: AnalysisMode,
        cache_ttl_minutes: u32,
    ) -> Result<Self, RequestError> {
        use itertools::Itertools;

        let tickers: Vec<String> = tickers.into_iter().unique().collect();
        if tickers.is_empty() || tickers.len() > MAX_TICKERS {
            return Err(RequestError::TickerCount {
                got: tickers.len(),
                max: MAX_TICKERS,
            });
        }
        if !(1..=MAX_ARTICLES_PER_SOURCE).contains(&articles_per_source) {
            return Err(RequestError::ArticleCount {
                got: articles_per_source,
                max: MAX_ARTICLES_PER_SOURCE,
            });
        }
        if !(MIN_CACHE_TTL_MINUTES..=MAX_CACHE_TTL_MINUTES).contains(&cache_ttl_minutes) {
            return Err(RequestError::CacheTtl {
                got: cache_ttl_minutes,
                min: MIN_CACHE_TTL_MINUTES,
                max: MAX_CACHE_TTL_MINUTES,
            });
        }
        let sources: Vec<Source> = sources.into_iter().unique().sorted().collect();
        if sources.is_empty() {
            return Err(RequestError::NoSources);
        }

        Ok(Self {
            tickers,
            sources,
            articles_per_source,
            analysis_mode,
            cache_ttl_minutes,
        })
    }
}

/// Label tallies and positive/negative ratio for one scorer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SentimentTally {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// `positive / negative`; `+inf` when only positives exist, `0` when
    /// there are no positives.
    #[serde(serialize_with = "serialize_ratio")]
    pub ratio: f64,
}

/// Per-ticker summary row, recomputed on every run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSummary {
    pub ticker: String,
    pub total_articles: usize,
    pub lexicon: SentimentTally,
    pub classifier: SentimentTally,
}

/// How far short of the request a ticker came, and why.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TickerDiagnostics {
    pub ticker: String,
    pub requested: usize,
    pub returned: usize,
    pub fetch_failures: usize,
    pub extraction_failures: usize,
    pub cache_hits: usize,
}

/// Everything one run produces, for rendering or export by the caller.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub request: AnalysisRequest,
    pub summaries: Vec<TickerSummary>,
    pub articles: Vec<ArticleRecord>,
    pub diagnostics: Vec<TickerDiagnostics>,
}

/// JSON has no infinity; `+inf` goes out as the string `"inf"`.
fn serialize_ratio<S: Serializer>(ratio: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if ratio.is_infinite() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_f64(*ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(headline: &str, content: &str) -> ArticleRecord {
        let mut a = ArticleRecord::new(
            Source::Finviz,
            headline.to_string(),
            DATE_UNKNOWN.to_string(),
            String::new(),
        );
        a.content = content.to_string();
        a
    }

    #[test]
    fn test_analysis_mode_text_selection() {
        let a = article("Apple beats estimates", "Revenue rose sharply.");
        assert_eq!(AnalysisMode::HeadlinesOnly.text_for(&a), "Apple beats estimates");
        assert_eq!(AnalysisMode::FullContent.text_for(&a), "Revenue rose sharply.");
        assert_eq!(
            AnalysisMode::Both.text_for(&a),
            "Apple beats estimates Revenue rose sharply."
        );
    }

    #[test]
    fn test_full_content_falls_back_to_headline() {
        let a = article("Apple beats estimates", "");
        assert_eq!(AnalysisMode::FullContent.text_for(&a), "Apple beats estimates");
        assert_eq!(AnalysisMode::Both.text_for(&a), "Apple beats estimates");
    }

    #[test]
    fn test_request_dedupes_and_orders_sources() {
        let req = AnalysisRequest::new(
            vec!["AAPL".into(), "MSFT".into(), "AAPL".into()],
            vec![Source::GoogleNews, Source::Finviz, Source::GoogleNews],
            3,
            AnalysisMode::HeadlinesOnly,
            10,
        )
        .unwrap();
        assert_eq!(req.tickers, vec!["AAPL", "MSFT"]);
        assert_eq!(req.sources, vec![Source::Finviz, Source::GoogleNews]);
    }

    #[test]
    fn test_request_rejects_out_of_range_fields() {
        let mode = AnalysisMode::HeadlinesOnly;
        assert!(matches!(
            AnalysisRequest::new(vec![], vec![Source::Finviz], 3, mode, 10),
            Err(RequestError::TickerCount { got: 0, .. })
        ));
        let many: Vec<String> = (0..31).map(|i| format!("T{i}")).collect();
        assert!(matches!(
            AnalysisRequest::new(many, vec![Source::Finviz], 3, mode, 10),
            Err(RequestError::TickerCount { got: 31, .. })
        ));
        assert!(matches!(
            AnalysisRequest::new(vec!["AAPL".into()], vec![Source::Finviz], 11, mode, 10),
            Err(RequestError::ArticleCount { got: 11, .. })
        ));
        assert!(matches!(
            AnalysisRequest::new(vec!["AAPL".into()], vec![Source::Finviz], 0, mode, 10),
            Err(RequestError::ArticleCount { got: 0, .. })
        ));
        assert!(matches!(
            AnalysisRequest::new(vec!["AAPL".into()], vec![Source::Finviz], 3, mode, 4),
            Err(RequestError::CacheTtl { got: 4, .. })
        ));
        assert_eq!(
            AnalysisRequest::new(vec!["AAPL".into()], vec![], 3, mode, 10),
            Err(RequestError::NoSources)
        );
    }

    #[test]
    fn test_label_from_class_index() {
        assert_eq!(SentimentLabel::from_class_index(0), Some(SentimentLabel::Positive));
        assert_eq!(SentimentLabel::from_class_index(1), Some(SentimentLabel::Negative));
        assert_eq!(SentimentLabel::from_class_index(2), Some(SentimentLabel::Neutral));
        assert_eq!(SentimentLabel::from_class_index(3), None);
    }

    #[test]
    fn test_distribution_argmax_prefers_first_on_tie() {
        let d = Distribution {
            positive: 0.4,
            negative: 0.4,
            neutral: 0.2,
        };
        assert_eq!(d.argmax(), 0);
        assert_eq!(d.max(), 0.4);
    }

    #[test]
    fn test_infinite_ratio_serializes_as_string() {
        let tally = SentimentTally {
            positive: 2,
            negative: 0,
            neutral: 1,
            ratio: f64::INFINITY,
        };
        let json = serde_json::to_value(tally).unwrap();
        assert_eq!(json["ratio"], "inf");

        let finite = SentimentTally {
            ratio: 1.5,
            ..tally
        };
        assert_eq!(serde_json::to_value(finite).unwrap()["ratio"], 1.5);
    }

    #[test]
    fn test_source_display_and_order() {
        assert_eq!(Source::YahooFinance.to_string(), "Yahoo Finance");
        for (i, s) in Source::ALL.iter().enumerate() {
            assert_eq!(s.ordinal(), i);
        }
    }
}
