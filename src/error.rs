//! Error types for fetching, extraction, scoring and request validation.
//!
//! Nothing here is allowed to abort a batch. Fetch and extraction errors are
//! turned into "fewer results" by the scrapers, and model errors are turned
//! into a neutral score by the classifier. The only errors that reach `main`
//! are bad configuration and rejected requests at startup.

use thiserror::Error;

/// Failure of a single HTTP GET.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Connection, DNS, timeout or body read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-2xx status.
    #[error("unexpected HTTP status {0}")]
    HttpStatus(u16),
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) if !status.is_success() => FetchError::HttpStatus(status.as_u16()),
            _ => FetchError::Network(e.to_string()),
        }
    }
}

/// Why one row/item of a listing page could not become an article.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionFailure {
    /// An element the source's layout relies on was absent.
    #[error("missing element `{0}`")]
    MissingElement(&'static str),

    /// The item's link was empty, a placeholder, or not HTTP(S).
    #[error("unusable link `{0}`")]
    UnusableLink(String),

    /// The headline was shorter than the minimum length.
    #[error("headline too short ({0} chars)")]
    HeadlineTooShort(usize),
}

/// Internal failure of a sentiment model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("model failure: {0}")]
pub struct ModelFailure(pub String);

/// Rejected analysis request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("expected between 1 and {max} tickers, got {got}")]
    TickerCount { got: usize, max: usize },

    #[error("articles per source must be between 1 and {max}, got {got}")]
    ArticleCount { got: usize, max: usize },

    #[error("cache TTL must be between {min} and {max} minutes, got {got}")]
    CacheTtl { got: u32, min: u32, max: u32 },

    #[error("at least one news source must be selected")]
    NoSources,
}

/// Configuration file could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config `{path}`: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}
