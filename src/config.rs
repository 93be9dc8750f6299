//! Runtime configuration loaded from an optional YAML file.
//!
//! Every field has a default, so a partial file (or no file at all) yields a
//! working configuration pointed at the real news sites.
//!
//! ```yaml
//! user_agent: "Mozilla/5.0 ..."
//! page_timeout_secs: 10
//! article_timeout_secs: 5
//! politeness_delay_ms: 500
//! max_concurrency: 4
//! endpoints:
//!   finviz: https://finviz.com
//! classifier_weights: ./weights.tsv
//! ```

use crate::error::ConfigError;
use crate::extract::DEFAULT_MAX_LENGTH;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// Browser identity sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub user_agent: String,
    /// Timeout for a source's listing page.
    pub page_timeout_secs: u64,
    /// Timeout for a single article page fetched for its body text.
    pub article_timeout_secs: u64,
    /// Maximum characters of extracted body text kept per article.
    pub content_max_length: usize,
    /// Minimum gap between two listing requests to the same source.
    pub politeness_delay_ms: u64,
    /// How many (ticker, source) scrapes run at once.
    pub max_concurrency: usize,
    pub endpoints: Endpoints,
    /// Optional TSV weights for the classifier; the built-in table is used otherwise.
    pub classifier_weights: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_timeout_secs: 10,
            article_timeout_secs: 5,
            content_max_length: DEFAULT_MAX_LENGTH,
            politeness_delay_ms: 500,
            max_concurrency: 4,
            endpoints: Endpoints::default(),
            classifier_weights: None,
        }
    }
}

impl Settings {
    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn article_timeout(&self) -> Duration {
        Duration::from_secs(self.article_timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn from_yaml(yaml: &str, path: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }
}

/// Base origins of the scraped sites.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub finviz: Url,
    pub yahoo: Url,
    pub google_news: Url,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            finviz: Url::parse("https://finviz.com").expect("static URL"),
            yahoo: Url::parse("https://finance.yahoo.com").expect("static URL"),
            google_news: Url::parse("https://news.google.com").expect("static URL"),
        }
    }
}

#[cfg(test)]
impl Endpoints {
    /// Point every source at the same origin.
    pub fn all_at(base: &Url) -> Self {
        Self {
            finviz: base.clone(),
            yahoo: base.clone(),
            google_news: base.clone(),
        }
    }
}

/// Load settings from `path`, or defaults when no path is given.
#[instrument(level = "info")]
pub async fn load_settings(path: Option<&str>) -> Result<Settings, ConfigError> {
    let Some(path) = path else {
        info!("No config file given; using defaults");
        return Ok(Settings::default());
    };

    let yaml = fs::read_to_string(path)
        .await
        .map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
    let settings = Settings::from_yaml(&yaml, path)?;
    info!(path, max_concurrency = settings.max_concurrency, "Loaded configuration");
    Ok(settings)
}
