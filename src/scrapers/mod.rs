//! News source scrapers for finding ticker news on various sites.
//!
//! Each scraper follows the same two-phase pattern:
//!
//! 1. **Listing**: Fetch the source's page for a ticker and turn its markup
//!    into [`ArticleRecord`]s with a pure `parse_*` function
//! 2. **Enrichment**: Optionally fetch each article and extract its body text
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Body text |
//! |--------|--------|--------|-----------|
//! | Finviz | [`finviz`] | Quote page news table | Yes |
//! | Yahoo Finance | [`yahoo`] | Container selectors, heading fallback | Yes |
//! | Google News | [`google_news`] | Search result `<article>` blocks | No |
//!
//! # Failure Handling
//!
//! Scrapers never return errors. A failed page fetch yields an empty
//! [`ScrapeOutcome`] with `fetch_failed` set; a row or item that cannot be
//! turned into a record is counted in `extraction_failures` and skipped.
//! All markup assumptions stay inside the owning module.

pub mod finviz;
pub mod google_news;
pub mod yahoo;

use crate::config::Settings;
use crate::error::{ExtractionFailure, FetchError};
use crate::extract::fetch_article_content;
use crate::fetch::Fetcher;
use crate::models::{ArticleRecord, MIN_HEADLINE_LEN, Source};
use crate::utils::collapse_whitespace;
use scraper::{ElementRef, Selector};
use tracing::{debug, instrument, warn};
use url::Url;

/// Shared handles every scraper needs.
#[derive(Debug, Clone)]
pub struct ScrapeContext {
    pub fetcher: Fetcher,
    pub settings: Settings,
}

impl ScrapeContext {
    pub fn new(fetcher: Fetcher, settings: Settings) -> Self {
        Self { fetcher, settings }
    }

    pub fn base_url(&self, source: Source) -> &Url {
        let endpoints = &self.settings.endpoints;
        match source {
            Source::Finviz => &endpoints.finviz,
            Source::YahooFinance => &endpoints.yahoo,
            Source::GoogleNews => &endpoints.google_news,
        }
    }
}

/// What one (ticker, source) scrape produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScrapeOutcome {
    pub articles: Vec<ArticleRecord>,
    pub extraction_failures: usize,
    pub fetch_failed: bool,
}

impl ScrapeOutcome {
    fn fetch_failure() -> Self {
        Self {
            fetch_failed: true,
            ..Self::default()
        }
    }
}

/// Records parsed from one listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Listing {
    pub articles: Vec<ArticleRecord>,
    pub failures: usize,
}

impl Listing {
    /// Keep the first `max` successful items and count the failures seen
    /// before the cap was reached.
    pub fn collect(
        items: impl IntoIterator<Item = Result<ArticleRecord, ExtractionFailure>>,
        max: usize,
    ) -> Self {
        let mut listing = Listing::default();
        for item in items {
            if listing.articles.len() >= max {
                break;
            }
            match item {
                Ok(article) => listing.articles.push(article),
                Err(e) => {
                    debug!(error = %e, "Skipping item");
                    listing.failures += 1;
                }
            }
        }
        listing
    }

    fn into_outcome(self) -> ScrapeOutcome {
        ScrapeOutcome {
            articles: self.articles,
            extraction_failures: self.failures,
            fetch_failed: false,
        }
    }
}

/// Scrape `source` for up to `max_articles` records about `ticker`.
pub async fn scrape(
    ctx: &ScrapeContext,
    source: Source,
    ticker: &str,
    max_articles: usize,
) -> ScrapeOutcome {
    match source {
        Source::Finviz => finviz::scrape(ctx, ticker, max_articles).await,
        Source::YahooFinance => yahoo::scrape(ctx, ticker, max_articles).await,
        Source::GoogleNews => google_news::scrape(ctx, ticker, max_articles).await,
    }
}

/// Fetch a listing page with the page timeout, logging failures.
#[instrument(level = "info", skip(ctx), fields(%source))]
async fn fetch_listing(ctx: &ScrapeContext, source: Source, url: &str) -> Result<String, FetchError> {
    let res = ctx.fetcher.fetch(url, ctx.settings.page_timeout()).await;
    if let Err(e) = &res {
        warn!(%url, error = %e, "Listing fetch failed");
    }
    res
}

/// Build a listing URL from the source origin and an origin-relative path.
fn listing_url(base: &Url, path_and_query: &str) -> Option<String> {
    base.join(path_and_query).ok().map(String::from)
}

/// Fill in `content` for every linkable article, one fetch each.
async fn enrich_with_content(ctx: &ScrapeContext, articles: &mut [ArticleRecord]) {
    for article in articles.iter_mut().filter(|a| !a.url.is_empty()) {
        article.content = fetch_article_content(
            &ctx.fetcher,
            &article.url,
            ctx.settings.article_timeout(),
            ctx.settings.content_max_length,
        )
        .await;
    }
}

/// Parse a selector that is known at compile time. Failures are logged and
/// treated as "matches nothing".
fn selector(css: &str) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!(css, error = ?e, "Invalid selector");
            None
        }
    }
}

/// Whitespace-collapsed text of an element.
fn element_text(el: ElementRef) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Validate a headline against the minimum length.
fn headline(text: String) -> Result<String, ExtractionFailure> {
    let len = text.chars().count();
    if len < MIN_HEADLINE_LEN {
        Err(ExtractionFailure::HeadlineTooShort(len))
    } else {
        Ok(text)
    }
}

/// Turn an `href` into an absolute HTTP(S) URL.
///
/// Absolute `http(s)` links pass through, root-relative (`/x`) and
/// dot-relative (`./x`) links are resolved against the source origin.
/// Empty, placeholder (`#`) and any other links are unusable.
fn resolve_link(base: &Url, href: &str) -> Result<String, ExtractionFailure> {
    let href = href.trim();
    let unusable = || ExtractionFailure::UnusableLink(href.to_string());

    let resolved = if href.starts_with("http://") || href.starts_with("https://") {
        Url::parse(href).map_err(|_| unusable())?
    } else if href.starts_with('/') && !href.starts_with("//") {
        base.join(href).map_err(|_| unusable())?
    } else if let Some(rest) = href.strip_prefix("./") {
        base.join(&format!("/{rest}")).map_err(|_| unusable())?
    } else {
        return Err(unusable());
    };

    match resolved.scheme() {
        "http" | "https" => Ok(resolved.into()),
        _ => Err(unusable()),
    }
}
