//! Google News search page scraper.
//!
//! Searches `"{TICKER} stock news"` and reads the `<article>` blocks of the
//! result page. Result links are usually dot-relative (`./articles/...`) and
//! are rewritten onto the Google News origin. Items whose link cannot be made
//! absolute are still reported, just without a URL.
//!
//! Article bodies are not fetched: result links redirect through Google and
//! the targets are too varied to extract reliably.

use super::{
    Listing, ScrapeContext, ScrapeOutcome, element_text, fetch_listing, headline, listing_url,
    resolve_link, selector,
};
use crate::error::ExtractionFailure;
use crate::models::{ArticleRecord, DATE_RECENT, Source};
use scraper::{ElementRef, Html};
use tracing::{info, instrument};
use url::Url;

/// Scrape Google News search results for `ticker`.
#[instrument(level = "info", skip(ctx))]
pub async fn scrape(ctx: &ScrapeContext, ticker: &str, max_articles: usize) -> ScrapeOutcome {
    let base = ctx.base_url(Source::GoogleNews);
    let query = urlencoding::encode(&format!("{ticker} stock news")).into_owned();
    let Some(url) = listing_url(base, &format!("/search?q={query}&hl=en-US&gl=US&ceid=US:en"))
    else {
        return ScrapeOutcome::fetch_failure();
    };

    let html = match fetch_listing(ctx, Source::GoogleNews, &url).await {
        Ok(html) => html,
        Err(_) => return ScrapeOutcome::fetch_failure(),
    };

    let listing = parse_search_results(&html, base, max_articles);
    info!(
        count = listing.articles.len(),
        failures = listing.failures,
        "Scraped Google News results"
    );
    listing.into_outcome()
}

/// Parse up to twice `max_articles` result blocks, keeping `max_articles`.
pub fn parse_search_results(html: &str, base: &Url, max_articles: usize) -> Listing {
    let document = Html::parse_document(html);
    let Some(article_sel) = selector("article") else {
        return Listing::default();
    };

    let items: Vec<_> = document
        .select(&article_sel)
        .take(max_articles * 2)
        .map(|block| parse_block(block, base))
        .collect();
    Listing::collect(items, max_articles)
}

fn parse_block(block: ElementRef, base: &Url) -> Result<ArticleRecord, ExtractionFailure> {
    let (Some(link_sel), Some(time_sel)) = (selector("a"), selector("time")) else {
        return Err(ExtractionFailure::MissingElement("a"));
    };

    let link = block
        .select(&link_sel)
        .next()
        .ok_or(ExtractionFailure::MissingElement("a"))?;
    let title = headline(element_text(link))?;
    let url = link
        .value()
        .attr("href")
        .and_then(|href| resolve_link(base, href).ok())
        .unwrap_or_default();
    let published_at = block
        .select(&time_sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DATE_RECENT.to_string());

    Ok(ArticleRecord::new(Source::GoogleNews, title, published_at, url))
}
