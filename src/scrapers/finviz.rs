//! Finviz quote page scraper.
//!
//! Finviz lists a ticker's news in a single table (`#news-table`) on
//! `quote.ashx?t=TICKER`. Each row holds a date cell aligned right and a
//! `tab-link-news` anchor. Every linked article is fetched once more to
//! extract its body text.

use super::{
    ScrapeContext, ScrapeOutcome, Listing, element_text, enrich_with_content, fetch_listing,
    headline, listing_url, resolve_link, selector,
};
use crate::error::ExtractionFailure;
use crate::models::{ArticleRecord, DATE_UNKNOWN, Source};
use crate::utils::truncate_for_log;
use scraper::{ElementRef, Html};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Scrape the Finviz news table for `ticker`.
#[instrument(level = "info", skip(ctx))]
pub async fn scrape(ctx: &ScrapeContext, ticker: &str, max_articles: usize) -> ScrapeOutcome {
    let base = ctx.base_url(Source::Finviz);
    let Some(url) = listing_url(base, &format!("/quote.ashx?t={}", urlencoding::encode(ticker)))
    else {
        return ScrapeOutcome::fetch_failure();
    };

    let html = match fetch_listing(ctx, Source::Finviz, &url).await {
        Ok(html) => html,
        Err(_) => return ScrapeOutcome::fetch_failure(),
    };

    // Html is not Send; parse fully before the next await.
    let mut listing = parse_news_table(&html, base, max_articles);
    enrich_with_content(ctx, &mut listing.articles).await;

    info!(
        count = listing.articles.len(),
        failures = listing.failures,
        "Scraped Finviz news"
    );
    listing.into_outcome()
}

/// Parse the news table of a Finviz quote page.
///
/// Only the first `max_articles` rows are looked at; a bad row is skipped
/// without affecting the rest.
pub fn parse_news_table(html: &str, base: &Url, max_articles: usize) -> Listing {
    let document = Html::parse_document(html);
    let (Some(table_sel), Some(row_sel)) = (selector("table#news-table"), selector("tr")) else {
        return Listing::default();
    };

    let Some(table) = document.select(&table_sel).next() else {
        warn!(page = %truncate_for_log(html, 200), "Finviz news table not found");
        return Listing {
            articles: Vec::new(),
            failures: 1,
        };
    };

    let rows: Vec<_> = table
        .select(&row_sel)
        .take(max_articles)
        .map(|row| parse_row(row, base))
        .collect();
    debug!(rows = rows.len(), "Parsed Finviz rows");
    Listing::collect(rows, max_articles)
}

fn parse_row(row: ElementRef, base: &Url) -> Result<ArticleRecord, ExtractionFailure> {
    let (Some(date_sel), Some(link_sel)) = (selector(r#"td[align="right"]"#), selector("a.tab-link-news"))
    else {
        return Err(ExtractionFailure::MissingElement("a.tab-link-news"));
    };

    let published_at = row
        .select(&date_sel)
        .next()
        .map(element_text)
        .filter(|d| !d.is_empty())
        .unwrap_or_else(|| DATE_UNKNOWN.to_string());

    let link = row
        .select(&link_sel)
        .next()
        .ok_or(ExtractionFailure::MissingElement("a.tab-link-news"))?;
    let title = headline(element_text(link))?;
    let url = link
        .value()
        .attr("href")
        .and_then(|href| resolve_link(base, href).ok())
        .unwrap_or_default();

    Ok(ArticleRecord::new(Source::Finviz, title, published_at, url))
}
