//! Yahoo Finance quote page scraper.
//!
//! Yahoo's markup changes often, so the quote page is parsed with an ordered
//! list of [`Strategy`]s. The first strategy that finds anything wins:
//!
//! 1. Known news container selectors, each tried in turn. The first selector
//!    with matches is used and later ones are not tried. Up to twice the
//!    requested count of containers is kept to absorb bad items.
//! 2. A fallback scan of heading tags that contain a link.
//!
//! Linked articles are fetched for their body text.

use super::{
    Listing, ScrapeContext, ScrapeOutcome, element_text, enrich_with_content, fetch_listing,
    headline, listing_url, resolve_link, selector,
};
use crate::error::ExtractionFailure;
use crate::models::{ArticleRecord, DATE_RECENT, Source};
use crate::utils::truncate_for_log;
use scraper::{ElementRef, Html};
use tracing::{debug, info, instrument};
use url::Url;

type Items = Vec<Result<ArticleRecord, ExtractionFailure>>;

/// One way of finding news items on the quote page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Each element matching the selector is one news item.
    Containers(&'static str),
    /// Any heading with a link in it is a news item.
    Headings,
}

pub const STRATEGIES: [Strategy; 5] = [
    Strategy::Containers(r#"div[data-test="news-stream"]"#),
    Strategy::Containers("div.stream-items"),
    Strategy::Containers(r"div.Mb\(20px\)"),
    Strategy::Containers("li.js-stream-content"),
    Strategy::Headings,
];

impl Strategy {
    /// `None` when the strategy found nothing on this page.
    fn run(&self, document: &Html, base: &Url, max_articles: usize) -> Option<Items> {
        let buffer = max_articles * 2;
        let items: Items = match self {
            Strategy::Containers(css) => {
                let sel = selector(css)?;
                document
                    .select(&sel)
                    .take(buffer)
                    .map(|c| parse_container(c, base))
                    .collect()
            }
            Strategy::Headings => {
                let (heading_sel, link_sel) = (selector("h2, h3")?, selector("a[href]")?);
                document
                    .select(&heading_sel)
                    .filter(|h| h.select(&link_sel).next().is_some())
                    .take(buffer)
                    .map(|h| parse_heading(h, base))
                    .collect()
            }
        };
        (!items.is_empty()).then_some(items)
    }
}

/// Scrape the Yahoo Finance quote page for `ticker`.
#[instrument(level = "info", skip(ctx))]
pub async fn scrape(ctx: &ScrapeContext, ticker: &str, max_articles: usize) -> ScrapeOutcome {
    let base = ctx.base_url(Source::YahooFinance);
    let Some(url) = listing_url(base, &format!("/quote/{}", urlencoding::encode(ticker))) else {
        return ScrapeOutcome::fetch_failure();
    };

    let html = match fetch_listing(ctx, Source::YahooFinance, &url).await {
        Ok(html) => html,
        Err(_) => return ScrapeOutcome::fetch_failure(),
    };

    let mut listing = parse_quote_page(&html, base, max_articles);
    enrich_with_content(ctx, &mut listing.articles).await;

    info!(
        count = listing.articles.len(),
        failures = listing.failures,
        "Scraped Yahoo Finance news"
    );
    listing.into_outcome()
}

/// Parse a Yahoo Finance quote page into at most `max_articles` records.
pub fn parse_quote_page(html: &str, base: &Url, max_articles: usize) -> Listing {
    let document = Html::parse_document(html);
    for strategy in STRATEGIES {
        if let Some(items) = strategy.run(&document, base, max_articles) {
            debug!(?strategy, items = items.len(), "Yahoo strategy matched");
            return Listing::collect(items, max_articles);
        }
    }
    debug!(page = %truncate_for_log(html, 200), "No Yahoo strategy matched");
    Listing::default()
}

fn parse_container(container: ElementRef, base: &Url) -> Result<ArticleRecord, ExtractionFailure> {
    let link_sel = selector("a").ok_or(ExtractionFailure::MissingElement("a"))?;
    let link = container
        .select(&link_sel)
        .next()
        .ok_or(ExtractionFailure::MissingElement("a"))?;
    let published_at = time_text(container).unwrap_or_else(|| DATE_RECENT.to_string());
    link_record(link, published_at, base)
}

fn parse_heading(heading: ElementRef, base: &Url) -> Result<ArticleRecord, ExtractionFailure> {
    let link_sel = selector("a[href]").ok_or(ExtractionFailure::MissingElement("a"))?;
    let link = heading
        .select(&link_sel)
        .next()
        .ok_or(ExtractionFailure::MissingElement("a"))?;
    // The timestamp usually sits next to the heading, not inside it.
    let published_at = heading
        .parent()
        .and_then(ElementRef::wrap)
        .and_then(time_text)
        .unwrap_or_else(|| DATE_RECENT.to_string());
    link_record(link, published_at, base)
}

/// Build a record from a news link; Yahoo items without a usable link are dropped.
fn link_record(
    link: ElementRef,
    published_at: String,
    base: &Url,
) -> Result<ArticleRecord, ExtractionFailure> {
    let title = headline(element_text(link))?;
    let href = link.value().attr("href").unwrap_or_default();
    let url = resolve_link(base, href)?;
    Ok(ArticleRecord::new(Source::YahooFinance, title, published_at, url))
}

fn time_text(scope: ElementRef) -> Option<String> {
    let time_sel = selector("time")?;
    scope
        .select(&time_sel)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}
