//! One report run, end to end.
//!
//! 1. **Scrape**: every (ticker, source) pair is a unit of work; units run
//!    concurrently, bounded by `max_concurrency`, and read through the
//!    article cache. Only cache misses are throttled.
//! 2. **Merge**: results are put back in request order (tickers as given,
//!    sources in canonical order) regardless of completion order, and each
//!    record is tagged with its ticker.
//! 3. **Score**: both scorers run over the text the analysis mode selects.
//! 4. **Aggregate**: per-ticker tallies, ranked by classifier ratio.
//!
//! A failing unit only costs its own articles; the run always produces a
//! [`Report`].

use crate::aggregate::aggregate;
use crate::cache::{ArticleCache, CacheKey};
use crate::config::Settings;
use crate::error::FetchError;
use crate::fetch::Fetcher;
use crate::models::{AnalysisMode, AnalysisRequest, ArticleRecord, Report, Source, TickerDiagnostics};
use crate::scrapers::{self, ScrapeContext, ScrapeOutcome};
use crate::sentiment::SentimentScorer;
use crate::sentiment::classifier::ClassifierScorer;
use crate::sentiment::lexicon::LexiconScorer;
use crate::throttle::SourceThrottle;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Result of one (ticker, source) unit.
#[derive(Debug)]
struct UnitResult {
    ticker_index: usize,
    source: Source,
    outcome: ScrapeOutcome,
    cache_hit: bool,
}

pub struct Pipeline {
    ctx: ScrapeContext,
    cache: ArticleCache,
    throttle: SourceThrottle,
    lexicon: LexiconScorer,
    classifier: ClassifierScorer,
}

impl Pipeline {
    pub fn new(settings: Settings) -> Result<Self, FetchError> {
        let fetcher = Fetcher::new(&settings.user_agent)?;
        let throttle = SourceThrottle::new(settings.politeness_delay());
        let classifier = ClassifierScorer::new(settings.classifier_weights.clone());
        // Weights are read from disk here, before any scoring runs on the runtime.
        classifier.preload();
        Ok(Self {
            ctx: ScrapeContext::new(fetcher, settings),
            cache: ArticleCache::new(),
            throttle,
            lexicon: LexiconScorer::new(),
            classifier,
        })
    }

    pub async fn run(&self, request: &AnalysisRequest) -> Report {
        self.run_at(request, Utc::now()).await
    }

    #[instrument(
        level = "info",
        skip_all,
        fields(tickers = request.tickers.len(), sources = request.sources.len())
    )]
    async fn run_at(&self, request: &AnalysisRequest, now: DateTime<Utc>) -> Report {
        let start = std::time::Instant::now();
        self.cache.sweep(now);

        let ttl = Duration::from_secs(u64::from(request.cache_ttl_minutes) * 60);
        let units: Vec<(usize, Source)> = (0..request.tickers.len())
            .flat_map(|i| request.sources.iter().map(move |s| (i, *s)))
            .collect();
        info!(units = units.len(), "Scraping sources");

        let mut results: Vec<UnitResult> = stream::iter(units)
            .map(|(ticker_index, source)| {
                let ticker = &request.tickers[ticker_index];
                async move {
                    let key = CacheKey::new(ticker, source, request.articles_per_source, now);
                    let lookup = self
                        .cache
                        .get_or_fetch(key, now, ttl, || async move {
                            self.throttle.acquire(source).await;
                            scrapers::scrape(&self.ctx, source, ticker, request.articles_per_source)
                                .await
                        })
                        .await;
                    UnitResult {
                        ticker_index,
                        source,
                        outcome: lookup.outcome,
                        cache_hit: lookup.hit,
                    }
                }
            })
            .buffer_unordered(self.ctx.settings.max_concurrency.max(1))
            .collect()
            .await;

        // Completion order is arbitrary; restore request order.
        results.sort_by_key(|r| (r.ticker_index, r.source.ordinal()));

        let diagnostics = diagnose(request, &results);
        let mut articles: Vec<ArticleRecord> = results
            .into_iter()
            .flat_map(|r| {
                let ticker = request.tickers[r.ticker_index].clone();
                r.outcome.articles.into_iter().map(move |mut a| {
                    a.ticker = ticker.clone();
                    a
                })
            })
            .collect();

        self.score_all(request.analysis_mode, &mut articles);
        let summaries = aggregate(&request.tickers, &articles);

        let elapsed = start.elapsed();
        info!(
            articles = articles.len(),
            summaries = summaries.len(),
            cache_entries = self.cache.len(),
            cache_hits = self.cache.hits(),
            cache_misses = self.cache.misses(),
            ?elapsed,
            "Run complete"
        );

        Report {
            generated_at: now,
            request: request.clone(),
            summaries,
            articles,
            diagnostics,
        }
    }

    /// Attach both scores to every article.
    fn score_all(&self, mode: AnalysisMode, articles: &mut [ArticleRecord]) {
        for article in articles.iter_mut() {
            let text = mode.text_for(article);
            article.lexicon_sentiment = Some(self.lexicon.score(&text));
            article.classifier_sentiment = Some(self.classifier.score(&text));
        }
        debug!(
            count = articles.len(),
            lexicon = self.lexicon.name(),
            classifier = self.classifier.name(),
            classifier_loaded = self.classifier.is_loaded(),
            classifier_loads = self.classifier.load_count(),
            "Scored articles"
        );
    }
}

/// Per-ticker accounting of what was asked for and what came back.
fn diagnose(request: &AnalysisRequest, results: &[UnitResult]) -> Vec<TickerDiagnostics> {
    let requested = request.articles_per_source * request.sources.len();
    request
        .tickers
        .iter()
        .enumerate()
        .map(|(i, ticker)| {
            let mut d = TickerDiagnostics {
                ticker: ticker.clone(),
                requested,
                ..TickerDiagnostics::default()
            };
            for r in results.iter().filter(|r| r.ticker_index == i) {
                d.returned += r.outcome.articles.len();
                d.extraction_failures += r.outcome.extraction_failures;
                d.fetch_failures += usize::from(r.outcome.fetch_failed);
                d.cache_hits += usize::from(r.cache_hit);
            }
            if d.returned < d.requested {
                info!(
                    ticker = %d.ticker,
                    requested = d.requested,
                    returned = d.returned,
                    fetch_failures = d.fetch_failures,
                    extraction_failures = d.extraction_failures,
                    "Fewer articles than requested"
                );
            }
            d
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Endpoints;
    use crate::models::SentimentLabel;
    use chrono::TimeZone;
    use httpmock::{Method::GET, MockServer};
    use url::Url;

    fn pipeline(server: &MockServer) -> Pipeline {
        let base = Url::parse(&server.base_url()).unwrap();
        Pipeline::new(Settings {
            endpoints: Endpoints::all_at(&base),
            politeness_delay_ms: 0,
            ..Settings::default()
        })
        .unwrap()
    }

    fn request(tickers: &[&str], sources: &[Source], count: usize) -> AnalysisRequest {
        request_with_ttl(tickers, sources, count, 10)
    }

    fn request_with_ttl(
        tickers: &[&str],
        sources: &[Source],
        count: usize,
        ttl_minutes: u32,
    ) -> AnalysisRequest {
        AnalysisRequest::new(
            tickers.iter().map(|t| t.to_string()).collect(),
            sources.to_vec(),
            count,
            AnalysisMode::HeadlinesOnly,
            ttl_minutes,
        )
        .unwrap()
    }

    fn finviz_page(headlines: &[&str]) -> String {
        let rows: String = headlines
            .iter()
            .map(|h| {
                format!(
                    r##"<tr><td align="right">Oct-17-25 09:00AM</td><td><a class="tab-link-news" href="#">{h}</a></td></tr>"##
                )
            })
            .collect();
        format!(r#"<html><body><table id="news-table">{rows}</table></body></html>"#)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[tokio::test]
    async fn test_single_ticker_finviz_headlines() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/quote.ashx").query_param("t", "AAPL");
            then.status(200).body(finviz_page(&[
                "Apple beats earnings expectations on strong iPhone sales",
                "Apple faces lawsuit over App Store fees",
                "Apple to hold product event next month",
                "Apple supplier warns of weak demand",
            ]));
        });

        let report = pipeline(&server)
            .run(&request(&["AAPL"], &[Source::Finviz], 3))
            .await;

        assert!(!report.articles.is_empty());
        assert!(report.articles.len() <= 3);
        for a in &report.articles {
            assert_eq!(a.ticker, "AAPL");
            assert_eq!(a.source, Source::Finviz);
            assert!(!a.headline.is_empty());
            assert!(a.lexicon_sentiment.is_some());
            assert!(a.classifier_sentiment.is_some());
        }
        assert_eq!(report.summaries.len(), 1);
        assert_eq!(report.summaries[0].total_articles, report.articles.len());
        assert_eq!(report.diagnostics[0].requested, 3);
        assert_eq!(report.diagnostics[0].returned, 3);
    }

    #[tokio::test]
    async fn test_second_run_in_same_bucket_hits_cache() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET).path("/quote.ashx");
            then.status(200)
                .body(finviz_page(&["Nvidia shares surge to record high"]));
        });

        let p = pipeline(&server);
        let req = request(&["NVDA"], &[Source::Finviz], 5);
        let first = p.run_at(&req, at(1_000)).await;
        let second = p.run_at(&req, at(1_100)).await;

        listing.assert_calls(1);
        assert_eq!(first.articles, second.articles);
        assert_eq!(second.diagnostics[0].cache_hits, 1);
        assert_eq!((p.cache.hits(), p.cache.misses()), (1, 1));

        // Next bucket fetches again.
        p.run_at(&req, at(1_300)).await;
        listing.assert_calls(2);
    }

    #[tokio::test]
    async fn test_short_ttl_expires_before_bucket_ends() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET).path("/quote.ashx");
            then.status(200)
                .body(finviz_page(&["Nvidia shares surge to record high"]));
        });

        let p = pipeline(&server);
        let req = request_with_ttl(&["NVDA"], &[Source::Finviz], 5, 5);
        // All three runs share the bucket [0, 600); the 5 minute TTL ends at 310.
        p.run_at(&req, at(10)).await;
        p.run_at(&req, at(200)).await;
        listing.assert_calls(1);
        p.run_at(&req, at(400)).await;
        listing.assert_calls(2);
    }

    #[tokio::test]
    async fn test_ttl_does_not_change_cache_key() {
        let server = MockServer::start();
        let listing = server.mock(|when, then| {
            when.method(GET).path("/quote.ashx");
            then.status(200)
                .body(finviz_page(&["Nvidia shares surge to record high"]));
        });

        let p = pipeline(&server);
        p.run_at(&request_with_ttl(&["NVDA"], &[Source::Finviz], 5, 30), at(1_000))
            .await;
        let second = p
            .run_at(&request_with_ttl(&["NVDA"], &[Source::Finviz], 5, 10), at(1_100))
            .await;

        listing.assert_calls(1);
        assert_eq!(second.diagnostics[0].cache_hits, 1);
    }

    #[test]
    fn test_new_preloads_classifier() {
        let server = MockServer::start();
        let p = pipeline(&server);
        assert!(p.classifier.is_loaded());
        assert_eq!(p.classifier.load_count(), 1);
    }

    #[tokio::test]
    async fn test_results_follow_request_order() {
        let server = MockServer::start();
        for ticker in ["MSFT", "AAPL"] {
            let headline = format!("{ticker} finviz headline number one");
            server.mock(|when, then| {
                when.method(GET).path("/quote.ashx").query_param("t", ticker);
                then.status(200).body(finviz_page(&[headline.as_str()]));
            });
            server.mock(|when, then| {
                when.method(GET).path("/search").query_param("q", format!("{ticker} stock news"));
                then.status(200).body(format!(
                    r#"<article><a href="./articles/{ticker}">{ticker} google headline number one</a></article>"#
                ));
            });
        }

        let report = pipeline(&server)
            .run(&request(&["MSFT", "AAPL"], &[Source::GoogleNews, Source::Finviz], 2))
            .await;

        let order: Vec<(&str, Source)> = report
            .articles
            .iter()
            .map(|a| (a.ticker.as_str(), a.source))
            .collect();
        assert_eq!(
            order,
            vec![
                ("MSFT", Source::Finviz),
                ("MSFT", Source::GoogleNews),
                ("AAPL", Source::Finviz),
                ("AAPL", Source::GoogleNews),
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_source_is_isolated() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/quote.ashx");
            then.status(500);
        });
        server.mock(|when, then| {
            when.method(GET).path("/search");
            then.status(200).body(
                r#"<article><a href="./articles/t">Tesla deliveries beat expectations</a></article>"#,
            );
        });

        let p = pipeline(&server);
        let report = p
            .run(&request(&["TSLA"], &[Source::Finviz, Source::GoogleNews], 2))
            .await;

        assert_eq!(report.articles.len(), 1);
        assert_eq!(report.articles[0].source, Source::GoogleNews);
        let d = &report.diagnostics[0];
        assert_eq!((d.requested, d.returned, d.fetch_failures), (4, 1, 1));
        // The failed listing is not cached.
        assert_eq!(p.cache.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_page_yields_no_articles() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/quote.ashx");
            then.status(200).body("<html><body><div>nothing here</div>");
        });

        let report = pipeline(&server)
            .run(&request(&["IBM"], &[Source::Finviz], 5))
            .await;

        assert!(report.articles.is_empty());
        assert!(report.summaries.is_empty());
        assert_eq!(report.diagnostics[0].extraction_failures, 1);
        assert_eq!(report.diagnostics[0].fetch_failures, 0);
    }

    #[tokio::test]
    async fn test_content_mode_scores_body_text() {
        let server = MockServer::start();
        let page = format!(
            r#"<table id="news-table"><tr><td align="right">09:00AM</td>
               <td><a class="tab-link-news" href="{}">Company schedules annual meeting</a></td></tr></table>"#,
            server.url("/story/1")
        );
        server.mock(|when, then| {
            when.method(GET).path("/quote.ashx");
            then.status(200).body(page);
        });
        server.mock(|when, then| {
            when.method(GET).path("/story/1");
            then.status(200).body(
                "<article>Investors cheer a strong quarter and celebrate great results.</article>",
            );
        });

        let mut req = request(&["AMD"], &[Source::Finviz], 1);
        req.analysis_mode = AnalysisMode::FullContent;
        let report = pipeline(&server).run(&req).await;

        let article = &report.articles[0];
        assert!(article.content.contains("Investors cheer"));
        assert_eq!(
            article.lexicon_sentiment.as_ref().map(|s| s.label),
            Some(SentimentLabel::Positive)
        );
    }
}
