//! Per-ticker tallies and ranking.

use crate::models::{ArticleRecord, SentimentLabel, SentimentScore, SentimentTally, TickerSummary};

/// `positive / negative`, with `+inf` when there are positives but no
/// negatives and `0` when there are no positives at all.
pub fn sentiment_ratio(positive: usize, negative: usize) -> f64 {
    if negative > 0 {
        positive as f64 / negative as f64
    } else if positive > 0 {
        f64::INFINITY
    } else {
        0.0
    }
}

/// Count labels. Unscored articles are not counted.
pub fn tally<'a>(scores: impl IntoIterator<Item = Option<&'a SentimentScore>>) -> SentimentTally {
    let mut t = SentimentTally::default();
    for score in scores.into_iter().flatten() {
        match score.label {
            SentimentLabel::Positive => t.positive += 1,
            SentimentLabel::Negative => t.negative += 1,
            SentimentLabel::Neutral => t.neutral += 1,
        }
    }
    t.ratio = sentiment_ratio(t.positive, t.negative);
    t
}

/// Build one summary per ticker that has at least one article, ranked by
/// classifier ratio, highest first. Ties keep the input ticker order.
pub fn aggregate(tickers: &[String], articles: &[ArticleRecord]) -> Vec<TickerSummary> {
    let mut summaries: Vec<TickerSummary> = tickers
        .iter()
        .filter_map(|ticker| {
            let mine: Vec<&ArticleRecord> =
                articles.iter().filter(|a| &a.ticker == ticker).collect();
            if mine.is_empty() {
                return None;
            }
            Some(TickerSummary {
                ticker: ticker.clone(),
                total_articles: mine.len(),
                lexicon: tally(mine.iter().map(|a| a.lexicon_sentiment.as_ref())),
                classifier: tally(mine.iter().map(|a| a.classifier_sentiment.as_ref())),
            })
        })
        .collect();
    rank(&mut summaries);
    summaries
}

/// Stable sort, descending by classifier ratio; `+inf` sorts first.
pub fn rank(summaries: &mut [TickerSummary]) {
    summaries.sort_by(|a, b| b.classifier.ratio.total_cmp(&a.classifier.ratio));
}
