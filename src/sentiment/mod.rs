//! Sentiment scorers.
//!
//! Two independent scorers share the [`SentimentScorer`] interface:
//!
//! - [`lexicon::LexiconScorer`]: rule-based, signed compound polarity in
//!   `[-1, 1]`; cheap and always available
//! - [`classifier::ClassifierScorer`]: finance-tuned linear classifier with a
//!   softmax over `[positive, negative, neutral]`; its weights are loaded
//!   lazily, exactly once per scorer
//!
//! Both return `{neutral, 0.0}` for blank text without touching their model.
//! Which text gets scored is chosen by the caller's
//! [`AnalysisMode`](crate::models::AnalysisMode).

pub mod classifier;
pub mod lexicon;

use crate::models::SentimentScore;

pub trait SentimentScorer: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Score `text`. Never fails; internal errors degrade to a neutral score.
    fn score(&self, text: &str) -> SentimentScore;
}

/// Blank input is never handed to a model.
pub(crate) fn is_blank(text: &str) -> bool {
    text.trim().is_empty()
}

/// Words that flip the polarity of what follows.
pub(crate) fn is_negation(word: &str) -> bool {
    const NEGATIONS: &[&str] = &[
        "not", "no", "never", "none", "nobody", "nothing", "neither", "nor", "nowhere",
        "cannot", "without", "dont", "doesnt", "didnt", "isnt", "wasnt", "arent", "werent",
        "wont", "cant", "couldnt", "shouldnt", "wouldnt", "hasnt", "havent", "hadnt",
    ];
    word.ends_with("n't") || NEGATIONS.contains(&word)
}
