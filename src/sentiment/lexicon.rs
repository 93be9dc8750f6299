//! Rule-based lexicon scorer backed by VADER.
//!
//! VADER weighs each word of its valence lexicon and adjusts for boosters,
//! ALL-CAPS emphasis, negation, a contrastive "but" and trailing `!`/`?`.
//! The result is a compound score in `[-1, 1]` plus the positive, negative
//! and neutral proportions of the text.

use super::{SentimentScorer, is_blank};
use crate::models::{Distribution, SentimentLabel, SentimentScore};
use vader_sentiment::SentimentIntensityAnalyzer;

pub const POSITIVE_THRESHOLD: f64 = 0.05;
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Compound score and proportions for one text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Polarity {
    pub compound: f64,
    pub distribution: Distribution,
}

/// Lexicon scorer. The analyzer only borrows VADER's static tables, so one
/// instance can be shared freely.
pub struct LexiconScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }

    /// Full polarity breakdown of `text`.
    pub fn polarity(&self, text: &str) -> Polarity {
        let scores = self.analyzer.polarity_scores(text);
        let get = |key: &str| scores.get(key).copied().unwrap_or(0.0);
        Polarity {
            compound: get("compound").clamp(-1.0, 1.0),
            distribution: Distribution {
                positive: get("pos"),
                negative: get("neg"),
                neutral: get("neu"),
            },
        }
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentScorer for LexiconScorer {
    fn name(&self) -> &'static str {
        "lexicon"
    }

    fn score(&self, text: &str) -> SentimentScore {
        if is_blank(text) {
            return SentimentScore::neutral();
        }
        let polarity = self.polarity(text);
        SentimentScore {
            label: label_for(polarity.compound),
            score: polarity.compound,
            distribution: Some(polarity.distribution),
        }
    }
}

/// Map a compound score to a label using the ±0.05 thresholds.
pub fn label_for(compound: f64) -> SentimentLabel {
    if compound >= POSITIVE_THRESHOLD {
        SentimentLabel::Positive
    } else if compound <= NEGATIVE_THRESHOLD {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(text: &str) -> SentimentScore {
        LexiconScorer::new().score(text)
    }

    #[test]
    fn test_positive_headlines() {
        for text in [
            "Apple Inc. reported strong quarterly earnings, exceeding analyst expectations.",
            "Investors cheer upbeat optimism",
            "Apple stock hits all-time high as investors celebrate",
        ] {
            let s = score(text);
            assert_eq!(s.label, SentimentLabel::Positive, "{text}");
            assert!(s.score > POSITIVE_THRESHOLD, "{text}");
        }
    }

    #[test]
    fn test_negative_headlines() {
        for text in [
            "Shareholders furious and angry over shocking collapse",
            "Terrible quarter leaves investors worried about a crisis",
        ] {
            let s = score(text);
            assert_eq!(s.label, SentimentLabel::Negative, "{text}");
            assert!(s.score < NEGATIVE_THRESHOLD, "{text}");
        }
    }

    #[test]
    fn test_neutral_headline() {
        let s = score("Company schedules annual shareholder meeting for Tuesday");
        assert_eq!(s.label, SentimentLabel::Neutral);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn test_blank_short_circuits() {
        for text in ["", "   ", "\n\t"] {
            let s = score(text);
            assert_eq!(s, SentimentScore::neutral());
        }
    }

    #[test]
    fn test_deterministic() {
        let text = "Tesla stock soars but analysts warn of volatility!";
        assert_eq!(score(text), score(text));
    }

    #[test]
    fn test_negation_flips_polarity() {
        let plain = score("The results were good").score;
        let negated = score("The results were not good").score;
        assert!(plain > 0.0);
        assert!(negated < 0.0);
    }

    #[test]
    fn test_boosters_and_caps_intensify() {
        let plain = score("Earnings were good").score;
        let boosted = score("Earnings were very good").score;
        let shouted = score("Earnings were GOOD").score;
        assert!(boosted > plain);
        assert!(shouted > plain);
    }

    #[test]
    fn test_exclamation_intensifies() {
        assert!(score("Earnings were good!!").score > score("Earnings were good").score);
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        let s = score("Revenue was good but the outlook is terrible");
        assert_eq!(s.label, SentimentLabel::Negative);
    }

    #[test]
    fn test_compound_bounds_and_distribution() {
        let s = score("great great great excellent amazing best win win success!!!!");
        assert!(s.score <= 1.0 && s.score > 0.9);
        let d = s.distribution.unwrap();
        assert!(d.positive > d.negative);
        // Proportions are rounded to three decimals.
        assert!((d.positive + d.negative + d.neutral - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(label_for(0.05), SentimentLabel::Positive);
        assert_eq!(label_for(-0.05), SentimentLabel::Negative);
        assert_eq!(label_for(0.049), SentimentLabel::Neutral);
        assert_eq!(label_for(-0.049), SentimentLabel::Neutral);
    }
}
