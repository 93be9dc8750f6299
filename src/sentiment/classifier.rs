//! Finance-tuned sentiment classifier.
//!
//! A linear model over unigram and bigram features produces three logits,
//! `[positive, negative, neutral]`, turned into probabilities with a softmax.
//! The label is the most probable class and the primary score is that
//! class's probability (a confidence, unlike the lexicon's signed score).
//!
//! Weights come from a TSV table, either the built-in one or a file named in
//! the configuration. They are loaded exactly once per scorer, either by
//! [`ClassifierScorer::preload`] or on first use: concurrent first callers
//! block until loading finishes, and a failed load is remembered rather than
//! retried.

use super::{SentimentScorer, is_blank, is_negation};
use crate::error::ModelFailure;
use crate::models::{Distribution, SentimentLabel, SentimentScore};
use once_cell::sync::OnceCell;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// Longest token window the model looks at; the rest is ignored.
pub const MAX_TOKENS: usize = 512;

const BUILTIN_WEIGHTS: &str = include_str!("finance_weights.tsv");
const BIAS_KEY: &str = "__bias__";

/// Class weights indexed as `[positive, negative, neutral]`.
type Weights = [f64; 3];

#[derive(Debug, Clone)]
pub struct LinearModel {
    bias: Weights,
    features: HashMap<String, Weights>,
}

impl LinearModel {
    /// Parse a weights table: `term<TAB>pos<TAB>neg<TAB>neu` per line, `#`
    /// comments and blank lines ignored, and an optional `__bias__` row.
    pub fn from_tsv(tsv: &str) -> Result<Self, ModelFailure> {
        let mut bias = [0.0; 3];
        let mut features = HashMap::new();

        for (lineno, line) in tsv.lines().enumerate() {
            let line = line.trim_end();
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let cols: Vec<&str> = line.split('\t').collect();
            let [term, pos, neg, neu] = cols.as_slice() else {
                return Err(ModelFailure(format!(
                    "line {}: expected 4 tab-separated columns, got {}",
                    lineno + 1,
                    cols.len()
                )));
            };
            let parse = |v: &str| {
                v.trim().parse::<f64>().map_err(|e| {
                    ModelFailure(format!("line {}: bad weight `{v}`: {e}", lineno + 1))
                })
            };
            let weights = [parse(*pos)?, parse(*neg)?, parse(*neu)?];

            if *term == BIAS_KEY {
                bias = weights;
            } else {
                features.insert(term.trim().to_lowercase(), weights);
            }
        }

        if features.is_empty() {
            return Err(ModelFailure("weights table has no features".to_string()));
        }
        Ok(Self { bias, features })
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Class probabilities for `text`.
    pub fn predict(&self, text: &str) -> Result<Distribution, ModelFailure> {
        let tokens = tokenize(text);
        let mut logits = self.bias;

        for i in 0..tokens.len() {
            let negated = (1..=2)
                .filter_map(|d| i.checked_sub(d))
                .any(|j| is_negation(&tokens[j]));

            if let Some(w) = self.features.get(&tokens[i]) {
                accumulate(&mut logits, w, negated);
            }
            if i > 0 {
                let bigram = format!("{} {}", tokens[i - 1], tokens[i]);
                if let Some(w) = self.features.get(&bigram) {
                    accumulate(&mut logits, w, negated);
                }
            }
        }

        softmax(logits)
    }
}

/// Negated features swap their positive and negative evidence.
fn accumulate(logits: &mut Weights, w: &Weights, negated: bool) {
    let (pos, neg) = if negated { (w[1], w[0]) } else { (w[0], w[1]) };
    logits[0] += pos;
    logits[1] += neg;
    logits[2] += w[2];
}

fn softmax(logits: Weights) -> Result<Distribution, ModelFailure> {
    if logits.iter().any(|l| !l.is_finite()) {
        return Err(ModelFailure(format!("non-finite logits {logits:?}")));
    }
    let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exp = logits.map(|l| (l - max).exp());
    let total: f64 = exp.iter().sum();
    Ok(Distribution {
        positive: exp[0] / total,
        negative: exp[1] / total,
        neutral: exp[2] / total,
    })
}

/// Lowercase word tokens, cut to the model window.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|t| t.trim_matches('\''))
        .filter(|t| !t.is_empty())
        .take(MAX_TOKENS)
        .map(String::from)
        .collect()
}

/// Classifier scorer with lazily loaded weights.
///
/// Build one per process and share it by reference (or `Arc`).
#[derive(Debug, Default)]
pub struct ClassifierScorer {
    weights_path: Option<PathBuf>,
    model: OnceCell<Result<LinearModel, ModelFailure>>,
    loads: AtomicUsize,
}

impl ClassifierScorer {
    /// Scorer using the weights file at `weights_path`, or the built-in table.
    pub fn new(weights_path: Option<PathBuf>) -> Self {
        Self {
            weights_path,
            model: OnceCell::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Whether the weights have been loaded (successfully or not).
    pub fn is_loaded(&self) -> bool {
        self.model.get().is_some()
    }

    /// How many times loading ran; never more than once.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Load the weights now instead of on first score. Returns whether the
    /// model is usable; a failure is remembered like a lazy one.
    pub fn preload(&self) -> bool {
        self.model().is_ok()
    }

    fn model(&self) -> Result<&LinearModel, ModelFailure> {
        self.model
            .get_or_init(|| self.load())
            .as_ref()
            .map_err(Clone::clone)
    }

    /// Probability distribution for `text`, loading the model if needed.
    pub fn classify(&self, text: &str) -> Result<Distribution, ModelFailure> {
        self.model()?.predict(text)
    }

    #[instrument(level = "info", skip(self), fields(path = ?self.weights_path))]
    fn load(&self) -> Result<LinearModel, ModelFailure> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let t0 = Instant::now();

        let res = match &self.weights_path {
            Some(path) => std::fs::read_to_string(path)
                .map_err(|e| ModelFailure(format!("reading {}: {e}", path.display())))
                .and_then(|tsv| LinearModel::from_tsv(&tsv)),
            None => LinearModel::from_tsv(BUILTIN_WEIGHTS),
        };

        match &res {
            Ok(model) => info!(
                features = model.feature_count(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Loaded classifier weights"
            ),
            Err(e) => warn!(error = %e, "Classifier failed to load; scores will be neutral"),
        }
        res
    }
}

impl SentimentScorer for ClassifierScorer {
    fn name(&self) -> &'static str {
        "classifier"
    }

    fn score(&self, text: &str) -> SentimentScore {
        if is_blank(text) {
            return SentimentScore::neutral();
        }
        match self.classify(text) {
            Ok(distribution) => SentimentScore {
                label: SentimentLabel::from_class_index(distribution.argmax())
                    .unwrap_or(SentimentLabel::Neutral),
                score: distribution.max(),
                distribution: Some(distribution),
            },
            Err(e) => {
                debug!(error = %e, "Classifier failure; scoring neutral");
                SentimentScore::neutral()
            }
        }
    }
}
