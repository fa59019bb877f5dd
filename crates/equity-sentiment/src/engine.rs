//! Scoring articles and reducing per-article results.

use std::sync::Arc;

use equity_core::{Article, RateLimiter, Settings};
use futures::{StreamExt, stream};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    label::{LabelCounts, LabelPercentages, SentimentLabel},
    lexicon::LexiconScorer,
    model::{FinBertClient, ModelScorer, top_class, truncate_chars},
};

/// Default number of model requests in flight at once.
pub const DEFAULT_MODEL_CONCURRENCY: usize = 4;

/// One article's result from one scorer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArticleSentiment {
    /// Index into the scored article slice.
    pub article_index: usize,
    /// Assigned label.
    pub label: SentimentLabel,
    /// Compound score (lexicon) or confidence of the label (model).
    pub score: f64,
}

impl ArticleSentiment {
    /// A lexicon result, labeled by the compound thresholds.
    #[must_use]
    pub fn from_compound(article_index: usize, compound: f64) -> Self {
        Self {
            article_index,
            label: SentimentLabel::from_compound(compound),
            score: compound,
        }
    }
}

/// Reduction of per-article results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SentimentAggregate {
    /// Mean compound score (lexicon) or mean signed confidence (model).
    pub average_score: Option<f64>,
    /// Overall label.
    pub dominant_label: Option<SentimentLabel>,
    /// Articles per label; sums to the number of scored articles.
    pub counts: LabelCounts,
    /// Articles per label in percent.
    pub percentages: LabelPercentages,
}

/// Results of one scorer over a set of articles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentScore {
    /// Scorer name.
    pub scorer: String,
    /// Per-article results in article order.
    pub per_article: Vec<ArticleSentiment>,
    /// Reduction over `per_article`.
    pub aggregate: SentimentAggregate,
}

impl SentimentScore {
    /// Lexicon reduction: the overall label applies the compound thresholds
    /// to the mean compound score.
    #[must_use]
    pub fn from_lexicon(per_article: Vec<ArticleSentiment>) -> Self {
        let average_score = mean(per_article.iter().map(|a| a.score));
        let counts = LabelCounts::from_labels(per_article.iter().map(|a| a.label));

        Self {
            scorer: LexiconScorer::NAME.to_string(),
            aggregate: SentimentAggregate {
                average_score,
                dominant_label: average_score.map(SentimentLabel::from_compound),
                counts,
                percentages: counts.percentages(),
            },
            per_article,
        }
    }

    /// Model reduction: the overall label is the most frequent one, ties
    /// broken positive, then neutral, then negative.
    #[must_use]
    pub fn from_model(scorer: impl Into<String>, per_article: Vec<ArticleSentiment>) -> Self {
        let average_score = mean(per_article.iter().map(|a| a.label.sign() * a.score));
        let counts = LabelCounts::from_labels(per_article.iter().map(|a| a.label));

        Self {
            scorer: scorer.into(),
            aggregate: SentimentAggregate {
                average_score,
                dominant_label: counts.dominant(),
                counts,
                percentages: counts.percentages(),
            },
            per_article,
        }
    }

    /// Returns true if no article was scored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.per_article.is_empty()
    }
}

/// Both scorers' results for a set of articles.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SentimentReport {
    /// Articles supplied, including ones without text.
    pub total_articles: usize,
    /// Lexicon results.
    pub lexicon: SentimentScore,
    /// Model results; `None` when no model is configured.
    pub model: Option<SentimentScore>,
}

/// Runs the lexicon scorer and, when configured, a model scorer.
#[derive(Clone, Debug)]
pub struct SentimentEngine {
    lexicon: LexiconScorer,
    model: Option<Arc<dyn ModelScorer>>,
    model_concurrency: usize,
}

impl Default for SentimentEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentEngine {
    /// Creates a lexicon-only engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lexicon: LexiconScorer::new(),
            model: None,
            model_concurrency: DEFAULT_MODEL_CONCURRENCY,
        }
    }

    /// Adds a model scorer.
    #[must_use]
    pub fn with_model(mut self, model: Arc<dyn ModelScorer>) -> Self {
        self.model = Some(model);
        self
    }

    /// Sets how many model requests may be in flight at once (at least one).
    #[must_use]
    pub fn with_model_concurrency(mut self, concurrency: usize) -> Self {
        self.model_concurrency = concurrency.max(1);
        self
    }

    /// Creates an engine with FinBERT when `HUGGINGFACE_API_KEY` is configured.
    pub fn from_settings(settings: &Settings, limiter: Arc<RateLimiter>) -> equity_core::Result<Self> {
        let engine = Self::new();
        Ok(match FinBertClient::from_config(&settings.hugging_face, limiter)? {
            Some(client) => engine.with_model(Arc::new(client)),
            None => engine,
        })
    }

    /// Returns true if a model scorer was configured at construction.
    #[must_use]
    pub fn model_available(&self) -> bool {
        self.model.is_some()
    }

    /// Scores articles with the lexicon only, on the calling thread.
    #[must_use]
    pub fn score_lexicon(&self, articles: &[Article]) -> SentimentScore {
        score_with_lexicon(self.lexicon, &article_texts(articles))
    }

    /// Scores articles with every available scorer.
    ///
    /// Lexicon scoring runs on a blocking worker. A model failure on one
    /// article drops that article from the model results only.
    pub async fn score(&self, articles: &[Article]) -> SentimentReport {
        let texts = article_texts(articles);
        debug!(
            articles = articles.len(),
            with_text = texts.len(),
            model = self.model_available(),
            "Scoring sentiment"
        );

        let lexicon = self.lexicon;
        let blocking_texts = texts.clone();
        let worker = tokio::task::spawn_blocking(move || score_with_lexicon(lexicon, &blocking_texts));
        let lexicon_score = match worker.await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "Lexicon worker failed, scoring inline");
                score_with_lexicon(lexicon, &texts)
            }
        };

        let model_score = match &self.model {
            Some(model) => Some(self.score_with_model(model.as_ref(), &texts).await),
            None => None,
        };

        SentimentReport {
            total_articles: articles.len(),
            lexicon: lexicon_score,
            model: model_score,
        }
    }

    async fn score_with_model(&self, model: &dyn ModelScorer, texts: &[(usize, String)]) -> SentimentScore {
        let max_chars = model.max_input_chars();

        let results: Vec<_> = stream::iter(texts)
            .map(|(index, text)| async move {
                let outcome = model.classify(truncate_chars(text, max_chars)).await;
                (*index, outcome)
            })
            .buffered(self.model_concurrency)
            .collect()
            .await;

        let per_article = results
            .into_iter()
            .filter_map(|(article_index, outcome)| match outcome {
                Ok(scores) => top_class(&scores).map(|top| ArticleSentiment {
                    article_index,
                    label: top.label,
                    score: top.confidence,
                }),
                Err(e) => {
                    warn!(scorer = model.name(), article_index, error = %e, "Model scoring failed");
                    None
                }
            })
            .collect();

        SentimentScore::from_model(model.name(), per_article)
    }
}

/// `(index, text)` for every article with non-blank title or description.
fn article_texts(articles: &[Article]) -> Vec<(usize, String)> {
    articles
        .iter()
        .enumerate()
        .filter_map(|(i, a)| a.sentiment_text().map(|text| (i, text)))
        .collect()
}

fn score_with_lexicon(lexicon: LexiconScorer, texts: &[(usize, String)]) -> SentimentScore {
    let per_article = texts
        .iter()
        .map(|(index, text)| ArticleSentiment::from_compound(*index, lexicon.score(text).compound))
        .collect();
    SentimentScore::from_lexicon(per_article)
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ClassScore;
    use async_trait::async_trait;
    use equity_core::ProviderError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn article(title: &str) -> Article {
        Article {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    /// Labels by keyword; fails on texts containing "boom".
    #[derive(Debug, Default)]
    struct KeywordModel {
        calls: AtomicUsize,
        longest_input: AtomicUsize,
    }

    #[async_trait]
    impl ModelScorer for KeywordModel {
        fn name(&self) -> &str {
            "keyword"
        }

        fn max_input_chars(&self) -> usize {
            16
        }

        async fn classify(&self, text: &str) -> equity_core::Result<Vec<ClassScore>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.longest_input.fetch_max(text.chars().count(), Ordering::SeqCst);
            if text.contains("boom") {
                return Err(ProviderError::Network("connection reset".into()));
            }
            let label = if text.contains("up") {
                SentimentLabel::Positive
            } else if text.contains("down") {
                SentimentLabel::Negative
            } else {
                SentimentLabel::Neutral
            };
            Ok(vec![
                ClassScore {
                    label,
                    confidence: 0.8,
                },
                ClassScore {
                    label: SentimentLabel::Neutral,
                    confidence: 0.2,
                },
            ])
        }
    }

    #[test]
    fn test_lexicon_thresholds_and_mean() {
        let compounds = [0.5, -0.5, 0.0, 0.06, -0.06];
        let per_article = compounds
            .iter()
            .enumerate()
            .map(|(i, c)| ArticleSentiment::from_compound(i, *c))
            .collect();
        let score = SentimentScore::from_lexicon(per_article);

        assert_eq!(score.aggregate.counts.positive, 2);
        assert_eq!(score.aggregate.counts.negative, 2);
        assert_eq!(score.aggregate.counts.neutral, 1);
        assert_eq!(score.aggregate.counts.total(), score.per_article.len());

        let mean = compounds.iter().sum::<f64>() / 5.0;
        assert!((score.aggregate.average_score.unwrap() - mean).abs() < 1e-12);
        assert_eq!(score.aggregate.dominant_label, Some(SentimentLabel::from_compound(mean)));
    }

    #[test]
    fn test_model_dominant_tie_prefers_positive() {
        let per_article = vec![
            ArticleSentiment {
                article_index: 0,
                label: SentimentLabel::Negative,
                score: 0.9,
            },
            ArticleSentiment {
                article_index: 1,
                label: SentimentLabel::Positive,
                score: 0.6,
            },
        ];
        let score = SentimentScore::from_model("finbert", per_article);

        assert_eq!(score.aggregate.dominant_label, Some(SentimentLabel::Positive));
        assert_eq!(score.aggregate.percentages.positive, 50.0);
        assert!((score.aggregate.average_score.unwrap() - (-0.15)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input_gives_empty_summary() {
        let score = SentimentEngine::new().score_lexicon(&[]);

        assert!(score.is_empty());
        assert_eq!(score.aggregate.average_score, None);
        assert_eq!(score.aggregate.dominant_label, None);
        assert_eq!(score.aggregate.counts.total(), 0);
    }

    #[tokio::test]
    async fn test_lexicon_only_engine() {
        let engine = SentimentEngine::new();
        assert!(!engine.model_available());

        let articles = vec![
            article("Profits soar on record demand"),
            Article::default(),
            article("Shares plunge as losses mount"),
        ];
        let report = engine.score(&articles).await;

        assert_eq!(report.total_articles, 3);
        assert!(report.model.is_none());
        assert_eq!(report.lexicon.per_article.len(), 2);
        assert_eq!(report.lexicon.per_article[1].article_index, 2);
        assert_eq!(report.lexicon.per_article[0].label, SentimentLabel::Positive);
        assert_eq!(report.lexicon.per_article[1].label, SentimentLabel::Negative);
        assert_eq!(report.lexicon, engine.score_lexicon(&articles));
    }

    #[tokio::test]
    async fn test_model_failure_drops_only_that_article() {
        let model = Arc::new(KeywordModel::default());
        let engine = SentimentEngine::new()
            .with_model(model.clone())
            .with_model_concurrency(2);
        assert!(engine.model_available());

        let articles = vec![
            article("prices up again"),
            article("boom goes the server"),
            article("prices down, and the rest of a long headline"),
        ];
        let report = engine.score(&articles).await;
        let model_score = report.model.unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert!(model.longest_input.load(Ordering::SeqCst) <= 16);
        assert_eq!(model_score.scorer, "keyword");
        assert_eq!(model_score.per_article.len(), 2);
        assert_eq!(model_score.per_article[0].article_index, 0);
        assert_eq!(model_score.per_article[1].article_index, 2);
        assert_eq!(model_score.aggregate.counts.total(), 2);
        assert_eq!(report.lexicon.per_article.len(), 3);
    }

    #[tokio::test]
    async fn test_zero_articles_with_model() {
        let engine = SentimentEngine::new().with_model(Arc::new(KeywordModel::default()));
        let report = engine.score(&[]).await;

        assert_eq!(report.total_articles, 0);
        assert!(report.lexicon.is_empty());
        assert!(report.model.unwrap().is_empty());
    }
}
