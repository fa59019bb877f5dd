#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! News sentiment scoring.
//!
//! - [`LexiconScorer`] - Rule-based compound scores
//! - [`ModelScorer`] / [`FinBertClient`] - Classifier confidences
//! - [`SentimentEngine`] - Runs both and reduces to a [`SentimentReport`]
//!
//! # Example
//!
//! ```
//! use equity_core::Article;
//! use equity_sentiment::{SentimentEngine, SentimentLabel};
//!
//! let engine = SentimentEngine::new();
//! let articles = vec![Article {
//!     title: Some("Profits soar on record demand".into()),
//!     ..Default::default()
//! }];
//!
//! let score = engine.score_lexicon(&articles);
//! assert_eq!(score.aggregate.dominant_label, Some(SentimentLabel::Positive));
//! ```

/// Scoring articles and reducing per-article results.
pub mod engine;
/// Sentiment labels and per-label statistics.
pub mod label;
/// Rule-based valence scoring.
pub mod lexicon;
/// Model-based classification.
pub mod model;

pub use engine::{
    ArticleSentiment, DEFAULT_MODEL_CONCURRENCY, SentimentAggregate, SentimentEngine,
    SentimentReport, SentimentScore,
};
pub use label::{LabelCounts, LabelPercentages, SentimentLabel};
pub use lexicon::{LexiconScorer, LexiconScores};
pub use model::{ClassScore, FinBertClient, ModelScorer};
