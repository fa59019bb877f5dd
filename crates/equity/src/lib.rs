#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Equity research data core.
//!
//! This crate re-exports the core types, the provider implementations, the
//! ratio and sentiment engines, and provides the [`Aggregator`] that runs
//! every source for one ticker concurrently.
//!
//! # Features
//!
//! - `yahoo` - Yahoo Finance market data and fundamentals
//! - `newsapi` - NewsAPI articles
//! - `edgar` - SEC EDGAR filings
//! - `alphavantage` - Alpha Vantage technicals and company overview

// Core types and traits
pub use equity_core::*;

// Engines
pub use equity_ratios::{DuPontAnalysis, DuPontSource, RatioBundle};
pub use equity_sentiment::{
    FinBertClient, LexiconScorer, ModelScorer, SentimentEngine, SentimentLabel, SentimentReport,
    SentimentScore,
};

// Providers
#[cfg(feature = "alphavantage")]
pub use equity_alphavantage::AlphaVantageProvider;
#[cfg(feature = "edgar")]
pub use equity_edgar::EdgarProvider;
#[cfg(feature = "newsapi")]
pub use equity_newsapi::NewsApiProvider;
#[cfg(feature = "yahoo")]
pub use equity_yahoo::YahooProvider;

mod coordinator;
pub use coordinator::{
    AggregateError, AggregateResult, Aggregator, AggregatorBuilder, DEFAULT_MAX_ARTICLES,
    DEFAULT_NEWS_LOOKBACK_DAYS, SourceError, SourceId,
};

/// Computes the ratio bundle for fetched fundamentals.
///
/// Pure: the same input always yields the same bundle.
#[must_use]
pub fn compute_ratios(fundamentals: &Fundamentals) -> RatioBundle {
    equity_ratios::compute(&fundamentals.snapshot, &fundamentals.statements)
}

/// Scores `articles` with the lexicon and, when configured, the model.
pub async fn score_sentiment(engine: &SentimentEngine, articles: &[Article]) -> SentimentReport {
    engine.score(articles).await
}
