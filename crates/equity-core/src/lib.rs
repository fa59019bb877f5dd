#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for equity research data providers.
//!
//! This crate provides the foundational abstractions shared by every provider:
//!
//! - [`DataProvider`](provider::DataProvider) - Base trait for all providers
//! - [`MarketDataProvider`](provider::MarketDataProvider) - Quote snapshot and price history
//! - [`FundamentalsProvider`](provider::FundamentalsProvider) - Reported metrics and statements
//! - [`NewsProvider`](provider::NewsProvider) - News articles
//! - [`FilingsProvider`](provider::FilingsProvider) - Regulatory filings
//! - [`TechnicalsProvider`](provider::TechnicalsProvider) - Technical indicators
//! - [`RateLimiter`](rate_limit::RateLimiter) - Per-provider call budgets
//! - [`Settings`](config::Settings) - Environment-driven provider configuration

/// Provider configuration loaded from the environment.
pub mod config;
/// Error types for provider operations.
pub mod error;
/// Shared HTTP request and status handling.
pub mod http;
/// Price history lookback windows and reporting period types.
pub mod period;
/// Provider traits for fetching research data.
pub mod provider;
/// Per-provider daily budgets and call spacing.
pub mod rate_limit;
/// Core data types (Symbol, quotes, statements, articles, filings).
pub mod types;

// Re-export commonly used items at crate root
pub use config::{ConfigError, ProviderConfig, Settings};
pub use error::{ErrorKind, ProviderError, Result};
pub use period::{Lookback, PeriodType};
pub use provider::{
    DataProvider, FilingsProvider, FundamentalsProvider, MarketDataProvider, NewsProvider,
    NewsRequest, QuoteRequest, TechnicalsProvider,
};
pub use rate_limit::{Denied, Permit, RateBudget, RateLimiter, RateLimiterBuilder, RatePolicy};
pub use types::{
    Article, FilingRecord, FilingsSummary, FinancialStatement, Fundamentals, FundamentalsSnapshot,
    IndicatorPoint, NormalizedQuote, OhlcvBar, PriceHistory, QuoteSnapshot, Symbol,
    TechnicalIndicators,
};
