//! Provider traits for fetching research data.
//!
//! This module defines the core provider traits:
//!
//! - [`DataProvider`] - Base trait for all data providers
//! - [`MarketDataProvider`] - Quote snapshot and price histories
//! - [`FundamentalsProvider`] - Reported metrics and financial statements
//! - [`NewsProvider`] - News articles about a company
//! - [`FilingsProvider`] - Recent regulatory filings
//! - [`TechnicalsProvider`] - Technical indicator series
//!
//! Every fetch returns a [`Result`]: failures are values, and a provider
//! that cannot be reached never prevents callers from using other providers.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::fmt::Debug;

use crate::{
    error::Result,
    period::Lookback,
    types::{Article, FilingsSummary, Fundamentals, NormalizedQuote, Symbol, TechnicalIndicators},
};

/// Rate-limit identifiers of the built-in providers.
pub mod ids {
    /// Yahoo Finance quotes and price history.
    pub const YAHOO: &str = "yahoo";
    /// Yahoo Finance fundamentals. Metered apart from quotes so both can run
    /// in the same fan-out under a call spacing.
    pub const YAHOO_FUNDAMENTALS: &str = "yahoo_fundamentals";
    /// Alpha Vantage technical indicators.
    pub const ALPHA_VANTAGE: &str = "alpha_vantage";
    /// Alpha Vantage company overview.
    pub const ALPHA_VANTAGE_OVERVIEW: &str = "alpha_vantage_overview";
    /// NewsAPI.
    pub const NEWSAPI: &str = "newsapi";
    /// SEC EDGAR.
    pub const EDGAR: &str = "edgar";
    /// Hugging Face inference API.
    pub const HUGGINGFACE: &str = "huggingface";
}

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the identifier used for rate-limit bookkeeping (e.g. `"yahoo"`).
    fn id(&self) -> &str;

    /// Returns the display name of this provider (e.g. "Yahoo Finance").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Parameters for a market data fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuoteRequest {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Histories to fetch; each window is an independent request.
    pub lookbacks: Vec<Lookback>,
}

impl QuoteRequest {
    /// Creates a request for the one-year and five-year histories.
    #[must_use]
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            lookbacks: vec![Lookback::OneYear, Lookback::FiveYears],
        }
    }

    /// Replaces the requested lookback windows.
    #[must_use]
    pub fn with_lookbacks(mut self, lookbacks: impl Into<Vec<Lookback>>) -> Self {
        self.lookbacks = lookbacks.into();
        self
    }
}

/// Parameters for a news search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewsRequest {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Free-text query, usually the company name.
    pub query: String,
    /// Oldest publication date to include.
    pub from: NaiveDate,
    /// Maximum number of articles to return.
    pub max_articles: usize,
}

impl NewsRequest {
    /// Creates a request searching for `company_name`, falling back to the
    /// ticker when the name is blank.
    #[must_use]
    pub fn new(symbol: Symbol, company_name: &str, from: NaiveDate, max_articles: usize) -> Self {
        let query = match company_name.trim() {
            "" => symbol.to_string(),
            name => name.to_string(),
        };
        Self {
            symbol,
            query,
            from,
            max_articles,
        }
    }
}

/// Provider for quote snapshots and daily price histories.
#[async_trait]
pub trait MarketDataProvider: DataProvider {
    /// Fetches the current quote and every requested history window.
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<NormalizedQuote>;
}

/// Provider for fundamental financial data.
#[async_trait]
pub trait FundamentalsProvider: DataProvider {
    /// Fetches reported metrics and any available statements for a symbol.
    async fn fetch_fundamentals(&self, symbol: &Symbol) -> Result<Fundamentals>;
}

/// Provider for news articles.
#[async_trait]
pub trait NewsProvider: DataProvider {
    /// Fetches articles matching the request, most relevant first.
    async fn fetch_news(&self, request: &NewsRequest) -> Result<Vec<Article>>;
}

/// Provider for regulatory filings.
#[async_trait]
pub trait FilingsProvider: DataProvider {
    /// Fetches the registrant's most recent filings.
    async fn fetch_filings(&self, symbol: &Symbol) -> Result<FilingsSummary>;
}

/// Provider for technical indicators.
#[async_trait]
pub trait TechnicalsProvider: DataProvider {
    /// Fetches indicator series for a symbol.
    async fn fetch_technicals(&self, symbol: &Symbol) -> Result<TechnicalIndicators>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_request_defaults() {
        let request = QuoteRequest::new(Symbol::new("msft"));
        assert_eq!(request.lookbacks, vec![Lookback::OneYear, Lookback::FiveYears]);

        let request = request.with_lookbacks([Lookback::OneMonth]);
        assert_eq!(request.lookbacks, vec![Lookback::OneMonth]);
    }

    #[test]
    fn test_news_request_falls_back_to_ticker() {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let request = NewsRequest::new(Symbol::new("aapl"), "  ", from, 20);
        assert_eq!(request.query, "AAPL");

        let request = NewsRequest::new(Symbol::new("aapl"), "Apple Inc", from, 20);
        assert_eq!(request.query, "Apple Inc");
    }
}
