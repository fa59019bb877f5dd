//! Concurrent aggregation of every data source for one ticker.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use equity_core::config::DEFAULT_HARD_TIMEOUT;
use equity_core::{
    Article, DataProvider, ErrorKind, FilingsProvider, FilingsSummary, Fundamentals,
    FundamentalsProvider, Lookback, MarketDataProvider, NewsProvider, NewsRequest,
    NormalizedQuote, ProviderError, QuoteRequest, Settings, Symbol, TechnicalIndicators,
    TechnicalsProvider,
};
use equity_ratios::RatioBundle;
use equity_sentiment::{SentimentEngine, SentimentReport};

/// Days of news searched back from the aggregation date.
pub const DEFAULT_NEWS_LOOKBACK_DAYS: u32 = 7;

/// Most articles requested from the news provider.
pub const DEFAULT_MAX_ARTICLES: usize = 20;

/// A data source of the aggregation, in the order errors are reported.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    /// Quote snapshot and price histories.
    MarketData,
    /// Reported metrics and statements.
    Fundamentals,
    /// News articles.
    News,
    /// Regulatory filings.
    Filings,
    /// Technical indicators.
    Technicals,
}

impl SourceId {
    /// Returns the snake_case source name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MarketData => "market_data",
            Self::Fundamentals => "fundamentals",
            Self::News => "news",
            Self::Filings => "filings",
            Self::Technicals => "technicals",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source that failed during an aggregation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceError {
    /// Failed source.
    pub source: SourceId,
    /// Failure category.
    pub kind: ErrorKind,
    /// Provider error message.
    pub message: String,
}

impl SourceError {
    fn new(source: SourceId, error: &ProviderError) -> Self {
        Self {
            source,
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Everything collected for one ticker.
///
/// A source that failed is `None` and has exactly one entry in `errors`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Requested symbol.
    pub symbol: Symbol,
    /// Company name as given, else as reported by the quote or filings.
    pub company_name: Option<String>,
    /// When the aggregation started.
    pub collected_at: DateTime<Utc>,
    /// Quote snapshot and price histories.
    pub quote: Option<NormalizedQuote>,
    /// Reported metrics and statements.
    pub fundamentals: Option<Fundamentals>,
    /// Ratios computed from `fundamentals`.
    pub ratios: Option<RatioBundle>,
    /// News articles.
    pub articles: Option<Vec<Article>>,
    /// Sentiment of `articles`.
    pub sentiment: Option<SentimentReport>,
    /// Recent filings.
    pub filings: Option<FilingsSummary>,
    /// Technical indicators, when a technicals provider is registered.
    pub technicals: Option<TechnicalIndicators>,
    /// Failed sources in [`SourceId`] order.
    pub errors: Vec<SourceError>,
}

impl AggregateResult {
    /// Returns true if no source failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Returns the recorded error for `source`, if it failed.
    #[must_use]
    pub fn error_for(&self, source: SourceId) -> Option<&SourceError> {
        self.errors.iter().find(|e| e.source == source)
    }
}

/// Fatal aggregation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregateError {
    /// The fan-out did not settle within the hard limit.
    #[error("Aggregation did not complete within {limit:?}")]
    HardTimeout {
        /// Limit that was exceeded.
        limit: Duration,
    },
}

/// Fans out one request per source, tolerating partial failure.
///
/// # Example
///
/// ```rust,ignore
/// use equity::{Aggregator, Settings};
///
/// let aggregator = Aggregator::from_settings(&Settings::from_env()?)?;
/// let result = aggregator.aggregate("MSFT", "Microsoft").await?;
///
/// if let Some(ratios) = &result.ratios {
///     println!("{:?}", ratios.valuation.pe_ratio);
/// }
/// ```
pub struct Aggregator {
    market_data: Option<Arc<dyn MarketDataProvider>>,
    fundamentals: Vec<Arc<dyn FundamentalsProvider>>,
    news: Option<Arc<dyn NewsProvider>>,
    filings: Option<Arc<dyn FilingsProvider>>,
    technicals: Option<Arc<dyn TechnicalsProvider>>,
    sentiment: SentimentEngine,
    lookbacks: Vec<Lookback>,
    news_lookback_days: u32,
    max_articles: usize,
    hard_timeout: Duration,
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("market_data", &self.market_data.as_ref().map(|p| p.name()))
            .field(
                "fundamentals",
                &self.fundamentals.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("news", &self.news.as_ref().map(|p| p.name()))
            .field("filings", &self.filings.as_ref().map(|p| p.name()))
            .field("technicals", &self.technicals.as_ref().map(|p| p.name()))
            .field("model_available", &self.sentiment.model_available())
            .field("hard_timeout", &self.hard_timeout)
            .finish_non_exhaustive()
    }
}

impl Aggregator {
    /// Starts building an aggregator with no providers registered.
    #[must_use]
    pub fn builder() -> AggregatorBuilder {
        AggregatorBuilder::default()
    }

    /// Wires the concrete providers from `settings` over one shared
    /// [`RateLimiter`](equity_core::RateLimiter).
    ///
    /// Yahoo serves market data and fundamentals, NewsAPI serves news and
    /// SEC EDGAR serves filings. With an Alpha Vantage key, Alpha Vantage
    /// serves technicals and backs up Yahoo fundamentals with its company
    /// overview. The FinBERT model is registered only when its key is set.
    pub fn from_settings(settings: &Settings) -> equity_core::Result<Self> {
        let limiter = Arc::new(settings.rate_limiter());

        #[allow(unused_mut)]
        let mut builder = Self::builder()
            .sentiment(SentimentEngine::from_settings(settings, Arc::clone(&limiter))?)
            .hard_timeout(settings.hard_timeout);

        #[cfg(feature = "yahoo")]
        {
            let yahoo = Arc::new(equity_yahoo::YahooProvider::new(
                &settings.yahoo,
                Arc::clone(&limiter),
            )?);
            builder = builder.market_data(yahoo.clone()).fundamentals(yahoo);
        }

        #[cfg(feature = "newsapi")]
        {
            let news =
                equity_newsapi::NewsApiProvider::new(&settings.news_api, Arc::clone(&limiter))?;
            builder = builder.news(Arc::new(news));
        }

        #[cfg(feature = "edgar")]
        {
            let edgar = equity_edgar::EdgarProvider::new(
                &settings.edgar,
                &settings.sec_user_agent,
                Arc::clone(&limiter),
            )?;
            builder = builder.filings(Arc::new(edgar));
        }

        #[cfg(feature = "alphavantage")]
        {
            if settings.alpha_vantage.has_api_key() {
                let alpha = equity_alphavantage::AlphaVantageProvider::new(
                    &settings.alpha_vantage,
                    Arc::clone(&limiter),
                )?;
                let alpha = Arc::new(alpha);
                builder = builder.technicals(alpha.clone()).fundamentals(alpha);
            }
        }

        Ok(builder.build())
    }

    /// Returns the sentiment engine applied to fetched articles.
    #[must_use]
    pub const fn sentiment_engine(&self) -> &SentimentEngine {
        &self.sentiment
    }

    /// Collects every source for `ticker`.
    ///
    /// `company_name` drives the news search; when blank the ticker is
    /// searched instead. Source failures are recorded in
    /// [`AggregateResult::errors`] and never abort the call. Dropping the
    /// returned future cancels in-flight fetches.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::HardTimeout`] if the sources do not settle
    /// within the configured hard limit.
    #[instrument(skip(self))]
    pub async fn aggregate(
        &self,
        ticker: &str,
        company_name: &str,
    ) -> Result<AggregateResult, AggregateError> {
        let symbol = Symbol::new(ticker);
        let collected_at = Utc::now();

        match tokio::time::timeout(self.hard_timeout, self.collect(symbol, company_name, collected_at))
            .await
        {
            Ok(result) => {
                info!(
                    symbol = %result.symbol,
                    failed_sources = result.errors.len(),
                    "Aggregation complete"
                );
                Ok(result)
            }
            Err(_) => {
                warn!(limit = ?self.hard_timeout, "Aggregation exceeded hard timeout");
                Err(AggregateError::HardTimeout {
                    limit: self.hard_timeout,
                })
            }
        }
    }

    async fn collect(
        &self,
        symbol: Symbol,
        company_name: &str,
        collected_at: DateTime<Utc>,
    ) -> AggregateResult {
        let quote_request =
            QuoteRequest::new(symbol.clone()).with_lookbacks(self.lookbacks.clone());
        let from = collected_at
            .date_naive()
            .checked_sub_days(chrono::Days::new(u64::from(self.news_lookback_days)))
            .unwrap_or(NaiveDate::MIN);
        let news_request = NewsRequest::new(symbol.clone(), company_name, from, self.max_articles);

        debug!(symbol = %symbol, query = %news_request.query, "Fetching all sources");

        let (quote, fundamentals, articles, filings, technicals) = tokio::join!(
            fetch(self.market_data.as_deref(), |p| p.fetch_quote(&quote_request)),
            self.fetch_fundamentals(&symbol),
            fetch(self.news.as_deref(), |p| p.fetch_news(&news_request)),
            fetch(self.filings.as_deref(), |p| p.fetch_filings(&symbol)),
            async {
                match self.technicals.as_deref() {
                    Some(provider) => Some(provider.fetch_technicals(&symbol).await),
                    None => None,
                }
            },
        );

        let mut errors = Vec::new();
        let quote = settle(SourceId::MarketData, quote, &mut errors);
        let fundamentals = settle(SourceId::Fundamentals, fundamentals, &mut errors);
        let articles = settle(SourceId::News, articles, &mut errors);
        let filings = settle(SourceId::Filings, filings, &mut errors);
        let technicals = technicals.and_then(|t| settle(SourceId::Technicals, t, &mut errors));

        let ratios = fundamentals.as_ref().map(crate::compute_ratios);
        let sentiment = match &articles {
            Some(articles) => Some(self.sentiment.score(articles).await),
            None => None,
        };

        let company_name = non_blank(company_name)
            .or_else(|| quote.as_ref().and_then(|q| q.snapshot.long_name.clone()))
            .or_else(|| filings.as_ref().and_then(|f| f.company_name.clone()));

        AggregateResult {
            symbol,
            company_name,
            collected_at,
            quote,
            fundamentals,
            ratios,
            articles,
            sentiment,
            filings,
            technicals,
            errors,
        }
    }

    /// Tries each fundamentals provider in registration order; the last
    /// failure is reported when none succeeds.
    async fn fetch_fundamentals(&self, symbol: &Symbol) -> equity_core::Result<Fundamentals> {
        let mut last_error = None;
        for provider in &self.fundamentals {
            match provider.fetch_fundamentals(symbol).await {
                Ok(fundamentals) => return Ok(fundamentals),
                Err(e) => {
                    debug!(
                        provider = provider.name(),
                        symbol = %symbol,
                        error = %e,
                        "Fundamentals provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            ProviderError::NotConfigured("no provider registered".to_string())
        }))
    }
}

/// Runs `call` on a registered provider; an unregistered source is
/// reported as unconfigured.
async fn fetch<'a, P, T, F, Fut>(provider: Option<&'a P>, call: F) -> equity_core::Result<T>
where
    P: ?Sized,
    F: FnOnce(&'a P) -> Fut,
    Fut: Future<Output = equity_core::Result<T>>,
{
    match provider {
        Some(provider) => call(provider).await,
        None => Err(ProviderError::NotConfigured(
            "no provider registered".to_string(),
        )),
    }
}

fn settle<T>(
    source: SourceId,
    outcome: equity_core::Result<T>,
    errors: &mut Vec<SourceError>,
) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(error) => {
            warn!(source = %source, error = %error, "Source failed");
            errors.push(SourceError::new(source, &error));
            None
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Builder for [`Aggregator`].
#[derive(Debug)]
pub struct AggregatorBuilder {
    market_data: Option<Arc<dyn MarketDataProvider>>,
    fundamentals: Vec<Arc<dyn FundamentalsProvider>>,
    news: Option<Arc<dyn NewsProvider>>,
    filings: Option<Arc<dyn FilingsProvider>>,
    technicals: Option<Arc<dyn TechnicalsProvider>>,
    sentiment: SentimentEngine,
    lookbacks: Vec<Lookback>,
    news_lookback_days: u32,
    max_articles: usize,
    hard_timeout: Duration,
}

impl Default for AggregatorBuilder {
    fn default() -> Self {
        Self {
            market_data: None,
            fundamentals: Vec::new(),
            news: None,
            filings: None,
            technicals: None,
            sentiment: SentimentEngine::new(),
            lookbacks: vec![Lookback::OneYear, Lookback::FiveYears],
            news_lookback_days: DEFAULT_NEWS_LOOKBACK_DAYS,
            max_articles: DEFAULT_MAX_ARTICLES,
            hard_timeout: DEFAULT_HARD_TIMEOUT,
        }
    }
}

impl AggregatorBuilder {
    /// Registers the market data provider.
    #[must_use]
    pub fn market_data(mut self, provider: Arc<dyn MarketDataProvider>) -> Self {
        debug!(provider = provider.name(), "Registering market data provider");
        self.market_data = Some(provider);
        self
    }

    /// Registers a fundamentals provider.
    ///
    /// Providers are tried in registration order until one succeeds.
    #[must_use]
    pub fn fundamentals(mut self, provider: Arc<dyn FundamentalsProvider>) -> Self {
        debug!(provider = provider.name(), "Registering fundamentals provider");
        self.fundamentals.push(provider);
        self
    }

    /// Registers the news provider.
    #[must_use]
    pub fn news(mut self, provider: Arc<dyn NewsProvider>) -> Self {
        debug!(provider = provider.name(), "Registering news provider");
        self.news = Some(provider);
        self
    }

    /// Registers the filings provider.
    #[must_use]
    pub fn filings(mut self, provider: Arc<dyn FilingsProvider>) -> Self {
        debug!(provider = provider.name(), "Registering filings provider");
        self.filings = Some(provider);
        self
    }

    /// Registers the optional technicals provider.
    #[must_use]
    pub fn technicals(mut self, provider: Arc<dyn TechnicalsProvider>) -> Self {
        debug!(provider = provider.name(), "Registering technicals provider");
        self.technicals = Some(provider);
        self
    }

    /// Sets the sentiment engine applied to fetched articles.
    #[must_use]
    pub fn sentiment(mut self, engine: SentimentEngine) -> Self {
        self.sentiment = engine;
        self
    }

    /// Sets the price history windows requested with the quote.
    #[must_use]
    pub fn lookbacks(mut self, lookbacks: impl Into<Vec<Lookback>>) -> Self {
        self.lookbacks = lookbacks.into();
        self
    }

    /// Sets how many days back the news search reaches.
    #[must_use]
    pub const fn news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = days;
        self
    }

    /// Sets the most articles requested.
    #[must_use]
    pub const fn max_articles(mut self, max_articles: usize) -> Self {
        self.max_articles = max_articles;
        self
    }

    /// Sets the overall limit on one aggregation.
    #[must_use]
    pub const fn hard_timeout(mut self, hard_timeout: Duration) -> Self {
        self.hard_timeout = hard_timeout;
        self
    }

    /// Builds the aggregator.
    #[must_use]
    pub fn build(self) -> Aggregator {
        Aggregator {
            market_data: self.market_data,
            fundamentals: self.fundamentals,
            news: self.news,
            filings: self.filings,
            technicals: self.technicals,
            sentiment: self.sentiment,
            lookbacks: self.lookbacks,
            news_lookback_days: self.news_lookback_days,
            max_articles: self.max_articles,
            hard_timeout: self.hard_timeout,
        }
    }
}
