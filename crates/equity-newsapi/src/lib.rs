#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! NewsAPI data provider.
//!
//! This crate implements the [`NewsProvider`] trait for
//! [NewsAPI](https://newsapi.org/).
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use equity_newsapi::NewsApiProvider;
//! use equity_core::{NewsProvider, NewsRequest, Settings, Symbol};
//! use chrono::{Duration, Utc};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let limiter = Arc::new(settings.rate_limiter());
//!     let provider = NewsApiProvider::new(&settings.news_api, limiter)?;
//!
//!     let from = (Utc::now() - Duration::days(7)).date_naive();
//!     let request = NewsRequest::new(Symbol::new("AAPL"), "Apple Inc", from, 20);
//!     let articles = provider.fetch_news(&request).await?;
//!
//!     Ok(())
//! }
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use equity_core::{
    Article, DataProvider, NewsProvider, NewsRequest, ProviderConfig, ProviderError, RateLimiter,
    Result, http, provider::ids,
};
use reqwest::Client;
use serde::Deserialize;

/// Base URL for the NewsAPI v2 API.
const NEWSAPI_BASE_URL: &str = "https://newsapi.org/v2";

/// User agent for HTTP requests.
const USER_AGENT: &str = "equity-newsapi/0.1";

/// Display name used in errors and logs.
const PROVIDER_NAME: &str = "NewsAPI";

/// NewsAPI allows at most 100 articles per page.
const MAX_PAGE_SIZE: usize = 100;

/// NewsAPI news provider.
#[derive(Clone)]
pub struct NewsApiProvider {
    client: Client,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl fmt::Debug for NewsApiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsApiProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl NewsApiProvider {
    /// Create a new NewsAPI provider from its configuration.
    ///
    /// A missing API key is not an error here; fetches fail with
    /// [`ProviderError::NotConfigured`] instead.
    pub fn new(config: &ProviderConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = http::build_client(config.request_timeout, USER_AGENT)?;
        Ok(Self::with_client(client, config.api_key.clone(), limiter))
    }

    /// Create a new NewsAPI provider with a custom HTTP client.
    #[must_use]
    pub const fn with_client(
        client: Client,
        api_key: Option<String>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            api_key,
            limiter,
        }
    }

    /// Returns true if an API key is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn search(&self, api_key: &str, request: &NewsRequest) -> Result<EverythingResponse> {
        let page_size = request.max_articles.clamp(1, MAX_PAGE_SIZE).to_string();
        let from = request.from.format("%Y-%m-%d").to_string();
        tracing::debug!(query = %request.query, %from, "NewsAPI request");

        let response = self
            .client
            .get(format!("{NEWSAPI_BASE_URL}/everything"))
            .query(&[
                ("q", request.query.as_str()),
                ("from", from.as_str()),
                ("sortBy", "relevancy"),
                ("language", "en"),
                ("pageSize", page_size.as_str()),
                ("apiKey", api_key),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        // Error bodies carry a code that is more precise than the status.
        if let Ok(error) = serde_json::from_str::<ErrorResponse>(&text)
            && error.status == "error"
        {
            return Err(api_error(error));
        }
        if let Some(error) = http::status_error(status, PROVIDER_NAME, request.symbol.as_str()) {
            return Err(error);
        }

        http::decode_json(&text)
    }
}

impl DataProvider for NewsApiProvider {
    fn id(&self) -> &str {
        ids::NEWSAPI
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Company news articles from NewsAPI"
    }
}

#[async_trait]
impl NewsProvider for NewsApiProvider {
    async fn fetch_news(&self, request: &NewsRequest) -> Result<Vec<Article>> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured(format!(
                "{PROVIDER_NAME} requires NEWSAPI_KEY"
            )));
        };
        if request.max_articles == 0 {
            return Ok(Vec::new());
        }

        self.limiter
            .try_acquire(ids::NEWSAPI)
            .map_err(|denied| denied.into_error(PROVIDER_NAME))?;

        let response = self.search(api_key, request).await?;
        let articles = normalize_articles(response, request.max_articles);
        tracing::debug!(symbol = %request.symbol, count = articles.len(), "Fetched news");
        Ok(articles)
    }
}

fn api_error(error: ErrorResponse) -> ProviderError {
    let message = error.message.unwrap_or_default();
    match error.code.as_deref() {
        Some("rateLimited") => ProviderError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            retry_after: Some(Duration::from_secs(3600)),
        },
        Some("apiKeyInvalid" | "apiKeyMissing" | "apiKeyDisabled" | "apiKeyExhausted") => {
            ProviderError::NotConfigured(format!("{PROVIDER_NAME}: {message}"))
        }
        Some(code) => ProviderError::Upstream(format!("{PROVIDER_NAME} {code}: {message}")),
        None => ProviderError::Upstream(format!("{PROVIDER_NAME}: {message}")),
    }
}

fn normalize_articles(response: EverythingResponse, max_articles: usize) -> Vec<Article> {
    response
        .articles
        .into_iter()
        .take(max_articles)
        .map(|a| Article {
            title: non_blank(a.title),
            description: non_blank(a.description),
            url: non_blank(a.url),
            source_name: a.source.and_then(|s| non_blank(s.name)),
            published_at: a
                .published_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            content: non_blank(a.content),
        })
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// ============================================================================
// NewsAPI Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    source: Option<NewsApiSource>,
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    status: String,
    code: Option<String>,
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use equity_core::{ErrorKind, RatePolicy, Symbol};

    const EVERYTHING_JSON: &str = r#"{
        "status": "ok",
        "totalResults": 3,
        "articles": [
            {
                "source": {"id": null, "name": "Reuters"},
                "author": "Jane Doe",
                "title": "Apple beats estimates",
                "description": "Strong iPhone sales lifted revenue.",
                "url": "https://example.com/a",
                "publishedAt": "2024-05-03T12:30:00Z",
                "content": "Apple reported..."
            },
            {
                "source": {"id": null, "name": ""},
                "title": "Apple faces probe",
                "description": null,
                "url": "https://example.com/b",
                "publishedAt": "not a date",
                "content": null
            },
            {
                "source": null,
                "title": "Third story",
                "description": "More",
                "url": null,
                "publishedAt": null,
                "content": null
            }
        ]
    }"#;

    fn request(max_articles: usize) -> NewsRequest {
        let from = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        NewsRequest::new(Symbol::new("AAPL"), "Apple Inc", from, max_articles)
    }

    #[test]
    fn test_normalize_articles() {
        let response: EverythingResponse = serde_json::from_str(EVERYTHING_JSON).unwrap();
        let articles = normalize_articles(response, 20);

        assert_eq!(articles.len(), 3);
        assert_eq!(articles[0].source_name.as_deref(), Some("Reuters"));
        assert_eq!(
            articles[0].published_at,
            Some(DateTime::parse_from_rfc3339("2024-05-03T12:30:00Z").unwrap().with_timezone(&Utc))
        );
        assert_eq!(articles[1].source_name, None);
        assert_eq!(articles[1].published_at, None);
        assert_eq!(articles[1].description, None);
        assert_eq!(articles[2].url, None);
    }

    #[test]
    fn test_normalize_articles_caps_count() {
        let response: EverythingResponse = serde_json::from_str(EVERYTHING_JSON).unwrap();
        assert_eq!(normalize_articles(response, 2).len(), 2);
    }

    #[test]
    fn test_api_error_mapping() {
        let rate_limited: ErrorResponse = serde_json::from_str(
            r#"{"status": "error", "code": "rateLimited", "message": "Too many requests"}"#,
        )
        .unwrap();
        assert_eq!(api_error(rate_limited).kind(), ErrorKind::RateLimited);

        let invalid: ErrorResponse = serde_json::from_str(
            r#"{"status": "error", "code": "apiKeyInvalid", "message": "Bad key"}"#,
        )
        .unwrap();
        assert_eq!(api_error(invalid).kind(), ErrorKind::Unconfigured);

        let other: ErrorResponse = serde_json::from_str(
            r#"{"status": "error", "code": "unexpectedError", "message": "Oops"}"#,
        )
        .unwrap();
        assert_eq!(api_error(other).kind(), ErrorKind::UpstreamError);
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let provider = NewsApiProvider::with_client(
            Client::new(),
            Some("secret_key_12345".into()),
            Arc::new(RateLimiter::unlimited()),
        );
        let debug_str = format!("{provider:?}");
        assert!(!debug_str.contains("secret_key_12345"));
        assert!(debug_str.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_missing_key_does_not_spend_budget() {
        let limiter = Arc::new(
            RateLimiter::builder()
                .budget(ids::NEWSAPI, RatePolicy::new(10, Duration::ZERO))
                .build(),
        );
        let provider = NewsApiProvider::with_client(Client::new(), None, Arc::clone(&limiter));

        let err = provider.fetch_news(&request(20)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconfigured);
        assert_eq!(limiter.snapshot(ids::NEWSAPI).unwrap().calls_made_today, 0);
    }

    #[tokio::test]
    async fn test_exhausted_budget_is_rate_limited() {
        let limiter = Arc::new(
            RateLimiter::builder()
                .budget(ids::NEWSAPI, RatePolicy::new(0, Duration::ZERO))
                .build(),
        );
        let provider =
            NewsApiProvider::with_client(Client::new(), Some("key".into()), limiter);

        let err = provider.fetch_news(&request(20)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }
}
