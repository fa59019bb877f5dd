#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpha Vantage data provider.
//!
//! This crate implements the [`TechnicalsProvider`] and
//! [`FundamentalsProvider`] traits for the
//! [Alpha Vantage](https://www.alphavantage.co/) API.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use equity_alphavantage::AlphaVantageProvider;
//! use equity_core::{Settings, Symbol, TechnicalsProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::from_env()?;
//!     let limiter = Arc::new(settings.rate_limiter());
//!     let provider = AlphaVantageProvider::new(&settings.alpha_vantage, limiter)?;
//!
//!     let technicals = provider.fetch_technicals(&Symbol::new("AAPL")).await?;
//!     println!("RSI: {:?}", technicals.latest_rsi());
//!
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use equity_core::{
    DataProvider, Fundamentals, FundamentalsProvider, FundamentalsSnapshot, IndicatorPoint,
    ProviderConfig, ProviderError, RateLimiter, Result, Symbol, TechnicalIndicators,
    TechnicalsProvider, http, provider::ids,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

/// Base URL for the Alpha Vantage query API.
const ALPHA_VANTAGE_URL: &str = "https://www.alphavantage.co/query";

/// User agent for HTTP requests.
const USER_AGENT: &str = "equity-alphavantage/0.1";

/// Display name used in errors and logs.
const PROVIDER_NAME: &str = "Alpha Vantage";

/// RSI lookback period.
const RSI_PERIOD: u32 = 14;

/// Alpha Vantage data provider.
///
/// Provides access to:
/// - Daily RSI
/// - Company overview metrics
#[derive(Clone)]
pub struct AlphaVantageProvider {
    client: Client,
    api_key: Option<String>,
    limiter: Arc<RateLimiter>,
}

impl fmt::Debug for AlphaVantageProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlphaVantageProvider")
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}

impl AlphaVantageProvider {
    /// Create a new Alpha Vantage provider from its configuration.
    pub fn new(config: &ProviderConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = http::build_client(config.request_timeout, USER_AGENT)?;
        Ok(Self::with_client(client, config.api_key.clone(), limiter))
    }

    /// Create a new Alpha Vantage provider with a custom HTTP client.
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

    /// Checks the key, spends a permit from `budget` and runs one query.
    async fn query(&self, budget: &str, symbol: &Symbol, params: &[(&str, &str)]) -> Result<Value> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(ProviderError::NotConfigured(format!(
                "{PROVIDER_NAME} requires ALPHA_VANTAGE_API_KEY"
            )));
        };

        self.limiter
            .try_acquire(budget)
            .map_err(|denied| denied.into_error(PROVIDER_NAME))?;

        tracing::debug!(symbol = %symbol, ?params, "Alpha Vantage request");
        let request = self
            .client
            .get(ALPHA_VANTAGE_URL)
            .query(params)
            .query(&[("symbol", symbol.as_str()), ("apikey", api_key)]);

        let body: Value = http::get_json(request, PROVIDER_NAME, symbol.as_str()).await?;
        check_body(symbol, body)
    }
}

impl DataProvider for AlphaVantageProvider {
    fn id(&self) -> &str {
        ids::ALPHA_VANTAGE
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Alpha Vantage technical indicators and company overview"
    }
}

#[async_trait]
impl TechnicalsProvider for AlphaVantageProvider {
    async fn fetch_technicals(&self, symbol: &Symbol) -> Result<TechnicalIndicators> {
        let period = RSI_PERIOD.to_string();
        let body = self
            .query(
                ids::ALPHA_VANTAGE,
                symbol,
                &[
                    ("function", "RSI"),
                    ("interval", "daily"),
                    ("time_period", period.as_str()),
                    ("series_type", "close"),
                ],
            )
            .await?;

        let response: RsiResponse =
            serde_json::from_value(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
        normalize_rsi(response)
    }
}

#[async_trait]
impl FundamentalsProvider for AlphaVantageProvider {
    async fn fetch_fundamentals(&self, symbol: &Symbol) -> Result<Fundamentals> {
        let body = self
            .query(ids::ALPHA_VANTAGE_OVERVIEW, symbol, &[("function", "OVERVIEW")])
            .await?;

        let overview: Overview =
            serde_json::from_value(body).map_err(|e| ProviderError::Parse(e.to_string()))?;
        if overview.symbol.is_none() {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }

        Ok(Fundamentals {
            symbol: symbol.clone(),
            snapshot: normalize_overview(&overview),
            statements: Vec::new(),
        })
    }
}

/// Alpha Vantage reports throttling and bad symbols with HTTP 200 and a
/// message key in the body.
fn check_body(symbol: &Symbol, body: Value) -> Result<Value> {
    let message = |key: &str| body.get(key).and_then(Value::as_str).map(str::to_string);

    if let Some(note) = message("Note").or_else(|| message("Information")) {
        tracing::warn!(symbol = %symbol, %note, "Alpha Vantage throttled request");
        return Err(ProviderError::RateLimited {
            provider: PROVIDER_NAME.to_string(),
            retry_after: Some(Duration::from_secs(60)),
        });
    }
    if let Some(error) = message("Error Message") {
        tracing::debug!(symbol = %symbol, %error, "Alpha Vantage rejected request");
        return Err(ProviderError::NotFound(symbol.to_string()));
    }
    Ok(body)
}

fn normalize_rsi(response: RsiResponse) -> Result<TechnicalIndicators> {
    let Some(series) = response.series else {
        return Err(ProviderError::Parse(
            "response has no \"Technical Analysis: RSI\" series".to_string(),
        ));
    };

    let mut rsi: Vec<IndicatorPoint> = series
        .into_iter()
        .filter_map(|(date, point)| {
            Some(IndicatorPoint {
                date: NaiveDate::parse_from_str(&date, "%Y-%m-%d").ok()?,
                value: number(&point.rsi)?,
            })
        })
        .collect();
    rsi.sort_by_key(|p| p.date);
    Ok(TechnicalIndicators { rsi })
}

fn normalize_overview(o: &Overview) -> FundamentalsSnapshot {
    FundamentalsSnapshot {
        market_cap: number(&o.market_capitalization),
        trailing_pe: number(&o.trailing_pe).or(number(&o.pe_ratio)),
        forward_pe: number(&o.forward_pe),
        peg_ratio: number(&o.peg_ratio),
        price_to_book: number(&o.price_to_book_ratio),
        price_to_sales: number(&o.price_to_sales_ratio_ttm),
        enterprise_to_ebitda: number(&o.ev_to_ebitda),
        enterprise_to_revenue: number(&o.ev_to_revenue),
        book_value: number(&o.book_value),
        operating_margins: number(&o.operating_margin_ttm),
        profit_margins: number(&o.profit_margin),
        return_on_equity: number(&o.return_on_equity_ttm),
        return_on_assets: number(&o.return_on_assets_ttm),
        total_revenue: number(&o.revenue_ttm),
        revenue_growth: number(&o.quarterly_revenue_growth_yoy),
        earnings_growth: number(&o.quarterly_earnings_growth_yoy),
        dividend_yield: number(&o.dividend_yield),
        beta: number(&o.beta),
        ..FundamentalsSnapshot::default()
    }
}

/// Parses an Alpha Vantage numeric string; `"None"`, `"-"` and blanks are absent.
fn number(value: &Option<String>) -> Option<f64> {
    match value.as_deref()?.trim() {
        "" | "-" | "None" => None,
        s => s.parse::<f64>().ok().filter(|v| v.is_finite()),
    }
}

// ============================================================================
// Alpha Vantage API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct RsiResponse {
    #[serde(rename = "Technical Analysis: RSI")]
    series: Option<HashMap<String, RsiPoint>>,
}

#[derive(Debug, Deserialize)]
struct RsiPoint {
    #[serde(rename = "RSI")]
    rsi: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Overview {
    symbol: Option<String>,
    market_capitalization: Option<String>,
    #[serde(rename = "PERatio")]
    pe_ratio: Option<String>,
    #[serde(rename = "TrailingPE")]
    trailing_pe: Option<String>,
    #[serde(rename = "ForwardPE")]
    forward_pe: Option<String>,
    #[serde(rename = "PEGRatio")]
    peg_ratio: Option<String>,
    price_to_book_ratio: Option<String>,
    #[serde(rename = "PriceToSalesRatioTTM")]
    price_to_sales_ratio_ttm: Option<String>,
    #[serde(rename = "EVToEBITDA")]
    ev_to_ebitda: Option<String>,
    #[serde(rename = "EVToRevenue")]
    ev_to_revenue: Option<String>,
    book_value: Option<String>,
    #[serde(rename = "OperatingMarginTTM")]
    operating_margin_ttm: Option<String>,
    profit_margin: Option<String>,
    #[serde(rename = "ReturnOnEquityTTM")]
    return_on_equity_ttm: Option<String>,
    #[serde(rename = "ReturnOnAssetsTTM")]
    return_on_assets_ttm: Option<String>,
    #[serde(rename = "RevenueTTM")]
    revenue_ttm: Option<String>,
    #[serde(rename = "QuarterlyRevenueGrowthYOY")]
    quarterly_revenue_growth_yoy: Option<String>,
    #[serde(rename = "QuarterlyEarningsGrowthYOY")]
    quarterly_earnings_growth_yoy: Option<String>,
    dividend_yield: Option<String>,
    beta: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use equity_core::{ErrorKind, RatePolicy};

    fn symbol() -> Symbol {
        Symbol::new("IBM")
    }

    #[test]
    fn test_normalize_rsi_sorted_ascending() {
        let body: Value = serde_json::from_str(
            r#"{
                "Meta Data": {"1: Symbol": "IBM", "2: Indicator": "Relative Strength Index (RSI)"},
                "Technical Analysis: RSI": {
                    "2024-05-03": {"RSI": "61.2040"},
                    "2024-05-01": {"RSI": "48.7711"},
                    "2024-05-02": {"RSI": "55.0190"},
                    "bad-date": {"RSI": "1.0"}
                }
            }"#,
        )
        .unwrap();
        let response: RsiResponse = serde_json::from_value(check_body(&symbol(), body).unwrap()).unwrap();
        let technicals = normalize_rsi(response).unwrap();

        assert_eq!(technicals.rsi.len(), 3);
        assert_eq!(technicals.rsi[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(technicals.latest_rsi(), Some(61.204));
    }

    #[test]
    fn test_missing_rsi_series_is_parse_error() {
        let body = check_body(&Symbol::new("ZZZZ"), serde_json::json!({})).unwrap();
        let response: RsiResponse = serde_json::from_value(body).unwrap();

        let err = normalize_rsi(response).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ParseError);

        let meta_only = serde_json::json!({"Meta Data": {"1: Symbol": "ZZZZ"}});
        let response: RsiResponse = serde_json::from_value(meta_only).unwrap();
        assert!(matches!(normalize_rsi(response), Err(ProviderError::Parse(_))));
    }

    #[test]
    fn test_empty_rsi_series_is_valid() {
        let body = serde_json::json!({"Technical Analysis: RSI": {}});
        let response: RsiResponse = serde_json::from_value(body).unwrap();

        assert!(normalize_rsi(response).unwrap().rsi.is_empty());
    }

    #[test]
    fn test_normalize_overview_sentinels() {
        let overview: Overview = serde_json::from_str(
            r#"{
                "Symbol": "IBM",
                "Name": "International Business Machines",
                "MarketCapitalization": "153000000000",
                "PERatio": "18.9",
                "PEGRatio": "None",
                "ForwardPE": "-",
                "ProfitMargin": "0.114",
                "ReturnOnEquityTTM": "0.335",
                "Beta": "0.715"
            }"#,
        )
        .unwrap();
        let snapshot = normalize_overview(&overview);

        assert_eq!(snapshot.market_cap, Some(153_000_000_000.0));
        assert_eq!(snapshot.trailing_pe, Some(18.9));
        assert_eq!(snapshot.peg_ratio, None);
        assert_eq!(snapshot.forward_pe, None);
        assert_eq!(snapshot.return_on_equity, Some(0.335));
        assert_eq!(snapshot.current_ratio, None);
    }

    #[test]
    fn test_body_messages() {
        let throttled: Value = serde_json::from_str(
            r#"{"Note": "Thank you for using Alpha Vantage! Our standard API rate limit is 25 requests per day."}"#,
        )
        .unwrap();
        assert_eq!(check_body(&symbol(), throttled).unwrap_err().kind(), ErrorKind::RateLimited);

        let info: Value = serde_json::from_str(r#"{"Information": "Premium endpoint"}"#).unwrap();
        assert_eq!(check_body(&symbol(), info).unwrap_err().kind(), ErrorKind::RateLimited);

        let invalid: Value = serde_json::from_str(r#"{"Error Message": "Invalid API call."}"#).unwrap();
        assert_eq!(
            check_body(&symbol(), invalid).unwrap_err(),
            ProviderError::NotFound("IBM".into())
        );
    }

    #[test]
    fn test_number_parsing() {
        assert_eq!(number(&Some("12.5".into())), Some(12.5));
        assert_eq!(number(&Some("None".into())), None);
        assert_eq!(number(&Some(" - ".into())), None);
        assert_eq!(number(&Some("abc".into())), None);
        assert_eq!(number(&None), None);
    }

    #[tokio::test]
    async fn test_missing_key_does_not_spend_budget() {
        let limiter = Arc::new(
            RateLimiter::builder()
                .budget(ids::ALPHA_VANTAGE, RatePolicy::new(25, Duration::from_secs(12)))
                .build(),
        );
        let provider = AlphaVantageProvider::with_client(Client::new(), None, Arc::clone(&limiter));

        let err = provider.fetch_technicals(&symbol()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unconfigured);
        assert_eq!(limiter.snapshot(ids::ALPHA_VANTAGE).unwrap().calls_made_today, 0);
    }

    #[tokio::test]
    async fn test_call_spacing_denies_second_fetch() {
        let limiter = Arc::new(
            RateLimiter::builder()
                .budget(ids::ALPHA_VANTAGE_OVERVIEW, RatePolicy::new(25, Duration::from_secs(12)))
                .build(),
        );
        limiter.try_acquire(ids::ALPHA_VANTAGE_OVERVIEW).unwrap();
        let provider =
            AlphaVantageProvider::with_client(Client::new(), Some("demo".into()), limiter);

        let err = provider.fetch_fundamentals(&symbol()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RateLimited);
    }
}
