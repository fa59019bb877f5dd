#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Yahoo Finance data provider.
//!
//! This crate provides a Yahoo Finance data provider that implements the
//! [`DataProvider`], [`MarketDataProvider`], and [`FundamentalsProvider`]
//! traits from `equity-core`.
//!
//! # Features
//!
//! - Daily price histories from the chart API, one request per lookback
//! - Quote snapshot from the quote summary API, falling back to chart metadata
//! - Reported ratios and annual statements from the quote summary API
//! - Budgeted through the shared [`RateLimiter`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use equity_yahoo::YahooProvider;
//! use equity_core::{MarketDataProvider, ProviderConfig, QuoteRequest, RateLimiter, Symbol};
//! use std::time::Duration;
//!
//! # async fn example() -> equity_core::Result<()> {
//! let config = ProviderConfig::new(2000, Duration::ZERO);
//! let provider = YahooProvider::new(&config, Arc::new(RateLimiter::unlimited()))?;
//!
//! let quote = provider.fetch_quote(&QuoteRequest::new(Symbol::new("AAPL"))).await?;
//! println!("Price: {:?}", quote.snapshot.price);
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use equity_core::{
    DataProvider, FinancialStatement, Fundamentals, FundamentalsProvider, FundamentalsSnapshot,
    Lookback, MarketDataProvider, NormalizedQuote, OhlcvBar, PeriodType, PriceHistory,
    ProviderConfig, ProviderError, QuoteRequest, QuoteSnapshot, RateLimiter, Result, Symbol, http,
    provider::ids,
};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, warn};

/// Yahoo Finance chart API base URL.
const CHART_API_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Yahoo Finance quote summary API base URL.
const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";

/// Quote summary modules backing the quote snapshot.
const QUOTE_MODULES: &str = "price,summaryDetail";

/// Quote summary modules backing fundamentals.
const FUNDAMENTAL_MODULES: &str = "financialData,defaultKeyStatistics,summaryDetail,\
incomeStatementHistory,balanceSheetHistory,cashflowStatementHistory";

/// User agent for HTTP requests.
const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";

/// Display name used in errors and logs.
const PROVIDER_NAME: &str = "Yahoo Finance";

/// Yahoo Finance data provider.
///
/// Implements [`DataProvider`], [`MarketDataProvider`], and [`FundamentalsProvider`].
#[derive(Debug, Clone)]
pub struct YahooProvider {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
}

impl YahooProvider {
    /// Create a new Yahoo Finance provider using the configured request timeout.
    pub fn new(config: &ProviderConfig, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = http::build_client(config.request_timeout, USER_AGENT)?;
        Ok(Self::with_client(client, limiter))
    }

    /// Create a new Yahoo Finance provider with a custom HTTP client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self { client, limiter }
    }

    /// Spend one permit from the budget registered under `budget`.
    fn acquire(&self, budget: &str) -> Result<()> {
        self.limiter
            .try_acquire(budget)
            .map(|_| ())
            .map_err(|denied| denied.into_error(PROVIDER_NAME))
    }

    /// Build the chart API URL for a symbol and lookback window.
    fn build_chart_url(symbol: &Symbol, lookback: Lookback) -> String {
        format!(
            "{}/{}?range={}&interval=1d&includeAdjustedClose=true",
            CHART_API_URL,
            symbol.as_str(),
            lookback.as_range()
        )
    }

    /// Build the quote summary URL for a symbol and module list.
    fn build_summary_url(symbol: &Symbol, modules: &str) -> String {
        format!("{}/{}?modules={}", QUOTE_SUMMARY_URL, symbol.as_str(), modules)
    }

    /// Fetch one chart window.
    async fn fetch_chart(&self, symbol: &Symbol, lookback: Lookback) -> Result<ChartData> {
        let url = Self::build_chart_url(symbol, lookback);
        debug!(symbol = %symbol, %lookback, "Fetching chart");

        let response: ChartResponse =
            http::get_json(self.client.get(&url), PROVIDER_NAME, symbol.as_str()).await?;
        chart_result(symbol, response)
    }

    /// Fetch quote summary data for a symbol.
    async fn fetch_quote_summary(&self, symbol: &Symbol, modules: &str) -> Result<QuoteSummaryData> {
        let url = Self::build_summary_url(symbol, modules);
        debug!(symbol = %symbol, modules, "Fetching quote summary");

        let response: QuoteSummaryResponse =
            http::get_json(self.client.get(&url), PROVIDER_NAME, symbol.as_str()).await?;
        summary_result(symbol, response)
    }
}

impl DataProvider for YahooProvider {
    fn id(&self) -> &str {
        ids::YAHOO
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "Yahoo Finance quotes, daily price history and reported fundamentals"
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<NormalizedQuote> {
        if request.lookbacks.is_empty() {
            return Err(ProviderError::InvalidParameter(
                "At least one lookback window is required".to_string(),
            ));
        }

        self.acquire(ids::YAHOO)?;
        let symbol = &request.symbol;

        // Histories are independent requests; run them alongside the summary.
        let (summary, charts) = tokio::join!(
            self.fetch_quote_summary(symbol, QUOTE_MODULES),
            join_all(
                request
                    .lookbacks
                    .iter()
                    .map(|lookback| self.fetch_chart(symbol, *lookback))
            ),
        );

        let charts = request
            .lookbacks
            .iter()
            .copied()
            .zip(charts)
            .map(|(lookback, chart)| chart.map(|c| (lookback, c)))
            .collect::<Result<Vec<_>>>()?;

        let summary = match summary {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Quote summary unavailable, using chart metadata");
                None
            }
        };

        Ok(normalize_quote(symbol, charts, summary.as_ref()))
    }
}

#[async_trait]
impl FundamentalsProvider for YahooProvider {
    async fn fetch_fundamentals(&self, symbol: &Symbol) -> Result<Fundamentals> {
        self.acquire(ids::YAHOO_FUNDAMENTALS)?;
        let summary = self.fetch_quote_summary(symbol, FUNDAMENTAL_MODULES).await?;
        Ok(normalize_fundamentals(symbol, &summary))
    }
}

// ============================================================================
// Normalization
// ============================================================================

/// Unwrap the chart envelope, mapping API-level errors.
fn chart_result(symbol: &Symbol, response: ChartResponse) -> Result<ChartData> {
    if let Some(error) = response.chart.error {
        if error.code == "Not Found" {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        return Err(ProviderError::Upstream(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    response
        .chart
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
}

/// Unwrap the quote summary envelope, mapping API-level errors.
fn summary_result(symbol: &Symbol, response: QuoteSummaryResponse) -> Result<QuoteSummaryData> {
    if let Some(error) = response.quote_summary.error {
        if error.code == "Not Found" {
            return Err(ProviderError::NotFound(symbol.to_string()));
        }
        return Err(ProviderError::Upstream(format!(
            "{}: {}",
            error.code, error.description
        )));
    }

    response
        .quote_summary
        .result
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
}

/// Convert chart data into bars, dropping rows with missing prices.
fn parse_bars(chart: &ChartData) -> Vec<OhlcvBar> {
    let timestamps = chart.timestamp.as_deref().unwrap_or_default();
    let Some(quote) = chart.indicators.quote.first() else {
        return Vec::new();
    };
    let adj_close = chart
        .indicators
        .adjclose
        .as_ref()
        .and_then(|ac| ac.first())
        .map(|ac| ac.adjclose.as_slice())
        .unwrap_or_default();

    let at = |values: &[Option<f64>], i: usize| values.get(i).copied().flatten();

    timestamps
        .iter()
        .enumerate()
        .filter_map(|(i, &ts)| {
            let timestamp = Utc.timestamp_opt(ts, 0).single()?;
            let bar = OhlcvBar::new(
                timestamp,
                at(&quote.open, i)?,
                at(&quote.high, i)?,
                at(&quote.low, i)?,
                at(&quote.close, i)?,
                quote.volume.get(i).copied().flatten(),
            );
            Some(match at(adj_close, i) {
                Some(adjusted) => bar.with_adjusted_close(adjusted),
                None => bar,
            })
        })
        .collect()
}

/// Build a quote from chart windows and an optional quote summary.
fn normalize_quote(
    symbol: &Symbol,
    charts: Vec<(Lookback, ChartData)>,
    summary: Option<&QuoteSummaryData>,
) -> NormalizedQuote {
    let meta = charts
        .first()
        .and_then(|(_, chart)| chart.meta.clone())
        .unwrap_or_default();

    let history: Vec<PriceHistory> = charts
        .iter()
        .map(|(lookback, chart)| PriceHistory {
            lookback: *lookback,
            bars: parse_bars(chart),
        })
        .collect();

    let mut snapshot = summary.map(snapshot_from_summary).unwrap_or_default();

    snapshot.price = snapshot.price.or(meta.regular_market_price);
    snapshot.previous_close = snapshot
        .previous_close
        .or(meta.previous_close)
        .or(meta.chart_previous_close);
    snapshot.volume = snapshot.volume.or(meta.regular_market_volume);
    snapshot.week_52_high = snapshot.week_52_high.or(meta.fifty_two_week_high);
    snapshot.week_52_low = snapshot.week_52_low.or(meta.fifty_two_week_low);
    snapshot.currency = snapshot.currency.or(meta.currency);
    snapshot.long_name = snapshot.long_name.or(meta.long_name);
    snapshot.exchange = snapshot.exchange.or(meta.exchange_name);

    if snapshot.price.is_none() {
        snapshot.price = history
            .iter()
            .filter_map(|h| h.last())
            .max_by_key(|bar| bar.timestamp)
            .map(|bar| bar.close);
    }

    NormalizedQuote {
        symbol: symbol.clone(),
        snapshot: snapshot.with_derived_change(),
        history,
    }
}

fn snapshot_from_summary(summary: &QuoteSummaryData) -> QuoteSnapshot {
    let price = summary.price.clone().unwrap_or_default();
    let detail = summary.summary_detail.clone().unwrap_or_default();

    QuoteSnapshot {
        price: raw(&price.regular_market_price),
        previous_close: raw(&price.regular_market_previous_close).or(raw(&detail.previous_close)),
        change: raw(&price.regular_market_change),
        change_percent: None,
        volume: raw(&price.regular_market_volume)
            .or(raw(&detail.volume))
            .filter(|v| *v >= 0.0)
            .map(|v| v as u64),
        market_cap: raw(&price.market_cap).or(raw(&detail.market_cap)),
        trailing_pe: raw(&detail.trailing_pe),
        forward_pe: raw(&detail.forward_pe),
        beta: raw(&detail.beta),
        week_52_high: raw(&detail.fifty_two_week_high),
        week_52_low: raw(&detail.fifty_two_week_low),
        dividend_yield: raw(&detail.dividend_yield),
        currency: price.currency,
        long_name: price.long_name.or(price.short_name),
        exchange: price.exchange_name,
    }
}

/// Build fundamentals from a quote summary.
fn normalize_fundamentals(symbol: &Symbol, summary: &QuoteSummaryData) -> Fundamentals {
    let financial = summary.financial_data.clone().unwrap_or_default();
    let stats = summary.default_key_statistics.clone().unwrap_or_default();
    let detail = summary.summary_detail.clone().unwrap_or_default();

    let snapshot = FundamentalsSnapshot {
        market_cap: raw(&detail.market_cap),
        enterprise_value: raw(&stats.enterprise_value),
        trailing_pe: raw(&detail.trailing_pe),
        forward_pe: raw(&stats.forward_pe).or(raw(&detail.forward_pe)),
        peg_ratio: raw(&stats.peg_ratio),
        price_to_book: raw(&stats.price_to_book),
        price_to_sales: raw(&detail.price_to_sales_trailing_12_months),
        enterprise_to_ebitda: raw(&stats.enterprise_to_ebitda),
        enterprise_to_revenue: raw(&stats.enterprise_to_revenue),
        book_value: raw(&stats.book_value),
        gross_margins: raw(&financial.gross_margins),
        operating_margins: raw(&financial.operating_margins),
        profit_margins: raw(&financial.profit_margins).or(raw(&stats.profit_margins)),
        ebitda_margins: raw(&financial.ebitda_margins),
        return_on_equity: raw(&financial.return_on_equity),
        return_on_assets: raw(&financial.return_on_assets),
        current_ratio: raw(&financial.current_ratio),
        quick_ratio: raw(&financial.quick_ratio),
        debt_to_equity: raw(&financial.debt_to_equity),
        total_cash: raw(&financial.total_cash),
        total_cash_per_share: raw(&financial.total_cash_per_share),
        total_debt: raw(&financial.total_debt),
        total_revenue: raw(&financial.total_revenue),
        revenue_growth: raw(&financial.revenue_growth),
        earnings_growth: raw(&financial.earnings_growth),
        dividend_yield: raw(&detail.dividend_yield),
        beta: raw(&stats.beta).or(raw(&detail.beta)),
    };

    Fundamentals {
        symbol: symbol.clone(),
        snapshot,
        statements: merge_statements(summary),
    }
}

/// Merge the three annual statement histories by period end, newest first.
fn merge_statements(summary: &QuoteSummaryData) -> Vec<FinancialStatement> {
    let mut by_date: BTreeMap<NaiveDate, FinancialStatement> = BTreeMap::new();

    let income = summary
        .income_statement_history
        .as_ref()
        .map(|h| h.income_statement_history.as_slice())
        .unwrap_or_default();
    let balance = summary
        .balance_sheet_history
        .as_ref()
        .map(|h| h.balance_sheet_statements.as_slice())
        .unwrap_or_default();
    let cash = summary
        .cashflow_statement_history
        .as_ref()
        .map(|h| h.cashflow_statements.as_slice())
        .unwrap_or_default();

    for item in income {
        let Some(date) = end_date(&item.end_date) else {
            continue;
        };
        let stmt = by_date
            .entry(date)
            .or_insert_with(|| FinancialStatement::new(date, PeriodType::Annual));
        stmt.revenue = raw(&item.total_revenue);
        stmt.gross_profit = raw(&item.gross_profit);
        stmt.operating_income = raw(&item.operating_income);
        stmt.net_income = raw(&item.net_income);
        stmt.interest_expense = raw(&item.interest_expense);
    }

    for item in balance {
        let Some(date) = end_date(&item.end_date) else {
            continue;
        };
        let stmt = by_date
            .entry(date)
            .or_insert_with(|| FinancialStatement::new(date, PeriodType::Annual));
        stmt.total_assets = raw(&item.total_assets);
        stmt.current_assets = raw(&item.total_current_assets);
        stmt.cash_and_equivalents = raw(&item.cash);
        stmt.inventory = raw(&item.inventory);
        stmt.total_liabilities = raw(&item.total_liab);
        stmt.current_liabilities = raw(&item.total_current_liabilities);
        stmt.stockholders_equity = raw(&item.total_stockholder_equity);
        stmt.total_debt = match (raw(&item.long_term_debt), raw(&item.short_long_term_debt)) {
            (Some(long), Some(short)) => Some(long + short),
            (Some(long), None) => Some(long),
            (None, Some(short)) => Some(short),
            (None, None) => None,
        };
    }

    for item in cash {
        let Some(date) = end_date(&item.end_date) else {
            continue;
        };
        let stmt = by_date
            .entry(date)
            .or_insert_with(|| FinancialStatement::new(date, PeriodType::Annual));
        stmt.operating_cash_flow = raw(&item.total_cash_from_operating_activities);
        stmt.capital_expenditures = raw(&item.capital_expenditures);
        stmt.dividends_paid = raw(&item.dividends_paid);
    }

    by_date.into_values().rev().collect()
}

/// Extract a finite number from a Yahoo `{raw, fmt}` value.
///
/// Yahoo reports absent values as `{}` and sometimes non-finite values as
/// strings such as `"Infinity"`; both map to `None`.
fn raw(value: &Option<RawValue>) -> Option<f64> {
    value
        .as_ref()?
        .raw
        .as_ref()?
        .as_f64()
        .filter(|v| v.is_finite())
}

fn end_date(value: &Option<RawValue>) -> Option<NaiveDate> {
    let secs = raw(value)? as i64;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

// ============================================================================
// Yahoo Finance API Response Types
// ============================================================================

/// Chart API response.
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartResult,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    result: Option<Vec<ChartData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    meta: Option<ChartMeta>,
    timestamp: Option<Vec<i64>>,
    indicators: Indicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    currency: Option<String>,
    exchange_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<f64>,
    chart_previous_close: Option<f64>,
    previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    quote: Vec<QuoteData>,
    adjclose: Option<Vec<AdjClose>>,
}

#[derive(Debug, Deserialize)]
struct QuoteData {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjClose {
    adjclose: Vec<Option<f64>>,
}

/// Quote Summary API response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryResponse {
    quote_summary: QuoteSummaryResult,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryResult {
    result: Option<Vec<QuoteSummaryData>>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteSummaryData {
    price: Option<PriceModule>,
    summary_detail: Option<SummaryDetail>,
    financial_data: Option<FinancialData>,
    default_key_statistics: Option<KeyStatistics>,
    income_statement_history: Option<IncomeStatementHistory>,
    balance_sheet_history: Option<BalanceSheetHistory>,
    cashflow_statement_history: Option<CashflowStatementHistory>,
}

/// A Yahoo `{raw, fmt}` number.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawValue {
    raw: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Option<RawValue>,
    regular_market_previous_close: Option<RawValue>,
    regular_market_change: Option<RawValue>,
    regular_market_volume: Option<RawValue>,
    market_cap: Option<RawValue>,
    currency: Option<String>,
    long_name: Option<String>,
    short_name: Option<String>,
    exchange_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    previous_close: Option<RawValue>,
    volume: Option<RawValue>,
    market_cap: Option<RawValue>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    beta: Option<RawValue>,
    fifty_two_week_high: Option<RawValue>,
    fifty_two_week_low: Option<RawValue>,
    dividend_yield: Option<RawValue>,
    price_to_sales_trailing_12_months: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    current_ratio: Option<RawValue>,
    quick_ratio: Option<RawValue>,
    debt_to_equity: Option<RawValue>,
    return_on_equity: Option<RawValue>,
    return_on_assets: Option<RawValue>,
    gross_margins: Option<RawValue>,
    operating_margins: Option<RawValue>,
    profit_margins: Option<RawValue>,
    ebitda_margins: Option<RawValue>,
    total_cash: Option<RawValue>,
    total_cash_per_share: Option<RawValue>,
    total_debt: Option<RawValue>,
    total_revenue: Option<RawValue>,
    revenue_growth: Option<RawValue>,
    earnings_growth: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeyStatistics {
    enterprise_value: Option<RawValue>,
    #[serde(rename = "forwardPE")]
    forward_pe: Option<RawValue>,
    peg_ratio: Option<RawValue>,
    price_to_book: Option<RawValue>,
    enterprise_to_revenue: Option<RawValue>,
    enterprise_to_ebitda: Option<RawValue>,
    book_value: Option<RawValue>,
    profit_margins: Option<RawValue>,
    beta: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementHistory {
    #[serde(default)]
    income_statement_history: Vec<IncomeStatementItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IncomeStatementItem {
    end_date: Option<RawValue>,
    total_revenue: Option<RawValue>,
    gross_profit: Option<RawValue>,
    operating_income: Option<RawValue>,
    net_income: Option<RawValue>,
    interest_expense: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetHistory {
    #[serde(default)]
    balance_sheet_statements: Vec<BalanceSheetItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BalanceSheetItem {
    end_date: Option<RawValue>,
    total_assets: Option<RawValue>,
    total_current_assets: Option<RawValue>,
    cash: Option<RawValue>,
    inventory: Option<RawValue>,
    total_liab: Option<RawValue>,
    total_current_liabilities: Option<RawValue>,
    long_term_debt: Option<RawValue>,
    short_long_term_debt: Option<RawValue>,
    total_stockholder_equity: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashflowStatementHistory {
    #[serde(default)]
    cashflow_statements: Vec<CashflowItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CashflowItem {
    end_date: Option<RawValue>,
    total_cash_from_operating_activities: Option<RawValue>,
    capital_expenditures: Option<RawValue>,
    dividends_paid: Option<RawValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHART_JSON: &str = r#"{
        "chart": {
            "result": [{
                "meta": {
                    "currency": "USD",
                    "exchangeName": "NMS",
                    "regularMarketPrice": 191.5,
                    "chartPreviousClose": 185.0,
                    "fiftyTwoWeekHigh": 199.6
                },
                "timestamp": [1704205800, 1704292200, 1704378600],
                "indicators": {
                    "quote": [{
                        "open": [187.1, null, 182.1],
                        "high": [188.4, 185.9, 183.0],
                        "low": [183.8, 183.4, 180.8],
                        "close": [185.6, 184.2, 181.9],
                        "volume": [82488700, 58414500, null]
                    }],
                    "adjclose": [{"adjclose": [184.9, 183.5, 181.2]}]
                }
            }],
            "error": null
        }
    }"#;

    const SUMMARY_JSON: &str = r#"{
        "quoteSummary": {
            "result": [{
                "financialData": {
                    "currentRatio": {"raw": 0.988, "fmt": "0.99"},
                    "quickRatio": {},
                    "debtToEquity": {"raw": 145.8, "fmt": "145.80"},
                    "returnOnEquity": {"raw": 1.56, "fmt": "156.08%"},
                    "profitMargins": {"raw": 0.2531, "fmt": "25.31%"},
                    "grossMargins": {"raw": 0.4413},
                    "revenueGrowth": {"raw": 0.021}
                },
                "defaultKeyStatistics": {
                    "forwardPE": {"raw": 28.1},
                    "pegRatio": {"raw": "Infinity"},
                    "priceToBook": {"raw": 47.2}
                },
                "summaryDetail": {
                    "trailingPE": {"raw": 30.4},
                    "marketCap": {"raw": 2.95e12}
                },
                "incomeStatementHistory": {
                    "incomeStatementHistory": [
                        {"endDate": {"raw": 1696032000}, "totalRevenue": {"raw": 383285000000}, "netIncome": {"raw": 96995000000}, "operatingIncome": {"raw": 114301000000}, "interestExpense": {"raw": -3933000000}},
                        {"endDate": {"raw": 1664496000}, "totalRevenue": {"raw": 394328000000}, "netIncome": {"raw": 99803000000}}
                    ]
                },
                "balanceSheetHistory": {
                    "balanceSheetStatements": [
                        {"endDate": {"raw": 1696032000}, "totalAssets": {"raw": 352583000000}, "totalStockholderEquity": {"raw": 62146000000}, "longTermDebt": {"raw": 95281000000}, "shortLongTermDebt": {"raw": 9822000000}}
                    ]
                },
                "cashflowStatementHistory": {
                    "cashflowStatements": [
                        {"endDate": {"raw": 1696032000}, "totalCashFromOperatingActivities": {"raw": 110543000000}, "capitalExpenditures": {"raw": -10959000000}}
                    ]
                }
            }],
            "error": null
        }
    }"#;

    fn chart() -> ChartData {
        let response: ChartResponse = serde_json::from_str(CHART_JSON).unwrap();
        chart_result(&Symbol::new("AAPL"), response).unwrap()
    }

    fn summary() -> QuoteSummaryData {
        let response: QuoteSummaryResponse = serde_json::from_str(SUMMARY_JSON).unwrap();
        summary_result(&Symbol::new("AAPL"), response).unwrap()
    }

    #[test]
    fn test_build_chart_url() {
        let url = YahooProvider::build_chart_url(&Symbol::new("AAPL"), Lookback::FiveYears);

        assert!(url.contains("AAPL"));
        assert!(url.contains("range=5y"));
        assert!(url.contains("interval=1d"));
    }

    #[test]
    fn test_parse_bars_drops_incomplete_rows() {
        let bars = parse_bars(&chart());

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].close, 185.6);
        assert_eq!(bars[0].adjusted_close, Some(184.9));
        assert_eq!(bars[1].volume, None);
        assert!(bars[0].timestamp < bars[1].timestamp);
    }

    #[test]
    fn test_quote_falls_back_to_chart_meta() {
        let quote = normalize_quote(
            &Symbol::new("AAPL"),
            vec![(Lookback::OneYear, chart())],
            None,
        );

        assert_eq!(quote.snapshot.price, Some(191.5));
        assert_eq!(quote.snapshot.previous_close, Some(185.0));
        assert_eq!(quote.snapshot.change, Some(6.5));
        assert_eq!(quote.snapshot.currency.as_deref(), Some("USD"));
        assert_eq!(quote.snapshot.trailing_pe, None);
        assert_eq!(quote.history_for(Lookback::OneYear).unwrap().len(), 2);
    }

    #[test]
    fn test_quote_price_falls_back_to_last_close() {
        let mut data = chart();
        data.meta = None;
        let quote = normalize_quote(&Symbol::new("AAPL"), vec![(Lookback::OneYear, data)], None);
        assert_eq!(quote.snapshot.price, Some(181.9));
    }

    #[test]
    fn test_fundamentals_snapshot_keeps_missing_as_none() {
        let fundamentals = normalize_fundamentals(&Symbol::new("AAPL"), &summary());
        let snapshot = &fundamentals.snapshot;

        assert_eq!(snapshot.current_ratio, Some(0.988));
        assert_eq!(snapshot.quick_ratio, None);
        assert_eq!(snapshot.peg_ratio, None);
        assert_eq!(snapshot.trailing_pe, Some(30.4));
        assert_eq!(snapshot.forward_pe, Some(28.1));
        assert_eq!(snapshot.operating_margins, None);
    }

    #[test]
    fn test_statements_merged_newest_first() {
        let fundamentals = normalize_fundamentals(&Symbol::new("AAPL"), &summary());
        let statements = &fundamentals.statements;

        assert_eq!(statements.len(), 2);
        assert!(statements[0].period_end > statements[1].period_end);

        let latest = &statements[0];
        assert_eq!(latest.revenue, Some(383_285_000_000.0));
        assert_eq!(latest.total_debt, Some(105_103_000_000.0));
        assert_eq!(latest.stockholders_equity, Some(62_146_000_000.0));
        assert_eq!(latest.free_cash_flow(), Some(99_584_000_000.0));

        let previous = &statements[1];
        assert_eq!(previous.revenue, Some(394_328_000_000.0));
        assert_eq!(previous.total_assets, None);
    }

    #[test]
    fn test_not_found_error() {
        let response: ChartResponse = serde_json::from_str(
            r#"{"chart": {"result": null, "error": {"code": "Not Found", "description": "No data found, symbol may be delisted"}}}"#,
        )
        .unwrap();
        let err = chart_result(&Symbol::new("ZZZZ"), response).unwrap_err();
        assert_eq!(err, ProviderError::NotFound("ZZZZ".into()));
    }

    #[test]
    fn test_provider_info() {
        let provider =
            YahooProvider::with_client(reqwest::Client::new(), Arc::new(RateLimiter::unlimited()));
        assert_eq!(provider.name(), "Yahoo Finance");
        assert_eq!(provider.id(), ids::YAHOO);
    }

    #[tokio::test]
    async fn test_exhausted_budget_skips_network() {
        use equity_core::RatePolicy;
        use std::time::Duration;

        let limiter = Arc::new(
            RateLimiter::builder()
                .budget(ids::YAHOO_FUNDAMENTALS, RatePolicy::new(0, Duration::ZERO))
                .build(),
        );
        let provider = YahooProvider::with_client(reqwest::Client::new(), limiter);

        let err = provider
            .fetch_fundamentals(&Symbol::new("AAPL"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), equity_core::ErrorKind::RateLimited);
    }

    #[tokio::test]
    async fn test_quote_and_fundamentals_share_a_fan_out() {
        use equity_core::{ErrorKind, Lookback, Settings};
        use std::time::Duration;

        let mut settings = Settings::default();
        settings.yahoo = ProviderConfig::new(2000, Duration::from_secs(1));
        let limiter = Arc::new(settings.rate_limiter());

        // Nothing listens on the discard port, so requests fail fast after the permit.
        let client = reqwest::Client::builder()
            .proxy(reqwest::Proxy::all("http://127.0.0.1:9").unwrap())
            .timeout(Duration::from_secs(2))
            .build()
            .unwrap();
        let provider = YahooProvider::with_client(client, Arc::clone(&limiter));

        let symbol = Symbol::new("AAPL");
        let request = QuoteRequest::new(symbol.clone()).with_lookbacks([Lookback::OneMonth]);
        let (quote, fundamentals) = tokio::join!(
            provider.fetch_quote(&request),
            provider.fetch_fundamentals(&symbol),
        );

        assert_ne!(quote.unwrap_err().kind(), ErrorKind::RateLimited);
        assert_ne!(fundamentals.unwrap_err().kind(), ErrorKind::RateLimited);
        assert_eq!(limiter.snapshot(ids::YAHOO).unwrap().calls_made_today, 1);
        assert_eq!(
            limiter.snapshot(ids::YAHOO_FUNDAMENTALS).unwrap().calls_made_today,
            1
        );
    }
}
