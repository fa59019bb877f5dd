//! Core data types for equity research data.
//!
//! This module defines the normalized records every provider produces:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`OhlcvBar`] and [`PriceHistory`] - Daily price bars for a lookback window
//! - [`QuoteSnapshot`] and [`NormalizedQuote`] - Current quote plus histories
//! - [`FundamentalsSnapshot`], [`FinancialStatement`] and [`Fundamentals`] - Reported metrics and statements
//! - [`Article`] - A news article
//! - [`FilingRecord`] and [`FilingsSummary`] - Regulatory filings
//! - [`TechnicalIndicators`] - Indicator series
//!
//! Every field an upstream may omit is an `Option`; absent values are never
//! replaced by zero or empty-string sentinels.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::period::{Lookback, PeriodType};

/// A trading symbol/ticker.
///
/// Symbols are automatically trimmed and uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the symbol without an exchange suffix (`"BRK.B"` -> `"BRK"`).
    #[must_use]
    pub fn base(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }

    /// Returns true if the symbol is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// OHLCV (Open, High, Low, Close, Volume) bar data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OhlcvBar {
    /// Timestamp of the bar.
    pub timestamp: DateTime<Utc>,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume, when reported.
    pub volume: Option<u64>,
    /// Split/dividend adjusted closing price.
    pub adjusted_close: Option<f64>,
}

impl OhlcvBar {
    /// Creates a new OHLCV bar.
    #[must_use]
    pub const fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: Option<u64>,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
            adjusted_close: None,
        }
    }

    /// Sets the adjusted close price.
    #[must_use]
    pub const fn with_adjusted_close(mut self, adjusted_close: f64) -> Self {
        self.adjusted_close = Some(adjusted_close);
        self
    }
}

/// Daily bars for one lookback window, ordered oldest to newest.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    /// Window the bars were requested for.
    pub lookback: Lookback,
    /// Bars ordered by timestamp ascending.
    pub bars: Vec<OhlcvBar>,
}

impl PriceHistory {
    /// Returns the most recent bar.
    #[must_use]
    pub fn last(&self) -> Option<&OhlcvBar> {
        self.bars.last()
    }

    /// Returns the number of bars.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Returns true if there are no bars.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// Current quote fields, all nullable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    /// Last traded price.
    pub price: Option<f64>,
    /// Previous session close.
    pub previous_close: Option<f64>,
    /// Absolute change versus the previous close.
    pub change: Option<f64>,
    /// Percentage change versus the previous close.
    pub change_percent: Option<f64>,
    /// Session volume.
    pub volume: Option<u64>,
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Trailing price-to-earnings ratio.
    pub trailing_pe: Option<f64>,
    /// Forward price-to-earnings ratio.
    pub forward_pe: Option<f64>,
    /// Beta coefficient.
    pub beta: Option<f64>,
    /// 52-week high price.
    pub week_52_high: Option<f64>,
    /// 52-week low price.
    pub week_52_low: Option<f64>,
    /// Dividend yield.
    pub dividend_yield: Option<f64>,
    /// Trading currency.
    pub currency: Option<String>,
    /// Company long name.
    pub long_name: Option<String>,
    /// Listing exchange.
    pub exchange: Option<String>,
}

impl QuoteSnapshot {
    /// Fills `change` and `change_percent` from price and previous close
    /// when the provider did not report them.
    #[must_use]
    pub fn with_derived_change(mut self) -> Self {
        if let (Some(price), Some(prev)) = (self.price, self.previous_close) {
            if self.change.is_none() {
                self.change = Some(price - prev);
            }
            if self.change_percent.is_none() && prev != 0.0 {
                self.change_percent = Some((price - prev) / prev * 100.0);
            }
        }
        self
    }
}

/// Quote snapshot plus one or more price histories for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NormalizedQuote {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Current quote fields.
    pub snapshot: QuoteSnapshot,
    /// Histories in the order they were requested.
    pub history: Vec<PriceHistory>,
}

impl NormalizedQuote {
    /// Returns the history fetched for `lookback`, if any.
    #[must_use]
    pub fn history_for(&self, lookback: Lookback) -> Option<&PriceHistory> {
        self.history.iter().find(|h| h.lookback == lookback)
    }
}

/// Provider-reported fundamental metrics, all nullable.
///
/// Margins, returns and growth figures are fractions (0.25 = 25%), except
/// `debt_to_equity`, which carries whatever scale the provider reports.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FundamentalsSnapshot {
    // Valuation
    /// Market capitalization.
    pub market_cap: Option<f64>,
    /// Enterprise value.
    pub enterprise_value: Option<f64>,
    /// Trailing price-to-earnings ratio.
    pub trailing_pe: Option<f64>,
    /// Forward price-to-earnings ratio.
    pub forward_pe: Option<f64>,
    /// Price/earnings-to-growth ratio.
    pub peg_ratio: Option<f64>,
    /// Price-to-book ratio.
    pub price_to_book: Option<f64>,
    /// Trailing twelve month price-to-sales ratio.
    pub price_to_sales: Option<f64>,
    /// Enterprise value to EBITDA.
    pub enterprise_to_ebitda: Option<f64>,
    /// Enterprise value to revenue.
    pub enterprise_to_revenue: Option<f64>,
    /// Book value per share.
    pub book_value: Option<f64>,

    // Profitability
    /// Gross margin.
    pub gross_margins: Option<f64>,
    /// Operating margin.
    pub operating_margins: Option<f64>,
    /// Net profit margin.
    pub profit_margins: Option<f64>,
    /// EBITDA margin.
    pub ebitda_margins: Option<f64>,
    /// Return on equity.
    pub return_on_equity: Option<f64>,
    /// Return on assets.
    pub return_on_assets: Option<f64>,

    // Liquidity & leverage
    /// Current ratio.
    pub current_ratio: Option<f64>,
    /// Quick ratio.
    pub quick_ratio: Option<f64>,
    /// Debt-to-equity ratio.
    pub debt_to_equity: Option<f64>,
    /// Total cash.
    pub total_cash: Option<f64>,
    /// Total cash per share.
    pub total_cash_per_share: Option<f64>,
    /// Total debt.
    pub total_debt: Option<f64>,

    // Growth & income
    /// Trailing total revenue.
    pub total_revenue: Option<f64>,
    /// Reported year-over-year revenue growth.
    pub revenue_growth: Option<f64>,
    /// Reported year-over-year earnings growth.
    pub earnings_growth: Option<f64>,
    /// Dividend yield.
    pub dividend_yield: Option<f64>,
    /// Beta coefficient.
    pub beta: Option<f64>,
}

/// One reporting period's financial statement line items.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialStatement {
    /// End date of the reporting period.
    pub period_end: NaiveDate,
    /// Type of period (annual or quarterly).
    pub period_type: PeriodType,

    // Balance Sheet
    /// Total assets.
    pub total_assets: Option<f64>,
    /// Current assets.
    pub current_assets: Option<f64>,
    /// Cash and cash equivalents.
    pub cash_and_equivalents: Option<f64>,
    /// Inventory.
    pub inventory: Option<f64>,
    /// Total liabilities.
    pub total_liabilities: Option<f64>,
    /// Current liabilities.
    pub current_liabilities: Option<f64>,
    /// Total debt.
    pub total_debt: Option<f64>,
    /// Stockholders' equity.
    pub stockholders_equity: Option<f64>,

    // Income Statement
    /// Total revenue.
    pub revenue: Option<f64>,
    /// Gross profit.
    pub gross_profit: Option<f64>,
    /// Operating income.
    pub operating_income: Option<f64>,
    /// Net income.
    pub net_income: Option<f64>,
    /// Interest expense.
    pub interest_expense: Option<f64>,

    // Cash Flow Statement
    /// Operating cash flow.
    pub operating_cash_flow: Option<f64>,
    /// Capital expenditures.
    pub capital_expenditures: Option<f64>,
    /// Dividends paid.
    pub dividends_paid: Option<f64>,
}

impl FinancialStatement {
    /// Creates a new financial statement with required fields.
    #[must_use]
    pub fn new(period_end: NaiveDate, period_type: PeriodType) -> Self {
        Self {
            period_end,
            period_type,
            ..Default::default()
        }
    }

    /// Free cash flow when both operating cash flow and capex are reported.
    ///
    /// Capital expenditures are reported as negative outflows upstream.
    #[must_use]
    pub fn free_cash_flow(&self) -> Option<f64> {
        Some(self.operating_cash_flow? + self.capital_expenditures?)
    }
}

/// Reported metrics plus statements for one symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Fundamentals {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Provider-reported metrics.
    pub snapshot: FundamentalsSnapshot,
    /// Statements ordered newest first.
    pub statements: Vec<FinancialStatement>,
}

/// A news article as returned by a news provider.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Headline.
    pub title: Option<String>,
    /// Short description or lede.
    pub description: Option<String>,
    /// Link to the article.
    pub url: Option<String>,
    /// Publishing outlet.
    pub source_name: Option<String>,
    /// Publication timestamp.
    pub published_at: Option<DateTime<Utc>>,
    /// Truncated body content.
    pub content: Option<String>,
}

impl Article {
    /// Text used for sentiment scoring: title and description joined by a space.
    ///
    /// Returns `None` when both are absent or blank.
    #[must_use]
    pub fn sentiment_text(&self) -> Option<String> {
        let text = format!(
            "{} {}",
            self.title.as_deref().unwrap_or_default(),
            self.description.as_deref().unwrap_or_default()
        );
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// A single regulatory filing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingRecord {
    /// Form type (e.g. `"10-K"`).
    pub form: String,
    /// Date the filing was accepted.
    pub filing_date: Option<NaiveDate>,
    /// Accession number.
    pub accession_number: String,
    /// Period the filing reports on.
    pub report_date: Option<NaiveDate>,
    /// Primary document file name.
    pub primary_document: Option<String>,
}

/// Recent filings for one registrant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilingsSummary {
    /// Registrant name.
    pub company_name: Option<String>,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    /// Most recent filings, newest first.
    pub recent: Vec<FilingRecord>,
}

/// A dated indicator value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    /// Observation date.
    pub date: NaiveDate,
    /// Indicator value.
    pub value: f64,
}

/// Technical indicator series for a symbol.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalIndicators {
    /// Daily relative strength index, oldest to newest.
    pub rsi: Vec<IndicatorPoint>,
}

impl TechnicalIndicators {
    /// Returns the most recent RSI value.
    #[must_use]
    pub fn latest_rsi(&self) -> Option<f64> {
        self.rsi.last().map(|p| p.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::new(" aapl ");
        assert_eq!(symbol.as_str(), "AAPL");
        assert_eq!(Symbol::new("reliance.ns").base(), "RELIANCE");
    }

    #[test]
    fn test_derived_change() {
        let snapshot = QuoteSnapshot {
            price: Some(110.0),
            previous_close: Some(100.0),
            ..Default::default()
        }
        .with_derived_change();
        assert_eq!(snapshot.change, Some(10.0));
        assert_eq!(snapshot.change_percent, Some(10.0));

        let zero_prev = QuoteSnapshot {
            price: Some(1.0),
            previous_close: Some(0.0),
            ..Default::default()
        }
        .with_derived_change();
        assert_eq!(zero_prev.change_percent, None);
    }

    #[test]
    fn test_sentiment_text() {
        let article = Article {
            title: Some("Shares rally".into()),
            description: None,
            ..Default::default()
        };
        assert_eq!(article.sentiment_text().as_deref(), Some("Shares rally"));
        assert_eq!(Article::default().sentiment_text(), None);
    }

    #[test]
    fn test_missing_fields_serialize_as_null() {
        let json = serde_json::to_value(QuoteSnapshot::default()).unwrap();
        assert!(json["trailing_pe"].is_null());
        assert!(json.as_object().unwrap().contains_key("market_cap"));
    }
}
