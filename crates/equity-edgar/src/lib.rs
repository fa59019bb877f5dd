#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR data provider for recent filings.
//!
//! This crate provides access to SEC EDGAR including:
//!
//! - CIK (Central Index Key) lookup from ticker symbols
//! - Recent filings from the submissions API
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use equity_edgar::EdgarProvider;
//! use equity_core::{FilingsProvider, Settings, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::default();
//!     let limiter = Arc::new(settings.rate_limiter());
//!     let provider = EdgarProvider::new(&settings.edgar, &settings.sec_user_agent, limiter)?;
//!
//!     let filings = provider.fetch_filings(&Symbol::new("AAPL")).await?;
//!     for filing in filings.recent {
//!         println!("{} filed {:?}", filing.form, filing.filing_date);
//!     }
//!
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use equity_core::{
    DataProvider, FilingRecord, FilingsProvider, FilingsSummary, ProviderConfig, ProviderError,
    RateLimiter, Result, Symbol, http, provider::ids,
};
use serde::Deserialize;
use tokio::sync::OnceCell;
use tracing::debug;

/// SEC EDGAR API base URL
const EDGAR_BASE_URL: &str = "https://data.sec.gov";

/// SEC company tickers URL
const COMPANY_TICKERS_URL: &str = "https://www.sec.gov/files/company_tickers.json";

/// Display name used in errors and logs.
const PROVIDER_NAME: &str = "SEC EDGAR";

/// Number of filings returned by default.
pub const DEFAULT_MAX_FILINGS: usize = 5;

/// SEC EDGAR filings provider.
///
/// The ticker-to-CIK table is downloaded on first use and kept for the
/// lifetime of the provider.
#[derive(Debug)]
pub struct EdgarProvider {
    client: reqwest::Client,
    limiter: Arc<RateLimiter>,
    max_filings: usize,
    tickers: OnceCell<HashMap<String, CompanyTickerInfo>>,
}

impl EdgarProvider {
    /// Create a new EDGAR provider with the specified user agent.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    pub fn new(config: &ProviderConfig, user_agent: &str, limiter: Arc<RateLimiter>) -> Result<Self> {
        let client = http::build_client(config.request_timeout, user_agent)?;
        Ok(Self::with_client(client, limiter))
    }

    /// Create a new EDGAR provider with a custom HTTP client.
    ///
    /// The client must already carry an identifying user agent.
    #[must_use]
    pub fn with_client(client: reqwest::Client, limiter: Arc<RateLimiter>) -> Self {
        Self {
            client,
            limiter,
            max_filings: DEFAULT_MAX_FILINGS,
            tickers: OnceCell::new(),
        }
    }

    /// Sets how many recent filings to return.
    #[must_use]
    pub const fn with_max_filings(mut self, max_filings: usize) -> Self {
        self.max_filings = max_filings;
        self
    }

    /// Look up a company's CIK number from its ticker symbol.
    ///
    /// Returns the CIK zero-padded to 10 digits.
    pub async fn get_cik(&self, symbol: &Symbol) -> Result<String> {
        let ticker = symbol.base();
        if ticker.is_empty() {
            return Err(ProviderError::InvalidParameter("Empty ticker".to_string()));
        }

        let tickers = self
            .tickers
            .get_or_try_init(|| self.fetch_company_tickers())
            .await?;

        find_cik(tickers, ticker).ok_or_else(|| ProviderError::NotFound(symbol.to_string()))
    }

    async fn fetch_company_tickers(&self) -> Result<HashMap<String, CompanyTickerInfo>> {
        debug!("Fetching company tickers from SEC");
        http::get_json(self.client.get(COMPANY_TICKERS_URL), PROVIDER_NAME, "company tickers")
            .await
    }

    /// Fetch company submissions/filings metadata.
    async fn fetch_company_submissions(&self, cik: &str) -> Result<CompanySubmissions> {
        let url = format!("{EDGAR_BASE_URL}/submissions/CIK{cik}.json");
        debug!(%url, "Fetching company submissions");
        http::get_json(self.client.get(&url), PROVIDER_NAME, cik).await
    }
}

impl DataProvider for EdgarProvider {
    fn id(&self) -> &str {
        ids::EDGAR
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn description(&self) -> &str {
        "SEC EDGAR recent regulatory filings for US-listed registrants"
    }
}

#[async_trait]
impl FilingsProvider for EdgarProvider {
    async fn fetch_filings(&self, symbol: &Symbol) -> Result<FilingsSummary> {
        self.limiter
            .try_acquire(ids::EDGAR)
            .map_err(|denied| denied.into_error(PROVIDER_NAME))?;

        let cik = self.get_cik(symbol).await?;
        debug!(symbol = %symbol, %cik, "Resolved CIK");

        let submissions = self.fetch_company_submissions(&cik).await?;
        Ok(summarize(cik, submissions, self.max_filings))
    }
}

/// Finds the zero-padded CIK for `ticker`, ignoring case.
fn find_cik(tickers: &HashMap<String, CompanyTickerInfo>, ticker: &str) -> Option<String> {
    tickers
        .values()
        .find(|company| company.ticker.eq_ignore_ascii_case(ticker))
        .map(|company| format!("{:0>10}", company.cik_str))
}

/// Zips the column-oriented recent filings into records, newest first.
fn summarize(cik: String, submissions: CompanySubmissions, max_filings: usize) -> FilingsSummary {
    let recent = &submissions.filings.recent;
    let date = |column: &[String], i: usize| {
        column
            .get(i)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    };

    let records = recent
        .form
        .iter()
        .zip(&recent.accession_number)
        .enumerate()
        .take(max_filings)
        .map(|(i, (form, accession))| FilingRecord {
            form: form.clone(),
            filing_date: date(&recent.filing_date, i),
            accession_number: accession.clone(),
            report_date: date(&recent.report_date, i),
            primary_document: recent
                .primary_document
                .get(i)
                .filter(|d| !d.is_empty())
                .cloned(),
        })
        .collect();

    FilingsSummary {
        company_name: submissions.name.filter(|n| !n.is_empty()),
        cik,
        recent: records,
    }
}

// =============================================================================
// SEC EDGAR API Response Types
// =============================================================================

/// Entry in the SEC company tickers file.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

/// Response from the SEC EDGAR submissions API.
#[derive(Debug, Deserialize)]
struct CompanySubmissions {
    name: Option<String>,
    #[serde(default)]
    filings: Filings,
}

#[derive(Debug, Default, Deserialize)]
struct Filings {
    #[serde(default)]
    recent: RecentFilings,
}

/// Recent filings as parallel columns, newest first.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentFilings {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
}

// =============================================================================
// Tests
// =============================================================================
