#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/equity-research/equity/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial ratio engine.
//!
//! - [`compute`] - Derive a [`RatioBundle`] from a snapshot and statements
//! - [`DuPontAnalysis`] - Return on equity decomposition
//! - [`cagr`] / [`yoy`] - Growth helpers
//!
//! # Example
//!
//! ```
//! use equity_core::FundamentalsSnapshot;
//! use equity_ratios::compute;
//!
//! let snapshot = FundamentalsSnapshot {
//!     trailing_pe: Some(25.0),
//!     ..Default::default()
//! };
//! let ratios = compute(&snapshot, &[]);
//!
//! assert_eq!(ratios.valuation.pe_ratio, Some(25.0));
//! assert_eq!(ratios.profitability.profit_margin, None);
//! ```

/// Ratio group types.
pub mod bundle;
/// DuPont decomposition.
pub mod dupont;
/// Ratio computation.
pub mod engine;
/// Growth helpers.
pub mod growth;

pub use bundle::{
    Entries, GrowthRatios, LeverageRatios, LiquidityRatios, ProfitabilityRatios, RatioBundle,
    ValuationRatios,
};
pub use dupont::{DuPontAnalysis, DuPontSource};
pub use engine::compute;
pub use growth::{cagr, yoy};
