//! Ratio groups.
//!
//! Every group is a plain struct of `Option<f64>` fields. Absent values
//! serialize as `null`, so a consumer always sees every key and can tell
//! "not computed" apart from "computed as zero".

use serde::{Deserialize, Serialize};

use crate::dupont::DuPontAnalysis;

/// Ordered `(name, value)` pairs of a ratio group.
pub type Entries<const N: usize> = [(&'static str, Option<f64>); N];

/// Price multiples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ValuationRatios {
    /// Trailing price-to-earnings.
    pub pe_ratio: Option<f64>,
    /// Forward price-to-earnings.
    pub forward_pe: Option<f64>,
    /// Provider-reported PEG ratio.
    pub peg_ratio: Option<f64>,
    /// Trailing P/E divided by earnings growth in percent.
    pub peg_calculated: Option<f64>,
    /// Price-to-book.
    pub price_to_book: Option<f64>,
    /// Price-to-sales (trailing twelve months).
    pub price_to_sales: Option<f64>,
    /// Enterprise value to EBITDA.
    pub ev_to_ebitda: Option<f64>,
    /// Enterprise value to revenue.
    pub ev_to_revenue: Option<f64>,
}

impl ValuationRatios {
    /// Returns every ratio in declaration order.
    #[must_use]
    pub const fn entries(&self) -> Entries<8> {
        [
            ("pe_ratio", self.pe_ratio),
            ("forward_pe", self.forward_pe),
            ("peg_ratio", self.peg_ratio),
            ("peg_calculated", self.peg_calculated),
            ("price_to_book", self.price_to_book),
            ("price_to_sales", self.price_to_sales),
            ("ev_to_ebitda", self.ev_to_ebitda),
            ("ev_to_revenue", self.ev_to_revenue),
        ]
    }
}

/// Margins and returns, as fractions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfitabilityRatios {
    /// Gross profit over revenue.
    pub gross_margin: Option<f64>,
    /// Operating income over revenue.
    pub operating_margin: Option<f64>,
    /// Net income over revenue.
    pub profit_margin: Option<f64>,
    /// EBITDA over revenue.
    pub ebitda_margin: Option<f64>,
    /// Return on equity.
    pub roe: Option<f64>,
    /// Return on assets.
    pub roa: Option<f64>,
    /// Return on invested capital, approximated by return on assets.
    pub roic: Option<f64>,
}

impl ProfitabilityRatios {
    /// Returns every ratio in declaration order.
    #[must_use]
    pub const fn entries(&self) -> Entries<7> {
        [
            ("gross_margin", self.gross_margin),
            ("operating_margin", self.operating_margin),
            ("profit_margin", self.profit_margin),
            ("ebitda_margin", self.ebitda_margin),
            ("roe", self.roe),
            ("roa", self.roa),
            ("roic", self.roic),
        ]
    }
}

/// Short-term solvency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LiquidityRatios {
    /// Current assets over current liabilities.
    pub current_ratio: Option<f64>,
    /// Current assets less inventory over current liabilities.
    pub quick_ratio: Option<f64>,
    /// Cash and equivalents over current liabilities.
    pub cash_ratio: Option<f64>,
}

impl LiquidityRatios {
    /// Returns every ratio in declaration order.
    #[must_use]
    pub const fn entries(&self) -> Entries<3> {
        [
            ("current_ratio", self.current_ratio),
            ("quick_ratio", self.quick_ratio),
            ("cash_ratio", self.cash_ratio),
        ]
    }
}

/// Capital structure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LeverageRatios {
    /// Debt to equity, in the provider's scale (Yahoo reports percent).
    pub debt_to_equity: Option<f64>,
    /// Total debt over total assets.
    pub debt_to_assets: Option<f64>,
    /// Operating income over interest expense, absolute.
    pub interest_coverage: Option<f64>,
}

impl LeverageRatios {
    /// Returns every ratio in declaration order.
    #[must_use]
    pub const fn entries(&self) -> Entries<3> {
        [
            ("debt_to_equity", self.debt_to_equity),
            ("debt_to_assets", self.debt_to_assets),
            ("interest_coverage", self.interest_coverage),
        ]
    }
}

/// Growth rates, as fractions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GrowthRatios {
    /// Latest revenue over the prior period.
    pub revenue_growth_yoy: Option<f64>,
    /// Latest net income over the prior period.
    pub net_income_growth_yoy: Option<f64>,
    /// Compound revenue growth over every available period.
    pub revenue_growth_cagr: Option<f64>,
    /// Provider-reported revenue growth.
    pub reported_revenue_growth: Option<f64>,
    /// Provider-reported earnings growth.
    pub reported_earnings_growth: Option<f64>,
}

impl GrowthRatios {
    /// Returns every ratio in declaration order.
    #[must_use]
    pub const fn entries(&self) -> Entries<5> {
        [
            ("revenue_growth_yoy", self.revenue_growth_yoy),
            ("net_income_growth_yoy", self.net_income_growth_yoy),
            ("revenue_growth_cagr", self.revenue_growth_cagr),
            ("reported_revenue_growth", self.reported_revenue_growth),
            ("reported_earnings_growth", self.reported_earnings_growth),
        ]
    }
}

/// All ratio groups for one company.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RatioBundle {
    /// Price multiples.
    pub valuation: ValuationRatios,
    /// Margins and returns.
    pub profitability: ProfitabilityRatios,
    /// Short-term solvency.
    pub liquidity: LiquidityRatios,
    /// Capital structure.
    pub leverage: LeverageRatios,
    /// Growth rates.
    pub growth: GrowthRatios,
    /// Return on equity decomposition.
    pub dupont: DuPontAnalysis,
}

impl RatioBundle {
    /// Returns `(group, entries)` for every group, DuPont included.
    #[must_use]
    pub fn groups(&self) -> Vec<(&'static str, Vec<(&'static str, Option<f64>)>)> {
        vec![
            ("valuation", self.valuation.entries().to_vec()),
            ("profitability", self.profitability.entries().to_vec()),
            ("liquidity", self.liquidity.entries().to_vec()),
            ("leverage", self.leverage.entries().to_vec()),
            ("growth", self.growth.entries().to_vec()),
            ("dupont", self.dupont.entries().to_vec()),
        ]
    }

    /// Number of ratios that could be computed.
    #[must_use]
    pub fn computed_count(&self) -> usize {
        self.groups()
            .iter()
            .flat_map(|(_, entries)| entries.iter())
            .filter(|(_, value)| value.is_some())
            .count()
    }
}
