//! Ratio computation.

use equity_core::{FinancialStatement, FundamentalsSnapshot};
use tracing::trace;

use crate::{
    bundle::{
        GrowthRatios, LeverageRatios, LiquidityRatios, ProfitabilityRatios, RatioBundle,
        ValuationRatios,
    },
    dupont::DuPontAnalysis,
    growth::{cagr, yoy},
};

/// Minimum number of revenue observations for a compound growth rate.
const MIN_CAGR_VALUES: usize = 3;

/// Computes every ratio group from a snapshot and statements ordered newest first.
///
/// Pure: the same inputs always produce the same bundle.
#[must_use]
pub fn compute(snapshot: &FundamentalsSnapshot, statements: &[FinancialStatement]) -> RatioBundle {
    let latest = statements.first();
    let previous = statements.get(1);

    let bundle = RatioBundle {
        valuation: valuation(snapshot),
        profitability: profitability(snapshot, latest),
        liquidity: liquidity(snapshot, latest),
        leverage: leverage(snapshot, latest),
        growth: growth(snapshot, statements, latest, previous),
        dupont: dupont(snapshot, latest),
    };
    trace!(computed = bundle.computed_count(), statements = statements.len(), "Computed ratios");
    bundle
}

fn valuation(s: &FundamentalsSnapshot) -> ValuationRatios {
    let pe = finite(s.trailing_pe);
    // Meaningless for negative earnings or shrinking growth.
    let peg_calculated = match (pe, finite(s.earnings_growth)) {
        (Some(pe), Some(g)) if pe > 0.0 && g > 0.0 => divide(Some(pe), Some(g * 100.0)),
        _ => None,
    };

    ValuationRatios {
        pe_ratio: pe,
        forward_pe: finite(s.forward_pe),
        peg_ratio: finite(s.peg_ratio),
        peg_calculated,
        price_to_book: finite(s.price_to_book),
        price_to_sales: finite(s.price_to_sales),
        ev_to_ebitda: finite(s.enterprise_to_ebitda),
        ev_to_revenue: finite(s.enterprise_to_revenue),
    }
}

fn profitability(s: &FundamentalsSnapshot, latest: Option<&FinancialStatement>) -> ProfitabilityRatios {
    let derived = |num: fn(&FinancialStatement) -> Option<f64>,
                   den: fn(&FinancialStatement) -> Option<f64>| {
        latest.and_then(|st| divide(num(st), den(st)))
    };

    let roa = finite(s.return_on_assets).or_else(|| derived(|st| st.net_income, |st| st.total_assets));

    ProfitabilityRatios {
        gross_margin: finite(s.gross_margins).or_else(|| derived(|st| st.gross_profit, |st| st.revenue)),
        operating_margin: finite(s.operating_margins)
            .or_else(|| derived(|st| st.operating_income, |st| st.revenue)),
        profit_margin: finite(s.profit_margins).or_else(|| derived(|st| st.net_income, |st| st.revenue)),
        ebitda_margin: finite(s.ebitda_margins),
        roe: finite(s.return_on_equity)
            .or_else(|| derived(|st| st.net_income, |st| st.stockholders_equity)),
        roa,
        roic: roa,
    }
}

fn liquidity(s: &FundamentalsSnapshot, latest: Option<&FinancialStatement>) -> LiquidityRatios {
    let current_liabilities = latest.and_then(|st| st.current_liabilities);

    let quick_assets = latest.and_then(|st| Some(st.current_assets? - st.inventory?));

    LiquidityRatios {
        current_ratio: finite(s.current_ratio).or_else(|| {
            divide(latest.and_then(|st| st.current_assets), current_liabilities)
        }),
        quick_ratio: finite(s.quick_ratio).or_else(|| divide(quick_assets, current_liabilities)),
        cash_ratio: divide(latest.and_then(|st| st.cash_and_equivalents), current_liabilities),
    }
}

fn leverage(s: &FundamentalsSnapshot, latest: Option<&FinancialStatement>) -> LeverageRatios {
    let total_debt = latest.and_then(|st| st.total_debt).or(s.total_debt);

    LeverageRatios {
        debt_to_equity: finite(s.debt_to_equity),
        debt_to_assets: divide(total_debt, latest.and_then(|st| st.total_assets)),
        interest_coverage: divide(
            latest.and_then(|st| st.operating_income),
            latest.and_then(|st| st.interest_expense),
        )
        .map(f64::abs),
    }
}

fn growth(
    s: &FundamentalsSnapshot,
    statements: &[FinancialStatement],
    latest: Option<&FinancialStatement>,
    previous: Option<&FinancialStatement>,
) -> GrowthRatios {
    let pair = |item: fn(&FinancialStatement) -> Option<f64>| {
        let current = item(latest?)?;
        let prior = item(previous?)?;
        yoy(current, prior)
    };

    // Contiguous run of reported revenue, newest first, then chronological.
    let mut revenues: Vec<f64> = statements.iter().map_while(|st| st.revenue).collect();
    revenues.reverse();
    let revenue_growth_cagr = if revenues.len() >= MIN_CAGR_VALUES {
        cagr(&revenues, revenues.len() - 1)
    } else {
        None
    };

    GrowthRatios {
        revenue_growth_yoy: pair(|st| st.revenue),
        net_income_growth_yoy: pair(|st| st.net_income),
        revenue_growth_cagr,
        reported_revenue_growth: finite(s.revenue_growth),
        reported_earnings_growth: finite(s.earnings_growth),
    }
}

fn dupont(s: &FundamentalsSnapshot, latest: Option<&FinancialStatement>) -> DuPontAnalysis {
    let components = latest.and_then(|st| {
        let margin = divide(st.net_income, st.revenue)?;
        let turnover = divide(st.revenue, st.total_assets)?;
        let multiplier = divide(st.total_assets, st.stockholders_equity)?;
        Some((margin, turnover, multiplier))
    });

    match (components, finite(s.return_on_equity)) {
        (Some((margin, turnover, multiplier)), _) => {
            DuPontAnalysis::from_components(margin, turnover, multiplier)
        }
        (None, Some(roe)) => {
            trace!("DuPont components unavailable, using reported return on equity");
            DuPontAnalysis::from_reported_roe(roe, finite(s.profit_margins))
        }
        (None, None) => DuPontAnalysis::default(),
    }
}

/// `num / den` when both are finite, the denominator is non-zero and the
/// quotient is finite.
fn divide(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    let (num, den) = (finite(num)?, finite(den)?);
    if den == 0.0 {
        return None;
    }
    finite(Some(num / den))
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}
