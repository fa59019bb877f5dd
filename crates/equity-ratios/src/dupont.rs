//! DuPont decomposition of return on equity.

use serde::{Deserialize, Serialize};

use crate::bundle::Entries;

/// Where a [`DuPontAnalysis`] came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuPontSource {
    /// All three components were derived from a financial statement.
    Statements,
    /// Only the provider-reported return on equity was available; turnover
    /// and multiplier are unknown.
    ReportedRoe,
    /// Neither statements nor a reported return on equity were available.
    #[default]
    Unavailable,
}

/// Return on equity as margin × asset turnover × equity multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DuPontAnalysis {
    /// Net income over revenue.
    pub net_profit_margin: Option<f64>,
    /// Revenue over total assets.
    pub asset_turnover: Option<f64>,
    /// Total assets over total equity.
    pub equity_multiplier: Option<f64>,
    /// Product of the three components, or the reported figure.
    pub roe_calculated: Option<f64>,
    /// How the figures were obtained.
    pub source: DuPontSource,
}

impl DuPontAnalysis {
    /// Builds a full decomposition from its three components.
    #[must_use]
    pub fn from_components(net_profit_margin: f64, asset_turnover: f64, equity_multiplier: f64) -> Self {
        let roe = net_profit_margin * asset_turnover * equity_multiplier;
        Self {
            net_profit_margin: Some(net_profit_margin),
            asset_turnover: Some(asset_turnover),
            equity_multiplier: Some(equity_multiplier),
            roe_calculated: roe.is_finite().then_some(roe),
            source: DuPontSource::Statements,
        }
    }

    /// A degraded analysis carrying only a reported return on equity.
    #[must_use]
    pub const fn from_reported_roe(roe: f64, net_profit_margin: Option<f64>) -> Self {
        Self {
            net_profit_margin,
            asset_turnover: None,
            equity_multiplier: None,
            roe_calculated: Some(roe),
            source: DuPontSource::ReportedRoe,
        }
    }

    /// Returns true if all three components are known.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.source, DuPontSource::Statements)
    }

    /// Returns every figure in declaration order.
    #[must_use]
    pub const fn entries(&self) -> Entries<4> {
        [
            ("net_profit_margin", self.net_profit_margin),
            ("asset_turnover", self.asset_turnover),
            ("equity_multiplier", self.equity_multiplier),
            ("roe_calculated", self.roe_calculated),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_components_multiplies() {
        let dupont = DuPontAnalysis::from_components(0.10, 1.5, 2.0);

        assert!((dupont.roe_calculated.unwrap() - 0.30).abs() < 1e-9);
        assert!(dupont.is_complete());
    }

    #[test]
    fn test_reported_roe_marks_components_unavailable() {
        let dupont = DuPontAnalysis::from_reported_roe(0.25, Some(0.2));

        assert_eq!(dupont.roe_calculated, Some(0.25));
        assert_eq!(dupont.asset_turnover, None);
        assert_eq!(dupont.equity_multiplier, None);
        assert_eq!(dupont.source, DuPontSource::ReportedRoe);
        assert!(!dupont.is_complete());
    }

    #[test]
    fn test_source_serializes_snake_case() {
        let json = serde_json::to_value(DuPontAnalysis::default()).unwrap();
        assert_eq!(json["source"], "unavailable");
    }
}
