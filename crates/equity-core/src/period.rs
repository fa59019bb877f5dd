//! Price history lookback windows and reporting period types.
//!
//! This module defines [`Lookback`] for the length of a daily price history
//! request and [`PeriodType`] for fundamental reporting periods.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Length of a daily price history request, counted back from today.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Lookback {
    /// One calendar month.
    OneMonth,
    /// Six calendar months.
    SixMonths,
    /// One year.
    OneYear,
    /// Two years.
    TwoYears,
    /// Five years.
    FiveYears,
    /// Full available history.
    Max,
}

impl Lookback {
    /// Returns the conventional range code (e.g. `"1y"`).
    #[must_use]
    pub const fn as_range(&self) -> &'static str {
        match self {
            Self::OneMonth => "1mo",
            Self::SixMonths => "6mo",
            Self::OneYear => "1y",
            Self::TwoYears => "2y",
            Self::FiveYears => "5y",
            Self::Max => "max",
        }
    }
}

impl fmt::Display for Lookback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_range())
    }
}

/// Period type for fundamental financial data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PeriodType {
    /// Annual reporting period.
    #[default]
    Annual,
    /// Quarterly reporting period.
    Quarterly,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_codes() {
        assert_eq!(Lookback::OneYear.as_range(), "1y");
        assert_eq!(Lookback::FiveYears.to_string(), "5y");
        assert!(Lookback::OneYear < Lookback::FiveYears);
    }
}
