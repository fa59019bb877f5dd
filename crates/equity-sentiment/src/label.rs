//! Sentiment labels, per-label counts and percentages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Compound score at or above which text is positive.
pub const POSITIVE_THRESHOLD: f64 = 0.05;

/// Compound score at or below which text is negative.
pub const NEGATIVE_THRESHOLD: f64 = -0.05;

/// Three-way sentiment classification.
///
/// Variants are declared in tie-break priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    /// Favorable.
    Positive,
    /// Neither favorable nor unfavorable.
    Neutral,
    /// Unfavorable.
    Negative,
}

impl SentimentLabel {
    /// Every label, highest tie-break priority first.
    pub const ALL: [Self; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// Classifies a compound score with the ±0.05 thresholds.
    #[must_use]
    pub fn from_compound(compound: f64) -> Self {
        if compound >= POSITIVE_THRESHOLD {
            Self::Positive
        } else if compound <= NEGATIVE_THRESHOLD {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    /// Returns the lowercase label name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }

    /// +1 for positive, -1 for negative, 0 for neutral.
    #[must_use]
    pub const fn sign(&self) -> f64 {
        match self {
            Self::Positive => 1.0,
            Self::Neutral => 0.0,
            Self::Negative => -1.0,
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    /// Parses a label case-insensitively (`"Positive"`, `"NEGATIVE"`, ...).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(format!("unknown sentiment label: {other}")),
        }
    }
}

/// Number of articles per label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelCounts {
    /// Positive articles.
    pub positive: usize,
    /// Neutral articles.
    pub neutral: usize,
    /// Negative articles.
    pub negative: usize,
}

impl LabelCounts {
    /// Counts the given labels.
    #[must_use]
    pub fn from_labels(labels: impl IntoIterator<Item = SentimentLabel>) -> Self {
        labels.into_iter().fold(Self::default(), |mut counts, label| {
            counts.increment(label);
            counts
        })
    }

    /// Adds one article with `label`.
    pub const fn increment(&mut self, label: SentimentLabel) {
        match label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Neutral => self.neutral += 1,
            SentimentLabel::Negative => self.negative += 1,
        }
    }

    /// Returns the count for `label`.
    #[must_use]
    pub const fn get(&self, label: SentimentLabel) -> usize {
        match label {
            SentimentLabel::Positive => self.positive,
            SentimentLabel::Neutral => self.neutral,
            SentimentLabel::Negative => self.negative,
        }
    }

    /// Total number of articles counted.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// The label with the highest count; ties go to positive, then neutral.
    ///
    /// `None` when nothing was counted.
    #[must_use]
    pub fn dominant(&self) -> Option<SentimentLabel> {
        if self.total() == 0 {
            return None;
        }
        // `ALL` is in priority order and `max_by_key` keeps the last maximum,
        // so iterate in reverse.
        SentimentLabel::ALL
            .into_iter()
            .rev()
            .max_by_key(|label| self.get(*label))
    }

    /// Share of each label in percent; all zero when nothing was counted.
    #[must_use]
    pub fn percentages(&self) -> LabelPercentages {
        let total = self.total();
        let pct = |n: usize| {
            if total == 0 {
                0.0
            } else {
                n as f64 / total as f64 * 100.0
            }
        };
        LabelPercentages {
            positive: pct(self.positive),
            neutral: pct(self.neutral),
            negative: pct(self.negative),
        }
    }
}

/// Percentage of articles per label.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelPercentages {
    /// Positive share.
    pub positive: f64,
    /// Neutral share.
    pub neutral: f64,
    /// Negative share.
    pub negative: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(SentimentLabel::from_compound(0.05), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_compound(-0.05), SentimentLabel::Negative);
        assert_eq!(SentimentLabel::from_compound(0.049), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_compound(-0.049), SentimentLabel::Neutral);
    }

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!("Positive".parse::<SentimentLabel>(), Ok(SentimentLabel::Positive));
        assert_eq!("NEGATIVE".parse::<SentimentLabel>(), Ok(SentimentLabel::Negative));
        assert!("LABEL_0".parse::<SentimentLabel>().is_err());
    }

    #[test]
    fn test_dominant_tie_break() {
        let counts = LabelCounts {
            positive: 2,
            neutral: 2,
            negative: 2,
        };
        assert_eq!(counts.dominant(), Some(SentimentLabel::Positive));

        let counts = LabelCounts {
            positive: 0,
            neutral: 3,
            negative: 3,
        };
        assert_eq!(counts.dominant(), Some(SentimentLabel::Neutral));

        let counts = LabelCounts {
            positive: 1,
            neutral: 0,
            negative: 4,
        };
        assert_eq!(counts.dominant(), Some(SentimentLabel::Negative));

        assert_eq!(LabelCounts::default().dominant(), None);
    }

    #[test]
    fn test_percentages() {
        let counts = LabelCounts::from_labels([
            SentimentLabel::Positive,
            SentimentLabel::Positive,
            SentimentLabel::Negative,
            SentimentLabel::Neutral,
        ]);
        let pct = counts.percentages();

        assert_eq!(pct.positive, 50.0);
        assert_eq!(pct.negative, 25.0);
        assert_eq!(pct.neutral, 25.0);
        assert_eq!(LabelCounts::default().percentages(), LabelPercentages::default());
    }
}
