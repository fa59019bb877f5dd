//! Rule-based valence scoring.
//!
//! Each known word carries a valence in `[-4, 4]`. Word valences are shifted
//! by preceding intensifiers, flipped and damped by preceding negations,
//! emphasized when written in capitals, and reweighted around a contrastive
//! "but". The summed valence is normalized into a compound score with
//! `s / sqrt(s² + 15)`.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::label::SentimentLabel;

/// Intensifier increment.
const BOOST_INCR: f64 = 0.293;
/// Intensifier decrement.
const BOOST_DECR: f64 = -0.293;
/// Emphasis added to a capitalized word in otherwise mixed-case text.
const CAPS_INCR: f64 = 0.733;
/// Scale applied to a negated valence.
const NEGATION_SCALAR: f64 = -0.74;
/// Emphasis per exclamation mark, up to four.
const EXCLAMATION_INCR: f64 = 0.292;
/// Emphasis per question mark when there are two or three.
const QUESTION_INCR: f64 = 0.18;
/// Normalization constant for the compound score.
const ALPHA: f64 = 15.0;

#[rustfmt::skip]
const VALENCES: &[(&str, f64)] = &[
    // General
    ("good", 1.9), ("great", 3.1), ("excellent", 2.7), ("best", 3.2), ("better", 1.9),
    ("positive", 2.6), ("happy", 2.7), ("love", 3.2), ("like", 1.5), ("win", 2.8),
    ("wins", 2.7), ("won", 2.7), ("success", 2.7), ("successful", 2.8), ("strong", 2.3),
    ("stronger", 2.1), ("strongest", 1.9), ("optimistic", 1.3), ("confident", 2.2),
    ("impressive", 2.3), ("solid", 1.4), ("benefit", 2.0), ("benefits", 1.6),
    ("opportunity", 1.8), ("opportunities", 1.6), ("improve", 1.9), ("improved", 2.1),
    ("improves", 1.8), ("improvement", 2.0), ("boost", 1.7), ("boosts", 1.3),
    ("boosted", 1.5), ("advance", 1.4), ("advances", 1.2), ("progress", 1.8),
    ("innovative", 1.9), ("innovation", 1.6), ("growth", 1.6), ("grow", 1.4),
    ("grows", 1.2), ("growing", 1.3), ("gain", 2.4), ("gains", 1.8), ("gained", 1.6),
    ("profit", 1.9), ("profits", 1.9), ("profitable", 1.9), ("rally", 1.6),
    ("rallies", 1.5), ("surge", 1.6), ("surges", 1.6), ("soar", 2.0), ("soars", 2.0),
    ("soared", 2.0), ("beat", 1.0), ("beats", 1.2), ("exceed", 1.4), ("exceeds", 1.4),
    ("exceeded", 1.4), ("outperform", 1.8), ("outperforms", 1.8), ("upgrade", 1.8),
    ("upgraded", 1.8), ("record", 1.0), ("bullish", 2.2), ("recovery", 1.4),
    ("rebound", 1.3), ("rebounds", 1.3), ("resilient", 1.6), ("robust", 1.7),
    ("healthy", 1.7), ("upbeat", 1.9), ("celebrate", 2.7), ("praise", 2.6),
    ("approve", 1.7), ("approved", 1.8), ("approval", 1.6), ("secure", 1.4),
    ("stable", 1.2), ("thriving", 2.4), ("wow", 2.8), ("amazing", 2.8),
    ("awesome", 3.1), ("fantastic", 2.6), ("favorable", 2.1), ("attractive", 1.9),
    ("reward", 2.0), ("rewarding", 2.4), ("dividend", 0.6), ("top", 0.8),
    // Negative
    ("bad", -2.5), ("worse", -2.1), ("worst", -3.1), ("terrible", -2.1),
    ("horrible", -2.5), ("awful", -2.0), ("poor", -2.1), ("weak", -1.9),
    ("weaker", -1.9), ("weakness", -1.7), ("negative", -2.7), ("sad", -2.1),
    ("hate", -2.7), ("lose", -1.7), ("loses", -1.3), ("losing", -1.6), ("lost", -1.3),
    ("loss", -1.3), ("losses", -1.7), ("fail", -2.5), ("fails", -1.8), ("failed", -2.3),
    ("failure", -2.3), ("decline", -1.5), ("declines", -1.4), ("declined", -1.3),
    ("drop", -1.1), ("drops", -1.1), ("dropped", -1.2), ("fall", -1.0), ("falls", -1.0),
    ("fell", -1.0), ("plunge", -2.0), ("plunges", -2.0), ("plunged", -2.0),
    ("slump", -1.9), ("slumps", -1.9), ("tumble", -1.6), ("tumbles", -1.6),
    ("crash", -1.7), ("crashes", -1.7), ("collapse", -2.2), ("collapses", -2.2),
    ("miss", -0.6), ("misses", -0.9), ("missed", -1.2), ("downgrade", -1.6),
    ("downgraded", -1.6), ("underperform", -1.6), ("bearish", -2.0), ("risk", -1.1),
    ("risks", -1.1), ("risky", -1.4), ("concern", -1.1), ("concerns", -1.1),
    ("worry", -1.9), ("worries", -1.8), ("worried", -1.2), ("fear", -2.2),
    ("fears", -1.8), ("uncertain", -1.2), ("uncertainty", -1.4), ("volatile", -0.9),
    ("warning", -1.4), ("warns", -0.4), ("crisis", -3.1), ("trouble", -1.7),
    ("troubled", -2.0), ("problem", -1.7), ("problems", -1.7), ("lawsuit", -1.8),
    ("sue", -1.6), ("sued", -1.5), ("probe", -0.7), ("investigation", -0.8),
    ("fraud", -2.8), ("scandal", -2.2), ("penalty", -1.4), ("fine", 0.8),
    ("fined", -1.5), ("bankrupt", -2.6), ("bankruptcy", -2.6), ("default", -1.3),
    ("layoffs", -1.9), ("cut", -1.1), ("cuts", -1.2), ("slowdown", -1.5),
    ("recession", -1.9), ("inflation", -0.9), ("disappoint", -2.0),
    ("disappointing", -2.2), ("disappointed", -1.9), ("disappointment", -2.3),
    ("struggle", -1.3), ("struggles", -1.5), ("struggling", -1.9), ("hurt", -2.4),
    ("damage", -2.2), ("threat", -2.4), ("threatens", -1.9), ("angry", -2.3),
    ("panic", -2.3), ("dump", -1.6), ("sell-off", -1.8), ("selloff", -1.8),
];

#[rustfmt::skip]
const BOOSTERS: &[(&str, f64)] = &[
    ("absolutely", BOOST_INCR), ("amazingly", BOOST_INCR), ("completely", BOOST_INCR),
    ("considerably", BOOST_INCR), ("deeply", BOOST_INCR), ("dramatically", BOOST_INCR),
    ("enormously", BOOST_INCR), ("entirely", BOOST_INCR), ("especially", BOOST_INCR),
    ("exceptionally", BOOST_INCR), ("extremely", BOOST_INCR), ("greatly", BOOST_INCR),
    ("highly", BOOST_INCR), ("hugely", BOOST_INCR), ("incredibly", BOOST_INCR),
    ("majorly", BOOST_INCR), ("more", BOOST_INCR), ("most", BOOST_INCR),
    ("particularly", BOOST_INCR), ("really", BOOST_INCR), ("remarkably", BOOST_INCR),
    ("sharply", BOOST_INCR), ("significantly", BOOST_INCR), ("so", BOOST_INCR),
    ("strongly", BOOST_INCR), ("substantially", BOOST_INCR), ("totally", BOOST_INCR),
    ("tremendously", BOOST_INCR), ("very", BOOST_INCR),
    ("almost", BOOST_DECR), ("barely", BOOST_DECR), ("hardly", BOOST_DECR),
    ("less", BOOST_DECR), ("little", BOOST_DECR), ("marginally", BOOST_DECR),
    ("occasionally", BOOST_DECR), ("partly", BOOST_DECR), ("scarcely", BOOST_DECR),
    ("slightly", BOOST_DECR), ("somewhat", BOOST_DECR),
];

#[rustfmt::skip]
const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "neither", "nor", "nowhere",
    "cannot", "without", "isn't", "isnt", "aren't", "arent", "wasn't", "wasnt",
    "weren't", "werent", "don't", "dont", "doesn't", "doesnt", "didn't", "didnt",
    "won't", "wont", "wouldn't", "wouldnt", "can't", "cant", "couldn't", "couldnt",
    "shouldn't", "shouldnt", "hasn't", "hasnt", "haven't", "havent", "hadn't", "hadnt",
    "ain't", "aint", "rarely", "seldom", "despite",
];

static LEXICON: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| VALENCES.iter().copied().collect());
static BOOSTER_DICT: Lazy<HashMap<&'static str, f64>> = Lazy::new(|| BOOSTERS.iter().copied().collect());
static NEGATION_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| NEGATIONS.iter().copied().collect());

/// Proportions and compound score for one text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LexiconScores {
    /// Normalized sum of valences in `[-1, 1]`.
    pub compound: f64,
    /// Share of positive intensity.
    pub positive: f64,
    /// Share of neutral words.
    pub neutral: f64,
    /// Share of negative intensity.
    pub negative: f64,
}

impl LexiconScores {
    /// Label from the compound score.
    #[must_use]
    pub fn label(&self) -> SentimentLabel {
        SentimentLabel::from_compound(self.compound)
    }
}

/// Rule-based sentiment scorer over a built-in valence lexicon.
#[derive(Clone, Copy, Debug, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    /// Scorer name recorded in results.
    pub const NAME: &'static str = "lexicon";

    /// Creates a scorer, forcing the lexicon tables to load.
    #[must_use]
    pub fn new() -> Self {
        Lazy::force(&LEXICON);
        Self
    }

    /// Scores `text`. Text without known words scores a neutral zero.
    #[must_use]
    pub fn score(&self, text: &str) -> LexiconScores {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return LexiconScores::default();
        }
        let lowered: Vec<String> = tokens.iter().map(|t| t.to_lowercase()).collect();
        let cap_diff = is_cap_diff(&tokens);

        let mut sentiments: Vec<f64> = (0..tokens.len())
            .map(|i| self.valence(&tokens, &lowered, i, cap_diff))
            .collect();
        but_check(&lowered, &mut sentiments);

        polarity(&sentiments, text)
    }

    fn valence(&self, tokens: &[&str], lowered: &[String], i: usize, cap_diff: bool) -> f64 {
        let word = lowered[i].as_str();
        if BOOSTER_DICT.contains_key(word) {
            return 0.0;
        }
        let Some(&base) = LEXICON.get(word) else {
            return 0.0;
        };

        let mut valence = base;
        if cap_diff && is_upper(tokens[i]) {
            valence += CAPS_INCR.copysign(valence);
        }

        // Up to three preceding words may intensify or negate.
        for distance in 1..=3 {
            if i < distance {
                break;
            }
            let prior = lowered[i - distance].as_str();
            if LEXICON.contains_key(prior) {
                continue;
            }
            let damp = match distance {
                1 => 1.0,
                2 => 0.95,
                _ => 0.9,
            };
            valence += boost(prior, tokens[i - distance], valence, cap_diff) * damp;
            if NEGATION_SET.contains(prior) || prior.ends_with("n't") {
                valence *= NEGATION_SCALAR;
            }
        }

        valence
    }
}

/// Splits on whitespace and strips surrounding punctuation, keeping
/// apostrophes and hyphens inside words.
fn tokenize(text: &str) -> Vec<&str> {
    text.split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|t| t.chars().count() > 1 || t.chars().any(char::is_alphabetic))
        .collect()
}

fn is_upper(token: &str) -> bool {
    token.chars().any(char::is_alphabetic)
        && token.chars().filter(|c| c.is_alphabetic()).all(char::is_uppercase)
}

/// True when some but not all words are in capitals.
fn is_cap_diff(tokens: &[&str]) -> bool {
    let upper = tokens.iter().filter(|t| is_upper(t)).count();
    upper > 0 && upper < tokens.len()
}

fn boost(prior_lower: &str, prior: &str, valence: f64, cap_diff: bool) -> f64 {
    let Some(&scalar) = BOOSTER_DICT.get(prior_lower) else {
        return 0.0;
    };
    let mut scalar = if valence < 0.0 { -scalar } else { scalar };
    if cap_diff && is_upper(prior) {
        scalar += CAPS_INCR.copysign(valence);
    }
    scalar
}

/// Halves sentiment before "but" and emphasizes sentiment after it.
fn but_check(lowered: &[String], sentiments: &mut [f64]) {
    let Some(pivot) = lowered.iter().position(|w| w == "but") else {
        return;
    };
    for (i, s) in sentiments.iter_mut().enumerate() {
        if i < pivot {
            *s *= 0.5;
        } else if i > pivot {
            *s *= 1.5;
        }
    }
}

fn punctuation_emphasis(text: &str) -> f64 {
    let exclamations = text.matches('!').count().min(4) as f64 * EXCLAMATION_INCR;
    let questions = match text.matches('?').count() {
        0 | 1 => 0.0,
        n @ 2..=3 => n as f64 * QUESTION_INCR,
        _ => 0.96,
    };
    exclamations + questions
}

fn polarity(sentiments: &[f64], text: &str) -> LexiconScores {
    let mut sum: f64 = sentiments.iter().sum();
    if sum == 0.0 {
        return LexiconScores {
            neutral: 1.0,
            ..LexiconScores::default()
        };
    }

    let emphasis = punctuation_emphasis(text);
    sum += emphasis.copysign(sum);
    let compound = (sum / (sum * sum + ALPHA).sqrt()).clamp(-1.0, 1.0);

    let mut pos_sum = 0.0;
    let mut neg_sum = 0.0;
    let mut neutral_count = 0.0;
    for &s in sentiments {
        if s > 0.0 {
            pos_sum += s + 1.0;
        } else if s < 0.0 {
            neg_sum += s - 1.0;
        } else {
            neutral_count += 1.0;
        }
    }
    if pos_sum > f64::abs(neg_sum) {
        pos_sum += emphasis;
    } else if pos_sum < f64::abs(neg_sum) {
        neg_sum -= emphasis;
    }

    let total = pos_sum + neg_sum.abs() + neutral_count;
    LexiconScores {
        compound,
        positive: (pos_sum / total).abs(),
        neutral: (neutral_count / total).abs(),
        negative: (neg_sum / total).abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(text: &str) -> f64 {
        LexiconScorer::new().score(text).compound
    }

    #[test]
    fn test_polar_headlines() {
        assert!(compound("Apple beats estimates as strong iPhone sales boost profit") > 0.05);
        assert!(compound("Shares plunge after fraud probe and weak guidance") < -0.05);
    }

    #[test]
    fn test_unknown_words_are_neutral() {
        let scores = LexiconScorer::new().score("Company schedules annual shareholder meeting");
        assert_eq!(scores.compound, 0.0);
        assert_eq!(scores.neutral, 1.0);
        assert_eq!(scores.label(), SentimentLabel::Neutral);
        assert_eq!(LexiconScorer::new().score("   ").compound, 0.0);
    }

    #[test]
    fn test_negation_flips_sign() {
        assert!(compound("The quarter was good") > 0.0);
        assert!(compound("The quarter was not good") < 0.0);
    }

    #[test]
    fn test_booster_and_emphasis_increase_intensity() {
        let plain = compound("Results were good");
        assert!(compound("Results were very good") > plain);
        assert!(compound("Results were good!!") > plain);
        assert!(compound("Results were GOOD") > plain);
    }

    #[test]
    fn test_but_shifts_weight_to_second_clause() {
        assert!(compound("Revenue was good but margins were terrible") < 0.0);
        assert!(compound("Revenue was terrible but margins were great") > 0.0);
    }

    #[test]
    fn test_compound_is_bounded() {
        let c = compound("great great great great great great great great great!!!!");
        assert!(c <= 1.0 && c > 0.9);
    }

    #[test]
    fn test_proportions_sum_to_one() {
        let scores = LexiconScorer::new().score("Good results despite weak demand in a quiet market");
        let sum = scores.positive + scores.neutral + scores.negative;
        assert!((sum - 1.0).abs() < 1e-9);
    }
}
