use std::collections::{BTreeMap, HashMap};

use crate::models::PolarityScores;

const BOOST_FACTOR: f64 = 1.29;
const DAMPEN_FACTOR: f64 = 0.71;
const NEGATION_FACTOR: f64 = -0.74;
// Denominator constant for compound normalization, x / sqrt(x^2 + alpha).
const NORMALIZATION_ALPHA: f64 = 15.0;
// How many preceding tokens are checked for boosters and negators.
const LOOKBACK: usize = 2;

const BOOSTERS: [&str; 10] = [
    "very",
    "really",
    "so",
    "extremely",
    "super",
    "absolutely",
    "totally",
    "highly",
    "definitely",
    "incredibly",
];

const DAMPENERS: [&str; 4] = ["kinda", "somewhat", "slightly", "barely"];

const NEGATORS: [&str; 14] = [
    "not", "no", "never", "none", "cannot", "cant", "dont", "doesnt", "didnt", "isnt", "wasnt",
    "wont", "without", "hardly",
];

/// Lexicon-based polarity scorer. The domain overlay is merged into the base
/// valence table at construction; instances are immutable afterwards, so one
/// analyzer can be shared freely.
pub struct PolarityAnalyzer {
    valences: HashMap<String, f64>,
}

impl PolarityAnalyzer {
    pub fn new() -> Self {
        Self::with_overlay(&BTreeMap::new())
    }

    pub fn with_overlay(overlay: &BTreeMap<String, f64>) -> Self {
        let mut valences = base_valences();
        for (term, valence) in overlay {
            valences.insert(term.clone(), *valence);
        }
        PolarityAnalyzer { valences }
    }

    pub fn polarity_scores(&self, text: &str) -> PolarityScores {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split_whitespace()
            .map(trim_token)
            .filter(|t| !t.is_empty())
            .collect();

        let mut total = 0.0;
        let mut pos_raw = 0.0;
        let mut neg_raw = 0.0;
        let mut neutral = 0usize;

        for (i, token) in tokens.iter().enumerate() {
            let Some(&valence) = self.valences.get(*token) else {
                neutral += 1;
                continue;
            };
            let mut valence = valence;
            let mut negated = false;
            for prev in &tokens[i.saturating_sub(LOOKBACK)..i] {
                if BOOSTERS.contains(prev) {
                    valence *= BOOST_FACTOR;
                } else if DAMPENERS.contains(prev) {
                    valence *= DAMPEN_FACTOR;
                } else if NEGATORS.contains(prev) || prev.ends_with("n't") {
                    negated = true;
                }
            }
            if negated {
                valence *= NEGATION_FACTOR;
            }

            total += valence;
            if valence > 0.0 {
                pos_raw += valence;
            } else {
                neg_raw += -valence;
            }
        }

        let compound =
            (total / (total * total + NORMALIZATION_ALPHA).sqrt()).clamp(-1.0, 1.0);
        let denom = pos_raw + neg_raw + neutral as f64;
        if denom <= 0.0 {
            return PolarityScores {
                compound,
                ..PolarityScores::default()
            };
        }
        PolarityScores {
            compound,
            pos: pos_raw / denom,
            neu: neutral as f64 / denom,
            neg: neg_raw / denom,
        }
    }
}

impl Default for PolarityAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn trim_token(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn base_valences() -> HashMap<String, f64> {
    [
        ("good", 1.9),
        ("great", 3.1),
        ("excellent", 2.7),
        ("amazing", 2.8),
        ("awesome", 3.1),
        ("best", 3.2),
        ("love", 3.2),
        ("loved", 2.9),
        ("like", 1.5),
        ("liked", 1.7),
        ("fun", 2.3),
        ("enjoyable", 2.2),
        ("enjoyed", 2.3),
        ("interesting", 1.7),
        ("helpful", 1.8),
        ("nice", 1.8),
        ("fair", 1.4),
        ("recommend", 1.5),
        ("recommended", 1.6),
        ("worth", 0.9),
        ("bad", -2.5),
        ("terrible", -2.1),
        ("awful", -2.0),
        ("horrible", -2.5),
        ("worst", -3.1),
        ("hate", -2.7),
        ("hated", -2.9),
        ("boring", -1.3),
        ("useless", -1.8),
        ("waste", -1.8),
        ("poor", -1.9),
        ("annoying", -1.8),
        ("confusing", -1.5),
        ("disappointing", -2.1),
        ("stress", -1.8),
        ("stressful", -1.9),
        ("avoid", -1.3),
        ("hard", -1.2),
        ("difficult", -1.5),
    ]
    .into_iter()
    .map(|(term, valence)| (term.to_string(), valence))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_text_scores_positive() {
        let analyzer = PolarityAnalyzer::new();
        let scores = analyzer.polarity_scores("This course was great and really fun");
        assert!(scores.compound > 0.0);
        assert!(scores.pos > 0.0);
        assert_eq!(scores.neg, 0.0);
    }

    #[test]
    fn negation_flips_valence() {
        let analyzer = PolarityAnalyzer::new();
        let positive = analyzer.polarity_scores("the lectures were good");
        let negated = analyzer.polarity_scores("the lectures were not good");
        assert!(positive.compound > 0.0);
        assert!(negated.compound < 0.0);
    }

    #[test]
    fn booster_amplifies_valence() {
        let analyzer = PolarityAnalyzer::new();
        let plain = analyzer.polarity_scores("it was good");
        let boosted = analyzer.polarity_scores("it was really good");
        assert!(boosted.compound > plain.compound);
    }

    #[test]
    fn empty_text_yields_zeroes() {
        let analyzer = PolarityAnalyzer::new();
        assert_eq!(analyzer.polarity_scores(""), PolarityScores::default());
    }

    #[test]
    fn overlay_terms_take_precedence() {
        let overlay = BTreeMap::from([("bird".to_string(), 2.5)]);
        let analyzer = PolarityAnalyzer::with_overlay(&overlay);
        let scores = analyzer.polarity_scores("total bird");
        assert!(scores.compound > 0.0);

        let base = PolarityAnalyzer::new();
        assert_eq!(base.polarity_scores("total bird").compound, 0.0);
    }

    #[test]
    fn proportions_sum_to_one_for_mixed_text() {
        let analyzer = PolarityAnalyzer::new();
        let scores = analyzer.polarity_scores("good course but boring lectures");
        assert!((scores.pos + scores.neu + scores.neg - 1.0).abs() < 1e-9);
        assert!(scores.compound >= -1.0 && scores.compound <= 1.0);
    }
}
